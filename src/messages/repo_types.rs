use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Broadcast message shown to all users while active.
#[derive(Debug, Clone, FromRow)]
pub struct SystemMessage {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}
