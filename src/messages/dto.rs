use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::repo_types::{MessagePatch, SystemMessage};
use crate::skills::dto::not_blank;

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(
        length(min = 1, max = 255, message = "title must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub content: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMessageRequest {
    #[validate(
        length(min = 1, max = 255, message = "title must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateMessageRequest> for MessagePatch {
    fn from(req: UpdateMessageRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<SystemMessage> for MessageView {
    fn from(m: SystemMessage) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}
