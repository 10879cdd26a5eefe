use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    messages::repo_types::{MessagePatch, SystemMessage},
    store::PgStore,
};

#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn insert_message(&self, title: &str, content: &str, is_active: bool) -> anyhow::Result<SystemMessage>;
    async fn update_message(&self, id: Uuid, patch: MessagePatch) -> anyhow::Result<Option<SystemMessage>>;
    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Newest first.
    async fn list_messages(&self, active_only: bool) -> anyhow::Result<Vec<SystemMessage>>;
}

#[async_trait]
impl MessageRepo for PgStore {
    async fn insert_message(&self, title: &str, content: &str, is_active: bool) -> anyhow::Result<SystemMessage> {
        let message = sqlx::query_as::<_, SystemMessage>(
            r#"
            INSERT INTO system_messages (title, content, is_active)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(is_active)
        .fetch_one(&self.db)
        .await
        .context("insert system message")?;
        Ok(message)
    }

    async fn update_message(&self, id: Uuid, patch: MessagePatch) -> anyhow::Result<Option<SystemMessage>> {
        let message = sqlx::query_as::<_, SystemMessage>(
            r#"
            UPDATE system_messages SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.is_active)
        .fetch_optional(&self.db)
        .await
        .context("update system message")?;
        Ok(message)
    }

    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool> {
        let done = sqlx::query(r#"DELETE FROM system_messages WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete system message")?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_messages(&self, active_only: bool) -> anyhow::Result<Vec<SystemMessage>> {
        let rows = sqlx::query_as::<_, SystemMessage>(
            r#"
            SELECT * FROM system_messages
             WHERE (NOT $1 OR is_active)
             ORDER BY created_at DESC, id
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.db)
        .await
        .context("list system messages")?;
        Ok(rows)
    }
}
