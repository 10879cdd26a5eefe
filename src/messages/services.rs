use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateMessageRequest, UpdateMessageRequest},
    repo::MessageRepo,
    repo_types::SystemMessage,
};
use crate::{error::AppError, state::AppState};

pub async fn active(st: &AppState) -> Result<Vec<SystemMessage>, AppError> {
    Ok(st.store.list_messages(true).await?)
}

pub async fn list_all(st: &AppState) -> Result<Vec<SystemMessage>, AppError> {
    Ok(st.store.list_messages(false).await?)
}

#[instrument(skip(st, req))]
pub async fn create(st: &AppState, req: CreateMessageRequest) -> Result<SystemMessage, AppError> {
    let message = st
        .store
        .insert_message(req.title.trim(), req.content.trim(), req.is_active)
        .await?;
    info!(message_id = %message.id, "system message created");
    Ok(message)
}

#[instrument(skip(st, req))]
pub async fn update(st: &AppState, id: Uuid, req: UpdateMessageRequest) -> Result<SystemMessage, AppError> {
    let message = st
        .store
        .update_message(id, req.into())
        .await?
        .ok_or_else(|| AppError::not_found("system message"))?;
    info!("system message updated");
    Ok(message)
}

#[instrument(skip(st))]
pub async fn delete(st: &AppState, id: Uuid) -> Result<(), AppError> {
    if !st.store.delete_message(id).await? {
        return Err(AppError::not_found("system message"));
    }
    info!("system message deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(title: &str, is_active: bool) -> CreateMessageRequest {
        CreateMessageRequest {
            title: title.into(),
            content: "maintenance tonight".into(),
            is_active,
        }
    }

    #[tokio::test]
    async fn only_active_messages_are_broadcast() {
        let st = AppState::fake();
        let shown = create(&st, new_message(" Notice ", true)).await.unwrap();
        assert_eq!(shown.title, "Notice");
        let hidden = create(&st, new_message("Draft", false)).await.unwrap();

        let visible: Vec<_> = active(&st).await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(visible, vec![shown.id]);
        assert_eq!(list_all(&st).await.unwrap().len(), 2);

        let patch = UpdateMessageRequest {
            is_active: Some(true),
            ..UpdateMessageRequest::default()
        };
        let published = update(&st, hidden.id, patch).await.unwrap();
        assert!(published.is_active);
        assert_eq!(published.title, "Draft");
        // Newest first.
        let visible: Vec<_> = active(&st).await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(visible, vec![hidden.id, shown.id]);
    }

    #[tokio::test]
    async fn missing_messages_are_not_found() {
        let st = AppState::fake();
        let err = update(&st, Uuid::new_v4(), UpdateMessageRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let m = create(&st, new_message("Bye", true)).await.unwrap();
        delete(&st, m.id).await.unwrap();
        assert!(matches!(delete(&st, m.id).await.unwrap_err(), AppError::NotFound(_)));
    }
}
