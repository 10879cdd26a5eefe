use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{dto::MessageView, services};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

pub fn message_routes() -> Router<AppState> {
    Router::new().route("/system-messages/active", get(active_messages))
}

#[instrument(skip_all)]
pub async fn active_messages(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let messages = services::active(&state).await?;
    Ok(Json(messages.into_iter().map(MessageView::from).collect()))
}
