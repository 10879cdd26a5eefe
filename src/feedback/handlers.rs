use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{FeedbackView, SubmitFeedbackRequest},
    repo_types::FeedbackFilter,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{ValidJson, ValidQuery},
    pagination::{Page, PageRequest},
    state::AppState,
};

pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/feedback", post(submit_feedback))
        .route("/feedback/received", get(received_feedback))
        .route("/feedback/given", get(given_feedback))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(payload): ValidJson<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackView>), AppError> {
    let feedback = services::submit(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(feedback.into())))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn received_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageRequest>,
) -> Result<Json<Page<FeedbackView>>, AppError> {
    let page = services::list(&state, FeedbackFilter::ReceivedBy(user.id), &page).await?;
    Ok(Json(page.map(FeedbackView::from)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn given_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageRequest>,
) -> Result<Json<Page<FeedbackView>>, AppError> {
    let page = services::list(&state, FeedbackFilter::GivenBy(user.id), &page).await?;
    Ok(Json(page.map(FeedbackView::from)))
}
