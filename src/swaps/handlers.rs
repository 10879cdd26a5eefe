use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateSwapRequest, StatusQuery, SwapView},
    lifecycle::{Actor, SwapAction},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{Path, ValidJson, ValidQuery},
    pagination::{Page, PageRequest},
    state::AppState,
};

pub fn swap_routes() -> Router<AppState> {
    Router::new()
        .route("/swap-requests", post(create_swap))
        .route("/swap-requests/sent", get(sent_swaps))
        .route("/swap-requests/received", get(received_swaps))
        .route("/swap-requests/completed", get(completed_swaps))
        .route("/swap-requests/:id/accept", put(accept_swap))
        .route("/swap-requests/:id/reject", put(reject_swap))
        .route("/swap-requests/:id/cancel", put(cancel_swap))
        .route("/swap-requests/:id/complete", put(complete_swap))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_swap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(payload): ValidJson<CreateSwapRequest>,
) -> Result<(StatusCode, Json<SwapView>), AppError> {
    let swap = services::create(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(services::view(&state, swap).await?)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn sent_swaps(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<StatusQuery>,
) -> Result<Json<Page<SwapView>>, AppError> {
    Ok(Json(services::sent(&state, user.id, filter.status, &page).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn received_swaps(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<StatusQuery>,
) -> Result<Json<Page<SwapView>>, AppError> {
    Ok(Json(services::received(&state, user.id, filter.status, &page).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn completed_swaps(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageRequest>,
) -> Result<Json<Page<SwapView>>, AppError> {
    Ok(Json(services::completed(&state, user.id, &page).await?))
}

async fn act(state: &AppState, user_id: Uuid, id: Uuid, action: SwapAction) -> Result<Json<SwapView>, AppError> {
    let swap = services::transition(state, id, Actor::User(user_id), action).await?;
    Ok(Json(services::view(state, swap).await?))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn accept_swap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, AppError> {
    act(&state, user.id, id, SwapAction::Accept).await
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn reject_swap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, AppError> {
    act(&state, user.id, id, SwapAction::Reject).await
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn cancel_swap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, AppError> {
    act(&state, user.id, id, SwapAction::Cancel).await
}

/// Records the caller's completion confirmation.
#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn complete_swap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, AppError> {
    act(&state, user.id, id, SwapAction::ConfirmCompletion).await
}
