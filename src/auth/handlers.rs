use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{
        AuthResponse, LoginRequest, MessageResponse, PasswordResetRequest, RefreshRequest,
        RegisterRequest, ResetPasswordRequest,
    },
    services,
};
use crate::{error::AppError, extract::ValidJson, state::AppState, users::dto::ProfileView};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/request-password-reset", post(request_password_reset))
        .route("/auth/reset-password", post(reset_password))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (user, tokens) = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: ProfileView::from(&user),
            tokens,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, tokens) = services::login(&state, payload).await?;
    Ok(Json(AuthResponse {
        user: ProfileView::from(&user),
        tokens,
    }))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, tokens) = services::refresh(&state, &payload.refresh).await?;
    Ok(Json(AuthResponse {
        user: ProfileView::from(&user),
        tokens,
    }))
}

#[instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::request_password_reset(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: "password reset email sent",
    }))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::reset_password(&state, payload).await?;
    Ok(Json(MessageResponse {
        message: "password has been reset",
    }))
}
