use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{ProfileInput, ProfileView, SkillProofView, UserProfileResponse},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{Path, ValidJson},
    skills::dto::SkillView,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).put(update_me))
        .route("/users/me/verified-skills", get(verified_skills))
        .route("/users/me/skill-proofs", get(skill_proofs))
        .route("/users/:id", get(get_user))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<ProfileView> {
    Json(ProfileView::from(&user))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(payload): ValidJson<ProfileInput>,
) -> Result<Json<ProfileView>, AppError> {
    let user = services::update_me(&state, &user, payload).await?;
    Ok(Json(ProfileView::from(&user)))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfileResponse>, AppError> {
    Ok(Json(services::get_profile(&state, &user, id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn verified_skills(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SkillView>>, AppError> {
    Ok(Json(services::verified_skills(&state, &user).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn skill_proofs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SkillProofView>>, AppError> {
    Ok(Json(services::skill_proofs(&state, &user).await?))
}
