use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateSkillRequest, ProofUploaded, SkillView, UpdateSkillRequest},
    services::{self, ProofUpload, MAX_PROOF_BYTES},
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{Path, ValidJson},
    state::AppState,
};

pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/skills", post(create_skill))
        .route("/skills/:id", put(update_skill).delete(delete_skill))
        .route("/skills/:id/mark-verified", put(mark_verified))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/skills/:id/upload-proof", post(upload_proof))
        // Headroom for multipart framing around a maximum-size file.
        .layer(DefaultBodyLimit::max(MAX_PROOF_BYTES + 64 * 1024))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(payload): ValidJson<CreateSkillRequest>,
) -> Result<(StatusCode, Json<SkillView>), AppError> {
    let skill = services::create(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(skill.into())))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn update_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateSkillRequest>,
) -> Result<Json<SkillView>, AppError> {
    let skill = services::update(&state, &user, id, payload.into()).await?;
    Ok(Json(skill.into()))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /skills/{id}/upload-proof (multipart, field `file`)
#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn upload_proof(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<ProofUploaded>, AppError> {
    let mut upload = None;
    while let Some(field) = mp.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let body = field.bytes().await?;
        upload = Some(ProofUpload { body, content_type });
        break;
    }
    let upload = upload.ok_or_else(|| AppError::field("file", "no file was submitted"))?;

    let file_url = services::upload_proof(&state, &user, id, upload).await?;
    Ok(Json(ProofUploaded { file_url }))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn mark_verified(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SkillView>, AppError> {
    let skill = services::mark_verified(&state, &user, id).await?;
    Ok(Json(skill.into()))
}
