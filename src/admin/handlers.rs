use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AdminUserQuery, AdminUserView, BanRequest},
    services,
};
use crate::{
    auth::extractors::AdminUser,
    discovery::{dto::PlatformStats, services as discovery},
    error::AppError,
    extract::{Path, ValidJson, ValidQuery},
    messages::{
        dto::{CreateMessageRequest, MessageView, UpdateMessageRequest},
        services as messages,
    },
    pagination::{Page, PageRequest},
    skills::{
        dto::{AdminSkillUpdate, SkillView},
        services as skills,
    },
    state::AppState,
    swaps::{
        dto::{AdminSwapQuery, SwapView},
        lifecycle::{Actor, SwapAction},
        services as swaps,
    },
    users::repo_types::UserFilter,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", axum::routing::delete(delete_user))
        .route("/admin/users/:id/ban", put(ban_user))
        .route("/admin/users/:id/unban", put(unban_user))
        .route("/admin/stats", get(platform_stats))
        .route("/admin/swap-requests", get(list_swaps))
        .route("/admin/swap-requests/:id/complete", put(force_complete))
        .route("/admin/system-messages", get(list_messages).post(create_message))
        .route("/admin/system-messages/:id", put(update_message).delete(delete_message))
        .route("/admin/skills/:id", put(update_skill).delete(delete_skill))
}

#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(query): ValidQuery<AdminUserQuery>,
) -> Result<Json<Page<AdminUserView>>, AppError> {
    let filter = UserFilter::from(query);
    let users = services::list_users(&state, &filter, &page).await?;
    Ok(Json(users.map(|u| AdminUserView::from(&u))))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn ban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<BanRequest>,
) -> Result<Json<AdminUserView>, AppError> {
    let user = services::ban(&state, id, &payload.banned_reason).await?;
    Ok(Json(AdminUserView::from(&user)))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn unban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUserView>, AppError> {
    let user = services::unban(&state, id).await?;
    Ok(Json(AdminUserView::from(&user)))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_user(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn platform_stats(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<PlatformStats>, AppError> {
    Ok(Json(discovery::platform_statistics(&state).await?))
}

#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn list_swaps(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(query): ValidQuery<AdminSwapQuery>,
) -> Result<Json<Page<SwapView>>, AppError> {
    Ok(Json(swaps::list_all(&state, query, &page).await?))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn force_complete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, AppError> {
    let swap = swaps::transition(&state, id, Actor::Admin, SwapAction::ForceComplete).await?;
    Ok(Json(swaps::view(&state, swap).await?))
}

#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn list_messages(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let rows = messages::list_all(&state).await?;
    Ok(Json(rows.into_iter().map(MessageView::from).collect()))
}

#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn create_message(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(payload): ValidJson<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    let message = messages::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn update_message(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateMessageRequest>,
) -> Result<Json<MessageView>, AppError> {
    Ok(Json(messages::update(&state, id, payload).await?.into()))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn delete_message(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    messages::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn update_skill(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<AdminSkillUpdate>,
) -> Result<Json<SkillView>, AppError> {
    let skill = skills::admin_update(&state, id, payload.description).await?;
    Ok(Json(skill.into()))
}

#[instrument(skip_all, fields(admin = %admin.id, %id))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    skills::delete(&state, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
