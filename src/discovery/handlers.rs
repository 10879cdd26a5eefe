use axum::{
    extract::{RawQuery, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{DashboardSummary, DiscoveryQuery},
    services,
};
use crate::{
    auth::extractors::AuthUser, error::AppError, pagination::Page, state::AppState,
    users::dto::PublicProfileView,
};

pub fn discovery_routes() -> Router<AppState> {
    Router::new()
        .route("/users/public", get(list_public_users))
        .route("/users/public/search", get(search_users))
        .route("/users/me/dashboard-summary", get(dashboard_summary))
}

#[instrument(skip_all)]
pub async fn list_public_users(
    State(state): State<AppState>,
    _user: AuthUser,
    RawQuery(raw): RawQuery,
) -> Result<Json<Page<PublicProfileView>>, AppError> {
    let query = DiscoveryQuery::parse(raw.as_deref())?;
    Ok(Json(services::list_public_users(&state, &query.filter, &query.page).await?))
}

#[instrument(skip_all)]
pub async fn search_users(
    State(state): State<AppState>,
    _user: AuthUser,
    RawQuery(raw): RawQuery,
) -> Result<Json<Page<PublicProfileView>>, AppError> {
    let query = DiscoveryQuery::parse(raw.as_deref())?;
    let page = services::search_users(&state, query.q.as_deref(), query.filter, &query.page).await?;
    Ok(Json(page))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(services::dashboard_summary(&state, &user).await?))
}
