//! Moderation endpoints. Every route requires [`AdminUser`].
//!
//! [`AdminUser`]: crate::auth::extractors::AdminUser

pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
