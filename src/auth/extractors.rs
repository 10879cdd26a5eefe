use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{claims::TokenKind, jwt::JwtKeys};
use crate::{
    error::{AppError, AuthError},
    state::AppState,
    users::{repo::UserRepo, repo_types::User},
};

/// Authenticated, active, unbanned caller.
pub struct AuthUser(pub User);

/// Authenticated caller with the admin flag.
pub struct AdminUser(pub User);

fn bearer(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidHeader)
}

/// Rejects accounts that may not authenticate. Shared by bearer auth,
/// login and refresh.
pub(crate) fn ensure_can_authenticate(user: &User) -> Result<(), AuthError> {
    if !user.is_active {
        return Err(AuthError::Disabled);
    }
    if user.is_banned {
        return Err(AuthError::Banned);
    }
    Ok(())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_kind(token, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AuthError::InvalidToken
        })?;

        let user = state
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        ensure_can_authenticate(&user)?;

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, "admin route refused");
            return Err(AppError::Forbidden("admin permissions required".into()));
        }
        Ok(AdminUser(user))
    }
}
