use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::{
    claims::TokenKind,
    dto::{LoginRequest, RegisterRequest, ResetPasswordRequest},
    extractors::ensure_can_authenticate,
    jwt::{JwtKeys, TokenPair},
    password::{fingerprint, hash_password, verify_password},
};
use crate::{
    config::BootstrapAdmin,
    error::{AppError, AuthError},
    state::AppState,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
};

/// Creates the account and signs the first token pair.
#[instrument(skip_all, fields(email = %req.email))]
pub async fn register(st: &AppState, req: RegisterRequest) -> Result<(User, TokenPair), AppError> {
    let password_hash = hash_password(&req.password)?;
    let patch = req.profile.into_patch();
    let new = NewUser {
        email: req.email,
        password_hash,
        name: patch.name,
        location: patch.location,
        profile_photo_url: patch.profile_photo_url,
        is_public: patch.is_public.unwrap_or(true),
        availability: patch.availability.unwrap_or_default(),
        timeslot: patch.timeslot.unwrap_or_default(),
        socials: patch.socials,
        is_admin: false,
    };

    let user = st.store.insert_user(new).await?.ok_or_else(|| {
        warn!("email already registered");
        AppError::EmailTaken
    })?;
    let tokens = JwtKeys::from_ref(st).sign_pair(user.id)?;

    info!(user_id = %user.id, "user registered");
    Ok((user, tokens))
}

/// Unknown email and wrong password are indistinguishable. Account flags are
/// only looked at once the password matches.
#[instrument(skip_all, fields(email = %req.email))]
pub async fn login(st: &AppState, req: LoginRequest) -> Result<(User, TokenPair), AppError> {
    let Some(mut user) = st.store.find_user_by_email(&req.email).await? else {
        warn!("login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };
    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }
    ensure_can_authenticate(&user).map_err(|e| {
        warn!(user_id = %user.id, reason = %e, "login refused");
        AppError::from(e)
    })?;

    st.store.touch_last_login(user.id).await?;
    user.last_login = Some(OffsetDateTime::now_utc());
    let tokens = JwtKeys::from_ref(st).sign_pair(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok((user, tokens))
}

#[instrument(skip_all)]
pub async fn refresh(st: &AppState, refresh_token: &str) -> Result<(User, TokenPair), AppError> {
    let keys = JwtKeys::from_ref(st);
    let claims = keys.verify_kind(refresh_token, TokenKind::Refresh).map_err(|e| {
        debug!(error = %e, "refresh token rejected");
        AuthError::InvalidToken
    })?;
    let user = st
        .store
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    ensure_can_authenticate(&user)?;

    let tokens = keys.sign_pair(user.id)?;
    debug!(user_id = %user.id, "tokens refreshed");
    Ok((user, tokens))
}

/// Issues a reset token bound to the current password hash. Delivery is not
/// wired up, so the token only goes to the debug log. Returns the token.
#[instrument(skip_all, fields(email = %email))]
pub async fn request_password_reset(st: &AppState, email: &str) -> Result<String, AppError> {
    let user = st
        .store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| AppError::field("email", "no user found with this email address"))?;

    let fp = fingerprint(&user.password_hash)?;
    let token = JwtKeys::from_ref(st).sign_reset(user.id, &fp)?;
    debug!(user_id = %user.id, %token, "password reset token issued");
    Ok(token)
}

#[instrument(skip_all)]
pub async fn reset_password(st: &AppState, req: ResetPasswordRequest) -> Result<(), AppError> {
    let invalid = || AppError::field("token", "invalid or expired token");

    let claims = JwtKeys::from_ref(st)
        .verify_kind(&req.token, TokenKind::Reset)
        .map_err(|e| {
            debug!(error = %e, "reset token rejected");
            invalid()
        })?;
    let user = st.store.find_user(claims.sub).await?.ok_or_else(invalid)?;
    if claims.fp.as_deref() != Some(fingerprint(&user.password_hash)?.as_str()) {
        warn!(user_id = %user.id, "reset token no longer matches the password");
        return Err(invalid());
    }

    let hash = hash_password(&req.new_password)?;
    if !st.store.set_password_hash(user.id, &hash).await? {
        return Err(invalid());
    }
    info!(user_id = %user.id, "password reset");
    Ok(())
}

/// Makes sure the configured admin account exists and has the admin flag.
#[instrument(skip_all, fields(email = %cfg.email))]
pub async fn bootstrap_admin(st: &AppState, cfg: &BootstrapAdmin) -> Result<User, AppError> {
    let email = cfg.email.trim().to_lowercase();
    if let Some(user) = st.store.find_user_by_email(&email).await? {
        if !user.is_admin {
            st.store.set_admin(user.id, true).await?;
            info!(user_id = %user.id, "existing user promoted to admin");
        }
        return Ok(user);
    }

    let new = NewUser {
        email,
        password_hash: hash_password(&cfg.password)?,
        is_public: false,
        is_admin: true,
        ..NewUser::default()
    };
    let user = st
        .store
        .insert_user(new)
        .await?
        .ok_or(AppError::EmailTaken)?;
    info!(user_id = %user.id, "admin account created");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing, users::dto::ProfileInput};

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: testing::PASSWORD.into(),
            password_confirm: testing::PASSWORD.into(),
            profile: ProfileInput {
                name: Some("New".into()),
                ..ProfileInput::default()
            },
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_duplicate_email() {
        let st = AppState::fake();
        let (user, tokens) = register(&st, register_req("new@example.com")).await.unwrap();
        assert!(user.is_public);
        assert_eq!(user.name.as_deref(), Some("New"));
        let claims = JwtKeys::from_ref(&st).verify(&tokens.access).unwrap();
        assert_eq!(claims.sub, user.id);

        let err = register(&st, register_req("new@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn login_checks_password_before_flags() {
        let st = AppState::fake();
        let u = testing::user(&st, "u@example.com").await;
        st.store.set_ban(u.id, Some("spam")).await.unwrap();

        let err = login(&st, login_req("u@example.com", "wrong-password")).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));

        let err = login(&st, login_req("u@example.com", testing::PASSWORD)).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::Banned)));

        let err = login(&st, login_req("ghost@example.com", testing::PASSWORD)).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_sets_last_login() {
        let st = AppState::fake();
        let u = testing::user(&st, "u@example.com").await;
        assert!(u.last_login.is_none());
        let (user, _) = login(&st, login_req("u@example.com", testing::PASSWORD)).await.unwrap();
        assert!(user.last_login.is_some());
        let stored = st.store.find_user(u.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn refresh_requires_refresh_token() {
        let st = AppState::fake();
        let u = testing::user(&st, "u@example.com").await;
        let pair = JwtKeys::from_ref(&st).sign_pair(u.id).unwrap();

        let (user, _) = refresh(&st, &pair.refresh).await.unwrap();
        assert_eq!(user.id, u.id);
        let err = refresh(&st, &pair.access).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let st = AppState::fake();
        let u = testing::user(&st, "u@example.com").await;

        let err = request_password_reset(&st, "ghost@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref f) if f.contains_key("email")));

        let token = request_password_reset(&st, "u@example.com").await.unwrap();
        let req = || ResetPasswordRequest {
            token: token.clone(),
            new_password: "brand-new-pass".into(),
            new_password_confirm: "brand-new-pass".into(),
        };
        reset_password(&st, req()).await.unwrap();
        login(&st, login_req("u@example.com", "brand-new-pass")).await.unwrap();

        let err = reset_password(&st, req()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref f) if f.contains_key("token")));
        let stored = st.store.find_user(u.id).await.unwrap().unwrap();
        assert!(verify_password("brand-new-pass", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn access_token_cannot_reset_password() {
        let st = AppState::fake();
        let u = testing::user(&st, "u@example.com").await;
        let access = JwtKeys::from_ref(&st).sign_access(u.id).unwrap();
        let err = reset_password(
            &st,
            ResetPasswordRequest {
                token: access,
                new_password: "brand-new-pass".into(),
                new_password_confirm: "brand-new-pass".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn bootstrap_admin_creates_or_promotes() {
        let st = AppState::fake();
        let cfg = BootstrapAdmin {
            email: "Root@Example.com".into(),
            password: "admin-password".into(),
        };
        let admin = bootstrap_admin(&st, &cfg).await.unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.email, "root@example.com");
        // Second run finds the same account.
        let again = bootstrap_admin(&st, &cfg).await.unwrap();
        assert_eq!(again.id, admin.id);

        let plain = testing::user(&st, "plain@example.com").await;
        bootstrap_admin(
            &st,
            &BootstrapAdmin {
                email: "plain@example.com".into(),
                password: "ignored-password".into(),
            },
        )
        .await
        .unwrap();
        assert!(st.store.find_user(plain.id).await.unwrap().unwrap().is_admin);
    }
}
