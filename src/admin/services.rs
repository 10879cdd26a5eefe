use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::AppError,
    pagination::{Page, PageRequest},
    skills::services::purge_object,
    state::AppState,
    users::{
        repo::UserRepo,
        repo_types::{User, UserFilter},
    },
};

pub async fn list_users(st: &AppState, filter: &UserFilter, page: &PageRequest) -> Result<Page<User>, AppError> {
    let (rows, total) = st.store.list_users(filter, page).await?;
    Ok(Page::new(rows, total, page))
}

#[instrument(skip(st, reason))]
pub async fn ban(st: &AppState, user_id: Uuid, reason: &str) -> Result<User, AppError> {
    let user = st
        .store
        .set_ban(user_id, Some(reason.trim()))
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    info!("user banned");
    Ok(user)
}

#[instrument(skip(st))]
pub async fn unban(st: &AppState, user_id: Uuid) -> Result<User, AppError> {
    let user = st
        .store
        .set_ban(user_id, None)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    info!("user unbanned");
    Ok(user)
}

/// Removes the user with their skills, swaps and feedback in one
/// transaction, then purges uploaded proofs.
#[instrument(skip(st))]
pub async fn delete_user(st: &AppState, user_id: Uuid) -> Result<(), AppError> {
    let report = st
        .store
        .delete_user_cascade(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    for key in &report.proof_keys {
        purge_object(st, key).await;
    }
    info!(
        feedback = report.feedback,
        swaps = report.swaps,
        skills = report.skills,
        "user deleted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{dto::LoginRequest, services as auth},
        discovery::{repo_types::PublicUserFilter, services as discovery},
        error::AuthError,
        feedback::{repo::FeedbackRepo, repo_types::{NewFeedback, PeerVerification}},
        skills::{repo::SkillRepo, services::ProofUpload},
        swaps::{repo::SwapRepo, repo_types::SwapStatus},
        testing,
    };

    #[tokio::test]
    async fn banned_user_cannot_log_in_and_leaves_listing() {
        let st = AppState::fake();
        let u = testing::user(&st, "u@example.com").await;
        let page = PageRequest::default();
        let listed = discovery::list_public_users(&st, &PublicUserFilter::default(), &page)
            .await
            .unwrap();
        assert_eq!(listed.pagination.total, 1);

        let banned = ban(&st, u.id, "  spam  ").await.unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.banned_reason.as_deref(), Some("spam"));

        let err = auth::login(
            &st,
            LoginRequest {
                email: "u@example.com".into(),
                password: testing::PASSWORD.into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::Banned)));
        let listed = discovery::list_public_users(&st, &PublicUserFilter::default(), &page)
            .await
            .unwrap();
        assert_eq!(listed.pagination.total, 0);

        let restored = unban(&st, u.id).await.unwrap();
        assert!(!restored.is_banned);
        assert!(restored.banned_reason.is_none());
    }

    #[tokio::test]
    async fn list_users_filters() {
        let st = AppState::fake();
        let a = testing::user(&st, "alice@example.com").await;
        testing::user(&st, "bob@example.com").await;
        ban(&st, a.id, "spam").await.unwrap();
        let page = PageRequest::default();

        let by_email = UserFilter {
            search_email: Some("ALI".into()),
            is_banned: None,
        };
        assert_eq!(list_users(&st, &by_email, &page).await.unwrap().pagination.total, 1);
        let not_banned = UserFilter {
            search_email: None,
            is_banned: Some(false),
        };
        let rows = list_users(&st, &not_banned, &page).await.unwrap();
        assert_eq!(rows.results.len(), 1);
        assert_eq!(rows.results[0].email, "bob@example.com");
    }

    #[tokio::test]
    async fn delete_user_cascades_and_purges_proofs() {
        let st = AppState::fake();
        let a = testing::user(&st, "a@example.com").await;
        let b = testing::user(&st, "b@example.com").await;
        let c = testing::user(&st, "c@example.com").await;
        let swap = testing::swap_in(&st, &a, &b, SwapStatus::Completed).await;
        st.store
            .insert_feedback(NewFeedback {
                swap_request_id: swap.id,
                rater_id: b.id,
                rated_user_id: a.id,
                rating: 4,
                comment: None,
                expectations_matched: true,
                skill_verified_by_peer: PeerVerification::Confirmed,
            })
            .await
            .unwrap()
            .unwrap();
        let untouched = testing::swap_in(&st, &b, &c, SwapStatus::Pending).await;
        crate::skills::services::upload_proof(
            &st,
            &a,
            swap.offered_skill_id,
            ProofUpload {
                body: bytes::Bytes::from_static(b"png"),
                content_type: "image/png".into(),
            },
        )
        .await
        .unwrap();

        delete_user(&st, a.id).await.unwrap();
        assert!(st.store.find_user(a.id).await.unwrap().is_none());
        assert!(st.store.find_swap(swap.id).await.unwrap().is_none());
        assert!(st.store.find_skill(swap.offered_skill_id).await.unwrap().is_none());
        assert!(st.store.find_swap(untouched.id).await.unwrap().is_some());
        assert_eq!(st.store.rating_summary(None).await.unwrap().count, 0);

        let err = delete_user(&st, a.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
