use tracing::{debug, instrument};

use super::{
    dto::{DashboardSummary, PlatformStats},
    repo::DiscoveryRepo,
    repo_types::PublicUserFilter,
};
use crate::{
    error::AppError,
    feedback::{
        repo::FeedbackRepo,
        services::{average_rating, round2},
    },
    pagination::{Page, PageRequest},
    skills::{dto::SkillView, repo::SkillRepo, repo_types::SkillScope},
    state::AppState,
    swaps::{repo::SwapRepo, repo_types::SwapStatus},
    users::{dto::PublicProfileView, repo_types::User},
};

const TOP_SKILLS: i64 = 10;

/// Public card of `user`: verified Offered skills and average rating.
pub async fn public_view(st: &AppState, user: &User) -> Result<PublicProfileView, AppError> {
    let skills = st
        .store
        .list_user_skills(user.id, SkillScope::VerifiedOffered)
        .await?
        .into_iter()
        .map(SkillView::from)
        .collect();
    let rating = average_rating(st, user.id).await?;
    Ok(PublicProfileView::new(user, skills, rating))
}

#[instrument(skip(st))]
pub async fn list_public_users(
    st: &AppState,
    filter: &PublicUserFilter,
    page: &PageRequest,
) -> Result<Page<PublicProfileView>, AppError> {
    let (users, total) = st.store.list_public_users(filter, page).await?;
    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        results.push(public_view(st, user).await?);
    }
    debug!(total, returned = results.len(), "public users listed");
    Ok(Page::new(results, total, page))
}

/// Same as the listing, with a mandatory skill query.
pub async fn search_users(
    st: &AppState,
    q: Option<&str>,
    filter: PublicUserFilter,
    page: &PageRequest,
) -> Result<Page<PublicProfileView>, AppError> {
    let q = q.map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(AppError::field("q", "search query required"));
    }
    let filter = PublicUserFilter {
        query: Some(q.to_string()),
        ..filter
    };
    list_public_users(st, &filter, page).await
}

pub async fn dashboard_summary(st: &AppState, user: &User) -> Result<DashboardSummary, AppError> {
    Ok(DashboardSummary {
        credits: user.credits,
        average_rating: average_rating(st, user.id).await?,
        completed_swaps: st.store.count_swaps(Some(user.id), Some(SwapStatus::Completed)).await?,
        pending_requests: st.store.count_swaps(Some(user.id), Some(SwapStatus::Pending)).await?,
    })
}

#[instrument(skip(st))]
pub async fn platform_statistics(st: &AppState) -> Result<PlatformStats, AppError> {
    let users = st.store.user_counts().await?;
    let ratings = st.store.rating_summary(None).await?;
    Ok(PlatformStats {
        total_users: users.total,
        active_users: users.active,
        total_swaps: st.store.count_swaps(None, None).await?,
        completed_swaps: st.store.count_swaps(None, Some(SwapStatus::Completed)).await?,
        skill_popularity: st.store.top_offered_skills(TOP_SKILLS).await?,
        total_feedback: ratings.count,
        average_rating: round2(ratings.average.unwrap_or(0.0)),
    })
}
