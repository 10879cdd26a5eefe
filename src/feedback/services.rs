use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::SubmitFeedbackRequest,
    repo::FeedbackRepo,
    repo_types::{Feedback, FeedbackFilter, NewFeedback},
};
use crate::{
    error::AppError,
    pagination::{Page, PageRequest},
    state::AppState,
    swaps::{repo::SwapRepo, repo_types::SwapStatus},
    users::repo_types::User,
};

/// Rounds to two decimals, the precision ratings are reported with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean rating received by `user_id`; 0 when there is none.
pub async fn average_rating(st: &AppState, user_id: Uuid) -> Result<f64, AppError> {
    let summary = st.store.rating_summary(Some(user_id)).await?;
    Ok(round2(summary.average.unwrap_or(0.0)))
}

/// Records the rater's feedback on a completed swap. The counterpart is
/// the rated user. Rating bounds are enforced by the request validator.
#[instrument(skip(st, rater, req), fields(rater = %rater.id, swap_id = %req.swap_request_id))]
pub async fn submit(st: &AppState, rater: &User, req: SubmitFeedbackRequest) -> Result<Feedback, AppError> {
    let swap = st
        .store
        .find_swap(req.swap_request_id)
        .await?
        .ok_or_else(|| AppError::not_found("swap request"))?;

    let Some(rated_user_id) = swap.counterpart(rater.id) else {
        warn!("feedback from a non-participant");
        return Err(AppError::Forbidden(
            "you can only provide feedback for swaps you're involved in".into(),
        ));
    };
    if swap.status != SwapStatus::Completed {
        return Err(AppError::InvalidTransition(
            "can only provide feedback for completed swaps".into(),
        ));
    }

    let feedback = st
        .store
        .insert_feedback(NewFeedback {
            swap_request_id: swap.id,
            rater_id: rater.id,
            rated_user_id,
            rating: req.rating,
            comment: req.comment,
            expectations_matched: req.expectations_matched,
            skill_verified_by_peer: req.skill_verified_by_peer.into(),
        })
        .await?
        .ok_or_else(|| {
            warn!("swap already reviewed");
            AppError::Conflict("already reviewed".into())
        })?;

    info!(feedback_id = %feedback.id, rating = feedback.rating, "feedback recorded");
    Ok(feedback)
}

pub async fn list(st: &AppState, filter: FeedbackFilter, page: &PageRequest) -> Result<Page<Feedback>, AppError> {
    let (rows, total) = st.store.list_feedback(filter, page).await?;
    Ok(Page::new(rows, total, page))
}
