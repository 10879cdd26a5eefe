use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::repo_types::{Feedback, PeerVerification};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedbackRequest {
    pub swap_request_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 2000, message = "comment is too long"))]
    pub comment: Option<String>,
    #[serde(default)]
    pub expectations_matched: bool,
    /// `true`, `false` or absent.
    pub skill_verified_by_peer: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackView {
    pub id: Uuid,
    pub swap_request_id: Uuid,
    pub rater_id: Uuid,
    pub rated_user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub expectations_matched: bool,
    pub skill_verified_by_peer: PeerVerification,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Feedback> for FeedbackView {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            swap_request_id: f.swap_request_id,
            rater_id: f.rater_id,
            rated_user_id: f.rated_user_id,
            rating: f.rating,
            comment: f.comment,
            expectations_matched: f.expectations_matched,
            skill_verified_by_peer: f.skill_verified_by_peer,
            created_at: f.created_at,
        }
    }
}
