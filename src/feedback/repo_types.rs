use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Whether the rater vouches for the counterpart's skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "peer_verification")]
#[serde(rename_all = "snake_case")]
pub enum PeerVerification {
    Confirmed,
    Disputed,
    #[default]
    NotAssessed,
}

impl From<Option<bool>> for PeerVerification {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => PeerVerification::Confirmed,
            Some(false) => PeerVerification::Disputed,
            None => PeerVerification::NotAssessed,
        }
    }
}

/// Feedback record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub swap_request_id: Uuid,
    pub rater_id: Uuid,
    pub rated_user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub expectations_matched: bool,
    pub skill_verified_by_peer: PeerVerification,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub swap_request_id: Uuid,
    pub rater_id: Uuid,
    pub rated_user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub expectations_matched: bool,
    pub skill_verified_by_peer: PeerVerification,
}

/// Count and mean of ratings. `average` is `None` when `count == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow)]
pub struct RatingSummary {
    pub count: i64,
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub enum FeedbackFilter {
    ReceivedBy(Uuid),
    GivenBy(Uuid),
}

impl FeedbackFilter {
    pub fn matches(&self, feedback: &Feedback) -> bool {
        match *self {
            FeedbackFilter::ReceivedBy(id) => feedback.rated_user_id == id,
            FeedbackFilter::GivenBy(id) => feedback.rater_id == id,
        }
    }
}
