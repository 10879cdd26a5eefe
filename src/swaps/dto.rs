use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::repo_types::{SwapRequest, SwapStatus};
use crate::{
    skills::{dto::SkillView, repo_types::Skill},
    users::{dto::ProfileView, repo_types::User},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSwapRequest {
    pub receiver_id: Uuid,
    pub offered_skill_id: Uuid,
    pub requested_skill_id: Uuid,
    #[validate(length(max = 2000, message = "message is too long"))]
    pub message: Option<String>,
}

/// `?status=` on the sent/received listings.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StatusQuery {
    pub status: Option<SwapStatus>,
}

/// Admin listing filters, alongside the page parameters.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminSwapQuery {
    pub status: Option<SwapStatus>,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
}

/// A swap request with both participants and both skills resolved.
#[derive(Debug, Serialize)]
pub struct SwapView {
    pub id: Uuid,
    pub sender: ProfileView,
    pub receiver: ProfileView,
    pub offered_skill: SkillView,
    pub requested_skill: SkillView,
    pub message: Option<String>,
    pub status: SwapStatus,
    pub sender_confirmed: bool,
    pub receiver_confirmed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SwapView {
    pub fn new(
        swap: SwapRequest,
        sender: &User,
        receiver: &User,
        offered_skill: Skill,
        requested_skill: Skill,
    ) -> Self {
        Self {
            id: swap.id,
            sender: sender.into(),
            receiver: receiver.into(),
            offered_skill: offered_skill.into(),
            requested_skill: requested_skill.into(),
            message: swap.message,
            status: swap.status,
            sender_confirmed: swap.sender_confirmed,
            receiver_confirmed: swap.receiver_confirmed,
            created_at: swap.created_at,
            updated_at: swap.updated_at,
        }
    }
}
