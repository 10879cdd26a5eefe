use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::lifecycle::SwapState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swap_status")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
    Withdrawn,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SwapStatus::Pending | SwapStatus::Accepted)
    }
}

/// Swap request record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct SwapRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub offered_skill_id: Uuid,
    pub requested_skill_id: Uuid,
    pub message: Option<String>,
    pub status: SwapStatus,
    pub sender_confirmed: bool,
    pub receiver_confirmed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl SwapRequest {
    pub fn state(&self) -> SwapState {
        SwapState {
            status: self.status,
            sender_confirmed: self.sender_confirmed,
            receiver_confirmed: self.receiver_confirmed,
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The other participant, if `user_id` takes part at all.
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.sender_id {
            Some(self.receiver_id)
        } else if user_id == self.receiver_id {
            Some(self.sender_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSwap {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub offered_skill_id: Uuid,
    pub requested_skill_id: Uuid,
    pub message: Option<String>,
}

/// Conjunctive listing filter. `participant` matches either side.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapFilter {
    pub sender_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
    pub participant: Option<Uuid>,
    pub status: Option<SwapStatus>,
}

impl SwapFilter {
    pub fn matches(&self, swap: &SwapRequest) -> bool {
        self.sender_id.map_or(true, |id| swap.sender_id == id)
            && self.receiver_id.map_or(true, |id| swap.receiver_id == id)
            && self.participant.map_or(true, |id| swap.involves(id))
            && self.status.map_or(true, |s| swap.status == s)
    }
}
