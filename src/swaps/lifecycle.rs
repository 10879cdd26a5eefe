//! Swap request state machine.
//!
//! ```text
//! Pending  --accept-->  Accepted  --confirm x2 / force-->  Completed
//!    |                     |
//!    +--reject--> Rejected +--cancel--> Cancelled
//!    +--cancel--> Withdrawn
//! ```
//!
//! Planning is pure: [`plan`] looks at a snapshot and returns the state to
//! write. The caller persists it with a compare-and-set against the snapshot's
//! [`SwapState`].

use uuid::Uuid;

use super::repo_types::{SwapRequest, SwapStatus};
use crate::error::AppError;

/// The mutable part of a swap request; also the CAS guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapState {
    pub status: SwapStatus,
    pub sender_confirmed: bool,
    pub receiver_confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAction {
    Accept,
    Reject,
    Cancel,
    /// One participant confirms the exchange happened.
    ConfirmCompletion,
    /// Admin override that completes an accepted swap.
    ForceComplete,
}

impl SwapAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapAction::Accept => "accept",
            SwapAction::Reject => "reject",
            SwapAction::Cancel => "cancel",
            SwapAction::ConfirmCompletion => "confirm_completion",
            SwapAction::ForceComplete => "force_complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(Uuid),
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    InvalidTransition(&'static str),
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Forbidden(msg) => AppError::Forbidden(msg.into()),
            TransitionError::InvalidTransition(msg) => AppError::InvalidTransition(msg.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Sender,
    Receiver,
}

fn side(swap: &SwapRequest, actor: Actor) -> Option<Side> {
    match actor {
        Actor::User(id) if id == swap.sender_id => Some(Side::Sender),
        Actor::User(id) if id == swap.receiver_id => Some(Side::Receiver),
        _ => None,
    }
}

/// Decides the state `action` by `actor` moves `swap` into.
pub fn plan(swap: &SwapRequest, actor: Actor, action: SwapAction) -> Result<SwapState, TransitionError> {
    let current = swap.state();
    let side = side(swap, actor);

    match action {
        SwapAction::Accept | SwapAction::Reject => {
            if side != Some(Side::Receiver) {
                return Err(TransitionError::Forbidden(
                    "only the receiver can respond to this swap request",
                ));
            }
            if current.status != SwapStatus::Pending {
                return Err(TransitionError::InvalidTransition(if action == SwapAction::Accept {
                    "can only accept pending requests"
                } else {
                    "can only reject pending requests"
                }));
            }
            let status = if action == SwapAction::Accept {
                SwapStatus::Accepted
            } else {
                SwapStatus::Rejected
            };
            Ok(SwapState { status, ..current })
        }
        SwapAction::Cancel => {
            if side != Some(Side::Sender) {
                return Err(TransitionError::Forbidden(
                    "only the sender can cancel this swap request",
                ));
            }
            let status = match current.status {
                SwapStatus::Pending => SwapStatus::Withdrawn,
                SwapStatus::Accepted => SwapStatus::Cancelled,
                _ => {
                    return Err(TransitionError::InvalidTransition(
                        "can only cancel pending or accepted requests",
                    ))
                }
            };
            Ok(SwapState { status, ..current })
        }
        SwapAction::ConfirmCompletion => {
            let Some(side) = side else {
                return Err(TransitionError::Forbidden(
                    "only participants can confirm completion",
                ));
            };
            if current.status != SwapStatus::Accepted {
                return Err(TransitionError::InvalidTransition(
                    "can only complete accepted requests",
                ));
            }
            let mut next = current;
            let already = match side {
                Side::Sender => std::mem::replace(&mut next.sender_confirmed, true),
                Side::Receiver => std::mem::replace(&mut next.receiver_confirmed, true),
            };
            if already {
                return Err(TransitionError::InvalidTransition("completion already confirmed"));
            }
            if next.sender_confirmed && next.receiver_confirmed {
                next.status = SwapStatus::Completed;
            }
            Ok(next)
        }
        SwapAction::ForceComplete => {
            if actor != Actor::Admin {
                return Err(TransitionError::Forbidden("admin permissions required"));
            }
            if current.status != SwapStatus::Accepted {
                return Err(TransitionError::InvalidTransition(
                    "can only complete accepted requests",
                ));
            }
            Ok(SwapState {
                status: SwapStatus::Completed,
                ..current
            })
        }
    }
}
