use std::collections::HashMap;

use anyhow::anyhow;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AdminSwapQuery, CreateSwapRequest, SwapView},
    lifecycle::{self, Actor, SwapAction},
    repo::SwapRepo,
    repo_types::{NewSwap, SwapFilter, SwapRequest, SwapStatus},
};
use crate::{
    error::AppError,
    pagination::{Page, PageRequest},
    skills::{
        repo::SkillRepo,
        repo_types::{Skill, SkillType},
    },
    state::AppState,
    users::{repo::UserRepo, repo_types::User},
};

/// Guarded writes re-plan this many times before giving up.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Validates ownership and skill types, then inserts a Pending request.
#[instrument(skip(st, sender, req), fields(sender = %sender.id, receiver = %req.receiver_id))]
pub async fn create(st: &AppState, sender: &User, req: CreateSwapRequest) -> Result<SwapRequest, AppError> {
    if req.receiver_id == sender.id {
        return Err(AppError::field("receiver_id", "cannot send a swap request to yourself"));
    }
    let receiver = st
        .store
        .find_user(req.receiver_id)
        .await?
        .ok_or_else(|| AppError::field("receiver_id", "receiver not found"))?;

    match st.store.find_skill(req.offered_skill_id).await? {
        Some(skill) if skill.user_id == sender.id => {
            if skill.skill_type != SkillType::Offered {
                return Err(AppError::field(
                    "offered_skill_id",
                    "offered skill must be of type 'Offered'",
                ));
            }
        }
        _ => {
            return Err(AppError::field(
                "offered_skill_id",
                "offered skill not found or doesn't belong to you",
            ))
        }
    }
    match st.store.find_skill(req.requested_skill_id).await? {
        Some(skill) if skill.user_id == receiver.id => {
            if skill.skill_type != SkillType::Offered {
                return Err(AppError::field(
                    "requested_skill_id",
                    "requested skill must be of type 'Offered'",
                ));
            }
        }
        _ => {
            return Err(AppError::field(
                "requested_skill_id",
                "requested skill not found or doesn't belong to receiver",
            ))
        }
    }

    let swap = st
        .store
        .insert_swap(NewSwap {
            sender_id: sender.id,
            receiver_id: receiver.id,
            offered_skill_id: req.offered_skill_id,
            requested_skill_id: req.requested_skill_id,
            message: req.message,
        })
        .await?;
    info!(swap_id = %swap.id, "swap request created");
    Ok(swap)
}

/// Applies `action` with a compare-and-set against the state the plan was
/// made from. A lost race re-reads the row and plans again.
#[instrument(skip(st, action), fields(action = action.as_str()))]
pub async fn transition(
    st: &AppState,
    swap_id: Uuid,
    actor: Actor,
    action: SwapAction,
) -> Result<SwapRequest, AppError> {
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let swap = st
            .store
            .find_swap(swap_id)
            .await?
            .ok_or_else(|| AppError::not_found("swap request"))?;

        let next = lifecycle::plan(&swap, actor, action).map_err(|e| {
            debug!(status = ?swap.status, reason = %e, "transition refused");
            AppError::from(e)
        })?;

        if let Some(updated) = st.store.compare_and_set_swap(swap.id, swap.state(), next).await? {
            info!(from = ?swap.status, to = ?updated.status, "swap request updated");
            return Ok(updated);
        }
        debug!(attempt, "swap request changed concurrently; re-planning");
    }

    warn!("giving up after repeated concurrent updates");
    Err(AppError::InvalidTransition(
        "swap request changed concurrently; retry".into(),
    ))
}

async fn cached_user(st: &AppState, cache: &mut HashMap<Uuid, User>, id: Uuid) -> Result<User, AppError> {
    if let Some(user) = cache.get(&id) {
        return Ok(user.clone());
    }
    let user = st
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| anyhow!("swap participant {id} is missing"))?;
    cache.insert(id, user.clone());
    Ok(user)
}

async fn cached_skill(st: &AppState, cache: &mut HashMap<Uuid, Skill>, id: Uuid) -> Result<Skill, AppError> {
    if let Some(skill) = cache.get(&id) {
        return Ok(skill.clone());
    }
    let skill = st
        .store
        .find_skill(id)
        .await?
        .ok_or_else(|| anyhow!("swap skill {id} is missing"))?;
    cache.insert(id, skill.clone());
    Ok(skill)
}

/// Resolves participants and skills, loading each row once.
pub async fn hydrate(st: &AppState, swaps: Vec<SwapRequest>) -> Result<Vec<SwapView>, AppError> {
    let mut users = HashMap::new();
    let mut skills = HashMap::new();
    let mut views = Vec::with_capacity(swaps.len());
    for swap in swaps {
        let sender = cached_user(st, &mut users, swap.sender_id).await?;
        let receiver = cached_user(st, &mut users, swap.receiver_id).await?;
        let offered = cached_skill(st, &mut skills, swap.offered_skill_id).await?;
        let requested = cached_skill(st, &mut skills, swap.requested_skill_id).await?;
        views.push(SwapView::new(swap, &sender, &receiver, offered, requested));
    }
    Ok(views)
}

pub async fn view(st: &AppState, swap: SwapRequest) -> Result<SwapView, AppError> {
    let mut views = hydrate(st, vec![swap]).await?;
    views.pop().ok_or_else(|| anyhow!("hydrate dropped a swap").into())
}

async fn page_of(st: &AppState, filter: SwapFilter, page: &PageRequest) -> Result<Page<SwapView>, AppError> {
    let (rows, total) = st.store.list_swaps(&filter, page).await?;
    Ok(Page::new(hydrate(st, rows).await?, total, page))
}

pub async fn sent(
    st: &AppState,
    user_id: Uuid,
    status: Option<SwapStatus>,
    page: &PageRequest,
) -> Result<Page<SwapView>, AppError> {
    let filter = SwapFilter {
        sender_id: Some(user_id),
        status,
        ..SwapFilter::default()
    };
    page_of(st, filter, page).await
}

pub async fn received(
    st: &AppState,
    user_id: Uuid,
    status: Option<SwapStatus>,
    page: &PageRequest,
) -> Result<Page<SwapView>, AppError> {
    let filter = SwapFilter {
        receiver_id: Some(user_id),
        status,
        ..SwapFilter::default()
    };
    page_of(st, filter, page).await
}

/// Completed swaps on either side.
pub async fn completed(st: &AppState, user_id: Uuid, page: &PageRequest) -> Result<Page<SwapView>, AppError> {
    let filter = SwapFilter {
        participant: Some(user_id),
        status: Some(SwapStatus::Completed),
        ..SwapFilter::default()
    };
    page_of(st, filter, page).await
}

pub async fn list_all(st: &AppState, query: AdminSwapQuery, page: &PageRequest) -> Result<Page<SwapView>, AppError> {
    let filter = SwapFilter {
        sender_id: query.sender_id,
        receiver_id: query.receiver_id,
        participant: None,
        status: query.status,
    };
    page_of(st, filter, page).await
}
