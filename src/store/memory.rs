//! In-process [`Store`](super::Store) used by unit and HTTP tests.
//!
//! Mirrors the SQL semantics of [`PgStore`](super::PgStore): unique email,
//! one feedback per swap, guarded swap updates, explicit cascades and the
//! same listing orders.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    discovery::{
        repo::DiscoveryRepo,
        repo_types::{PublicUserFilter, UserCounts},
    },
    feedback::{
        repo::FeedbackRepo,
        repo_types::{Feedback, FeedbackFilter, NewFeedback, RatingSummary},
    },
    messages::{
        repo::MessageRepo,
        repo_types::{MessagePatch, SystemMessage},
    },
    pagination::PageRequest,
    skills::{
        repo::SkillRepo,
        repo_types::{
            NewSkill, Skill, SkillPatch, SkillPopularity, SkillScope, SkillType, StoredProof, Verification,
        },
    },
    swaps::{
        lifecycle::SwapState,
        repo::SwapRepo,
        repo_types::{NewSwap, SwapFilter, SwapRequest, SwapStatus},
    },
    users::{
        repo::UserRepo,
        repo_types::{CascadeReport, NewUser, ProfilePatch, User, UserFilter},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    skills: Vec<Skill>,
    swaps: Vec<SwapRequest>,
    /// `(skill_id, verifier_id)` pairs.
    verifications: Vec<(Uuid, Uuid)>,
    feedback: Vec<Feedback>,
    messages: Vec<SystemMessage>,
    clock: Option<OffsetDateTime>,
}

impl Tables {
    /// Wall clock that never repeats, so insertion order and `updated_at`
    /// bumps are observable even within one microsecond.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let next = match self.clock {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn skill_mut(&mut self, id: Uuid) -> Option<&mut Skill> {
        self.skills.iter_mut().find(|s| s.id == id)
    }

    fn has_offered_skill(&self, user_id: Uuid, pred: impl Fn(&Skill) -> bool) -> bool {
        self.skills
            .iter()
            .any(|s| s.user_id == user_id && s.skill_type == SkillType::Offered && pred(s))
    }
}

fn ilike(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paged<T: Clone>(rows: Vec<&T>, page: &PageRequest) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    (rows, total)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.lock().await;
        if t.users.iter().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let date_joined = t.tick();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            location: new.location,
            profile_photo_url: new.profile_photo_url,
            is_public: new.is_public,
            availability: new.availability,
            timeslot: new.timeslot,
            socials: new.socials,
            is_active: true,
            is_banned: false,
            banned_reason: None,
            is_admin: new.is_admin,
            credits: 0,
            date_joined,
            last_login: None,
        };
        t.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.lock().await;
        let Some(user) = t.user_mut(id) else {
            return Ok(None);
        };
        if patch.name.is_some() {
            user.name = patch.name;
        }
        if patch.location.is_some() {
            user.location = patch.location;
        }
        if patch.profile_photo_url.is_some() {
            user.profile_photo_url = patch.profile_photo_url;
        }
        if let Some(is_public) = patch.is_public {
            user.is_public = is_public;
        }
        if let Some(availability) = patch.availability {
            user.availability = availability;
        }
        if let Some(timeslot) = patch.timeslot {
            user.timeslot = timeslot;
        }
        user.socials.apply(patch.socials);
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(t.user_mut(id)
            .map(|u| u.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        let now = t.tick();
        if let Some(u) = t.user_mut(id) {
            u.last_login = Some(now);
        }
        Ok(())
    }

    async fn set_ban(&self, id: Uuid, reason: Option<&str>) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.lock().await;
        Ok(t.user_mut(id).map(|u| {
            u.is_banned = reason.is_some();
            u.banned_reason = reason.map(str::to_string);
            u.clone()
        }))
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(t.user_mut(id).map(|u| u.is_admin = is_admin).is_some())
    }

    async fn delete_user_cascade(&self, id: Uuid) -> anyhow::Result<Option<CascadeReport>> {
        let mut t = self.tables.lock().await;
        if !t.users.iter().any(|u| u.id == id) {
            return Ok(None);
        }
        let owned: Vec<Uuid> = t.skills.iter().filter(|s| s.user_id == id).map(|s| s.id).collect();
        let doomed: Vec<Uuid> = t
            .swaps
            .iter()
            .filter(|s| {
                s.involves(id)
                    || owned.contains(&s.offered_skill_id)
                    || owned.contains(&s.requested_skill_id)
            })
            .map(|s| s.id)
            .collect();

        let before = t.feedback.len();
        t.feedback.retain(|f| {
            f.rater_id != id && f.rated_user_id != id && !doomed.contains(&f.swap_request_id)
        });
        let feedback = (before - t.feedback.len()) as u64;

        let before = t.swaps.len();
        t.swaps.retain(|s| !doomed.contains(&s.id));
        let swaps = (before - t.swaps.len()) as u64;

        let proof_keys = t
            .skills
            .iter()
            .filter(|s| s.user_id == id)
            .filter_map(|s| s.proof_file_key.clone())
            .collect();
        t.verifications
            .retain(|(skill_id, verifier_id)| *verifier_id != id && !owned.contains(skill_id));
        t.skills.retain(|s| s.user_id != id);
        t.users.retain(|u| u.id != id);

        Ok(Some(CascadeReport {
            feedback,
            swaps,
            skills: owned.len() as u64,
            proof_keys,
        }))
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<User>, i64)> {
        let t = self.tables.lock().await;
        let mut rows: Vec<&User> = t
            .users
            .iter()
            .filter(|u| filter.search_email.as_deref().map_or(true, |q| ilike(&u.email, q)))
            .filter(|u| filter.is_banned.map_or(true, |b| u.is_banned == b))
            .collect();
        rows.sort_by(|a, b| b.date_joined.cmp(&a.date_joined).then(a.id.cmp(&b.id)));
        Ok(paged(rows, page))
    }
}

#[async_trait]
impl SkillRepo for MemoryStore {
    async fn insert_skill(&self, new: NewSkill) -> anyhow::Result<Skill> {
        let mut t = self.tables.lock().await;
        let created_at = t.tick();
        let skill = Skill {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            skill_type: new.skill_type,
            description: new.description,
            is_verified: false,
            verification_count: 0,
            proof_file_url: new.proof_file_url,
            proof_file_type: new.proof_file_type,
            proof_description: new.proof_description,
            proof_file_key: None,
            created_at,
        };
        t.skills.push(skill.clone());
        Ok(skill)
    }

    async fn find_skill(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let t = self.tables.lock().await;
        Ok(t.skills.iter().find(|s| s.id == id).cloned())
    }

    async fn update_skill(&self, id: Uuid, patch: SkillPatch) -> anyhow::Result<Option<Skill>> {
        let mut t = self.tables.lock().await;
        Ok(t.skill_mut(id).map(|s| {
            if let Some(name) = patch.name {
                s.name = name;
            }
            if let Some(skill_type) = patch.skill_type {
                s.skill_type = skill_type;
            }
            if patch.description.is_some() {
                s.description = patch.description;
            }
            if patch.proof_file_url.is_some() {
                s.proof_file_url = patch.proof_file_url;
            }
            if patch.proof_file_type.is_some() {
                s.proof_file_type = patch.proof_file_type;
            }
            if patch.proof_description.is_some() {
                s.proof_description = patch.proof_description;
            }
            s.clone()
        }))
    }

    async fn set_proof(&self, id: Uuid, proof: StoredProof) -> anyhow::Result<Option<Skill>> {
        let mut t = self.tables.lock().await;
        Ok(t.skill_mut(id).map(|s| {
            s.proof_file_url = Some(proof.url);
            s.proof_file_type = Some(proof.file_type);
            s.proof_file_key = Some(proof.key);
            s.clone()
        }))
    }

    async fn record_verification(&self, id: Uuid, verifier_id: Uuid, threshold: i32) -> anyhow::Result<Verification> {
        let mut t = self.tables.lock().await;
        if !t.skills.iter().any(|s| s.id == id) {
            return Ok(Verification::Missing);
        }
        if t.verifications.contains(&(id, verifier_id)) {
            return Ok(Verification::Repeated);
        }
        t.verifications.push((id, verifier_id));
        let Some(skill) = t.skill_mut(id) else {
            return Ok(Verification::Missing);
        };
        skill.verification_count += 1;
        skill.is_verified = skill.is_verified || skill.verification_count >= threshold;
        Ok(Verification::Recorded(skill.clone()))
    }

    async fn delete_skill_cascade(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let mut t = self.tables.lock().await;
        let doomed: Vec<Uuid> = t
            .swaps
            .iter()
            .filter(|s| s.offered_skill_id == id || s.requested_skill_id == id)
            .map(|s| s.id)
            .collect();
        t.feedback.retain(|f| !doomed.contains(&f.swap_request_id));
        t.swaps.retain(|s| !doomed.contains(&s.id));
        t.verifications.retain(|(skill_id, _)| *skill_id != id);
        let Some(pos) = t.skills.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        Ok(Some(t.skills.remove(pos)))
    }

    async fn list_user_skills(&self, user_id: Uuid, scope: SkillScope) -> anyhow::Result<Vec<Skill>> {
        let t = self.tables.lock().await;
        Ok(t.skills
            .iter()
            .filter(|s| s.user_id == user_id && scope.matches(s))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SwapRepo for MemoryStore {
    async fn insert_swap(&self, new: NewSwap) -> anyhow::Result<SwapRequest> {
        let mut t = self.tables.lock().await;
        let now = t.tick();
        let swap = SwapRequest {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            offered_skill_id: new.offered_skill_id,
            requested_skill_id: new.requested_skill_id,
            message: new.message,
            status: SwapStatus::Pending,
            sender_confirmed: false,
            receiver_confirmed: false,
            created_at: now,
            updated_at: now,
        };
        t.swaps.push(swap.clone());
        Ok(swap)
    }

    async fn find_swap(&self, id: Uuid) -> anyhow::Result<Option<SwapRequest>> {
        let t = self.tables.lock().await;
        Ok(t.swaps.iter().find(|s| s.id == id).cloned())
    }

    async fn compare_and_set_swap(
        &self,
        id: Uuid,
        expected: SwapState,
        next: SwapState,
    ) -> anyhow::Result<Option<SwapRequest>> {
        let mut t = self.tables.lock().await;
        let now = t.tick();
        let Some(swap) = t.swaps.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if swap.state() != expected {
            return Ok(None);
        }
        swap.status = next.status;
        swap.sender_confirmed = next.sender_confirmed;
        swap.receiver_confirmed = next.receiver_confirmed;
        swap.updated_at = now.max(swap.updated_at + Duration::microseconds(1));
        Ok(Some(swap.clone()))
    }

    async fn list_swaps(
        &self,
        filter: &SwapFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<SwapRequest>, i64)> {
        let t = self.tables.lock().await;
        let mut rows: Vec<&SwapRequest> = t.swaps.iter().filter(|s| filter.matches(s)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paged(rows, page))
    }

    async fn count_swaps(&self, participant: Option<Uuid>, status: Option<SwapStatus>) -> anyhow::Result<i64> {
        let filter = SwapFilter {
            participant,
            status,
            ..SwapFilter::default()
        };
        let t = self.tables.lock().await;
        Ok(t.swaps.iter().filter(|s| filter.matches(s)).count() as i64)
    }

    async fn skill_in_open_swap(&self, skill_id: Uuid) -> anyhow::Result<bool> {
        let t = self.tables.lock().await;
        Ok(t.swaps.iter().any(|s| {
            !s.status.is_terminal()
                && (s.offered_skill_id == skill_id || s.requested_skill_id == skill_id)
        }))
    }
}

#[async_trait]
impl FeedbackRepo for MemoryStore {
    async fn insert_feedback(&self, new: NewFeedback) -> anyhow::Result<Option<Feedback>> {
        let mut t = self.tables.lock().await;
        if t.feedback.iter().any(|f| f.swap_request_id == new.swap_request_id) {
            return Ok(None);
        }
        let created_at = t.tick();
        let feedback = Feedback {
            id: Uuid::new_v4(),
            swap_request_id: new.swap_request_id,
            rater_id: new.rater_id,
            rated_user_id: new.rated_user_id,
            rating: new.rating,
            comment: new.comment,
            expectations_matched: new.expectations_matched,
            skill_verified_by_peer: new.skill_verified_by_peer,
            created_at,
        };
        t.feedback.push(feedback.clone());
        Ok(Some(feedback))
    }

    async fn rating_summary(&self, rated_user: Option<Uuid>) -> anyhow::Result<RatingSummary> {
        let t = self.tables.lock().await;
        let ratings: Vec<i32> = t
            .feedback
            .iter()
            .filter(|f| rated_user.map_or(true, |id| f.rated_user_id == id))
            .map(|f| f.rating)
            .collect();
        let count = ratings.len() as i64;
        let average = (count > 0).then(|| ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / count as f64);
        Ok(RatingSummary { count, average })
    }

    async fn list_feedback(
        &self,
        filter: FeedbackFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Feedback>, i64)> {
        let t = self.tables.lock().await;
        let mut rows: Vec<&Feedback> = t.feedback.iter().filter(|f| filter.matches(f)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paged(rows, page))
    }
}

#[async_trait]
impl MessageRepo for MemoryStore {
    async fn insert_message(&self, title: &str, content: &str, is_active: bool) -> anyhow::Result<SystemMessage> {
        let mut t = self.tables.lock().await;
        let created_at = t.tick();
        let message = SystemMessage {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            is_active,
            created_at,
        };
        t.messages.push(message.clone());
        Ok(message)
    }

    async fn update_message(&self, id: Uuid, patch: MessagePatch) -> anyhow::Result<Option<SystemMessage>> {
        let mut t = self.tables.lock().await;
        Ok(t.messages.iter_mut().find(|m| m.id == id).map(|m| {
            if let Some(title) = patch.title {
                m.title = title;
            }
            if let Some(content) = patch.content {
                m.content = content;
            }
            if let Some(is_active) = patch.is_active {
                m.is_active = is_active;
            }
            m.clone()
        }))
    }

    async fn delete_message(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let before = t.messages.len();
        t.messages.retain(|m| m.id != id);
        Ok(t.messages.len() < before)
    }

    async fn list_messages(&self, active_only: bool) -> anyhow::Result<Vec<SystemMessage>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<SystemMessage> = t
            .messages
            .iter()
            .filter(|m| !active_only || m.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl DiscoveryRepo for MemoryStore {
    async fn list_public_users(
        &self,
        filter: &PublicUserFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<User>, i64)> {
        let t = self.tables.lock().await;
        let mut rows: Vec<&User> = t
            .users
            .iter()
            .filter(|u| u.is_listed() && filter.matches_tags(u))
            .filter(|u| {
                [filter.search_skill.as_deref(), filter.query.as_deref()]
                    .into_iter()
                    .flatten()
                    .all(|needle| t.has_offered_skill(u.id, |s| ilike(&s.name, needle)))
            })
            .filter(|u| !filter.verified_only || t.has_offered_skill(u.id, |s| s.is_verified))
            .collect();
        rows.sort_by(|a, b| a.date_joined.cmp(&b.date_joined).then(a.id.cmp(&b.id)));
        Ok(paged(rows, page))
    }

    async fn top_offered_skills(&self, limit: i64) -> anyhow::Result<Vec<SkillPopularity>> {
        let t = self.tables.lock().await;
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for s in t.skills.iter().filter(|s| s.is_offered()) {
            *counts.entry(s.name.as_str()).or_default() += 1;
        }
        let mut rows: Vec<SkillPopularity> = counts
            .into_iter()
            .map(|(name, count)| SkillPopularity {
                name: name.to_string(),
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn user_counts(&self) -> anyhow::Result<UserCounts> {
        let t = self.tables.lock().await;
        Ok(UserCounts {
            total: t.users.len() as i64,
            active: t.users.iter().filter(|u| u.is_active).count() as i64,
        })
    }
}
