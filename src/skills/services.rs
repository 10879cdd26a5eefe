use anyhow::Context;
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::CreateSkillRequest,
    repo::SkillRepo,
    repo_types::{NewSkill, ProofFileType, Skill, SkillPatch, SkillType, StoredProof, Verification},
};
use crate::{error::AppError, state::AppState, swaps::repo::SwapRepo, users::repo_types::User};

pub const MAX_PROOF_BYTES: usize = 10 * 1024 * 1024;

/// Uploaded proof file as read from the multipart body.
pub struct ProofUpload {
    pub body: Bytes,
    pub content_type: String,
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Loads a skill owned by `owner`. Someone else's skill is reported as
/// missing.
async fn owned_skill(st: &AppState, owner: &User, skill_id: Uuid) -> Result<Skill, AppError> {
    match st.store.find_skill(skill_id).await? {
        Some(skill) if skill.user_id == owner.id => Ok(skill),
        _ => Err(AppError::not_found("skill")),
    }
}

/// Best-effort removal of an uploaded object; failures are only logged.
pub(crate) async fn purge_object(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %format!("{e:#}"), key = %key, "failed to delete stored object");
    }
}

#[instrument(skip(st, owner, req), fields(user_id = %owner.id))]
pub async fn create(st: &AppState, owner: &User, req: CreateSkillRequest) -> Result<Skill, AppError> {
    let skill = st
        .store
        .insert_skill(NewSkill {
            user_id: owner.id,
            name: req.name.trim().to_string(),
            skill_type: req.skill_type,
            description: req.description,
            proof_file_url: req.proof_file_url,
            proof_file_type: req.proof_file_type,
            proof_description: req.proof_description,
        })
        .await?;
    info!(skill_id = %skill.id, name = %skill.name, "skill created");
    Ok(skill)
}

#[instrument(skip(st, owner, patch), fields(user_id = %owner.id))]
pub async fn update(st: &AppState, owner: &User, skill_id: Uuid, patch: SkillPatch) -> Result<Skill, AppError> {
    let current = owned_skill(st, owner, skill_id).await?;
    if current.is_offered()
        && patch.skill_type == Some(SkillType::Wanted)
        && st.store.skill_in_open_swap(skill_id).await?
    {
        warn!(%skill_id, "type change refused while swaps are open");
        return Err(AppError::field(
            "type",
            "skill is part of a pending or accepted swap request and must stay 'Offered'",
        ));
    }
    let skill = st
        .store
        .update_skill(skill_id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("skill"))?;
    info!(skill_id = %skill.id, "skill updated");
    Ok(skill)
}

/// Deletes a skill with its swaps and their feedback. Owners may delete
/// their own skills, admins any.
#[instrument(skip(st, actor), fields(actor = %actor.id))]
pub async fn delete(st: &AppState, actor: &User, skill_id: Uuid) -> Result<(), AppError> {
    if !actor.is_admin {
        owned_skill(st, actor, skill_id).await?;
    }
    let skill = st
        .store
        .delete_skill_cascade(skill_id)
        .await?
        .ok_or_else(|| AppError::not_found("skill"))?;
    if let Some(key) = skill.proof_file_key.as_deref() {
        purge_object(st, key).await;
    }
    info!(%skill_id, "skill deleted");
    Ok(())
}

/// Stores an image proof and points the skill at it.
#[instrument(skip(st, owner, upload), fields(user_id = %owner.id, size = upload.body.len()))]
pub async fn upload_proof(
    st: &AppState,
    owner: &User,
    skill_id: Uuid,
    upload: ProofUpload,
) -> Result<String, AppError> {
    let skill = owned_skill(st, owner, skill_id).await?;

    if upload.body.is_empty() {
        return Err(AppError::field("file", "the submitted file is empty"));
    }
    if upload.body.len() > MAX_PROOF_BYTES {
        return Err(AppError::field("file", "file must be at most 10 MiB"));
    }
    if !upload.content_type.starts_with("image/") {
        warn!(content_type = %upload.content_type, "non-image proof rejected");
        return Err(AppError::field("file", "only image uploads are supported"));
    }

    let ext = ext_from_mime(&upload.content_type).unwrap_or("bin");
    let key = format!("skills/{}/{}/{}.{}", owner.id, skill.id, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, upload.body, &upload.content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;

    let url = st.storage.public_url(&key);
    let stored = StoredProof {
        url: url.clone(),
        file_type: ProofFileType::Image,
        key: key.clone(),
    };
    if st.store.set_proof(skill.id, stored).await?.is_none() {
        // Deleted while uploading.
        purge_object(st, &key).await;
        return Err(AppError::not_found("skill"));
    }
    if let Some(old) = skill.proof_file_key.as_deref() {
        purge_object(st, old).await;
    }

    info!(skill_id = %skill.id, key = %key, "proof uploaded");
    Ok(url)
}

/// Peer verification by any user other than the owner.
#[instrument(skip(st, actor), fields(actor = %actor.id))]
pub async fn mark_verified(st: &AppState, actor: &User, skill_id: Uuid) -> Result<Skill, AppError> {
    let skill = st
        .store
        .find_skill(skill_id)
        .await?
        .ok_or_else(|| AppError::not_found("skill"))?;
    if skill.user_id == actor.id {
        warn!(%skill_id, "self verification refused");
        return Err(AppError::Forbidden("you cannot verify your own skill".into()));
    }
    let skill = match st
        .store
        .record_verification(skill_id, actor.id, st.config.verification_threshold)
        .await?
    {
        Verification::Recorded(skill) => skill,
        Verification::Repeated => {
            warn!(%skill_id, "repeat verification refused");
            return Err(AppError::Conflict("you have already verified this skill".into()));
        }
        Verification::Missing => return Err(AppError::not_found("skill")),
    };
    info!(
        %skill_id,
        count = skill.verification_count,
        verified = skill.is_verified,
        "skill verification recorded"
    );
    Ok(skill)
}

/// Admin edit; only the description is writable.
#[instrument(skip(st))]
pub async fn admin_update(st: &AppState, skill_id: Uuid, description: Option<String>) -> Result<Skill, AppError> {
    let patch = SkillPatch {
        description,
        ..SkillPatch::default()
    };
    st.store
        .update_skill(skill_id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("skill"))
}
