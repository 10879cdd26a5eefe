use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ProfileInput, ProfileView, SkillProofView, UserProfileResponse},
    repo::UserRepo,
    repo_types::User,
};
use crate::{
    discovery::services::public_view,
    error::AppError,
    skills::{dto::SkillView, repo::SkillRepo, repo_types::SkillScope},
    state::AppState,
};

#[instrument(skip(st, user, input), fields(user_id = %user.id))]
pub async fn update_me(st: &AppState, user: &User, input: ProfileInput) -> Result<User, AppError> {
    let updated = st
        .store
        .update_profile(user.id, input.into_patch())
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    info!("profile updated");
    Ok(updated)
}

/// Owners get their full profile. Others only see public profiles.
#[instrument(skip(st, viewer), fields(viewer = %viewer.id))]
pub async fn get_profile(st: &AppState, viewer: &User, id: Uuid) -> Result<UserProfileResponse, AppError> {
    if id == viewer.id {
        return Ok(UserProfileResponse::Own(ProfileView::from(viewer)));
    }
    let user = st
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    if !user.is_public {
        warn!("private profile requested");
        return Err(AppError::Forbidden("profile not accessible".into()));
    }
    Ok(UserProfileResponse::Public(public_view(st, &user).await?))
}

pub async fn verified_skills(st: &AppState, user: &User) -> Result<Vec<SkillView>, AppError> {
    let skills = st.store.list_user_skills(user.id, SkillScope::Verified).await?;
    Ok(skills.into_iter().map(SkillView::from).collect())
}

pub async fn skill_proofs(st: &AppState, user: &User) -> Result<Vec<SkillProofView>, AppError> {
    let skills = st.store.list_user_skills(user.id, SkillScope::WithProof).await?;
    Ok(skills
        .into_iter()
        .map(|s| SkillProofView {
            skill_id: s.id,
            skill_name: s.name,
            proof_file_url: s.proof_file_url,
            proof_file_type: s.proof_file_type,
            proof_description: s.proof_description,
        })
        .collect())
}
