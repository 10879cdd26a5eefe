use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::repo_types::{ProofFileType, Skill, SkillPatch, SkillType};

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("this field may not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    pub description: Option<String>,
    pub is_verified: bool,
    pub verification_count: i32,
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Skill> for SkillView {
    fn from(s: Skill) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            name: s.name,
            skill_type: s.skill_type,
            description: s.description,
            is_verified: s.is_verified,
            verification_count: s.verification_count,
            proof_file_url: s.proof_file_url,
            proof_file_type: s.proof_file_type,
            proof_description: s.proof_description,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSkillRequest {
    #[validate(
        length(max = 255, message = "name is too long"),
        custom(function = "not_blank")
    )]
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    pub description: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
}

/// Partial owner update; absent fields are kept.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSkillRequest {
    #[validate(
        length(max = 255, message = "name is too long"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub skill_type: Option<SkillType>,
    pub description: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
}

impl From<UpdateSkillRequest> for SkillPatch {
    fn from(r: UpdateSkillRequest) -> Self {
        Self {
            name: r.name.map(|n| n.trim().to_string()),
            skill_type: r.skill_type,
            description: r.description,
            proof_file_url: r.proof_file_url,
            proof_file_type: r.proof_file_type,
            proof_description: r.proof_description,
        }
    }
}

/// Admins may only touch the description.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminSkillUpdate {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProofUploaded {
    pub file_url: String,
}
