use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_type")]
pub enum SkillType {
    Offered,
    Wanted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proof_file_type")]
pub enum ProofFileType {
    Link,
    Image,
}

/// Skill record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub skill_type: SkillType,
    pub description: Option<String>,
    pub is_verified: bool,
    pub verification_count: i32,
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
    pub proof_file_key: Option<String>, // set only for uploaded proofs
    pub created_at: OffsetDateTime,
}

impl Skill {
    pub fn is_offered(&self) -> bool {
        self.skill_type == SkillType::Offered
    }

    pub fn has_proof(&self) -> bool {
        self.proof_file_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct NewSkill {
    pub user_id: Uuid,
    pub name: String,
    pub skill_type: SkillType,
    pub description: Option<String>,
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub skill_type: Option<SkillType>,
    pub description: Option<String>,
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
}

/// Uploaded proof attached to a skill.
#[derive(Debug, Clone)]
pub struct StoredProof {
    pub url: String,
    pub file_type: ProofFileType,
    pub key: String,
}

/// Result of a peer verification attempt.
#[derive(Debug, Clone)]
pub enum Verification {
    Recorded(Skill),
    /// This verifier already vouched for the skill; nothing changed.
    Repeated,
    Missing,
}

/// Which of a user's skills to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillScope {
    All,
    Verified,
    VerifiedOffered,
    WithProof,
}

impl SkillScope {
    pub fn matches(self, skill: &Skill) -> bool {
        match self {
            SkillScope::All => true,
            SkillScope::Verified => skill.is_verified,
            SkillScope::VerifiedOffered => skill.is_verified && skill.is_offered(),
            SkillScope::WithProof => skill.has_proof(),
        }
    }
}

/// One row of the popularity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SkillPopularity {
    pub name: String,
    pub count: i64,
}
