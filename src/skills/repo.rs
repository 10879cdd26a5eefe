use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    skills::repo_types::{NewSkill, Skill, SkillPatch, SkillScope, StoredProof, Verification},
    store::PgStore,
};

#[async_trait]
pub trait SkillRepo: Send + Sync {
    async fn insert_skill(&self, new: NewSkill) -> anyhow::Result<Skill>;
    async fn find_skill(&self, id: Uuid) -> anyhow::Result<Option<Skill>>;
    async fn update_skill(&self, id: Uuid, patch: SkillPatch) -> anyhow::Result<Option<Skill>>;
    async fn set_proof(&self, id: Uuid, proof: StoredProof) -> anyhow::Result<Option<Skill>>;
    /// Records `verifier_id` as vouching for the skill and bumps
    /// `verification_count`, flagging the skill verified once the count
    /// reaches `threshold`. Each verifier counts once.
    async fn record_verification(&self, id: Uuid, verifier_id: Uuid, threshold: i32) -> anyhow::Result<Verification>;
    /// Deletes feedback and swaps referencing the skill, then the skill.
    /// Returns the removed row, `None` when it did not exist.
    async fn delete_skill_cascade(&self, id: Uuid) -> anyhow::Result<Option<Skill>>;
    async fn list_user_skills(&self, user_id: Uuid, scope: SkillScope) -> anyhow::Result<Vec<Skill>>;
}

#[async_trait]
impl SkillRepo for PgStore {
    async fn insert_skill(&self, new: NewSkill) -> anyhow::Result<Skill> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (user_id, name, skill_type, description, proof_file_url,
                                proof_file_type, proof_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .bind(new.skill_type)
        .bind(&new.description)
        .bind(&new.proof_file_url)
        .bind(new.proof_file_type)
        .bind(&new.proof_description)
        .fetch_one(&self.db)
        .await
        .context("insert skill")?;
        Ok(skill)
    }

    async fn find_skill(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(r#"SELECT * FROM skills WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find skill")?;
        Ok(skill)
    }

    async fn update_skill(&self, id: Uuid, patch: SkillPatch) -> anyhow::Result<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills SET
                name = COALESCE($2, name),
                skill_type = COALESCE($3, skill_type),
                description = COALESCE($4, description),
                proof_file_url = COALESCE($5, proof_file_url),
                proof_file_type = COALESCE($6, proof_file_type),
                proof_description = COALESCE($7, proof_description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.skill_type)
        .bind(patch.description)
        .bind(patch.proof_file_url)
        .bind(patch.proof_file_type)
        .bind(patch.proof_description)
        .fetch_optional(&self.db)
        .await
        .context("update skill")?;
        Ok(skill)
    }

    async fn set_proof(&self, id: Uuid, proof: StoredProof) -> anyhow::Result<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills
               SET proof_file_url = $2, proof_file_type = $3, proof_file_key = $4
             WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&proof.url)
        .bind(proof.file_type)
        .bind(&proof.key)
        .fetch_optional(&self.db)
        .await
        .context("set skill proof")?;
        Ok(skill)
    }

    async fn record_verification(&self, id: Uuid, verifier_id: Uuid, threshold: i32) -> anyhow::Result<Verification> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let exists = sqlx::query_scalar::<_, Uuid>(r#"SELECT id FROM skills WHERE id = $1 FOR UPDATE"#)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock skill")?;
        if exists.is_none() {
            return Ok(Verification::Missing);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO skill_verifications (skill_id, verifier_id)
            VALUES ($1, $2)
            ON CONFLICT (skill_id, verifier_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(verifier_id)
        .execute(&mut *tx)
        .await
        .context("insert skill verification")?
        .rows_affected();
        if inserted == 0 {
            return Ok(Verification::Repeated);
        }

        let skill = sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills
               SET verification_count = verification_count + 1,
                   is_verified = is_verified OR verification_count + 1 >= $2
             WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(threshold)
        .fetch_one(&mut *tx)
        .await
        .context("increment verification")?;

        tx.commit().await.context("commit tx")?;
        Ok(Verification::Recorded(skill))
    }

    async fn delete_skill_cascade(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        sqlx::query(
            r#"
            DELETE FROM feedback
             WHERE swap_request_id IN (
                SELECT id FROM swap_requests
                 WHERE offered_skill_id = $1 OR requested_skill_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete skill feedback")?;

        sqlx::query(
            r#"DELETE FROM swap_requests WHERE offered_skill_id = $1 OR requested_skill_id = $1"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete skill swaps")?;

        sqlx::query(r#"DELETE FROM skill_verifications WHERE skill_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete skill verifications")?;

        let skill = sqlx::query_as::<_, Skill>(r#"DELETE FROM skills WHERE id = $1 RETURNING *"#)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("delete skill")?;

        tx.commit().await.context("commit tx")?;
        Ok(skill)
    }

    async fn list_user_skills(&self, user_id: Uuid, scope: SkillScope) -> anyhow::Result<Vec<Skill>> {
        let predicate = match scope {
            SkillScope::All => "TRUE",
            SkillScope::Verified => "is_verified",
            SkillScope::VerifiedOffered => "is_verified AND skill_type = 'Offered'",
            SkillScope::WithProof => "proof_file_url IS NOT NULL AND proof_file_url <> ''",
        };
        let sql = format!(
            "SELECT * FROM skills WHERE user_id = $1 AND {predicate} ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, Skill>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await
            .context("list user skills")?;
        Ok(rows)
    }
}
