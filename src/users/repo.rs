use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    pagination::PageRequest,
    store::{contains_pattern, PgStore},
    users::repo_types::{CascadeReport, NewUser, ProfilePatch, User, UserFilter},
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a user; `None` when the email is already registered.
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<Option<User>>;
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<Option<User>>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()>;
    /// `Some(reason)` bans, `None` lifts the ban.
    async fn set_ban(&self, id: Uuid, reason: Option<&str>) -> anyhow::Result<Option<User>>;
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> anyhow::Result<bool>;
    /// Deletes feedback, swaps and skills that depend on the user, then the
    /// user, in one transaction. `None` when the user does not exist.
    async fn delete_user_cascade(&self, id: Uuid) -> anyhow::Result<Option<CascadeReport>>;
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<User>, i64)>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, location, profile_photo_url, is_public,
                               availability, timeslot, linkedin, instagram, youtube, facebook, x,
                               github, personal_portfolio, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(&new.location)
        .bind(&new.profile_photo_url)
        .bind(new.is_public)
        .bind(&new.availability)
        .bind(&new.timeslot)
        .bind(&new.socials.linkedin)
        .bind(&new.socials.instagram)
        .bind(&new.socials.youtube)
        .bind(&new.socials.facebook)
        .bind(&new.socials.x)
        .bind(&new.socials.github)
        .bind(&new.socials.personal_portfolio)
        .bind(new.is_admin)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<Option<User>> {
        let s = patch.socials;
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                location = COALESCE($3, location),
                profile_photo_url = COALESCE($4, profile_photo_url),
                is_public = COALESCE($5, is_public),
                availability = COALESCE($6, availability),
                timeslot = COALESCE($7, timeslot),
                linkedin = COALESCE($8, linkedin),
                instagram = COALESCE($9, instagram),
                youtube = COALESCE($10, youtube),
                facebook = COALESCE($11, facebook),
                x = COALESCE($12, x),
                github = COALESCE($13, github),
                personal_portfolio = COALESCE($14, personal_portfolio)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.location)
        .bind(patch.profile_photo_url)
        .bind(patch.is_public)
        .bind(patch.availability)
        .bind(patch.timeslot)
        .bind(s.linkedin)
        .bind(s.instagram)
        .bind(s.youtube)
        .bind(s.facebook)
        .bind(s.x)
        .bind(s.github)
        .bind(s.personal_portfolio)
        .fetch_optional(&self.db)
        .await
        .context("update profile")?;
        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let done = sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .context("set password hash")?;
        Ok(done.rows_affected() > 0)
    }

    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET last_login = now() WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("touch last_login")?;
        Ok(())
    }

    async fn set_ban(&self, id: Uuid, reason: Option<&str>) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_banned = $2, banned_reason = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason.is_some())
        .bind(reason)
        .fetch_optional(&self.db)
        .await
        .context("set ban")?;
        Ok(user)
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> anyhow::Result<bool> {
        let done = sqlx::query(r#"UPDATE users SET is_admin = $2 WHERE id = $1"#)
            .bind(id)
            .bind(is_admin)
            .execute(&self.db)
            .await
            .context("set admin")?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_user_cascade(&self, id: Uuid) -> anyhow::Result<Option<CascadeReport>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let exists = sqlx::query_scalar::<_, Uuid>(r#"SELECT id FROM users WHERE id = $1 FOR UPDATE"#)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock user")?;
        if exists.is_none() {
            return Ok(None);
        }

        let feedback = sqlx::query(
            r#"
            DELETE FROM feedback
             WHERE rater_id = $1
                OR rated_user_id = $1
                OR swap_request_id IN (
                    SELECT id FROM swap_requests
                     WHERE sender_id = $1 OR receiver_id = $1
                        OR offered_skill_id IN (SELECT id FROM skills WHERE user_id = $1)
                        OR requested_skill_id IN (SELECT id FROM skills WHERE user_id = $1))
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete user feedback")?
        .rows_affected();

        let swaps = sqlx::query(
            r#"
            DELETE FROM swap_requests
             WHERE sender_id = $1 OR receiver_id = $1
                OR offered_skill_id IN (SELECT id FROM skills WHERE user_id = $1)
                OR requested_skill_id IN (SELECT id FROM skills WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete user swaps")?
        .rows_affected();

        sqlx::query(
            r#"
            DELETE FROM skill_verifications
             WHERE verifier_id = $1
                OR skill_id IN (SELECT id FROM skills WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete user skill verifications")?;

        let keys: Vec<Option<String>> = sqlx::query_scalar(
            r#"DELETE FROM skills WHERE user_id = $1 RETURNING proof_file_key"#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .context("delete user skills")?;

        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete user")?;

        tx.commit().await.context("commit tx")?;

        Ok(Some(CascadeReport {
            feedback,
            swaps,
            skills: keys.len() as u64,
            proof_keys: keys.into_iter().flatten().collect(),
        }))
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<User>, i64)> {
        let pattern = filter.search_email.as_deref().map(contains_pattern);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
             WHERE ($1::text IS NULL OR email ILIKE $1)
               AND ($2::boolean IS NULL OR is_banned = $2)
            "#,
        )
        .bind(&pattern)
        .bind(filter.is_banned)
        .fetch_one(&self.db)
        .await
        .context("count users")?;

        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
             WHERE ($1::text IS NULL OR email ILIKE $1)
               AND ($2::boolean IS NULL OR is_banned = $2)
             ORDER BY date_joined DESC, id
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(filter.is_banned)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list users")?;

        Ok((rows, total))
    }
}
