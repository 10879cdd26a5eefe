use anyhow::Context;
use async_trait::async_trait;

use crate::{
    discovery::repo_types::{PublicUserFilter, UserCounts},
    pagination::PageRequest,
    skills::repo_types::SkillPopularity,
    store::{contains_pattern, PgStore},
    users::repo_types::User,
};

#[async_trait]
pub trait DiscoveryRepo: Send + Sync {
    /// Public, active, unbanned users matching `filter`, ordered by join
    /// date then id.
    async fn list_public_users(
        &self,
        filter: &PublicUserFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<User>, i64)>;
    /// Most frequent Offered skill names, count desc then name asc.
    async fn top_offered_skills(&self, limit: i64) -> anyhow::Result<Vec<SkillPopularity>>;
    async fn user_counts(&self) -> anyhow::Result<UserCounts>;
}

// Each skill predicate is an EXISTS so a user with several matching skills
// still yields one row.
const PUBLIC_USERS_WHERE: &str = r#"
    WHERE u.is_public AND u.is_active AND NOT u.is_banned
      AND ($1::text IS NULL OR EXISTS (
            SELECT 1 FROM skills s
             WHERE s.user_id = u.id AND s.skill_type = 'Offered' AND s.name ILIKE $1))
      AND ($2::text IS NULL OR EXISTS (
            SELECT 1 FROM skills s
             WHERE s.user_id = u.id AND s.skill_type = 'Offered' AND s.name ILIKE $2))
      AND (cardinality($3::text[]) = 0 OR u.availability && $3::text[])
      AND (cardinality($4::text[]) = 0 OR u.timeslot && $4::text[])
      AND (NOT $5 OR EXISTS (
            SELECT 1 FROM skills s
             WHERE s.user_id = u.id AND s.skill_type = 'Offered' AND s.is_verified))
"#;

#[async_trait]
impl DiscoveryRepo for PgStore {
    async fn list_public_users(
        &self,
        filter: &PublicUserFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<User>, i64)> {
        let skill = filter.search_skill.as_deref().map(contains_pattern);
        let query = filter.query.as_deref().map(contains_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM users u {PUBLIC_USERS_WHERE}"
        ))
        .bind(&skill)
        .bind(&query)
        .bind(&filter.availability)
        .bind(&filter.timeslot)
        .bind(filter.verified_only)
        .fetch_one(&self.db)
        .await
        .context("count public users")?;

        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT u.* FROM users u {PUBLIC_USERS_WHERE} ORDER BY u.date_joined, u.id LIMIT $6 OFFSET $7"
        ))
        .bind(&skill)
        .bind(&query)
        .bind(&filter.availability)
        .bind(&filter.timeslot)
        .bind(filter.verified_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list public users")?;

        Ok((rows, total))
    }

    async fn top_offered_skills(&self, limit: i64) -> anyhow::Result<Vec<SkillPopularity>> {
        let rows = sqlx::query_as::<_, SkillPopularity>(
            r#"
            SELECT name, COUNT(*) AS count
              FROM skills
             WHERE skill_type = 'Offered'
             GROUP BY name
             ORDER BY count DESC, name ASC
             LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("top offered skills")?;
        Ok(rows)
    }

    async fn user_counts(&self) -> anyhow::Result<UserCounts> {
        let counts = sqlx::query_as::<_, UserCounts>(
            r#"SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE is_active) AS active FROM users"#,
        )
        .fetch_one(&self.db)
        .await
        .context("user counts")?;
        Ok(counts)
    }
}
