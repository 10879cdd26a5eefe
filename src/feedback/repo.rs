use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    feedback::repo_types::{Feedback, FeedbackFilter, NewFeedback, RatingSummary},
    pagination::PageRequest,
    store::PgStore,
};

#[async_trait]
pub trait FeedbackRepo: Send + Sync {
    /// Inserts feedback unless the swap already has some; `None` on conflict.
    async fn insert_feedback(&self, new: NewFeedback) -> anyhow::Result<Option<Feedback>>;
    /// Ratings received by `rated_user`, or platform-wide when `None`.
    async fn rating_summary(&self, rated_user: Option<Uuid>) -> anyhow::Result<RatingSummary>;
    async fn list_feedback(
        &self,
        filter: FeedbackFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Feedback>, i64)>;
}

#[async_trait]
impl FeedbackRepo for PgStore {
    async fn insert_feedback(&self, new: NewFeedback) -> anyhow::Result<Option<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (swap_request_id, rater_id, rated_user_id, rating, comment,
                                  expectations_matched, skill_verified_by_peer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (swap_request_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(new.swap_request_id)
        .bind(new.rater_id)
        .bind(new.rated_user_id)
        .bind(new.rating)
        .bind(&new.comment)
        .bind(new.expectations_matched)
        .bind(new.skill_verified_by_peer)
        .fetch_optional(&self.db)
        .await
        .context("insert feedback")?;
        Ok(feedback)
    }

    async fn rating_summary(&self, rated_user: Option<Uuid>) -> anyhow::Result<RatingSummary> {
        let summary = sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT COUNT(*) AS count, AVG(rating)::float8 AS average
              FROM feedback
             WHERE ($1::uuid IS NULL OR rated_user_id = $1)
            "#,
        )
        .bind(rated_user)
        .fetch_one(&self.db)
        .await
        .context("rating summary")?;
        Ok(summary)
    }

    async fn list_feedback(
        &self,
        filter: FeedbackFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Feedback>, i64)> {
        let column = match filter {
            FeedbackFilter::ReceivedBy(_) => "rated_user_id",
            FeedbackFilter::GivenBy(_) => "rater_id",
        };
        let user_id = match filter {
            FeedbackFilter::ReceivedBy(id) | FeedbackFilter::GivenBy(id) => id,
        };

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM feedback WHERE {column} = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("count feedback")?;

        let rows = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT * FROM feedback WHERE {column} = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list feedback")?;

        Ok((rows, total))
    }
}
