use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    pagination::PageRequest,
    store::PgStore,
    swaps::{
        lifecycle::SwapState,
        repo_types::{NewSwap, SwapFilter, SwapRequest, SwapStatus},
    },
};

#[async_trait]
pub trait SwapRepo: Send + Sync {
    async fn insert_swap(&self, new: NewSwap) -> anyhow::Result<SwapRequest>;
    async fn find_swap(&self, id: Uuid) -> anyhow::Result<Option<SwapRequest>>;
    /// Writes `next` only if the row still holds `expected`, advancing
    /// `updated_at`. `None` means the guard missed (or the row is gone).
    async fn compare_and_set_swap(
        &self,
        id: Uuid,
        expected: SwapState,
        next: SwapState,
    ) -> anyhow::Result<Option<SwapRequest>>;
    /// Newest first.
    async fn list_swaps(
        &self,
        filter: &SwapFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<SwapRequest>, i64)>;
    async fn count_swaps(&self, participant: Option<Uuid>, status: Option<SwapStatus>) -> anyhow::Result<i64>;
    /// Whether a Pending or Accepted swap names the skill on either side.
    async fn skill_in_open_swap(&self, skill_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
impl SwapRepo for PgStore {
    async fn insert_swap(&self, new: NewSwap) -> anyhow::Result<SwapRequest> {
        let swap = sqlx::query_as::<_, SwapRequest>(
            r#"
            INSERT INTO swap_requests (sender_id, receiver_id, offered_skill_id, requested_skill_id, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.sender_id)
        .bind(new.receiver_id)
        .bind(new.offered_skill_id)
        .bind(new.requested_skill_id)
        .bind(&new.message)
        .fetch_one(&self.db)
        .await
        .context("insert swap request")?;
        Ok(swap)
    }

    async fn find_swap(&self, id: Uuid) -> anyhow::Result<Option<SwapRequest>> {
        let swap = sqlx::query_as::<_, SwapRequest>(r#"SELECT * FROM swap_requests WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find swap request")?;
        Ok(swap)
    }

    async fn compare_and_set_swap(
        &self,
        id: Uuid,
        expected: SwapState,
        next: SwapState,
    ) -> anyhow::Result<Option<SwapRequest>> {
        let swap = sqlx::query_as::<_, SwapRequest>(
            r#"
            UPDATE swap_requests
               SET status = $5,
                   sender_confirmed = $6,
                   receiver_confirmed = $7,
                   updated_at = GREATEST(now(), updated_at + interval '1 microsecond')
             WHERE id = $1
               AND status = $2
               AND sender_confirmed = $3
               AND receiver_confirmed = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.status)
        .bind(expected.sender_confirmed)
        .bind(expected.receiver_confirmed)
        .bind(next.status)
        .bind(next.sender_confirmed)
        .bind(next.receiver_confirmed)
        .fetch_optional(&self.db)
        .await
        .context("compare-and-set swap request")?;
        Ok(swap)
    }

    async fn list_swaps(
        &self,
        filter: &SwapFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<SwapRequest>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR sender_id = $1)
              AND ($2::uuid IS NULL OR receiver_id = $2)
              AND ($3::uuid IS NULL OR sender_id = $3 OR receiver_id = $3)
              AND ($4::swap_status IS NULL OR status = $4)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM swap_requests {WHERE}"))
            .bind(filter.sender_id)
            .bind(filter.receiver_id)
            .bind(filter.participant)
            .bind(filter.status)
            .fetch_one(&self.db)
            .await
            .context("count swap requests")?;

        let rows = sqlx::query_as::<_, SwapRequest>(&format!(
            "SELECT * FROM swap_requests {WHERE} ORDER BY created_at DESC, id LIMIT $5 OFFSET $6"
        ))
        .bind(filter.sender_id)
        .bind(filter.receiver_id)
        .bind(filter.participant)
        .bind(filter.status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list swap requests")?;

        Ok((rows, total))
    }

    async fn count_swaps(&self, participant: Option<Uuid>, status: Option<SwapStatus>) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM swap_requests
             WHERE ($1::uuid IS NULL OR sender_id = $1 OR receiver_id = $1)
               AND ($2::swap_status IS NULL OR status = $2)
            "#,
        )
        .bind(participant)
        .bind(status)
        .fetch_one(&self.db)
        .await
        .context("count swap requests")?;
        Ok(count)
    }

    async fn skill_in_open_swap(&self, skill_id: Uuid) -> anyhow::Result<bool> {
        let open = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM swap_requests
                 WHERE (offered_skill_id = $1 OR requested_skill_id = $1)
                   AND status IN ('Pending', 'Accepted'))
            "#,
        )
        .bind(skill_id)
        .fetch_one(&self.db)
        .await
        .context("check open swaps for skill")?;
        Ok(open)
    }
}
