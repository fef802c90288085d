use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{UsageCounter, UsageType};
use crate::pagination::SortOrder;

const COUNTER_COLUMNS: &str = "id, company_id, subscription_id, usage_type, period_start, \
     period_end, used, usage_limit, is_active, created_at, updated_at";

/// Data access for `usage_counters`.
///
/// Every function takes an executor so the same query can run on the pool
/// or inside a caller's transaction.
pub struct UsageCounterStore;

impl UsageCounterStore {
    /// Gets a counter by id, archived or not
    pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> AppResult<UsageCounter> {
        let counter = sqlx::query_as::<_, UsageCounter>(&format!(
            "SELECT {COUNTER_COLUMNS} FROM usage_counters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Usage counter with id {} not found", id)))?;

        Ok(counter)
    }

    /// Finds the active counter for a period without locking it
    pub async fn find_active<'e>(
        executor: impl PgExecutor<'e>,
        company_id: Uuid,
        usage_type: UsageType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Option<UsageCounter>> {
        let counter = sqlx::query_as::<_, UsageCounter>(&format!(
            r#"
            SELECT {COUNTER_COLUMNS} FROM usage_counters
            WHERE company_id = $1 AND usage_type = $2
              AND period_start = $3 AND period_end = $4
              AND is_active
            "#
        ))
        .bind(company_id)
        .bind(usage_type)
        .bind(period_start)
        .bind(period_end)
        .fetch_optional(executor)
        .await?;

        Ok(counter)
    }

    /// Finds the active counter for a period and locks it until the
    /// surrounding transaction ends
    pub async fn find_active_for_update<'e>(
        executor: impl PgExecutor<'e>,
        company_id: Uuid,
        usage_type: UsageType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Option<UsageCounter>> {
        let counter = sqlx::query_as::<_, UsageCounter>(&format!(
            r#"
            SELECT {COUNTER_COLUMNS} FROM usage_counters
            WHERE company_id = $1 AND usage_type = $2
              AND period_start = $3 AND period_end = $4
              AND is_active
            FOR UPDATE
            "#
        ))
        .bind(company_id)
        .bind(usage_type)
        .bind(period_start)
        .bind(period_end)
        .fetch_optional(executor)
        .await?;

        Ok(counter)
    }

    /// Inserts a fresh counter unless an active one already covers the period.
    /// Returns true if a row was inserted.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_if_absent<'e>(
        executor: impl PgExecutor<'e>,
        company_id: Uuid,
        subscription_id: Option<Uuid>,
        usage_type: UsageType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        usage_limit: i32,
    ) -> AppResult<bool> {
        // Conflict target matches the partial unique index on active counters
        let result = sqlx::query(
            r#"
            INSERT INTO usage_counters (
                company_id, subscription_id, usage_type,
                period_start, period_end, used, usage_limit
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            ON CONFLICT (company_id, usage_type, period_start, period_end)
                WHERE is_active
                DO NOTHING
            "#,
        )
        .bind(company_id)
        .bind(subscription_id)
        .bind(usage_type)
        .bind(period_start)
        .bind(period_end)
        .bind(usage_limit)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Inserts a replacement counter starting at zero (caller has already
    /// deactivated the counter it supersedes)
    pub async fn insert_replacement<'e>(
        executor: impl PgExecutor<'e>,
        archived: &UsageCounter,
    ) -> AppResult<UsageCounter> {
        let counter = sqlx::query_as::<_, UsageCounter>(&format!(
            r#"
            INSERT INTO usage_counters (
                company_id, subscription_id, usage_type,
                period_start, period_end, used, usage_limit
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING {COUNTER_COLUMNS}
            "#
        ))
        .bind(archived.company_id)
        .bind(archived.subscription_id)
        .bind(archived.usage_type)
        .bind(archived.period_start)
        .bind(archived.period_end)
        .bind(archived.usage_limit)
        .fetch_one(executor)
        .await?;

        Ok(counter)
    }

    /// Overwrites the stored limit and subscription reference
    pub async fn update_limit<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        usage_limit: i32,
        subscription_id: Option<Uuid>,
    ) -> AppResult<UsageCounter> {
        let counter = sqlx::query_as::<_, UsageCounter>(&format!(
            r#"
            UPDATE usage_counters
            SET usage_limit = $2, subscription_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {COUNTER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(usage_limit)
        .bind(subscription_id)
        .fetch_one(executor)
        .await?;

        Ok(counter)
    }

    /// Compare-and-increment: adds one to `used` only while `used < usage_limit`.
    ///
    /// Returns the updated counter, or `None` when the counter is exhausted or
    /// no longer active. The UPDATE holds the row lock until the transaction
    /// ends, so concurrent callers serialize on it.
    pub async fn try_increment<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> AppResult<Option<UsageCounter>> {
        let counter = sqlx::query_as::<_, UsageCounter>(&format!(
            r#"
            UPDATE usage_counters
            SET used = used + 1, updated_at = NOW()
            WHERE id = $1 AND is_active AND used < usage_limit
            RETURNING {COUNTER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(counter)
    }

    /// Lists and locks all active counters of a company
    pub async fn list_active_for_update<'e>(
        executor: impl PgExecutor<'e>,
        company_id: Uuid,
    ) -> AppResult<Vec<UsageCounter>> {
        let counters = sqlx::query_as::<_, UsageCounter>(&format!(
            r#"
            SELECT {COUNTER_COLUMNS} FROM usage_counters
            WHERE company_id = $1 AND is_active
            ORDER BY usage_type, period_start
            FOR UPDATE
            "#
        ))
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(counters)
    }

    /// Marks a single counter as archived
    pub async fn deactivate<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE usage_counters SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Archives every active counter of a company, returning how many were hit
    pub async fn deactivate_all<'e>(
        executor: impl PgExecutor<'e>,
        company_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE usage_counters SET is_active = FALSE, updated_at = NOW()
            WHERE company_id = $1 AND is_active
            "#,
        )
        .bind(company_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists a company's counters with offset-based pagination, newest period first
    /// by default
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        include_archived: bool,
        order: SortOrder,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<UsageCounter>, i64)> {
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::Validation(format!("page {} is out of range", page)))?;

        let total_count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM usage_counters WHERE company_id = $1 AND (is_active OR $2)",
        )
        .bind(company_id)
        .bind(include_archived)
        .fetch_one(pool)
        .await?;

        let order_clause = match order {
            SortOrder::Asc => "ORDER BY period_start ASC, created_at ASC",
            SortOrder::Desc => "ORDER BY period_start DESC, created_at DESC",
        };

        let query = format!(
            r#"
            SELECT {COUNTER_COLUMNS} FROM usage_counters
            WHERE company_id = $1 AND (is_active OR $2)
            {order_clause}
            LIMIT $3 OFFSET $4
            "#
        );

        let counters = sqlx::query_as::<_, UsageCounter>(&query)
            .bind(company_id)
            .bind(include_archived)
            .bind(per_page)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok((counters, total_count.0))
    }
}
