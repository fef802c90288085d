use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ArchivedCounter, ResolvedPeriod, UsageCounter, UsageType};
use crate::services::usage_counter::UsageCounterStore;

/// Attempts at creating-then-locking a counter before giving up. A retry is
/// only needed when an archive commits between the insert and the lock.
const GET_OR_CREATE_ATTEMPTS: usize = 3;

pub struct CounterLifecycle;

impl CounterLifecycle {
    /// Returns the active counter for a resolved period, creating it on first
    /// use, and locks it for the rest of the caller's transaction.
    ///
    /// If the stored limit or subscription reference disagrees with the
    /// resolution (the company changed plans), the row is corrected in place.
    pub async fn get_or_create(
        conn: &mut PgConnection,
        company_id: Uuid,
        usage_type: UsageType,
        resolved: &ResolvedPeriod,
        usage_limit: i32,
    ) -> AppResult<UsageCounter> {
        for _ in 0..GET_OR_CREATE_ATTEMPTS {
            let created = UsageCounterStore::insert_if_absent(
                &mut *conn,
                company_id,
                resolved.subscription_id,
                usage_type,
                resolved.period_start,
                resolved.period_end,
                usage_limit,
            )
            .await?;

            if created {
                log::debug!(
                    "Created {} counter for company {} ({} - {})",
                    usage_type,
                    company_id,
                    resolved.period_start,
                    resolved.period_end
                );
            }

            let counter = UsageCounterStore::find_active_for_update(
                &mut *conn,
                company_id,
                usage_type,
                resolved.period_start,
                resolved.period_end,
            )
            .await?;

            let Some(counter) = counter else {
                continue;
            };

            if counter.usage_limit == usage_limit
                && counter.subscription_id == resolved.subscription_id
            {
                return Ok(counter);
            }

            log::info!(
                "Correcting {} counter {} for company {}: limit {} -> {}",
                usage_type,
                counter.id,
                company_id,
                counter.usage_limit,
                usage_limit
            );

            return UsageCounterStore::update_limit(
                &mut *conn,
                counter.id,
                usage_limit,
                resolved.subscription_id,
            )
            .await;
        }

        Err(AppError::Internal(format!(
            "Could not obtain {} counter for company {}",
            usage_type, company_id
        )))
    }

    /// Archives every active counter of a company and replaces each with a
    /// zeroed counter over the same period.
    ///
    /// Replacements inherit the archived limit and subscription reference;
    /// the next [`Self::get_or_create`] corrects them against the new plan.
    pub async fn archive_and_reset(
        pool: &PgPool,
        company_id: Uuid,
    ) -> AppResult<Vec<ArchivedCounter>> {
        let mut tx = pool.begin().await?;

        let result = Self::archive_and_reset_inner(&mut tx, company_id).await;

        match result {
            Ok(archived) => {
                tx.commit().await?;
                log::info!(
                    "Archived and reset {} counters for company {}",
                    archived.len(),
                    company_id
                );
                Ok(archived)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn archive_and_reset_inner(
        conn: &mut PgConnection,
        company_id: Uuid,
    ) -> AppResult<Vec<ArchivedCounter>> {
        // Locking waits out any gate transaction still holding one of these rows
        let counters = UsageCounterStore::list_active_for_update(&mut *conn, company_id).await?;

        let mut archived = Vec::with_capacity(counters.len());
        for counter in counters {
            // Deactivate first: the replacement shares the partial unique key
            UsageCounterStore::deactivate(&mut *conn, counter.id).await?;
            let replacement = UsageCounterStore::insert_replacement(&mut *conn, &counter).await?;

            archived.push(ArchivedCounter {
                archived_id: counter.id,
                replacement_id: replacement.id,
                usage_type: counter.usage_type,
                final_used: counter.used,
                final_limit: counter.usage_limit,
            });
        }

        Ok(archived)
    }

    /// Archives every active counter of a company without replacements
    pub async fn reset_all(pool: &PgPool, company_id: Uuid) -> AppResult<u64> {
        let deactivated = UsageCounterStore::deactivate_all(pool, company_id).await?;

        log::info!(
            "Deactivated {} counters for company {}",
            deactivated,
            company_id
        );

        Ok(deactivated)
    }
}
