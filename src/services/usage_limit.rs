use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ArchivedCounter, LimitCheck, SubscriptionEvent, UsageSummary, UsageType};
use crate::services::counter_lifecycle::CounterLifecycle;
use crate::services::quota_gate::QuotaGate;

/// Entry point used by the resume-upload and comparison flows
#[derive(Clone)]
pub struct UsageLimitService {
    gate: QuotaGate,
}

/// What a subscription event did to the company's counters
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionChangeResult {
    pub company_id: Uuid,
    pub event: SubscriptionEvent,
    pub archived: Vec<ArchivedCounter>,
    pub deactivated: u64,
}

impl UsageLimitService {
    pub fn new(gate: QuotaGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &QuotaGate {
        &self.gate
    }

    /// Non-transactional pre-check; does not reserve anything
    pub async fn check_limit(
        &self,
        pool: &PgPool,
        company_id: Uuid,
        usage_type: UsageType,
    ) -> AppResult<LimitCheck> {
        let outcome = self.gate.can_use(pool, company_id, usage_type).await?;
        Ok(LimitCheck::new(
            usage_type,
            &outcome.resolved,
            outcome.used,
            outcome.allowed,
        ))
    }

    /// Reserves one unit inside the caller's transaction.
    ///
    /// Call after `pool.begin()` and before the gated action's writes are
    /// committed. A denied check leaves the transaction usable; the caller
    /// decides whether to roll back.
    ///
    /// Unlimited plans report `limit: None` and `remaining: None` here as well.
    pub async fn check_limit_in_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        usage_type: UsageType,
    ) -> AppResult<LimitCheck> {
        let outcome = self
            .gate
            .check_and_increment_if_allowed(tx, company_id, usage_type)
            .await?;

        Ok(LimitCheck::new(
            usage_type,
            &outcome.resolved,
            outcome.used,
            outcome.allowed,
        ))
    }

    /// Pre-check for every usage type
    pub async fn usage_summary(&self, pool: &PgPool, company_id: Uuid) -> AppResult<UsageSummary> {
        let mut usage = Vec::with_capacity(UsageType::ALL.len());
        for usage_type in UsageType::ALL {
            usage.push(self.check_limit(pool, company_id, usage_type).await?);
        }

        Ok(UsageSummary { company_id, usage })
    }

    /// Upgrade, downgrade or renewal: archive current counters and start fresh
    pub async fn notify_subscription_changed(
        &self,
        pool: &PgPool,
        company_id: Uuid,
    ) -> AppResult<Vec<ArchivedCounter>> {
        CounterLifecycle::archive_and_reset(pool, company_id).await
    }

    /// Cancellation with no replacement plan known yet
    pub async fn notify_subscription_cancelled(
        &self,
        pool: &PgPool,
        company_id: Uuid,
    ) -> AppResult<u64> {
        CounterLifecycle::reset_all(pool, company_id).await
    }

    /// Dispatches a billing event to the matching lifecycle operation
    pub async fn handle_subscription_event(
        &self,
        pool: &PgPool,
        company_id: Uuid,
        event: SubscriptionEvent,
    ) -> AppResult<SubscriptionChangeResult> {
        let (archived, deactivated) = match event {
            SubscriptionEvent::Cancelled => {
                let deactivated = self.notify_subscription_cancelled(pool, company_id).await?;
                (Vec::new(), deactivated)
            }
            SubscriptionEvent::Upgraded
            | SubscriptionEvent::Downgraded
            | SubscriptionEvent::Renewed => {
                let archived = self.notify_subscription_changed(pool, company_id).await?;
                let count = archived.len() as u64;
                (archived, count)
            }
        };

        Ok(SubscriptionChangeResult {
            company_id,
            event,
            archived,
            deactivated,
        })
    }
}
