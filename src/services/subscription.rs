//! Subscription lookups consumed by the period resolver.
//!
//! Checkout and subscription management live in the billing side; this
//! module only reads what it needs to resolve a company's current plan.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{PaidSubscription, Plan, Subscription};

/// Source of subscription and plan data
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    /// Active or pending subscription whose validity window covers `at`
    async fn current_subscription(
        &self,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<PaidSubscription>>;

    /// Plan by id, used to load the designated free plan
    async fn plan(&self, plan_id: Uuid) -> AppResult<Option<Plan>>;
}

/// PostgreSQL-backed provider reading the `subscriptions` and `plans` tables
#[derive(Clone)]
pub struct PgSubscriptionProvider {
    pool: PgPool,
}

impl PgSubscriptionProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionProvider for PgSubscriptionProvider {
    async fn current_subscription(
        &self,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<PaidSubscription>> {
        // Most recent start wins; an active row beats a pending one on ties
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, company_id, plan_id, status, starts_at, ends_at,
                   created_at, updated_at
            FROM subscriptions
            WHERE company_id = $1
              AND status IN ('active', 'pending')
              AND starts_at <= $2
              AND ends_at > $2
            ORDER BY starts_at DESC,
                     CASE status WHEN 'active' THEN 0 ELSE 1 END
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        let Some(subscription) = subscription else {
            return Ok(None);
        };

        match self.plan(subscription.plan_id).await? {
            Some(plan) => Ok(Some(PaidSubscription { subscription, plan })),
            None => {
                // plan_id is a foreign key, so this only happens mid-migration
                log::warn!(
                    "Subscription {} references missing plan {}",
                    subscription.id,
                    subscription.plan_id
                );
                Ok(None)
            }
        }
    }

    async fn plan(&self, plan_id: Uuid) -> AppResult<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, name, resume_upload_limit, comparison_limit, hours_window,
                   created_at, updated_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }
}
