//! Test fixtures and data builders
//!
//! Plans and subscriptions are owned by the billing side in production, so
//! tests insert them directly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hireflow_quota::config::QuotaConfig;
use hireflow_quota::models::{LimitCheck, Plan, Subscription, UsageType};
use hireflow_quota::services::{
    PeriodResolver, PgSubscriptionProvider, QuotaGate, UsageLimitService,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Builds plan rows with sensible defaults (everything unlimited, no window)
pub struct PlanBuilder {
    name: String,
    resume_upload_limit: Option<i32>,
    comparison_limit: Option<i32>,
    hours_window: Option<i32>,
}

impl PlanBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resume_upload_limit: None,
            comparison_limit: None,
            hours_window: None,
        }
    }

    pub fn with_resume_upload_limit(mut self, limit: Option<i32>) -> Self {
        self.resume_upload_limit = limit;
        self
    }

    pub fn with_comparison_limit(mut self, limit: Option<i32>) -> Self {
        self.comparison_limit = limit;
        self
    }

    pub fn with_hours_window(mut self, hours: i32) -> Self {
        self.hours_window = Some(hours);
        self
    }

    pub async fn insert(self, pool: &PgPool) -> Plan {
        sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans (name, resume_upload_limit, comparison_limit, hours_window)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, resume_upload_limit, comparison_limit, hours_window,
                      created_at, updated_at
            "#,
        )
        .bind(&self.name)
        .bind(self.resume_upload_limit)
        .bind(self.comparison_limit)
        .bind(self.hours_window)
        .fetch_one(pool)
        .await
        .expect("Failed to insert plan")
    }
}

/// Inserts a subscription row for a company
pub async fn insert_subscription(
    pool: &PgPool,
    company_id: Uuid,
    plan_id: Uuid,
    status: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Subscription {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (company_id, plan_id, status, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, company_id, plan_id, status, starts_at, ends_at,
                  created_at, updated_at
        "#,
    )
    .bind(company_id)
    .bind(plan_id)
    .bind(status)
    .bind(starts_at)
    .bind(ends_at)
    .fetch_one(pool)
    .await
    .expect("Failed to insert subscription")
}

/// Wires the quota core against the test database
pub fn build_service(pool: &PgPool, free_plan_id: Option<Uuid>) -> UsageLimitService {
    let provider = Arc::new(PgSubscriptionProvider::new(pool.clone()));
    let resolver = PeriodResolver::new(
        provider,
        QuotaConfig {
            free_plan_id,
            ..QuotaConfig::default()
        },
    );
    UsageLimitService::new(QuotaGate::new(resolver))
}

/// Reserves one unit in its own committed transaction
pub async fn reserve(
    service: &UsageLimitService,
    pool: &PgPool,
    company_id: Uuid,
    usage_type: UsageType,
) -> LimitCheck {
    let mut tx = pool.begin().await.expect("Failed to begin transaction");
    let check = service
        .check_limit_in_transaction(&mut tx, company_id, usage_type)
        .await
        .expect("Failed to check limit");
    tx.commit().await.expect("Failed to commit");
    check
}
