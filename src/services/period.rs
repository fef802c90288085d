//! Billing-period resolution.
//!
//! Free-plan windows float with the wall clock: they are anchored to the
//! start of the current day (windows of 24h or more) or the current hour,
//! so calls within the same hour/day land on the same counter. Paid-plan
//! windows are anchored to the subscription start, truncated to the hour.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};
use uuid::Uuid;

use crate::config::QuotaConfig;
use crate::error::{AppError, AppResult};
use crate::models::{LimitKind, Plan, ResolvedPeriod, UsageType};
use crate::services::subscription::SubscriptionProvider;

/// Where a billing window starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodAnchor {
    /// Free plan: the resolution instant
    Now(DateTime<Utc>),
    /// Paid plan: the subscription's start timestamp
    SubscriptionStart(DateTime<Utc>),
}

/// Truncates a timestamp to the start of its UTC day
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Truncates a timestamp to the start of its UTC hour
pub fn start_of_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(ts) + TimeDelta::hours(i64::from(ts.hour()))
}

/// Computes the half-open `[start, end)` window for an anchor
pub fn compute_period(
    anchor: PeriodAnchor,
    hours_window: i32,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = match anchor {
        PeriodAnchor::Now(now) if hours_window >= 24 => start_of_day(now),
        PeriodAnchor::Now(now) => start_of_hour(now),
        PeriodAnchor::SubscriptionStart(starts_at) => start_of_hour(starts_at),
    };

    (start, start + TimeDelta::hours(i64::from(hours_window)))
}

/// Resolves the limit and window that apply to a company right now
#[derive(Clone)]
pub struct PeriodResolver {
    provider: Arc<dyn SubscriptionProvider>,
    config: QuotaConfig,
}

impl PeriodResolver {
    pub fn new(provider: Arc<dyn SubscriptionProvider>, config: QuotaConfig) -> Self {
        Self { provider, config }
    }

    /// Resolves against the current wall-clock time
    pub async fn resolve(
        &self,
        company_id: Uuid,
        usage_type: UsageType,
    ) -> AppResult<ResolvedPeriod> {
        self.resolve_at(company_id, usage_type, Utc::now()).await
    }

    /// Resolves as if the current time were `now`. Read-only.
    pub async fn resolve_at(
        &self,
        company_id: Uuid,
        usage_type: UsageType,
        now: DateTime<Utc>,
    ) -> AppResult<ResolvedPeriod> {
        if let Some(paid) = self
            .provider
            .current_subscription(company_id, now)
            .await?
        {
            let hours_window = self.window_hours(&paid.plan);
            let (period_start, period_end) = compute_period(
                PeriodAnchor::SubscriptionStart(paid.subscription.starts_at),
                hours_window,
            );

            return Ok(ResolvedPeriod {
                limit: self.limit_kind(&paid.plan, usage_type),
                hours_window,
                period_start,
                period_end,
                subscription_id: Some(paid.subscription.id),
            });
        }

        let plan = self.free_plan().await?;
        let hours_window = self.window_hours(&plan);
        let (period_start, period_end) = compute_period(PeriodAnchor::Now(now), hours_window);

        Ok(ResolvedPeriod {
            limit: self.limit_kind(&plan, usage_type),
            hours_window,
            period_start,
            period_end,
            subscription_id: None,
        })
    }

    /// Loads the designated free plan, failing with a configuration error
    /// when it is unset or missing
    pub async fn free_plan(&self) -> AppResult<Plan> {
        let Some(plan_id) = self.config.free_plan_id else {
            log::error!("No free plan configured (FREE_PLAN_ID is unset)");
            return Err(AppError::Configuration(
                "Free plan is not configured".to_string(),
            ));
        };

        self.provider.plan(plan_id).await?.ok_or_else(|| {
            log::error!("Configured free plan {} does not exist", plan_id);
            AppError::Configuration(format!("Free plan {} not found", plan_id))
        })
    }

    fn limit_kind(&self, plan: &Plan, usage_type: UsageType) -> LimitKind {
        let raw = plan.raw_limit(usage_type);
        if matches!(raw, Some(n) if n < 0) {
            log::warn!(
                "Plan {} has negative {} limit {:?}, treating as blocked",
                plan.name,
                usage_type,
                raw
            );
        }
        LimitKind::from_plan_value(raw)
    }

    fn window_hours(&self, plan: &Plan) -> i32 {
        match plan.hours_window {
            Some(hours) if hours > 0 => hours,
            Some(hours) => {
                log::warn!(
                    "Plan {} has invalid hours_window {}, using {}",
                    plan.name,
                    hours,
                    self.config.default_hours_window
                );
                self.config.default_hours_window
            }
            None => self.config.default_hours_window,
        }
    }
}
