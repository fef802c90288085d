//! Admission checks and atomic quota reservation.
//!
//! `check_and_increment_if_allowed` must run inside the transaction of the
//! action it gates: the reservation commits or rolls back with that action.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{LimitKind, ResolvedPeriod, UsageType};
use crate::services::counter_lifecycle::CounterLifecycle;
use crate::services::period::PeriodResolver;
use crate::services::usage_counter::UsageCounterStore;

/// Result of a gate decision
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub allowed: bool,
    /// Counter value after the decision (0 when no counter is involved)
    pub used: i32,
    pub resolved: ResolvedPeriod,
    /// Counter that was read or incremented, if any
    pub counter_id: Option<Uuid>,
}

impl GateOutcome {
    fn without_counter(resolved: ResolvedPeriod, allowed: bool) -> Self {
        Self {
            allowed,
            used: 0,
            resolved,
            counter_id: None,
        }
    }
}

#[derive(Clone)]
pub struct QuotaGate {
    resolver: PeriodResolver,
}

impl QuotaGate {
    pub fn new(resolver: PeriodResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PeriodResolver {
        &self.resolver
    }

    /// Read-only pre-check. Never creates or locks a counter.
    pub async fn can_use(
        &self,
        pool: &PgPool,
        company_id: Uuid,
        usage_type: UsageType,
    ) -> AppResult<GateOutcome> {
        let resolved = self.resolver.resolve(company_id, usage_type).await?;
        Self::can_use_resolved(pool, company_id, usage_type, resolved).await
    }

    /// Pre-check against an already resolved period
    pub async fn can_use_resolved(
        pool: &PgPool,
        company_id: Uuid,
        usage_type: UsageType,
        resolved: ResolvedPeriod,
    ) -> AppResult<GateOutcome> {
        let limit = match resolved.limit {
            LimitKind::Unlimited => return Ok(GateOutcome::without_counter(resolved, true)),
            LimitKind::Blocked => return Ok(GateOutcome::without_counter(resolved, false)),
            LimitKind::Bounded(n) => n.get() as i32,
        };

        let counter = UsageCounterStore::find_active(
            pool,
            company_id,
            usage_type,
            resolved.period_start,
            resolved.period_end,
        )
        .await?;

        let (used, counter_id) = counter
            .map(|c| (c.used, Some(c.id)))
            .unwrap_or((0, None));

        Ok(GateOutcome {
            allowed: used < limit,
            used,
            resolved,
            counter_id,
        })
    }

    /// Reserves one unit of quota inside the caller's transaction.
    ///
    /// Unlimited plans succeed without touching a counter; blocked plans fail
    /// without one. Bounded plans lock the period's counter and increment it
    /// only while `used < limit`. A denial is `Ok` with `allowed == false`;
    /// store failures are returned as errors so the caller rolls back.
    pub async fn check_and_increment_if_allowed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        usage_type: UsageType,
    ) -> AppResult<GateOutcome> {
        let resolved = self.resolver.resolve(company_id, usage_type).await?;
        Self::check_and_increment_resolved(tx, company_id, usage_type, resolved).await
    }

    /// Reservation against an already resolved period
    pub async fn check_and_increment_resolved(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        usage_type: UsageType,
        resolved: ResolvedPeriod,
    ) -> AppResult<GateOutcome> {
        let limit = match resolved.limit {
            LimitKind::Unlimited => return Ok(GateOutcome::without_counter(resolved, true)),
            LimitKind::Blocked => {
                log::debug!("{} blocked by plan for company {}", usage_type, company_id);
                return Ok(GateOutcome::without_counter(resolved, false));
            }
            LimitKind::Bounded(n) => n.get() as i32,
        };

        let counter =
            CounterLifecycle::get_or_create(&mut **tx, company_id, usage_type, &resolved, limit)
                .await?;

        match UsageCounterStore::try_increment(&mut **tx, counter.id).await? {
            Some(updated) => Ok(GateOutcome {
                allowed: true,
                used: updated.used,
                resolved,
                counter_id: Some(updated.id),
            }),
            None => {
                log::debug!(
                    "{} quota exhausted for company {} ({}/{})",
                    usage_type,
                    company_id,
                    counter.used,
                    counter.usage_limit
                );
                Ok(GateOutcome {
                    allowed: false,
                    used: counter.used,
                    resolved,
                    counter_id: Some(counter.id),
                })
            }
        }
    }
}
