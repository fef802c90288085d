use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UsageType;

/// Resolved limit for a usage type under a plan.
///
/// Replaces the nullable integer stored on plans so that "no limit" and
/// "zero allowed" cannot be confused at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Unlimited,
    Blocked,
    Bounded(NonZeroU32),
}

impl LimitKind {
    /// Maps a plan column: `None` is unlimited, `0` blocked, `n > 0` bounded.
    /// Negative values are treated as blocked.
    pub fn from_plan_value(value: Option<i32>) -> Self {
        match value {
            None => LimitKind::Unlimited,
            Some(n) if n > 0 => match NonZeroU32::new(n as u32) {
                Some(n) => LimitKind::Bounded(n),
                None => LimitKind::Blocked,
            },
            Some(_) => LimitKind::Blocked,
        }
    }

    /// Concrete cap as reported to callers (`None` when unlimited)
    pub fn as_limit(&self) -> Option<i32> {
        match self {
            LimitKind::Unlimited => None,
            LimitKind::Blocked => Some(0),
            LimitKind::Bounded(n) => Some(n.get() as i32),
        }
    }
}

/// Output of the period resolver for one company and usage type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub limit: LimitKind,
    pub hours_window: i32,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Paid subscription that produced the limit, `None` under the free plan
    pub subscription_id: Option<Uuid>,
}

/// Admission result returned to resume and comparison flows
#[derive(Debug, Clone, Serialize)]
pub struct LimitCheck {
    pub usage_type: UsageType,
    pub allowed: bool,
    pub current_count: i32,
    /// `null` when the plan is unlimited
    pub limit: Option<i32>,
    pub hours_window: i32,
    /// `null` when the plan is unlimited
    pub remaining: Option<i32>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

impl LimitCheck {
    pub fn new(
        usage_type: UsageType,
        resolved: &ResolvedPeriod,
        current_count: i32,
        allowed: bool,
    ) -> Self {
        let limit = resolved.limit.as_limit();
        Self {
            usage_type,
            allowed,
            current_count,
            limit,
            hours_window: resolved.hours_window,
            remaining: limit.map(|limit| (limit - current_count).max(0)),
            period_start: resolved.period_start,
            period_end: resolved.period_end,
        }
    }

    /// Turns a denial into [`AppError::QuotaExceeded`] carrying the usage figures
    pub fn ensure_allowed(self) -> AppResult<Self> {
        if self.allowed {
            return Ok(self);
        }

        Err(AppError::QuotaExceeded {
            usage_type: self.usage_type,
            current_count: self.current_count,
            limit: self.limit,
            remaining: self.remaining.unwrap_or(0),
        })
    }
}

/// Per-company view across every usage type
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub company_id: Uuid,
    pub usage: Vec<LimitCheck>,
}
