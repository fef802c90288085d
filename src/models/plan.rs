use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::UsageType;

/// Subscription plan with its per-usage-type limits.
///
/// Limit columns keep the storage convention: `NULL` is unlimited, `0` is
/// blocked. Call sites go through [`crate::models::LimitKind`] instead of
/// reading the raw values.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub resume_upload_limit: Option<i32>,
    pub comparison_limit: Option<i32>,
    pub hours_window: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Raw limit column for a usage type
    pub fn raw_limit(&self, usage_type: UsageType) -> Option<i32> {
        match usage_type {
            UsageType::ResumeUpload => self.resume_upload_limit,
            UsageType::Comparison => self.comparison_limit,
        }
    }
}
