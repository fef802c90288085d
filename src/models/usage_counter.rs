use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// =============================================================================
// Usage Type Enum
// =============================================================================

/// Category of quota-consuming action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    ResumeUpload,
    Comparison,
}

impl UsageType {
    pub const ALL: [UsageType; 2] = [UsageType::ResumeUpload, UsageType::Comparison];

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::ResumeUpload => "resume_upload",
            UsageType::Comparison => "comparison",
        }
    }
}

impl std::fmt::Display for UsageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Usage Counter Model
// =============================================================================

/// Consumption counter for one (company, usage type, billing period).
///
/// The period is half-open: `[period_start, period_end)`. Archived counters
/// keep `is_active = false` and their final `used`/`usage_limit`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UsageCounter {
    pub id: Uuid,
    pub company_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub usage_type: UsageType,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub used: i32,
    #[serde(rename = "limit")]
    pub usage_limit: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pair produced by archiving: the retired counter and its fresh successor
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedCounter {
    pub archived_id: Uuid,
    pub replacement_id: Uuid,
    pub usage_type: UsageType,
    pub final_used: i32,
    pub final_limit: i32,
}
