use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Plan;

/// Lifecycle state of a paid subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
}

/// Paid subscription instance owned by a company
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub company_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A covering subscription together with the plan it grants
#[derive(Debug, Clone)]
pub struct PaidSubscription {
    pub subscription: Subscription,
    pub plan: Plan,
}

/// State change reported by the billing side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionEvent {
    Upgraded,
    Downgraded,
    Renewed,
    Cancelled,
}

/// DTO for `POST /api/companies/{id}/subscription-events`
#[derive(Debug, Deserialize)]
pub struct SubscriptionEventRequest {
    pub event: SubscriptionEvent,
}
