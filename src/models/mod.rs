pub mod limit;
pub mod plan;
pub mod subscription;
pub mod usage_counter;

pub use limit::{LimitCheck, LimitKind, ResolvedPeriod, UsageSummary};
pub use plan::Plan;
pub use subscription::{
    PaidSubscription, Subscription, SubscriptionEvent, SubscriptionEventRequest, SubscriptionStatus,
};
pub use usage_counter::{ArchivedCounter, UsageCounter, UsageType};
