pub mod counter_lifecycle;
pub mod period;
pub mod quota_gate;
pub mod subscription;
pub mod usage_counter;
pub mod usage_limit;

pub use counter_lifecycle::CounterLifecycle;
pub use period::{compute_period, start_of_day, start_of_hour, PeriodAnchor, PeriodResolver};
pub use quota_gate::{GateOutcome, QuotaGate};
pub use subscription::{PgSubscriptionProvider, SubscriptionProvider};
pub use usage_counter::UsageCounterStore;
pub use usage_limit::{SubscriptionChangeResult, UsageLimitService};
