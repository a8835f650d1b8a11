/// Coupon engine services
pub mod discount;
pub mod lifecycle;
pub mod totals;
pub mod usage;
pub mod validation;

pub use lifecycle::CouponLifecycle;
pub use usage::{FinalizeOutcome, RecordedUsage, UsageFinalizer, UsageRejection};
pub use validation::ValidationEngine;
