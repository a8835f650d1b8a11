use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::coupon::{self, CouponStatus};
use crate::errors::ServiceError;

pub mod memory;
pub mod sea_orm_repository;

pub use memory::InMemoryCouponRepository;
pub use sea_orm_repository::SeaOrmCouponRepository;

/// Storage contract the engine consumes.
///
/// The engine never touches global state; any store (SQL table, document
/// store, test double) sits behind this trait. `increment_usage_if_under_limit`
/// is the one operation with a concurrency obligation: it must be a single
/// atomic, conditional update against the backing store. An in-process lock
/// is not sufficient when several instances share the store.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn find_by_id(&self, coupon_id: Uuid) -> Result<Option<coupon::Model>, ServiceError>;

    /// Case-insensitive lookup by `(store_id, code)`.
    async fn find_by_code(
        &self,
        store_id: Uuid,
        code: &str,
    ) -> Result<Option<coupon::Model>, ServiceError>;

    /// All ACTIVE auto-apply coupons of the store.
    async fn list_auto_apply(&self, store_id: Uuid) -> Result<Vec<coupon::Model>, ServiceError>;

    /// Atomically increments `times_used_total` iff the coupon is still
    /// ACTIVE and under its total usage cap. Returns whether the increment
    /// happened; `false` means a concurrent checkout spent the cap first.
    async fn increment_usage_if_under_limit(&self, coupon_id: Uuid)
        -> Result<bool, ServiceError>;

    /// Records `(coupon_id, order_id)` once. Returns `false` when the pair
    /// was already recorded, the idempotency signal for finalize retries.
    async fn record_redemption(
        &self,
        coupon_id: Uuid,
        order_id: Uuid,
    ) -> Result<bool, ServiceError>;

    async fn update_status(
        &self,
        coupon_id: Uuid,
        status: CouponStatus,
    ) -> Result<coupon::Model, ServiceError>;
}
