use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::entities::coupon::{self, CouponStatus};
use crate::errors::ServiceError;
use crate::repositories::CouponRepository;

/// In-memory repository for tests and embedders without a database.
///
/// Backed by dashmap; `get_mut` holds the shard write lock for the key, so
/// the conditional increment is check-and-write under one lock and the
/// at-most-limit guarantee holds across concurrent tasks in this process.
#[derive(Debug, Default)]
pub struct InMemoryCouponRepository {
    coupons: DashMap<Uuid, coupon::Model>,
    redemptions: DashMap<(Uuid, Uuid), DateTime<Utc>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, model: coupon::Model) {
        self.coupons.insert(model.id, model);
    }

    pub fn get(&self, coupon_id: Uuid) -> Option<coupon::Model> {
        self.coupons.get(&coupon_id).map(|entry| entry.clone())
    }

    pub fn redemption_count(&self) -> usize {
        self.redemptions.len()
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn find_by_id(&self, coupon_id: Uuid) -> Result<Option<coupon::Model>, ServiceError> {
        Ok(self.get(coupon_id))
    }

    async fn find_by_code(
        &self,
        store_id: Uuid,
        code: &str,
    ) -> Result<Option<coupon::Model>, ServiceError> {
        Ok(self
            .coupons
            .iter()
            .find(|entry| entry.store_id == store_id && entry.matches_code(code))
            .map(|entry| entry.clone()))
    }

    async fn list_auto_apply(&self, store_id: Uuid) -> Result<Vec<coupon::Model>, ServiceError> {
        let mut matches: Vec<coupon::Model> = self
            .coupons
            .iter()
            .filter(|entry| {
                entry.store_id == store_id
                    && entry.status == CouponStatus::Active
                    && entry.auto_apply
            })
            .map(|entry| entry.clone())
            .collect();
        matches.sort_by_key(|model| model.created_at);
        Ok(matches)
    }

    async fn increment_usage_if_under_limit(
        &self,
        coupon_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let Some(mut entry) = self.coupons.get_mut(&coupon_id) else {
            return Ok(false);
        };

        if entry.status != CouponStatus::Active || entry.usage_exhausted() {
            return Ok(false);
        }

        entry.times_used_total += 1;
        entry.updated_at = Utc::now();
        Ok(true)
    }

    async fn record_redemption(
        &self,
        coupon_id: Uuid,
        order_id: Uuid,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .redemptions
            .insert((coupon_id, order_id), Utc::now())
            .is_none())
    }

    async fn update_status(
        &self,
        coupon_id: Uuid,
        status: CouponStatus,
    ) -> Result<coupon::Model, ServiceError> {
        let mut entry = self
            .coupons
            .get_mut(&coupon_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))?;

        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
