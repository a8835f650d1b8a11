//! Coupon state transitions: pause, resume, archive.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::coupon::{self, CouponStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::CouponRepository;

/// Owns the coupon status state machine: ACTIVE ⇄ PAUSED → ARCHIVED.
///
/// Consumed by the admin surface; the validation engine only ever reads the
/// resulting status.
#[derive(Clone)]
pub struct CouponLifecycle {
    repository: Arc<dyn CouponRepository>,
    event_sender: EventSender,
}

impl CouponLifecycle {
    pub fn new(repository: Arc<dyn CouponRepository>, event_sender: EventSender) -> Self {
        Self {
            repository,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn pause(&self, coupon_id: Uuid) -> Result<coupon::Model, ServiceError> {
        self.transition(coupon_id, CouponStatus::Paused).await
    }

    #[instrument(skip(self))]
    pub async fn resume(&self, coupon_id: Uuid) -> Result<coupon::Model, ServiceError> {
        self.transition(coupon_id, CouponStatus::Active).await
    }

    /// Archiving is terminal and idempotent: archiving an archived coupon
    /// returns it unchanged.
    #[instrument(skip(self))]
    pub async fn archive(&self, coupon_id: Uuid) -> Result<coupon::Model, ServiceError> {
        self.transition(coupon_id, CouponStatus::Archived).await
    }

    async fn transition(
        &self,
        coupon_id: Uuid,
        target: CouponStatus,
    ) -> Result<coupon::Model, ServiceError> {
        let current = self
            .repository
            .find_by_id(coupon_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))?;

        if current.status == CouponStatus::Archived && target == CouponStatus::Archived {
            return Ok(current);
        }

        if !current.status.can_transition_to(target) {
            return Err(ServiceError::InvalidStatus(format!(
                "Coupon {} cannot move from {} to {}",
                coupon_id, current.status, target
            )));
        }

        let old_status = current.status;
        let updated = self.repository.update_status(coupon_id, target).await?;

        self.event_sender
            .send_or_log(Event::CouponStatusChanged {
                coupon_id,
                old_status,
                new_status: target,
            })
            .await;

        info!("Coupon {} moved {} -> {}", coupon_id, old_status, target);
        Ok(updated)
    }
}
