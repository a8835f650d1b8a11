//! Usage finalization: recording coupon redemptions against confirmed orders.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entities::coupon::CouponStatus;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::CouponRepository;

/// Finalizes coupon usage when an order is confirmed.
///
/// Does not re-validate eligibility: a coupon that expired between
/// validation and order confirmation is still counted, because the order was
/// placed against the validated total. Retries for the same order are safe:
/// the redemption record absorbs them before any counter moves.
#[derive(Clone)]
pub struct UsageFinalizer {
    repository: Arc<dyn CouponRepository>,
    event_sender: EventSender,
}

/// What finalization did for one order.
///
/// A non-empty `rejections` list is the order-level signal that a
/// concurrent checkout spent a usage cap first; the order layer decides the
/// remediation (revoke the discount, flag for review).
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub order_id: Uuid,
    pub recorded: Vec<RecordedUsage>,
    pub rejections: Vec<UsageRejection>,
}

impl FinalizeOutcome {
    pub fn all_recorded(&self) -> bool {
        self.rejections.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedUsage {
    pub coupon_id: Uuid,
    pub code: String,
}

/// The conditional increment reported the usage cap already spent.
#[derive(Debug, Clone, Serialize)]
pub struct UsageRejection {
    pub coupon_id: Uuid,
    pub code: String,
}

impl UsageFinalizer {
    pub fn new(repository: Arc<dyn CouponRepository>, event_sender: EventSender) -> Self {
        Self {
            repository,
            event_sender,
        }
    }

    /// Records usage for every applied code of a confirmed order.
    #[instrument(skip(self, applied_codes), fields(store_id = %store_id, order_id = %order_id))]
    pub async fn finalize(
        &self,
        store_id: Uuid,
        order_id: Uuid,
        applied_codes: &[String],
    ) -> Result<FinalizeOutcome, ServiceError> {
        let mut outcome = FinalizeOutcome {
            order_id,
            recorded: Vec::new(),
            rejections: Vec::new(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        for raw in applied_codes {
            let trimmed = raw.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                continue;
            }

            let Some(coupon) = self.repository.find_by_code(store_id, trimmed).await? else {
                warn!("Skipping unknown code at finalize: {}", trimmed);
                continue;
            };

            if coupon.status != CouponStatus::Active {
                warn!(
                    "Skipping {} at finalize: coupon is {:?}",
                    coupon.code, coupon.status
                );
                continue;
            }

            // Idempotency gate: a retried finalize finds the redemption
            // already recorded and leaves the counter alone.
            if !self
                .repository
                .record_redemption(coupon.id, order_id)
                .await?
            {
                debug!(
                    "Redemption of {} already recorded for order {}",
                    coupon.code, order_id
                );
                continue;
            }

            if self
                .repository
                .increment_usage_if_under_limit(coupon.id)
                .await?
            {
                self.event_sender
                    .send_or_log(Event::CouponRedeemed {
                        coupon_id: coupon.id,
                        order_id,
                    })
                    .await;
                outcome.recorded.push(RecordedUsage {
                    coupon_id: coupon.id,
                    code: coupon.code,
                });
            } else {
                warn!(
                    "Usage limit spent while finalizing order {}: {}",
                    order_id, coupon.code
                );
                self.event_sender
                    .send_or_log(Event::CouponRedemptionRejected {
                        coupon_id: coupon.id,
                        order_id,
                    })
                    .await;
                outcome.rejections.push(UsageRejection {
                    coupon_id: coupon.id,
                    code: coupon.code,
                });
            }
        }

        info!(
            "Finalized order {}: {} recorded, {} rejected",
            order_id,
            outcome.recorded.len(),
            outcome.rejections.len()
        );
        Ok(outcome)
    }
}
