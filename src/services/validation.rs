//! Evaluation of candidate coupon codes against a cart snapshot.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dto::{
    AppliedCouponDto, CartDto, RejectedCouponDto, RejectionReason, ValidateCouponsResponse,
};
use crate::entities::coupon::{self, CouponStatus};
use crate::errors::ServiceError;
use crate::repositories::CouponRepository;
use crate::services::{discount, totals};

/// Validation engine: decides which codes apply to a cart and computes the
/// resulting totals.
///
/// Read-only and re-entrant, safe to run concurrently for different carts.
/// Usage counters are written elsewhere, on order completion only.
#[derive(Clone)]
pub struct ValidationEngine {
    repository: Arc<dyn CouponRepository>,
    config: Arc<AppConfig>,
}

/// A candidate code: explicit codes are looked up, auto-apply candidates
/// arrive with their coupon already fetched.
struct Candidate {
    raw: String,
    prefetched: Option<coupon::Model>,
}

impl ValidationEngine {
    pub fn new(repository: Arc<dyn CouponRepository>, config: Arc<AppConfig>) -> Self {
        Self { repository, config }
    }

    /// Validates explicit codes plus the store's auto-apply coupons against
    /// the cart, as of now.
    #[instrument(skip(self, cart, explicit_codes), fields(store_id = %store_id))]
    pub async fn validate(
        &self,
        store_id: Uuid,
        cart: &CartDto,
        explicit_codes: &[String],
    ) -> Result<ValidateCouponsResponse, ServiceError> {
        self.validate_at(store_id, cart, explicit_codes, Utc::now())
            .await
    }

    /// Same as `validate` with the clock as an argument; the seam tests use
    /// to pin eligibility windows.
    pub async fn validate_at(
        &self,
        store_id: Uuid,
        cart: &CartDto,
        explicit_codes: &[String],
        now: DateTime<Utc>,
    ) -> Result<ValidateCouponsResponse, ServiceError> {
        check_cart(cart)?;

        let candidates = self.collect_candidates(store_id, explicit_codes).await?;

        let mut valid_coupons = Vec::new();
        let mut invalid_coupons = Vec::new();

        for candidate in candidates {
            let coupon = match candidate.prefetched {
                Some(model) => Some(model),
                None => {
                    self.repository
                        .find_by_code(store_id, &candidate.raw)
                        .await?
                }
            };

            let Some(coupon) = coupon else {
                invalid_coupons.push(RejectedCouponDto {
                    code: candidate.raw,
                    reason: RejectionReason::CodeNotFound,
                    message: "Gutscheincode nicht gefunden".to_string(),
                });
                continue;
            };

            match first_failed_check(&coupon, cart, now) {
                None => {
                    let discount_cents = discount::compute(&coupon, cart);
                    debug!(
                        "Coupon {} valid for cart: {} cents off",
                        coupon.code, discount_cents
                    );
                    valid_coupons.push(AppliedCouponDto {
                        coupon_id: coupon.id,
                        code: coupon.code.clone(),
                        kind: coupon.kind,
                        discount_cents,
                        message: discount::shopper_message(&coupon),
                    });
                }
                Some((reason, message)) => {
                    debug!("Coupon {} rejected: {:?}", coupon.code, reason);
                    invalid_coupons.push(RejectedCouponDto {
                        // Stored casing, matching what a valid result shows.
                        code: coupon.code.clone(),
                        reason,
                        message,
                    });
                }
            }
        }

        let cart_totals = totals::aggregate(
            cart,
            &valid_coupons,
            self.config.shipping_base_cents,
            self.config.tax_rate(),
        );

        Ok(ValidateCouponsResponse {
            valid_coupons,
            invalid_coupons,
            cart_totals,
        })
    }

    /// Explicit codes in submission order, then auto-apply coupons not
    /// already present; duplicates collapse case-insensitively.
    async fn collect_candidates(
        &self,
        store_id: Uuid,
        explicit_codes: &[String],
    ) -> Result<Vec<Candidate>, ServiceError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();

        for raw in explicit_codes {
            let trimmed = raw.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                continue;
            }
            candidates.push(Candidate {
                raw: trimmed.to_string(),
                prefetched: None,
            });
        }

        for model in self.repository.list_auto_apply(store_id).await? {
            if seen.insert(model.code.to_lowercase()) {
                candidates.push(Candidate {
                    raw: model.code.clone(),
                    prefetched: Some(model),
                });
            }
        }

        Ok(candidates)
    }
}

/// Structural request checks; failures here abort the whole call instead of
/// becoming per-code results.
fn check_cart(cart: &CartDto) -> Result<(), ServiceError> {
    if cart.currency.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "cart currency must not be empty".to_string(),
        ));
    }
    if cart.subtotal_cents < 0 {
        return Err(ServiceError::ValidationError(
            "cart subtotal must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// The ordered, short-circuiting check chain. The first failing check
/// decides the rejection; later checks are not consulted.
fn first_failed_check(
    coupon: &coupon::Model,
    cart: &CartDto,
    now: DateTime<Utc>,
) -> Option<(RejectionReason, String)> {
    if coupon.status != CouponStatus::Active {
        return Some((
            RejectionReason::NotActive,
            "Gutschein ist nicht aktiv".to_string(),
        ));
    }

    if let Some(ends_at) = coupon.ends_at {
        if now > ends_at {
            return Some((
                RejectionReason::Expired,
                "Gutschein ist abgelaufen".to_string(),
            ));
        }
    }

    if let Some(starts_at) = coupon.starts_at {
        if now < starts_at {
            return Some((
                RejectionReason::NotYetValid,
                "Gutschein ist noch nicht gültig".to_string(),
            ));
        }
    }

    if let Some(min_subtotal_cents) = coupon.min_subtotal_cents {
        if cart.subtotal_cents < min_subtotal_cents {
            return Some((
                RejectionReason::BelowMinimumSubtotal,
                format!(
                    "Mindestbestellwert von {} € nicht erreicht",
                    discount::format_euro_cents(min_subtotal_cents)
                ),
            ));
        }
    }

    if coupon.usage_exhausted() {
        return Some((
            RejectionReason::UsageLimitReached,
            "Gutschein wurde bereits zu oft eingelöst".to_string(),
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::coupon::{
        AppliesTo, CombinationPolicy, CouponKind, DomainScope, NewCoupon,
    };
    use chrono::Duration;

    fn cart(subtotal_cents: i64) -> CartDto {
        CartDto {
            currency: "EUR".to_string(),
            subtotal_cents,
            customer_email: None,
            items: vec![],
        }
    }

    fn base_coupon() -> coupon::Model {
        NewCoupon {
            store_id: Uuid::new_v4(),
            code: "SAVE20".to_string(),
            description: None,
            currency: "EUR".to_string(),
            kind: CouponKind::Percent,
            percent_discount: Some(20),
            value_cents: None,
            starts_at: None,
            ends_at: None,
            min_subtotal_cents: None,
            applies_to: AppliesTo::All,
            applies_to_ids: None,
            domain_scope: DomainScope::All,
            domain_ids: None,
            customer_emails: None,
            usage_limit_total: None,
            usage_limit_per_customer: None,
            combinable: CombinationPolicy::StackAll,
            status: CouponStatus::Active,
            auto_apply: false,
        }
        .into_model(Utc::now())
        .unwrap()
    }

    #[test]
    fn paused_coupon_fails_first() {
        let mut coupon = base_coupon();
        coupon.status = CouponStatus::Paused;
        // Also expired; the status check still wins.
        coupon.ends_at = Some(Utc::now() - Duration::days(1));

        let (reason, _) = first_failed_check(&coupon, &cart(10000), Utc::now()).unwrap();
        assert_eq!(reason, RejectionReason::NotActive);
    }

    #[test]
    fn expired_checked_before_not_yet_valid() {
        let mut coupon = base_coupon();
        // A window that is over and (contradictorily) not yet begun;
        // the chain reports EXPIRED.
        coupon.ends_at = Some(Utc::now() - Duration::days(2));
        coupon.starts_at = Some(Utc::now() + Duration::days(2));

        let (reason, _) = first_failed_check(&coupon, &cart(10000), Utc::now()).unwrap();
        assert_eq!(reason, RejectionReason::Expired);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut coupon = base_coupon();
        coupon.starts_at = Some(now);
        coupon.ends_at = Some(now);

        assert!(first_failed_check(&coupon, &cart(10000), now).is_none());
    }

    #[test]
    fn minimum_subtotal_message_carries_amount() {
        let mut coupon = base_coupon();
        coupon.min_subtotal_cents = Some(5000);

        let (reason, message) = first_failed_check(&coupon, &cart(1000), Utc::now()).unwrap();
        assert_eq!(reason, RejectionReason::BelowMinimumSubtotal);
        assert_eq!(message, "Mindestbestellwert von 50 € nicht erreicht");
    }

    #[test]
    fn usage_limit_is_last_check() {
        let mut coupon = base_coupon();
        coupon.usage_limit_total = Some(5);
        coupon.times_used_total = 5;
        coupon.min_subtotal_cents = Some(5000);

        // Below minimum wins over the exhausted cap.
        let (reason, _) = first_failed_check(&coupon, &cart(1000), Utc::now()).unwrap();
        assert_eq!(reason, RejectionReason::BelowMinimumSubtotal);

        let (reason, _) = first_failed_check(&coupon, &cart(10000), Utc::now()).unwrap();
        assert_eq!(reason, RejectionReason::UsageLimitReached);
    }

    #[test]
    fn eligible_coupon_passes() {
        let coupon = base_coupon();
        assert!(first_failed_check(&coupon, &cart(10000), Utc::now()).is_none());
    }

    #[test]
    fn structural_cart_checks() {
        assert!(check_cart(&cart(0)).is_ok());
        assert!(check_cart(&cart(-1)).is_err());
        let mut no_currency = cart(100);
        no_currency.currency = " ".to_string();
        assert!(check_cart(&no_currency).is_err());
    }
}
