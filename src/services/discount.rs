//! Pure discount computation for one coupon against one cart snapshot.

use crate::dto::CartDto;
use crate::entities::coupon::{self, CouponKind};

/// Discount in cents for a coupon that already passed validation.
///
/// Total over all inputs; the result is clamped to `[0, subtotal]`.
/// A free-shipping coupon discounts nothing here; its effect is the
/// shipping flag the totals aggregator reads off the coupon kind.
pub fn compute(coupon: &coupon::Model, cart: &CartDto) -> i64 {
    let discount_cents = match coupon.kind {
        CouponKind::Percent => {
            let percent = i64::from(coupon.percent_discount.unwrap_or(0));
            // Integer division floors for non-negative operands.
            cart.subtotal_cents * percent / 100
        }
        CouponKind::Fixed => coupon.value_cents.unwrap_or(0),
        CouponKind::FreeShipping => 0,
    };

    discount_cents.clamp(0, cart.subtotal_cents.max(0))
}

/// Shopper-facing description of the granted discount.
pub fn shopper_message(coupon: &coupon::Model) -> String {
    match coupon.kind {
        CouponKind::Percent => format!("{}% Rabatt", coupon.percent_discount.unwrap_or(0)),
        CouponKind::Fixed => format!(
            "{} € Rabatt",
            format_euro_cents(coupon.value_cents.unwrap_or(0))
        ),
        CouponKind::FreeShipping => "Kostenloser Versand".to_string(),
    }
}

/// Formats cents as a German euro amount: whole euros bare, fractions with
/// a comma ("10", "10,50").
pub fn format_euro_cents(cents: i64) -> String {
    let euros = cents / 100;
    let remainder = (cents % 100).abs();
    if remainder == 0 {
        format!("{}", euros)
    } else {
        format!("{},{:02}", euros, remainder)
    }
}
