//! Cart totals aggregation: discounts, shipping policy, and tax.

use rust_decimal::Decimal;

use crate::dto::{AppliedCouponDto, CartDto, CartTotalsDto};
use crate::entities::coupon::CouponKind;

/// Combines per-coupon discounts, the shipping policy, and the tax rate into
/// final cart totals.
///
/// All rounding floors toward zero on integer cents. The summed discount is
/// clamped at the subtotal, which keeps `discount_cents <= subtotal_cents`
/// and `total_cents >= 0` without further guards. Stacking is additive:
/// every valid coupon contributes its discount regardless of the others'
/// combination policy. The single summing site below is where a stacking
/// policy would hook in, should one ever be defined.
pub fn aggregate(
    cart: &CartDto,
    applied: &[AppliedCouponDto],
    shipping_base_cents: i64,
    tax_rate: Decimal,
) -> CartTotalsDto {
    use rust_decimal::prelude::ToPrimitive;

    let subtotal_cents = cart.subtotal_cents.max(0);

    let summed: i64 = applied.iter().map(|coupon| coupon.discount_cents).sum();
    let discount_cents = summed.min(subtotal_cents);

    let has_free_shipping = applied
        .iter()
        .any(|coupon| coupon.kind == CouponKind::FreeShipping);
    let shipping_cents = if has_free_shipping {
        0
    } else {
        shipping_base_cents
    };

    let taxable_cents = subtotal_cents - discount_cents;
    let tax_cents = (Decimal::from(taxable_cents) * tax_rate)
        .floor()
        .to_i64()
        .unwrap_or(0);

    let total_cents = (subtotal_cents - discount_cents + shipping_cents + tax_cents).max(0);

    CartTotalsDto {
        subtotal_cents,
        discount_cents,
        shipping_cents,
        tax_cents,
        total_cents,
        currency: cart.currency.clone(),
    }
}
