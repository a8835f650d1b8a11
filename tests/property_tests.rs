//! Property-based tests for the discount and totals invariants.
//!
//! These use proptest to verify the numeric bounds across a wide range of
//! inputs, catching edge cases the scenario tests might miss.

use chrono::Utc;
use coupon_engine::dto::{AppliedCouponDto, CartDto};
use coupon_engine::entities::coupon::{
    self, AppliesTo, CombinationPolicy, CouponKind, CouponStatus, DomainScope, NewCoupon,
};
use coupon_engine::services::{discount, totals};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn cart(subtotal_cents: i64) -> CartDto {
    CartDto {
        currency: "EUR".to_string(),
        subtotal_cents,
        customer_email: None,
        items: vec![],
    }
}

fn coupon(kind: CouponKind, percent: Option<i32>, value_cents: Option<i64>) -> coupon::Model {
    NewCoupon {
        store_id: Uuid::new_v4(),
        code: "PROP".to_string(),
        description: None,
        currency: "EUR".to_string(),
        kind,
        percent_discount: percent,
        value_cents,
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
    .expect("valid property coupon")
}

fn coupon_strategy() -> impl Strategy<Value = coupon::Model> {
    prop_oneof![
        (1i32..=100).prop_map(|p| coupon(CouponKind::Percent, Some(p), None)),
        (1i64..5_000_000).prop_map(|v| coupon(CouponKind::Fixed, None, Some(v))),
        Just(coupon(CouponKind::FreeShipping, None, None)),
    ]
}

fn subtotal_strategy() -> impl Strategy<Value = i64> {
    0i64..10_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Property: 0 <= discount <= subtotal, for every coupon and cart.
    #[test]
    fn discount_stays_within_bounds(
        coupon in coupon_strategy(),
        subtotal in subtotal_strategy(),
    ) {
        let discount_cents = discount::compute(&coupon, &cart(subtotal));
        prop_assert!(discount_cents >= 0);
        prop_assert!(discount_cents <= subtotal);
    }

    // Property: percent discounts floor, never round up.
    #[test]
    fn percent_discount_floors(
        percent in 1i32..=100,
        subtotal in subtotal_strategy(),
    ) {
        let c = coupon(CouponKind::Percent, Some(percent), None);
        let discount_cents = discount::compute(&c, &cart(subtotal));
        let exact = subtotal as i128 * percent as i128;
        prop_assert_eq!(discount_cents as i128, exact / 100);
        prop_assert!(discount_cents as i128 * 100 <= exact);
    }

    // Property: totals never go negative and the discount never exceeds
    // the subtotal, whatever stack of coupons applied.
    #[test]
    fn totals_invariants_hold(
        coupons in prop::collection::vec(coupon_strategy(), 0..5),
        subtotal in subtotal_strategy(),
        shipping in 0i64..5000,
        tax_permille in 0u32..1000,
    ) {
        let cart = cart(subtotal);
        let applied: Vec<AppliedCouponDto> = coupons
            .iter()
            .map(|c| AppliedCouponDto {
                coupon_id: c.id,
                code: c.code.clone(),
                kind: c.kind,
                discount_cents: discount::compute(c, &cart),
                message: String::new(),
            })
            .collect();

        let tax_rate = Decimal::new(tax_permille as i64, 3);
        let result = totals::aggregate(&cart, &applied, shipping, tax_rate);

        prop_assert!(result.total_cents >= 0);
        prop_assert!(result.discount_cents >= 0);
        prop_assert!(result.discount_cents <= result.subtotal_cents);
        prop_assert!(result.tax_cents >= 0);
        prop_assert_eq!(
            result.total_cents,
            result.subtotal_cents - result.discount_cents
                + result.shipping_cents
                + result.tax_cents
        );
    }

    // Property: free shipping zeroes the shipping column whenever any
    // applied coupon is a free-shipping one.
    #[test]
    fn free_shipping_always_wins(
        subtotal in subtotal_strategy(),
        shipping in 1i64..5000,
    ) {
        let cart = cart(subtotal);
        let c = coupon(CouponKind::FreeShipping, None, None);
        let applied = vec![AppliedCouponDto {
            coupon_id: c.id,
            code: c.code.clone(),
            kind: c.kind,
            discount_cents: 0,
            message: String::new(),
        }];

        let result = totals::aggregate(&cart, &applied, shipping, Decimal::ZERO);
        prop_assert_eq!(result.shipping_cents, 0);
    }
}
