//! Wire shapes of the engine's request/response contract.
//!
//! Field names are part of the contract (camelCase on the wire); the structs
//! round-trip through serde so embedders can reuse them on either side.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::coupon::CouponKind;

/// Request to validate a set of coupon codes against a cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponsRequest {
    pub domain_host: String,
    pub cart: CartDto,
    #[serde(default)]
    pub applied_codes: Vec<String>,
}

/// Same shape as validation, additionally keyed by the confirmed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeCouponsRequest {
    pub domain_host: String,
    pub order_id: Uuid,
    pub cart: CartDto,
    #[serde(default)]
    pub applied_codes: Vec<String>,
}

/// Ephemeral cart snapshot; never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub currency: String,
    pub subtotal_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItemDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub product_id: String,
    pub product_name: String,
    pub price_cents: i64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_ids: Option<Vec<String>>,
}

/// Why a candidate code was rejected. The first failing check of the
/// ordered chain decides; `AlreadyApplied` belongs to the caller layer that
/// detects resubmission of a code it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    CodeNotFound,
    NotActive,
    Expired,
    NotYetValid,
    BelowMinimumSubtotal,
    UsageLimitReached,
    AlreadyApplied,
}

/// A coupon that passed every check, with its computed discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCouponDto {
    pub coupon_id: Uuid,
    /// Stored casing, regardless of how the shopper typed the code.
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub discount_cents: i64,
    pub message: String,
}

/// A candidate code that failed a check, with the shopper-facing text
/// (carries the formatted minimum for BELOW_MINIMUM_SUBTOTAL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedCouponDto {
    pub code: String,
    pub reason: RejectionReason,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotalsDto {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponsResponse {
    pub valid_coupons: Vec<AppliedCouponDto>,
    pub invalid_coupons: Vec<RejectedCouponDto>,
    pub cart_totals: CartTotalsDto,
}
