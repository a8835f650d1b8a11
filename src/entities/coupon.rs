use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;

/// Lifecycle state of a coupon. `Archived` is terminal.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponStatus {
    #[sea_orm(string_value = "active")]
    #[strum(serialize = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "paused")]
    #[strum(serialize = "PAUSED")]
    Paused,
    #[sea_orm(string_value = "archived")]
    #[strum(serialize = "ARCHIVED")]
    Archived,
}

impl CouponStatus {
    /// Legal transitions: ACTIVE ⇄ PAUSED, and either into ARCHIVED.
    /// Nothing leaves ARCHIVED.
    pub fn can_transition_to(self, next: CouponStatus) -> bool {
        match (self, next) {
            (CouponStatus::Active, CouponStatus::Paused) => true,
            (CouponStatus::Paused, CouponStatus::Active) => true,
            (CouponStatus::Active | CouponStatus::Paused, CouponStatus::Archived) => true,
            (CouponStatus::Archived, _) => false,
            _ => false,
        }
    }
}

/// Shape of the discount a coupon grants.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponKind {
    #[sea_orm(string_value = "percent")]
    #[strum(serialize = "PERCENT")]
    Percent,
    #[sea_orm(string_value = "fixed")]
    #[strum(serialize = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "free_shipping")]
    #[strum(serialize = "FREE_SHIPPING")]
    FreeShipping,
}

/// What part of the catalog the coupon applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppliesTo {
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "products")]
    Products,
    #[sea_orm(string_value = "categories")]
    Categories,
    #[sea_orm(string_value = "collections")]
    Collections,
}

/// Which storefront domains may redeem the coupon.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainScope {
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "selected")]
    Selected,
}

/// Whether the coupon may coexist with other simultaneously applied coupons.
///
/// Modeled but not enforced by the validation chain: every candidate is
/// evaluated independently and all valid discounts are summed. The aggregator
/// is the seam where a stacking policy would hook in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombinationPolicy {
    #[sea_orm(string_value = "none")]
    None,
    #[sea_orm(string_value = "stack_with_different_types")]
    StackWithDifferentTypes,
    #[sea_orm(string_value = "stack_all")]
    StackAll,
}

/// A store-scoped promotional rule identified by a code.
///
/// `code` is unique per store, case-insensitive (enforced by a unique index
/// on `(store_id, lower(code))` in the backing schema). `times_used_total`
/// only ever grows, and only through the repository's conditional increment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub currency: String,
    pub kind: CouponKind,
    pub percent_discount: Option<i32>,
    pub value_cents: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub min_subtotal_cents: Option<i64>,
    pub applies_to: AppliesTo,
    #[sea_orm(column_type = "Json", nullable)]
    pub applies_to_ids: Option<Json>,
    pub domain_scope: DomainScope,
    #[sea_orm(column_type = "Json", nullable)]
    pub domain_ids: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub customer_emails: Option<Json>,
    pub usage_limit_total: Option<i32>,
    pub usage_limit_per_customer: Option<i32>,
    pub times_used_total: i32,
    pub combinable: CombinationPolicy,
    pub status: CouponStatus,
    pub auto_apply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coupon_redemption::Entity")]
    Redemptions,
}

impl Related<super::coupon_redemption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Redemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Case-insensitive code comparison; the stored casing stays canonical.
    pub fn matches_code(&self, raw: &str) -> bool {
        self.code.eq_ignore_ascii_case(raw.trim())
    }

    /// True once the total usage cap has been spent.
    pub fn usage_exhausted(&self) -> bool {
        match self.usage_limit_total {
            Some(limit) => self.times_used_total >= limit,
            None => false,
        }
    }
}

/// Payload for creating a coupon.
///
/// `into_model` is the single construction path and rejects payloads where
/// the discount fields disagree with `kind`, so a `Model` with both (or
/// neither) of `percent_discount`/`value_cents` for a discounting kind
/// cannot exist.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCoupon {
    pub store_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub description: Option<String>,
    pub currency: String,
    pub kind: CouponKind,
    #[validate(range(min = 1, max = 100))]
    pub percent_discount: Option<i32>,
    #[validate(range(min = 1))]
    pub value_cents: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub min_subtotal_cents: Option<i64>,
    pub applies_to: AppliesTo,
    pub applies_to_ids: Option<Json>,
    pub domain_scope: DomainScope,
    pub domain_ids: Option<Json>,
    pub customer_emails: Option<Json>,
    pub usage_limit_total: Option<i32>,
    pub usage_limit_per_customer: Option<i32>,
    pub combinable: CombinationPolicy,
    pub status: CouponStatus,
    pub auto_apply: bool,
}

impl NewCoupon {
    pub fn into_model(self, now: DateTime<Utc>) -> Result<Model, ServiceError> {
        self.validate()?;

        match self.kind {
            CouponKind::Percent => {
                if self.percent_discount.is_none() || self.value_cents.is_some() {
                    return Err(ServiceError::InvalidInput(
                        "percent coupons carry percent_discount and no value_cents".to_string(),
                    ));
                }
            }
            CouponKind::Fixed => {
                if self.value_cents.is_none() || self.percent_discount.is_some() {
                    return Err(ServiceError::InvalidInput(
                        "fixed coupons carry value_cents and no percent_discount".to_string(),
                    ));
                }
            }
            CouponKind::FreeShipping => {
                if self.percent_discount.is_some() || self.value_cents.is_some() {
                    return Err(ServiceError::InvalidInput(
                        "free shipping coupons carry no discount amount".to_string(),
                    ));
                }
            }
        }

        Ok(Model {
            id: Uuid::new_v4(),
            store_id: self.store_id,
            code: self.code,
            description: self.description,
            currency: self.currency,
            kind: self.kind,
            percent_discount: self.percent_discount,
            value_cents: self.value_cents,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            min_subtotal_cents: self.min_subtotal_cents,
            applies_to: self.applies_to,
            applies_to_ids: self.applies_to_ids,
            domain_scope: self.domain_scope,
            domain_ids: self.domain_ids,
            customer_emails: self.customer_emails,
            usage_limit_total: self.usage_limit_total,
            usage_limit_per_customer: self.usage_limit_per_customer,
            times_used_total: 0,
            combinable: self.combinable,
            status: self.status,
            auto_apply: self.auto_apply,
            created_at: now,
            updated_at: now,
        })
    }
}
