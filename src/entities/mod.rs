/// Persistent entities owned by the coupon engine
pub mod coupon;
pub mod coupon_redemption;

// Re-export entities
pub use coupon::{
    AppliesTo, CombinationPolicy, CouponKind, CouponStatus, Entity as Coupon,
    Model as CouponModel, NewCoupon,
};
pub use coupon_redemption::{Entity as CouponRedemption, Model as CouponRedemptionModel};
