//! CSV export row contract for the coupon list.
//!
//! The column order is a compatibility surface consumed by the admin
//! dashboard's download; the file rendering itself lives outside the engine.

use crate::entities::coupon::{self, CouponKind};
use crate::services::discount::format_euro_cents;

pub const EXPORT_COLUMNS: [&str; 6] = ["ID", "Code", "Type", "Discount", "Status", "Uses"];

pub fn header_line() -> String {
    EXPORT_COLUMNS.join(",")
}

/// One coupon as an export row, in `EXPORT_COLUMNS` order.
pub fn export_row(coupon: &coupon::Model) -> [String; 6] {
    [
        coupon.id.to_string(),
        coupon.code.clone(),
        coupon.kind.to_string(),
        discount_column(coupon),
        coupon.status.to_string(),
        coupon.times_used_total.to_string(),
    ]
}

pub fn row_line(coupon: &coupon::Model) -> String {
    export_row(coupon).join(",")
}

fn discount_column(coupon: &coupon::Model) -> String {
    match coupon.kind {
        CouponKind::Percent => format!("{}%", coupon.percent_discount.unwrap_or(0)),
        CouponKind::Fixed => format!("{} €", format_euro_cents(coupon.value_cents.unwrap_or(0))),
        CouponKind::FreeShipping => "-".to_string(),
    }
}
