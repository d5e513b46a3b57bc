//! Integer-cent pricing.
//!
//! All amounts are `i64` cents. Discounts are whole percentages clamped to
//! `0..=100`; the discounted unit price is rounded half up to the cent, and
//! line totals multiply that rounded unit price by the quantity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "money_test.rs"]
mod tests;

/// Clamp a discount percentage into `0..=100`.
#[must_use]
pub fn clamp_discount(discount_percent: i32) -> i64 {
    i64::from(discount_percent.clamp(0, 100))
}

/// Unit price after applying the product discount.
#[must_use]
pub fn discounted_unit_price(price_cents: i64, discount_percent: i32) -> i64 {
    let remaining = 100 - clamp_discount(discount_percent);
    (price_cents * remaining + 50) / 100
}

#[must_use]
pub fn line_total(unit_price_cents: i64, quantity: i32) -> i64 {
    unit_price_cents * i64::from(quantity)
}

/// Render cents as a decimal amount, e.g. `1234` -> `"12.34"`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// One cart row as seen by checkout, before pricing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub artisan_id: Uuid,
    pub quantity: i32,
    pub price_cents: i64,
    pub discount_percent: i32,
}

/// A cart row with its frozen unit price, ready to become an order item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub artisan_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPlan {
    pub lines: Vec<PricedLine>,
    pub total_cents: i64,
}

/// Price every cart line and sum the order total.
#[must_use]
pub fn plan_checkout(lines: &[CartLine]) -> CheckoutPlan {
    let lines: Vec<PricedLine> = lines
        .iter()
        .map(|line| {
            let unit = discounted_unit_price(line.price_cents, line.discount_percent);
            PricedLine {
                product_id: line.product_id,
                artisan_id: line.artisan_id,
                quantity: line.quantity,
                unit_price_cents: unit,
                line_total_cents: line_total(unit, line.quantity),
            }
        })
        .collect();
    let total_cents = lines.iter().map(|l| l.line_total_cents).sum();
    CheckoutPlan { lines, total_cents }
}
