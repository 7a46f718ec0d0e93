use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::entities::coupon::DiscountType;
use crate::entities::order::DeliveryType;
use crate::entities::wilaya;

/// A line item as the calculator sees it: a unit-price snapshot and a
/// quantity. Where the snapshot came from (base price, variant price,
/// legacy adjustment) is the resolver's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Flat per-order shipping rates of the chosen delivery region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRates {
    pub office: Decimal,
    pub home: Decimal,
}

impl From<&wilaya::Model> for ShippingRates {
    fn from(wilaya: &wilaya::Model) -> Self {
        Self {
            office: wilaya.office_price,
            home: wilaya.home_price,
        }
    }
}

/// Discount descriptor held once a coupon passes validation. It stays
/// static for the rest of the draft's life; expiry is only checked at the
/// moment of explicit application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDiscount {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
}

/// The four figures of an order: subtotal, flat shipping, discount, total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
}

/// Sum of `unit_price × quantity` over the lines. Prices are already whole
/// currency units; no rounding happens per line.
pub fn subtotal(lines: &[PricedLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum()
}

/// Flat per-order shipping charge. Zero until a region is chosen; the
/// delivery type only matters once one is.
pub fn shipping_cost(rates: Option<ShippingRates>, delivery_type: DeliveryType) -> Decimal {
    match rates {
        None => Decimal::ZERO,
        Some(rates) => match delivery_type {
            DeliveryType::Home => rates.home,
            DeliveryType::Office => rates.office,
        },
    }
}

/// Discount granted by `coupon` against `subtotal`. Percentage amounts
/// round half-up to whole currency units. Both kinds clamp to the subtotal:
/// a coupon can wipe out the goods portion but never eats into shipping.
pub fn discount_amount(subtotal: Decimal, coupon: Option<&CouponDiscount>) -> Decimal {
    let Some(coupon) = coupon else {
        return Decimal::ZERO;
    };
    let raw = match coupon.discount_type {
        DiscountType::Percentage => (subtotal * coupon.value / Decimal::from(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        DiscountType::Fixed => coupon.value,
    };
    raw.min(subtotal)
}

/// The authoritative checkout/admin quote: one flat shipping charge for the
/// whole order. The total is never clamped; with the discount bounded by
/// the subtotal and shipping non-negative it cannot go below zero.
pub fn quote(
    lines: &[PricedLine],
    rates: Option<ShippingRates>,
    delivery_type: DeliveryType,
    coupon: Option<&CouponDiscount>,
) -> OrderQuote {
    let subtotal = subtotal(lines);
    let shipping_cost = shipping_cost(rates, delivery_type);
    let discount_amount = discount_amount(subtotal, coupon);
    OrderQuote {
        subtotal,
        shipping_cost,
        discount_amount,
        total_amount: subtotal + shipping_cost - discount_amount,
    }
}
