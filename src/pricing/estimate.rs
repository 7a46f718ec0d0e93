use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculator::PricedLine;

/// A cart line as the pre-checkout summary sees it: the line's own region
/// shipping rate travels with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub unit_price: Decimal,
    pub quantity: i32,
    pub shipping_rate: Decimal,
}

/// Pre-checkout cart summary. `estimated_shipping` sums each line's own
/// rate × quantity, an estimate shown before a delivery region is final.
/// Checkout charges one flat rate per order instead
/// (`calculator::shipping_cost`); the two figures are different stages and
/// are deliberately not reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEstimate {
    pub subtotal: Decimal,
    pub estimated_shipping: Decimal,
    pub estimated_total: Decimal,
}

pub fn estimate_cart(lines: &[CartLine]) -> CartEstimate {
    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|line| PricedLine {
            unit_price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();
    let subtotal = super::calculator::subtotal(&priced);
    let estimated_shipping: Decimal = lines
        .iter()
        .map(|line| line.shipping_rate * Decimal::from(line.quantity))
        .sum();
    CartEstimate {
        subtotal,
        estimated_shipping,
        estimated_total: subtotal + estimated_shipping,
    }
}
