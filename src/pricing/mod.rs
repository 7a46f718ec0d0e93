//! Pure order-pricing core.
//!
//! Everything in this module is deterministic and free of I/O: the
//! checkout/admin price calculator, the variant resolver for the two
//! coexisting variant models, and the pre-checkout cart shipping estimate.
//! The stateful services call into these functions instead of carrying
//! their own arithmetic, so every surface charges the same way.

pub mod calculator;
pub mod estimate;
pub mod resolver;

pub use calculator::{
    discount_amount, quote, shipping_cost, subtotal, CouponDiscount, OrderQuote, PricedLine,
    ShippingRates,
};
pub use estimate::{estimate_cart, CartEstimate, CartLine};
pub use resolver::{
    effective_stock, effective_unit_price, legacy_by_type, legacy_unit_price, resolve_variant,
    VariantResolution,
};
