//! SeaORM entities for the storefront catalog, delivery regions, coupons,
//! and persisted orders.

pub mod coupon;
pub mod coupon_product;
pub mod legacy_variation;
pub mod option_group;
pub mod option_value;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;
pub mod wilaya;

// Re-export entities
pub use coupon::{DiscountType, Entity as Coupon, Model as CouponModel};
pub use coupon_product::{Entity as CouponProduct, Model as CouponProductModel};
pub use legacy_variation::{Entity as LegacyVariation, Model as LegacyVariationModel};
pub use option_group::{Entity as OptionGroup, Model as OptionGroupModel, OptionDisplayType};
pub use option_value::{Entity as OptionValue, Model as OptionValueModel};
pub use order::{DeliveryType, Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use wilaya::{Entity as Wilaya, Model as WilayaModel};
