use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog product. `has_variants` is the discriminator between the two
/// variant models: option-group variants when true, legacy single-dimension
/// variations otherwise. A product never uses both at once.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    /// NULL means the stock was never set; readers treat it as zero.
    pub stock: Option<i32>,
    pub is_active: bool,
    pub has_variants: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::option_group::Entity")]
    OptionGroups,
    #[sea_orm(has_many = "super::product_variant::Entity")]
    ProductVariants,
    #[sea_orm(has_many = "super::legacy_variation::Entity")]
    LegacyVariations,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::option_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OptionGroups.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariants.def()
    }
}

impl Related<super::legacy_variation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LegacyVariations.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Units available for deduction. Untracked (NULL) stock counts as zero.
    pub fn available_stock(&self) -> i32 {
        self.stock.unwrap_or(0)
    }
}
