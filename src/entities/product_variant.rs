use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Concrete purchasable configuration of a modern-model product: one chosen
/// value per option group, with its own absolute price and stock.
///
/// The creation paths guarantee that no two variants of a product carry the
/// same option combination, so a complete selection matches at most one row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    /// Option-group name → chosen value label, one entry per group.
    #[sea_orm(column_type = "Json")]
    pub options: Json,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decoded option map. A malformed row decodes to an empty map and will
    /// never match a non-empty selection.
    pub fn option_map(&self) -> HashMap<String, String> {
        serde_json::from_value(self.options.clone()).unwrap_or_default()
    }
}
