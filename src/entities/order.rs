use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Status every order carries at creation.
pub const STATUS_NEW: &str = "new";

/// Persisted order header. The money columns are snapshots of the quote
/// computed at submission; they are never recomputed from the items.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 50,
        message = "Order number must be between 1 and 50 characters"
    ))]
    pub order_number: String,

    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya_id: Option<Uuid>,
    pub delivery_type: DeliveryType,
    /// Street address, required for home delivery.
    pub address: Option<String>,
    pub payment_method: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub shipping_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::wilaya::Entity",
        from = "Column::WilayaId",
        to = "super::wilaya::Column::Id"
    )]
    Wilaya,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::wilaya::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wilaya.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Where the parcel goes: office/pickup point or the customer's door.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    #[sea_orm(string_value = "office")]
    Office,
    #[default]
    #[sea_orm(string_value = "home")]
    Home,
}
