use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One choosable value inside an option group ("Red", "XL"). `color_hex`
/// backs swatch rendering and is absent for label groups.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "option_values")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub label: String,
    pub color_hex: Option<String>,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::option_group::Entity",
        from = "Column::GroupId",
        to = "super::option_group::Column::Id"
    )]
    OptionGroup,
}

impl Related<super::option_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OptionGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
