use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        coupon, legacy_variation, option_group, option_value, product, product_variant, wilaya,
        Coupon, LegacyVariation, OptionGroup, OptionValue, Product, ProductVariant, Wilaya,
    },
    errors::ServiceError,
};

/// An option group together with its choosable values, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct OptionGroupWithValues {
    pub group: option_group::Model,
    pub values: Vec<option_value::Model>,
}

/// The variant model a product uses, selected by its `has_variants` flag.
/// The two models never mix for one product. A legacy product with no
/// variation rows is a plain single-price product.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum VariantModel {
    Modern {
        groups: Vec<OptionGroupWithValues>,
        variants: Vec<product_variant::Model>,
    },
    Legacy {
        variations: Vec<legacy_variation::Model>,
    },
}

/// A product as the storefront and the order builders consume it: the row
/// plus whichever variant model applies.
#[derive(Debug, Clone, Serialize)]
pub struct ProductOffering {
    pub product: product::Model,
    #[serde(flatten)]
    pub variants: VariantModel,
}

impl ProductOffering {
    /// Display name for an order line carrying `variant`: the product name
    /// plus the variant's value labels in option-group order.
    pub fn line_name(&self, variant: &product_variant::Model) -> String {
        let VariantModel::Modern { groups, .. } = &self.variants else {
            return self.product.name.clone();
        };
        let options = variant.option_map();
        let labels: Vec<&str> = groups
            .iter()
            .filter_map(|entry| options.get(&entry.group.name).map(String::as_str))
            .collect();
        if labels.is_empty() {
            self.product.name.clone()
        } else {
            format!("{} ({})", self.product.name, labels.join(" / "))
        }
    }
}

/// Read-only catalog lookups. Every query filters to active rows; a
/// failing lookup surfaces as a database error the callers treat as
/// "catalog unavailable" rather than a fatal fault.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<product::Model>, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    /// Like `find_product`, erroring when the product vanished between
    /// read and use.
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        self.find_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Fetches the product together with whichever variant model its
    /// `has_variants` flag selects.
    #[instrument(skip(self))]
    pub async fn get_offering(&self, product_id: Uuid) -> Result<ProductOffering, ServiceError> {
        let product = self.get_product(product_id).await?;
        let variants = if product.has_variants {
            let groups = self.list_option_groups_with_values(product_id).await?;
            let variants = ProductVariant::find()
                .filter(product_variant::Column::ProductId.eq(product_id))
                .filter(product_variant::Column::IsActive.eq(true))
                .all(&*self.db)
                .await?;
            VariantModel::Modern { groups, variants }
        } else {
            let variations = LegacyVariation::find()
                .filter(legacy_variation::Column::ProductId.eq(product_id))
                .filter(legacy_variation::Column::IsActive.eq(true))
                .all(&*self.db)
                .await?;
            VariantModel::Legacy { variations }
        };
        Ok(ProductOffering { product, variants })
    }

    /// Option groups of a product with their values, both ordered by
    /// position.
    #[instrument(skip(self))]
    pub async fn list_option_groups_with_values(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<OptionGroupWithValues>, ServiceError> {
        let groups = OptionGroup::find()
            .filter(option_group::Column::ProductId.eq(product_id))
            .order_by_asc(option_group::Column::Position)
            .all(&*self.db)
            .await?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let group_ids: Vec<Uuid> = groups.iter().map(|group| group.id).collect();
        let values = OptionValue::find()
            .filter(option_value::Column::GroupId.is_in(group_ids))
            .order_by_asc(option_value::Column::Position)
            .all(&*self.db)
            .await?;

        let mut by_group: HashMap<Uuid, Vec<option_value::Model>> = HashMap::new();
        for value in values {
            by_group.entry(value.group_id).or_default().push(value);
        }
        Ok(groups
            .into_iter()
            .map(|group| {
                let values = by_group.remove(&group.id).unwrap_or_default();
                OptionGroupWithValues { group, values }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_active_wilayas(&self) -> Result<Vec<wilaya::Model>, ServiceError> {
        Wilaya::find()
            .filter(wilaya::Column::IsActive.eq(true))
            .order_by_asc(wilaya::Column::Code)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    pub async fn get_wilaya(&self, wilaya_id: Uuid) -> Result<wilaya::Model, ServiceError> {
        Wilaya::find_by_id(wilaya_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Wilaya {} not found", wilaya_id)))
    }

    /// Active coupon with exactly this code. Case is not adjusted here;
    /// codes were uppercased when stored.
    #[instrument(skip(self))]
    pub async fn find_coupon_by_code(
        &self,
        code: &str,
    ) -> Result<Option<coupon::Model>, ServiceError> {
        Coupon::find()
            .filter(coupon::Column::Code.eq(code))
            .filter(coupon::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)
    }
}
