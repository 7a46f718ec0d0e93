use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    cache::TtlCache,
    db::DbPool,
    entities::{
        legacy_variation, order, order_item, product, product_variant, DeliveryType, Order,
        OrderItem,
    },
    errors::{FieldError, ServiceError},
    events::{Event, EventSender},
    pricing::{self, CouponDiscount, PricedLine, ShippingRates},
    services::catalog::{CatalogService, ProductOffering, VariantModel},
    services::stock::StockService,
};

/// One line of an in-progress order. `name` and `unit_price` are resolved
/// when the line is added and stay fixed; later selection changes never
/// re-price an added line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub variant_id: Option<Uuid>,
    pub image_url: Option<String>,
}

impl DraftItem {
    /// Line for a product sold at its base price.
    pub fn base(product: &product::Model) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            variant_id: None,
            image_url: product.image_url.clone(),
        }
    }

    /// Line for a resolved variant of a modern-model product.
    pub fn for_variant(offering: &ProductOffering, variant: &product_variant::Model) -> Self {
        Self {
            product_id: offering.product.id,
            name: offering.line_name(variant),
            unit_price: variant.price,
            quantity: 1,
            variant_id: Some(variant.id),
            image_url: variant
                .image_url
                .clone()
                .or_else(|| offering.product.image_url.clone()),
        }
    }

    /// Line for a legacy variation: the price delta is applied here, once.
    pub fn for_legacy(product: &product::Model, variation: &legacy_variation::Model) -> Self {
        Self {
            product_id: product.id,
            name: format!(
                "{} ({}: {})",
                product.name, variation.variation_type, variation.variation_value
            ),
            unit_price: pricing::legacy_unit_price(product.price, variation),
            quantity: 1,
            variant_id: Some(variation.id),
            image_url: product.image_url.clone(),
        }
    }
}

/// The in-memory order being put together, before submission. Lives only
/// with its caller; nothing is persisted until `submit_order` succeeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya_id: Option<Uuid>,
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    /// Held once the coupon was explicitly applied; not re-checked on
    /// later recomputations.
    pub coupon: Option<CouponDiscount>,
    pub items: Vec<DraftItem>,
}

impl OrderDraft {
    pub fn add_item(&mut self, item: DraftItem) {
        self.items.push(item);
    }

    pub fn increment_item(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.quantity += 1;
        }
    }

    /// Quantities never drop below one; removing a line is a separate
    /// action.
    pub fn decrement_item(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.quantity = (item.quantity - 1).max(1);
        }
    }

    pub fn remove_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn priced_lines(&self) -> Vec<PricedLine> {
        self.items
            .iter()
            .map(|item| PricedLine {
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya_id: Option<Uuid>,
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub variant_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Sequences a draft through validation, order-number assignment,
/// persistence, and stock deduction.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    catalog: Arc<CatalogService>,
    stock: StockService,
    event_sender: Option<Arc<EventSender>>,
    list_cache: Arc<TtlCache<(u64, u64), OrderListResponse>>,
}

impl OrderService {
    pub fn new(
        db: Arc<DbPool>,
        catalog: Arc<CatalogService>,
        stock: StockService,
        event_sender: Option<Arc<EventSender>>,
        list_cache_ttl: Duration,
    ) -> Self {
        Self {
            db,
            catalog,
            stock,
            event_sender,
            list_cache: Arc::new(TtlCache::new(list_cache_ttl)),
        }
    }

    /// Submits a draft.
    ///
    /// The persistence steps run as separate sequential statements, not
    /// one spanning transaction: the header lands before the items, and
    /// stock deductions already applied when a later step fails stay
    /// applied. Callers keep the draft on failure and may simply submit
    /// again.
    #[instrument(skip(self, draft), fields(customer = %draft.customer_name, items = draft.items.len()))]
    pub async fn submit_order(&self, draft: &OrderDraft) -> Result<OrderResponse, ServiceError> {
        self.validate_draft(draft).await?;

        let rates = match draft.wilaya_id {
            Some(wilaya_id) => Some(ShippingRates::from(
                &self.catalog.get_wilaya(wilaya_id).await?,
            )),
            None => None,
        };
        let quote = pricing::quote(
            &draft.priced_lines(),
            rates,
            draft.delivery_type,
            draft.coupon.as_ref(),
        );

        let latest = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .one(&*self.db)
            .await?;
        let order_number =
            next_order_number(latest.as_ref().map(|order| order.order_number.as_str()));

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let header = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_name: Set(draft.customer_name.trim().to_string()),
            customer_phone: Set(draft.customer_phone.trim().to_string()),
            wilaya_id: Set(draft.wilaya_id),
            delivery_type: Set(draft.delivery_type),
            address: Set(draft.address.clone()),
            payment_method: Set(draft.payment_method.clone()),
            subtotal: Set(quote.subtotal),
            shipping_cost: Set(quote.shipping_cost),
            discount_amount: Set(quote.discount_amount),
            coupon_code: Set(draft.coupon.as_ref().map(|coupon| coupon.code.clone())),
            total_amount: Set(quote.total_amount),
            status: Set(order::STATUS_NEW.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        let item_models: Vec<order_item::ActiveModel> = draft
            .items
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                name: Set(item.name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                variant_id: Set(item.variant_id),
                image_url: Set(item.image_url.clone()),
                created_at: Set(now),
            })
            .collect();
        OrderItem::insert_many(item_models).exec(&*self.db).await?;

        // One deduction per distinct product, quantities summed across its
        // lines.
        let mut per_product: BTreeMap<Uuid, i32> = BTreeMap::new();
        for item in &draft.items {
            *per_product.entry(item.product_id).or_insert(0) += item.quantity;
        }
        for (product_id, quantity) in per_product {
            self.stock.deduct(product_id, quantity).await?;
        }

        self.list_cache.invalidate_all();

        if let Some(sender) = &self.event_sender {
            if let Err(error) = sender
                .send(Event::OrderCreated {
                    order_id,
                    order_number: order_number.clone(),
                })
                .await
            {
                warn!(%order_id, error, "failed to send order created event");
            }
            if let Some(coupon) = &draft.coupon {
                if let Err(error) = sender
                    .send(Event::CouponApplied {
                        order_id,
                        code: coupon.code.clone(),
                    })
                    .await
                {
                    warn!(%order_id, error, "failed to send coupon applied event");
                }
            }
        }

        info!(%order_id, %order_number, total = %header.total_amount, "order submitted");
        Ok(model_to_response(header))
    }

    /// Collects every field-level problem before any write happens. Draft
    /// failures come back as one `InvalidDraft` so the caller can pin each
    /// message to its field.
    async fn validate_draft(&self, draft: &OrderDraft) -> Result<(), ServiceError> {
        let mut errors = Vec::new();
        if draft.customer_name.trim().is_empty() {
            errors.push(FieldError::new(
                "customer_name",
                "customer name is required",
            ));
        }
        if draft.customer_phone.trim().is_empty() {
            errors.push(FieldError::new(
                "customer_phone",
                "customer phone is required",
            ));
        }
        if draft.items.is_empty() {
            errors.push(FieldError::new("items", "at least one item is required"));
        }
        if draft.items.iter().any(|item| item.quantity < 1) {
            errors.push(FieldError::new("items", "quantities must be at least one"));
        }
        if draft.wilaya_id.is_some()
            && draft.delivery_type == DeliveryType::Home
            && draft
                .address
                .as_deref()
                .map_or(true, |address| address.trim().is_empty())
        {
            errors.push(FieldError::new(
                "address",
                "address is required for home delivery",
            ));
        }

        // A line without a variant id is only acceptable when the product
        // defines no option groups.
        let mut unresolved: HashSet<Uuid> = HashSet::new();
        for item in draft.items.iter().filter(|item| item.variant_id.is_none()) {
            unresolved.insert(item.product_id);
        }
        for product_id in unresolved {
            let offering = self.catalog.get_offering(product_id).await?;
            if let VariantModel::Modern { groups, .. } = &offering.variants {
                if !groups.is_empty() {
                    errors.push(FieldError::new(
                        "variant",
                        format!("select all options for {}", offering.product.name),
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidDraft(errors))
        }
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<OrderDetailResponse>, ServiceError> {
        let Some(order) = Order::find_by_id(order_id).one(&*self.db).await? else {
            return Ok(None);
        };
        let items = order.find_related(OrderItem).all(&*self.db).await?;
        Ok(Some(OrderDetailResponse {
            order: model_to_response(order),
            items: items.into_iter().map(item_to_response).collect(),
        }))
    }

    /// Lists orders newest-first. Pages are cached briefly; any successful
    /// submission invalidates the whole cache.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let page = page.max(1);
        if let Some(cached) = self.list_cache.get(&(page, per_page)) {
            debug!(page, per_page, "order list served from cache");
            return Ok(cached);
        }

        let paginator = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        let response = OrderListResponse {
            orders: orders.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        };
        self.list_cache.put((page, per_page), response.clone());
        Ok(response)
    }
}

/// Next order number from the most recently created one: the numeric
/// suffix is parsed and incremented, and anything unparseable starts the
/// sequence over at `ORD-001`.
pub fn next_order_number(latest: Option<&str>) -> String {
    let next = latest
        .and_then(|number| number.rsplit_once('-'))
        .and_then(|(_, suffix)| suffix.parse::<u64>().ok())
        .map(|suffix| suffix + 1)
        .unwrap_or(1);
    format!("ORD-{next:03}")
}

fn model_to_response(model: order::Model) -> OrderResponse {
    OrderResponse {
        id: model.id,
        order_number: model.order_number,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        wilaya_id: model.wilaya_id,
        delivery_type: model.delivery_type,
        address: model.address,
        payment_method: model.payment_method,
        subtotal: model.subtotal,
        shipping_cost: model.shipping_cost,
        discount_amount: model.discount_amount,
        coupon_code: model.coupon_code,
        total_amount: model.total_amount,
        status: model.status,
        created_at: model.created_at,
    }
}

fn item_to_response(model: order_item::Model) -> OrderItemResponse {
    OrderItemResponse {
        id: model.id,
        product_id: model.product_id,
        name: model.name,
        quantity: model.quantity,
        unit_price: model.unit_price,
        variant_id: model.variant_id,
        image_url: model.image_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(Some("ORD-007"), "ORD-008" ; "increments the suffix")]
    #[test_case(Some("ORD-99"), "ORD-100" ; "grows past the padding")]
    #[test_case(None, "ORD-001" ; "first order")]
    #[test_case(Some("ORD-ABC"), "ORD-001" ; "non numeric suffix starts over")]
    #[test_case(Some("12345"), "ORD-001" ; "no separator starts over")]
    fn order_number_derivation(latest: Option<&str>, expected: &str) {
        assert_eq!(next_order_number(latest), expected);
    }

    fn draft_item(quantity: i32) -> DraftItem {
        DraftItem {
            product_id: Uuid::new_v4(),
            name: "Tee".to_string(),
            unit_price: dec!(1000),
            quantity,
            variant_id: None,
            image_url: None,
        }
    }

    #[test]
    fn quantity_mutations_floor_at_one() {
        let mut draft = OrderDraft::default();
        draft.add_item(draft_item(1));
        draft.increment_item(0);
        assert_eq!(draft.items[0].quantity, 2);
        draft.decrement_item(0);
        draft.decrement_item(0);
        draft.decrement_item(0);
        assert_eq!(draft.items[0].quantity, 1);
    }

    #[test]
    fn items_are_removed_individually() {
        let mut draft = OrderDraft::default();
        draft.add_item(draft_item(1));
        draft.add_item(draft_item(2));
        draft.remove_item(0);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].quantity, 2);
        // Out-of-range removals are ignored.
        draft.remove_item(5);
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn priced_lines_mirror_the_items() {
        let mut draft = OrderDraft::default();
        draft.add_item(draft_item(3));
        let lines = draft.priced_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price, dec!(1000));
        assert_eq!(lines[0].quantity, 3);
    }
}
