use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::DeliveryType,
    errors::{FieldError, ServiceError},
    pricing::{self, CartEstimate, CartLine, CouponDiscount, OrderQuote, PricedLine, ShippingRates},
    services::coupons::{CouponOutcome, CouponRejection},
    services::orders::{
        DraftItem, OrderDetailResponse, OrderDraft, OrderListResponse, OrderResponse,
    },
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitItem {
    pub product_id: Uuid,
    pub name: String,
    /// Price snapshot taken when the line was added; not re-derived here.
    pub unit_price: Decimal,
    pub quantity: i32,
    pub variant_id: Option<Uuid>,
    pub image_url: Option<String>,
}

impl From<SubmitItem> for DraftItem {
    fn from(item: SubmitItem) -> Self {
        DraftItem {
            product_id: item.product_id,
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            variant_id: item.variant_id,
            image_url: item.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya_id: Option<Uuid>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    pub coupon_code: Option<String>,
    pub items: Vec<SubmitItem>,
}

pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ServiceError> {
    // The coupon is confirmed here, once; the draft then holds the
    // descriptor statically.
    let coupon = match &request.coupon_code {
        Some(code) => match state.coupons.validate(code).await? {
            CouponOutcome::Valid(discount) => Some(discount),
            CouponOutcome::NotEntered => None,
            CouponOutcome::Rejected(rejection) => {
                return Err(ServiceError::InvalidDraft(vec![FieldError::new(
                    "coupon",
                    rejection.message(),
                )]))
            }
        },
        None => None,
    };

    let draft = OrderDraft {
        customer_name: request.customer_name,
        customer_phone: request.customer_phone,
        wilaya_id: request.wilaya_id,
        delivery_type: request.delivery_type,
        address: request.address,
        payment_method: request.payment_method,
        coupon,
        items: request.items.into_iter().map(DraftItem::from).collect(),
    };
    let order = state.orders.submit_order(&draft).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct QuoteLine {
    pub unit_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<QuoteLine>,
    pub wilaya_id: Option<Uuid>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: OrderQuote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponDiscount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_rejection: Option<CouponRejection>,
}

/// Live checkout totals, recomputed on every selection change. A rejected
/// coupon prices as no coupon and reports the rejection alongside.
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ServiceError> {
    let rates = match request.wilaya_id {
        Some(wilaya_id) => Some(ShippingRates::from(
            &state.catalog.get_wilaya(wilaya_id).await?,
        )),
        None => None,
    };

    let (coupon, coupon_rejection) = match &request.coupon_code {
        Some(code) => match state.coupons.validate(code).await? {
            CouponOutcome::Valid(discount) => (Some(discount), None),
            CouponOutcome::NotEntered => (None, None),
            CouponOutcome::Rejected(rejection) => (None, Some(rejection)),
        },
        None => (None, None),
    };

    let lines: Vec<PricedLine> = request
        .items
        .iter()
        .map(|line| PricedLine {
            unit_price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();
    let quote = pricing::quote(&lines, rates, request.delivery_type, coupon.as_ref());

    Ok(Json(QuoteResponse {
        quote,
        coupon,
        coupon_rejection,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CartEstimateRequest {
    pub lines: Vec<CartLine>,
}

/// Pre-checkout cart summary. The shipping figure is an estimate (each
/// line's own rate × quantity); checkout recalculates with one flat
/// region rate.
pub async fn estimate_cart(
    Json(request): Json<CartEstimateRequest>,
) -> Json<CartEstimate> {
    Json(pricing::estimate_cart(&request.lines))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderListResponse>, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(25).clamp(1, 100);
    Ok(Json(state.orders.list_orders(page, per_page).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailResponse>, ServiceError> {
    state
        .orders
        .get_order(order_id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}
