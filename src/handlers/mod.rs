//! Thin JSON layer over the services. Handlers translate between DTOs and
//! core types; every rule lives in `pricing` and `services`.

pub mod coupons;
pub mod orders;
pub mod products;
pub mod wilayas;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::services::{catalog::CatalogService, coupons::CouponService, orders::OrderService};

/// Shared handler state: one `Arc` per service.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products/:id", get(products::get_offering))
        .route("/api/v1/wilayas", get(wilayas::list))
        .route("/api/v1/coupons/validate", post(coupons::validate))
        .route("/api/v1/cart/estimate", post(orders::estimate_cart))
        .route("/api/v1/orders/quote", post(orders::quote))
        .route("/api/v1/orders", post(orders::submit).get(orders::list))
        .route("/api/v1/orders/:id", get(orders::get))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "souk-api" }))
}
