use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{errors::ServiceError, services::catalog::ProductOffering};

use super::AppState;

/// Product detail for the storefront and the order builders: the product
/// row plus whichever variant model applies.
pub async fn get_offering(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductOffering>, ServiceError> {
    Ok(Json(state.catalog.get_offering(product_id).await?))
}
