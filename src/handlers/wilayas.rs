use axum::{extract::State, Json};

use crate::{entities::wilaya, errors::ServiceError};

use super::AppState;

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<wilaya::Model>>, ServiceError> {
    Ok(Json(state.catalog.list_active_wilayas().await?))
}
