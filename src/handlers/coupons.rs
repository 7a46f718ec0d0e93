use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;

use crate::{errors::ServiceError, services::coupons::CouponOutcome};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// Explicit coupon application. A blank code is a silent no-op; rejections
/// name their reason so the UI can pin the message to the coupon field.
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let outcome = state.coupons.validate(&request.code).await?;
    let body = match outcome {
        CouponOutcome::NotEntered => json!({ "status": "not_entered" }),
        CouponOutcome::Valid(discount) => json!({ "status": "valid", "discount": discount }),
        CouponOutcome::Rejected(rejection) => json!({
            "status": "rejected",
            "reason": rejection,
            "message": rejection.message(),
        }),
    };
    Ok(Json(body))
}
