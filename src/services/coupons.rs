use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::coupon::{self, normalize_code, DiscountType},
    errors::ServiceError,
    pricing::CouponDiscount,
    services::catalog::CatalogService,
};

/// Why an entered code was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    /// No active coupon carries the entered code.
    InvalidCode,
    /// The coupon exists but its expiry instant is in the past.
    Expired,
}

impl CouponRejection {
    /// Message shown next to the coupon field.
    pub fn message(&self) -> &'static str {
        match self {
            CouponRejection::InvalidCode => "invalid coupon code",
            CouponRejection::Expired => "this coupon has expired",
        }
    }
}

/// Result of checking an entered code.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponOutcome {
    /// Blank entry: a silent no-op, not an error.
    NotEntered,
    /// The code is good; the descriptor stays fixed for the rest of the
    /// draft's life and is not re-checked on later recomputations.
    Valid(CouponDiscount),
    Rejected(CouponRejection),
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 40, message = "Code must be between 1 and 40 characters"))]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Coupon validation and creation.
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DbPool>,
    catalog: CatalogService,
}

impl CouponService {
    pub fn new(db: Arc<DbPool>) -> Self {
        let catalog = CatalogService::new(db.clone());
        Self { db, catalog }
    }

    /// Checks an entered code, in order: blank entries are a no-op, the
    /// trimmed code must name an active coupon, and the coupon must not
    /// have expired before `now`. The entered code is trimmed but its case
    /// is left alone; stored codes are already uppercase.
    #[instrument(skip(self))]
    pub async fn check_code(
        &self,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponOutcome, ServiceError> {
        let code = raw_code.trim();
        if code.is_empty() {
            return Ok(CouponOutcome::NotEntered);
        }
        match self.catalog.find_coupon_by_code(code).await? {
            Some(coupon) => Ok(outcome_for(&coupon, now)),
            None => Ok(CouponOutcome::Rejected(CouponRejection::InvalidCode)),
        }
    }

    /// `check_code` against the wall clock, at the moment of explicit
    /// application.
    pub async fn validate(&self, raw_code: &str) -> Result<CouponOutcome, ServiceError> {
        self.check_code(raw_code, Utc::now()).await
    }

    /// Creates a coupon, normalizing the code to its stored uppercase
    /// form.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_coupon(
        &self,
        request: CreateCouponRequest,
    ) -> Result<coupon::Model, ServiceError> {
        request.validate()?;
        if request.discount_value < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Discount value must not be negative".to_string(),
            ));
        }

        let model = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(normalize_code(&request.code)),
            discount_type: Set(request.discount_type),
            discount_value: Set(request.discount_value),
            expires_at: Set(request.expires_at),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!(code = %model.code, "coupon created");
        Ok(model)
    }
}

/// Expiry is a strict before-`now` comparison: a coupon expiring exactly
/// at `now` is still good.
fn outcome_for(coupon: &coupon::Model, now: DateTime<Utc>) -> CouponOutcome {
    if let Some(expires_at) = coupon.expires_at {
        if expires_at < now {
            return CouponOutcome::Rejected(CouponRejection::Expired);
        }
    }
    CouponOutcome::Valid(CouponDiscount {
        code: coupon.code.clone(),
        discount_type: coupon.discount_type,
        value: coupon.discount_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn promo(expires_at: Option<DateTime<Utc>>) -> coupon::Model {
        coupon::Model {
            id: Uuid::new_v4(),
            code: "PROMO10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            expires_at,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn coupon_without_expiry_is_valid() {
        let outcome = outcome_for(&promo(None), Utc::now());
        let discount = match outcome {
            CouponOutcome::Valid(discount) => discount,
            other => panic!("expected a valid coupon, got {other:?}"),
        };
        assert_eq!(discount.code, "PROMO10");
        assert_eq!(discount.discount_type, DiscountType::Percentage);
        assert_eq!(discount.value, dec!(10));
    }

    #[test]
    fn expiry_one_second_ago_is_expired() {
        let now = Utc::now();
        let outcome = outcome_for(&promo(Some(now - Duration::seconds(1))), now);
        assert_matches!(
            outcome,
            CouponOutcome::Rejected(CouponRejection::Expired)
        );
    }

    #[test]
    fn expiry_in_one_hour_is_still_valid() {
        let now = Utc::now();
        let outcome = outcome_for(&promo(Some(now + Duration::hours(1))), now);
        assert_matches!(outcome, CouponOutcome::Valid(_));
    }

    #[test]
    fn expiry_exactly_now_is_still_valid() {
        let now = Utc::now();
        let outcome = outcome_for(&promo(Some(now)), now);
        assert_matches!(outcome, CouponOutcome::Valid(_));
    }
}
