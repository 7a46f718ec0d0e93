//! Catalog offering and coupon validation against in-memory SQLite.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;

use souk_api::db::{self, DbPool};
use souk_api::entities::{
    coupon, legacy_variation, option_group, option_value, product, product_variant, wilaya,
    DiscountType, OptionDisplayType,
};
use souk_api::services::catalog::{CatalogService, VariantModel};
use souk_api::services::coupons::{
    CouponOutcome, CouponRejection, CouponService, CreateCouponRequest,
};

async fn setup() -> (Arc<DbPool>, CatalogService, CouponService) {
    let db = Arc::new(db::connect_in_memory().await.expect("connect in-memory sqlite"));
    db::init_schema(&db).await.expect("schema initializes");
    let catalog = CatalogService::new(db.clone());
    let coupons = CouponService::new(db.clone());
    (db, catalog, coupons)
}

async fn seed_product(db: &DbPool, name: &str, has_variants: bool) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(dec!(1900)),
        stock: Set(Some(10)),
        is_active: Set(true),
        has_variants: Set(has_variants),
        image_url: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert product")
}

#[tokio::test]
async fn offering_uses_the_modern_model_when_flagged() {
    let (db, catalog, _coupons) = setup().await;
    let product = seed_product(&db, "Tee", true).await;

    let group = option_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        name: Set("Color".to_string()),
        display_type: Set(OptionDisplayType::Swatch),
        position: Set(0),
        created_at: Set(Utc::now()),
    }
    .insert(&*db)
    .await
    .expect("insert group");

    for (position, (label, hex)) in [("Red", "#c0392b"), ("Black", "#111111")]
        .into_iter()
        .enumerate()
    {
        option_value::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(group.id),
            label: Set(label.to_string()),
            color_hex: Set(Some(hex.to_string())),
            position: Set(position as i32),
        }
        .insert(&*db)
        .await
        .expect("insert value");
    }

    let active = product_variant::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        options: Set(json!({"Color": "Red"})),
        price: Set(dec!(2100)),
        stock: Set(5),
        is_active: Set(true),
        image_url: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&*db)
    .await
    .expect("insert variant");

    // Inactive variants stay out of the offering entirely.
    product_variant::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        options: Set(json!({"Color": "Black"})),
        price: Set(dec!(2100)),
        stock: Set(0),
        is_active: Set(false),
        image_url: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&*db)
    .await
    .expect("insert inactive variant");

    let offering = catalog.get_offering(product.id).await.expect("offering");
    let (groups, variants) = match &offering.variants {
        VariantModel::Modern { groups, variants } => (groups, variants),
        other => panic!("expected the modern model, got {other:?}"),
    };
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group.name, "Color");
    assert_eq!(groups[0].values.len(), 2);
    assert_eq!(groups[0].values[0].label, "Red");
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].id, active.id);

    assert_eq!(offering.line_name(&variants[0]), "Tee (Red)");
}

#[tokio::test]
async fn offering_uses_the_legacy_model_otherwise() {
    let (db, catalog, _coupons) = setup().await;
    let product = seed_product(&db, "Classic Tee", false).await;

    legacy_variation::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        variation_type: Set("Size".to_string()),
        variation_value: Set("XL".to_string()),
        price_adjustment: Set(dec!(200)),
        stock: Set(3),
        is_active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(&*db)
    .await
    .expect("insert variation");

    let offering = catalog.get_offering(product.id).await.expect("offering");
    assert_matches!(
        &offering.variants,
        VariantModel::Legacy { variations } if variations.len() == 1
    );
}

#[tokio::test]
async fn created_coupon_codes_are_stored_uppercase() {
    let (_db, _catalog, coupons) = setup().await;
    let created = coupons
        .create_coupon(CreateCouponRequest {
            code: "  promo10 ".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            expires_at: None,
        })
        .await
        .expect("create coupon");
    assert_eq!(created.code, "PROMO10");

    // Lookup trims the entry but does not force its case.
    let trimmed = coupons.validate(" PROMO10 ").await.expect("check");
    assert_matches!(trimmed, CouponOutcome::Valid(discount) if discount.code == "PROMO10");

    let lowercase = coupons.validate("promo10").await.expect("check");
    assert_matches!(
        lowercase,
        CouponOutcome::Rejected(CouponRejection::InvalidCode)
    );
}

#[tokio::test]
async fn blank_codes_are_a_silent_no_op() {
    let (_db, _catalog, coupons) = setup().await;
    let outcome = coupons.validate("   ").await.expect("check");
    assert_matches!(outcome, CouponOutcome::NotEntered);
}

#[tokio::test]
async fn unknown_and_inactive_codes_are_invalid() {
    let (db, _catalog, coupons) = setup().await;
    coupon::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set("RETIRED".to_string()),
        discount_type: Set(DiscountType::Fixed),
        discount_value: Set(dec!(500)),
        expires_at: Set(None),
        is_active: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(&*db)
    .await
    .expect("insert inactive coupon");

    for code in ["NOSUCHCODE", "RETIRED"] {
        let outcome = coupons.validate(code).await.expect("check");
        assert_matches!(
            outcome,
            CouponOutcome::Rejected(CouponRejection::InvalidCode)
        );
    }
}

#[tokio::test]
async fn expiry_boundary_is_strictly_before_now() {
    let (db, _catalog, coupons) = setup().await;
    let now = Utc::now();
    for (code, expires_at) in [
        ("STALE", now - Duration::seconds(1)),
        ("FRESH", now + Duration::hours(1)),
    ] {
        coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            discount_type: Set(DiscountType::Fixed),
            discount_value: Set(dec!(300)),
            expires_at: Set(Some(expires_at)),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&*db)
        .await
        .expect("insert coupon");
    }

    let stale = coupons.check_code("STALE", now).await.expect("check");
    assert_matches!(stale, CouponOutcome::Rejected(CouponRejection::Expired));

    let fresh = coupons.check_code("FRESH", now).await.expect("check");
    assert_matches!(fresh, CouponOutcome::Valid(_));
}

#[tokio::test]
async fn wilaya_listing_is_active_only_in_code_order() {
    let (db, catalog, _coupons) = setup().await;
    for (code, name, active) in [
        (31, "Oran", true),
        (16, "Alger", true),
        (25, "Constantine", false),
    ] {
        wilaya::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(name.to_string()),
            office_price: Set(dec!(400)),
            home_price: Set(dec!(600)),
            is_active: Set(active),
        }
        .insert(&*db)
        .await
        .expect("insert wilaya");
    }

    let listed = catalog.list_active_wilayas().await.expect("listing");
    let names: Vec<&str> = listed.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Alger", "Oran"]);
    assert!(listed.iter().all(|w| w.is_active));
}

#[tokio::test]
async fn missing_products_are_not_found() {
    let (_db, catalog, _coupons) = setup().await;
    let error = catalog.get_product(Uuid::new_v4()).await.unwrap_err();
    assert_matches!(error, souk_api::errors::ServiceError::NotFound(_));
}
