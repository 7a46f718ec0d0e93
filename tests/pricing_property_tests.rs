//! Property-based tests for the pricing core: discount clamping, total
//! non-negativity, and variant resolution over a wide range of inputs.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use souk_api::entities::coupon::DiscountType;
use souk_api::entities::option_group::{self, OptionDisplayType};
use souk_api::entities::order::DeliveryType;
use souk_api::entities::product_variant;
use souk_api::pricing::{
    discount_amount, quote, resolve_variant, subtotal, CouponDiscount, PricedLine, ShippingRates,
    VariantResolution,
};

fn money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(Decimal::from)
}

fn lines_strategy() -> impl Strategy<Value = Vec<PricedLine>> {
    prop::collection::vec(
        (0i64..100_000, 1i32..50).prop_map(|(price, quantity)| PricedLine {
            unit_price: Decimal::from(price),
            quantity,
        }),
        0..8,
    )
}

fn coupon_strategy() -> impl Strategy<Value = CouponDiscount> {
    (any::<bool>(), 0i64..2_000_000).prop_map(|(is_fixed, value)| CouponDiscount {
        code: "PROMO".to_string(),
        discount_type: if is_fixed {
            DiscountType::Fixed
        } else {
            DiscountType::Percentage
        },
        value: if is_fixed {
            Decimal::from(value)
        } else {
            Decimal::from(value % 101)
        },
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn discount_never_exceeds_the_subtotal(s in money_strategy(), coupon in coupon_strategy()) {
        let discount = discount_amount(s, Some(&coupon));
        prop_assert!(discount <= s);
        prop_assert!(discount >= Decimal::ZERO);
    }

    #[test]
    fn fixed_discount_is_the_clamped_value(s in money_strategy(), value in money_strategy()) {
        let coupon = CouponDiscount {
            code: "PROMO".to_string(),
            discount_type: DiscountType::Fixed,
            value,
        };
        prop_assert_eq!(discount_amount(s, Some(&coupon)), value.min(s));
    }

    #[test]
    fn percentage_discount_matches_the_rounded_formula(s in money_strategy(), percent in 0u32..=100) {
        let coupon = CouponDiscount {
            code: "PROMO".to_string(),
            discount_type: DiscountType::Percentage,
            value: Decimal::from(percent),
        };
        let expected = (s * Decimal::from(percent) / Decimal::from(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .min(s);
        prop_assert_eq!(discount_amount(s, Some(&coupon)), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn totals_are_never_negative_and_always_balance(
        lines in lines_strategy(),
        office in money_strategy(),
        home in money_strategy(),
        coupon in proptest::option::of(coupon_strategy()),
        with_region in any::<bool>(),
        home_delivery in any::<bool>(),
    ) {
        let rates = with_region.then_some(ShippingRates { office, home });
        let delivery_type = if home_delivery {
            DeliveryType::Home
        } else {
            DeliveryType::Office
        };
        let quote = quote(&lines, rates, delivery_type, coupon.as_ref());

        prop_assert!(quote.total_amount >= Decimal::ZERO);
        prop_assert_eq!(
            quote.total_amount,
            quote.subtotal + quote.shipping_cost - quote.discount_amount
        );
        prop_assert_eq!(quote.subtotal, subtotal(&lines));
        // With no region there is never a shipping charge.
        if rates.is_none() {
            prop_assert_eq!(quote.shipping_cost, Decimal::ZERO);
        }
    }
}

// ==================== Variant resolution ====================

fn group(name: &str, position: i32) -> option_group::Model {
    option_group::Model {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        name: name.to_string(),
        display_type: OptionDisplayType::Label,
        position,
        created_at: Utc::now(),
    }
}

fn variant(options: &HashMap<String, String>) -> product_variant::Model {
    product_variant::Model {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        options: serde_json::to_value(options).expect("options encode"),
        price: Decimal::from(1000),
        stock: 5,
        is_active: true,
        image_url: None,
        created_at: Utc::now(),
    }
}

fn group_count_strategy() -> impl Strategy<Value = usize> {
    1usize..5
}

proptest! {
    #[test]
    fn partial_selections_resolve_incomplete(count in group_count_strategy(), missing in 0usize..5) {
        let groups: Vec<option_group::Model> = (0..count)
            .map(|i| group(&format!("Group {i}"), i as i32))
            .collect();
        let missing = missing % count;

        // One entry per group except the one left out.
        let mut selection = HashMap::new();
        for (i, g) in groups.iter().enumerate() {
            if i != missing {
                selection.insert(g.name.clone(), "Value".to_string());
            }
        }
        let full: HashMap<String, String> = groups
            .iter()
            .map(|g| (g.name.clone(), "Value".to_string()))
            .collect();
        let variants = vec![variant(&full)];

        let resolution = resolve_variant(&groups, &variants, &selection);
        prop_assert!(matches!(resolution, VariantResolution::Incomplete));
    }

    #[test]
    fn full_selections_resolve_the_unique_match_or_no_match(count in group_count_strategy(), tweak in any::<bool>()) {
        let groups: Vec<option_group::Model> = (0..count)
            .map(|i| group(&format!("Group {i}"), i as i32))
            .collect();
        let selection: HashMap<String, String> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), format!("Value {i}")))
            .collect();

        let mut options = selection.clone();
        if tweak {
            // Perturb one value so no variant carries the combination.
            options.insert("Group 0".to_string(), "Other".to_string());
        }
        let variants = vec![variant(&options)];

        let resolution = resolve_variant(&groups, &variants, &selection);
        if tweak {
            prop_assert!(matches!(resolution, VariantResolution::NoMatch));
        } else {
            match resolution {
                VariantResolution::Resolved(found) => prop_assert_eq!(found.id, variants[0].id),
                other => return Err(TestCaseError::fail(format!("expected a match, got {other:?}"))),
            }
        }
    }
}
