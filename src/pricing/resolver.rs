use std::collections::BTreeMap;
use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::entities::{legacy_variation, option_group, product, product_variant};

/// Outcome of matching a buyer's option choices against a product's
/// variants.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantResolution<'a> {
    /// Every option group has a choice and exactly one active variant
    /// carries that combination.
    Resolved(&'a product_variant::Model),
    /// At least one option group has no choice yet. An expected
    /// intermediate state while the buyer is still picking; pricing falls
    /// back to the base price.
    Incomplete,
    /// Every group has a choice but no active variant carries the
    /// combination. Prices like `Incomplete`, but submission reports it as
    /// a select-your-options failure instead of accepting the line.
    NoMatch,
}

impl VariantResolution<'_> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, VariantResolution::Resolved(_))
    }
}

/// Resolves a selection map (group name → chosen value label) against the
/// product's option groups and variants.
///
/// The comparison is order-independent map equality over the groups the
/// product defines; selection entries for unknown groups are ignored.
/// Inactive variants never match. Variant combinations are unique per
/// product, so at most one variant can win.
pub fn resolve_variant<'a>(
    groups: &[option_group::Model],
    variants: &'a [product_variant::Model],
    selection: &HashMap<String, String>,
) -> VariantResolution<'a> {
    let mut wanted: HashMap<&str, &str> = HashMap::with_capacity(groups.len());
    for group in groups {
        match selection.get(&group.name) {
            Some(choice) => {
                wanted.insert(group.name.as_str(), choice.as_str());
            }
            None => return VariantResolution::Incomplete,
        }
    }

    for variant in variants.iter().filter(|variant| variant.is_active) {
        let options = variant.option_map();
        if options.len() == wanted.len()
            && options
                .iter()
                .all(|(group, value)| wanted.get(group.as_str()) == Some(&value.as_str()))
        {
            return VariantResolution::Resolved(variant);
        }
    }
    VariantResolution::NoMatch
}

/// Unit price for the current selection state. `Incomplete` and `NoMatch`
/// both fall back to the product's base price.
pub fn effective_unit_price(
    product: &product::Model,
    resolution: &VariantResolution<'_>,
) -> Decimal {
    match resolution {
        VariantResolution::Resolved(variant) => variant.price,
        VariantResolution::Incomplete | VariantResolution::NoMatch => product.price,
    }
}

/// Stock shown for the current selection state, with the same base-product
/// fallback as the price.
pub fn effective_stock(product: &product::Model, resolution: &VariantResolution<'_>) -> i32 {
    match resolution {
        VariantResolution::Resolved(variant) => variant.stock,
        VariantResolution::Incomplete | VariantResolution::NoMatch => product.available_stock(),
    }
}

/// Unit price of a legacy-model line at the moment it is added to an
/// order: base price plus the variation's adjustment. The result is a
/// snapshot; already-added lines are never re-priced from later selection
/// changes.
pub fn legacy_unit_price(base_price: Decimal, variation: &legacy_variation::Model) -> Decimal {
    base_price + variation.price_adjustment
}

/// Groups legacy variations by their `variation_type` for display, in type
/// order. Legacy selections have no completeness rule and no composite
/// price; each variation stands on its own.
pub fn legacy_by_type(
    variations: &[legacy_variation::Model],
) -> BTreeMap<String, Vec<&legacy_variation::Model>> {
    let mut grouped: BTreeMap<String, Vec<&legacy_variation::Model>> = BTreeMap::new();
    for variation in variations {
        grouped
            .entry(variation.variation_type.clone())
            .or_default()
            .push(variation);
    }
    grouped
}
