//! # Pricing Engine
//!
//! Pure functions that price a product or a cart line.
//!
//! ## Price Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Line Unit Price                                     │
//! │                                                                         │
//! │   1 flavor:   unit_price(flavor, size, promo)                           │
//! │   2-3 flavors: max(unit_price(f, size, promo_f) for f in flavors)       │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │                 base price                                              │
//! │                 + Σ add-on groups (per flavor)                          │
//! │                 + stuffed crust                                         │
//! │                 ─────────────────                                       │
//! │                 = line unit price                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A multi-flavor pizza costs exactly its most expensive flavor, never the
//! sum and never the average.
//!
//! ## Degradation
//! Pricing never fails. A missing price for the requested size prices as
//! zero; a promotion with no promo price for the requested size falls back
//! to the regular price of that size. Both cases log a warning.

use tracing::warn;

use crate::cart::CartLine;
use crate::catalog::PricingContext;
use crate::money::Money;
use crate::types::{Product, Size};

/// Unit price of one product at `size`.
///
/// ## Rules
/// - Promotion active and a promo price exists for `size` → promo price
/// - Promotion active but no promo price for `size` → regular price for
///   `size` (a promotion never borrows another size's discount)
/// - No price for `size` at all → zero
///
/// ## Example
/// ```rust
/// use forno_core::money::Money;
/// use forno_core::pricing::unit_price;
/// use forno_core::types::{PriceTable, Product, ProductKind, Size};
///
/// let product = Product {
///     id: "1".into(),
///     name: "Margherita".into(),
///     kind: ProductKind::Pizza,
///     base_price: PriceTable::sized(Money::from_cents(3500), Money::from_cents(2500)),
///     promo_price: PriceTable::regular(Money::from_cents(2990)),
///     is_promo_active: true,
///     add_ons: vec![],
///     description: None,
///     active: true,
/// };
///
/// assert_eq!(unit_price(&product, Size::Regular, true).cents(), 2990);
/// assert_eq!(unit_price(&product, Size::Small, true).cents(), 2500);
/// assert_eq!(unit_price(&product, Size::Regular, false).cents(), 3500);
/// ```
pub fn unit_price(product: &Product, size: Size, is_promo_active: bool) -> Money {
    if is_promo_active {
        if let Some(price) = product.promo_price.get(size) {
            return price;
        }
        warn!(
            product_id = %product.id,
            size = size.as_str(),
            "Promotion has no price for this size, using regular price"
        );
    }

    match product.base_price.get(size) {
        Some(price) => price,
        None => {
            warn!(
                product_id = %product.id,
                size = size.as_str(),
                "Product has no price for this size, pricing as zero"
            );
            Money::zero()
        }
    }
}

/// Price of a multi-flavor pizza: the maximum of each flavor's unit price.
///
/// An empty flavor list prices as zero.
pub fn multi_flavor_unit_price(products: &[&Product], size: Size, ctx: &PricingContext) -> Money {
    products
        .iter()
        .map(|p| ctx.unit_price(p, size))
        .max()
        .unwrap_or_default()
}

/// Base price (before modifiers) of a line made of `products`.
pub fn base_price(products: &[&Product], size: Size, ctx: &PricingContext) -> Money {
    match products {
        [single] => ctx.unit_price(single, size),
        many => multi_flavor_unit_price(many, size, ctx),
    }
}

/// Σ over every flavor add-on group, Σ over the group's items.
pub fn line_add_on_total(line: &CartLine) -> Money {
    line.add_ons
        .iter()
        .flat_map(|group| group.items.iter())
        .map(|item| item.price)
        .sum()
}

/// Stuffed-crust surcharge, zero when the line has none.
pub fn crust_surcharge(line: &CartLine) -> Money {
    line.stuffed_crust
        .as_ref()
        .map(|c| c.price)
        .unwrap_or_default()
}

/// Add-ons plus crust: everything a line costs on top of its base price.
pub fn modifier_total(line: &CartLine) -> Money {
    line_add_on_total(line) + crust_surcharge(line)
}

/// Base price of a line recomputed against the catalog.
///
/// Falls back to the line's frozen base price when a flavor has disappeared
/// from the catalog.
pub fn line_base_price(line: &CartLine, ctx: &PricingContext) -> Money {
    match ctx.products_for(line.flavor_ids().as_slice()) {
        Some(products) => base_price(&products, line.size, ctx),
        None => {
            warn!(line_id = %line.key, "Line references unknown products, keeping frozen price");
            line.base_price
        }
    }
}

/// Unit price of a line recomputed against the catalog: base price for its
/// flavors and size, plus add-ons, plus crust.
pub fn line_unit_price(line: &CartLine, ctx: &PricingContext) -> Money {
    line_base_price(line, ctx) + modifier_total(line)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartStore, LineDraft};
    use crate::catalog::CatalogSnapshot;
    use crate::types::{AddOn, PriceTable, ProductKind, StuffedCrust};

    fn pizza(id: &str, regular: i64, small: Option<i64>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Pizza {id}"),
            kind: ProductKind::Pizza,
            base_price: PriceTable {
                regular: Some(Money::from_cents(regular)),
                small: small.map(Money::from_cents),
            },
            promo_price: PriceTable::default(),
            is_promo_active: false,
            add_ons: Vec::new(),
            description: None,
            active: true,
        }
    }

    fn context(products: Vec<Product>) -> PricingContext {
        PricingContext::new(CatalogSnapshot {
            products,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_unit_price_regular_and_small() {
        let p = pizza("1", 3500, Some(2500));
        assert_eq!(unit_price(&p, Size::Regular, false).cents(), 3500);
        assert_eq!(unit_price(&p, Size::Small, false).cents(), 2500);
    }

    #[test]
    fn test_missing_size_prices_as_zero() {
        let beverage = pizza("6", 800, None);
        assert_eq!(unit_price(&beverage, Size::Small, false), Money::zero());
        assert_eq!(unit_price(&beverage, Size::Small, true), Money::zero());
    }

    #[test]
    fn test_promo_applies_only_to_matching_size() {
        let mut p = pizza("1", 4000, Some(3000));
        p.is_promo_active = true;
        p.promo_price = PriceTable::regular(Money::from_cents(3200));

        assert_eq!(unit_price(&p, Size::Regular, true).cents(), 3200);
        // No small promo price: regular small price, not the regular promo
        assert_eq!(unit_price(&p, Size::Small, true).cents(), 3000);
    }

    #[test]
    fn test_multi_flavor_is_max_not_sum_or_average() {
        let ctx = context(vec![
            pizza("a", 4000, None),
            pizza("b", 4500, None),
            pizza("c", 3800, None),
        ]);
        let products = ctx.products_for(&["a", "b", "c"]).unwrap();

        let price = multi_flavor_unit_price(&products, Size::Regular, &ctx);
        assert_eq!(price.cents(), 4500);
        assert_ne!(price.cents(), 4000 + 4500 + 3800);
        assert_ne!(price.cents(), (4000 + 4500 + 3800) / 3);
    }

    #[test]
    fn test_multi_flavor_uses_promo_of_each_flavor() {
        let mut promo = pizza("a", 5000, None);
        promo.is_promo_active = true;
        promo.promo_price = PriceTable::regular(Money::from_cents(3000));
        let ctx = context(vec![promo, pizza("b", 4200, None)]);
        let products = ctx.products_for(&["a", "b"]).unwrap();

        assert_eq!(base_price(&products, Size::Regular, &ctx).cents(), 4200);
    }

    #[test]
    fn test_single_flavor_base_price_equals_unit_price() {
        let ctx = context(vec![pizza("a", 4000, Some(3000))]);
        let products = ctx.products_for(&["a"]).unwrap();
        for size in [Size::Regular, Size::Small] {
            assert_eq!(
                base_price(&products, size, &ctx),
                unit_price(products[0], size, false)
            );
        }
    }

    #[test]
    fn test_empty_flavor_list_prices_as_zero() {
        let ctx = context(vec![]);
        assert_eq!(multi_flavor_unit_price(&[], Size::Regular, &ctx), Money::zero());
    }

    fn catupiry() -> StuffedCrust {
        StuffedCrust {
            id: "catupiry".to_string(),
            name: "Catupiry".to_string(),
            price: Money::from_cents(1200),
        }
    }

    #[test]
    fn test_single_flavor_line_price_equals_unit_price() {
        let ctx = context(vec![pizza("a", 4000, Some(3000))]);
        let mut cart = CartStore::new();
        let products = ctx.products_for(&["a"]).unwrap();
        let handle = cart.add(LineDraft::from_products(&products, Size::Small, &ctx));

        let line = cart.line(handle).unwrap();
        assert_eq!(line_unit_price(line, &ctx), unit_price(products[0], Size::Small, false));
        assert_eq!(line_unit_price(line, &ctx), line.unit_price);
    }

    #[test]
    fn test_line_price_is_max_base_plus_modifiers() {
        let ctx = context(vec![pizza("a", 4000, None), pizza("b", 4500, None)]);
        let mut cart = CartStore::new();
        let products = ctx.products_for(&["a", "b"]).unwrap();
        let handle = cart.add(LineDraft::from_products(&products, Size::Regular, &ctx));
        cart.set_add_ons(handle, "a", vec![AddOn::new("Bacon", Money::from_cents(600))]);
        cart.set_crust(handle, Some(catupiry()));

        let line = cart.lines().first().unwrap();
        assert_eq!(modifier_total(line).cents(), 1800);
        assert_eq!(line_unit_price(line, &ctx).cents(), 4500 + 600 + 1200);
        assert_eq!(line.unit_price, line_unit_price(line, &ctx));
    }

    #[test]
    fn test_line_price_keeps_frozen_base_for_missing_flavor() {
        let ctx = context(vec![pizza("a", 4000, None), pizza("b", 4500, None)]);
        let mut cart = CartStore::new();
        let products = ctx.products_for(&["a", "b"]).unwrap();
        let handle = cart.add(LineDraft::from_products(&products, Size::Regular, &ctx));
        cart.set_crust(handle, Some(catupiry()));

        // "b" left the menu, "a" got more expensive
        let updated = context(vec![pizza("a", 5000, None)]);
        let line = cart.lines().first().unwrap();
        assert_eq!(line_base_price(line, &updated).cents(), 4500);
        assert_eq!(line_unit_price(line, &updated).cents(), 5700);
    }

    #[test]
    fn test_reprice_goes_through_line_unit_price() {
        let ctx = context(vec![pizza("a", 4000, None), pizza("b", 4500, None)]);
        let mut cart = CartStore::new();
        let products = ctx.products_for(&["a", "b"]).unwrap();
        let handle = cart.add(LineDraft::from_products(&products, Size::Regular, &ctx));
        cart.set_add_ons(handle, "b", vec![AddOn::new("Cheddar", Money::from_cents(500))]);

        let updated = context(vec![pizza("a", 5200, None), pizza("b", 4500, None)]);
        cart.reprice(&updated);

        let line = cart.lines().first().unwrap();
        assert_eq!(line.base_price.cents(), 5200);
        assert_eq!(line.unit_price.cents(), 5700);
        assert_eq!(line.unit_price, line_unit_price(line, &updated));
        assert_eq!(cart.subtotal().cents(), 5700);
    }
}
