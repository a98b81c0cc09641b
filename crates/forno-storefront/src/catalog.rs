//! Catalog loading.
//!
//! The storage collaborator hands over a JSON [`CatalogSnapshot`]. When it
//! cannot, the storefront still opens with the built-in menu.

use std::path::Path;
use tracing::{info, warn};

use forno_core::types::{FlavorMode, FlavorOption, PriceTable, Product, ProductKind};
use forno_core::{CatalogSnapshot, Money};

use crate::error::{StorefrontError, StorefrontResult};

/// Reads and decodes a catalog snapshot file.
pub fn load_catalog(path: &Path) -> StorefrontResult<CatalogSnapshot> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| StorefrontError::CatalogLoadFailed(format!("{}: {}", path.display(), e)))?;

    let snapshot = CatalogSnapshot::from_json(&json)
        .map_err(|e| StorefrontError::CatalogLoadFailed(format!("{}: {}", path.display(), e)))?;

    info!(
        path = %path.display(),
        products = snapshot.products.len(),
        "Catalog loaded"
    );
    Ok(snapshot)
}

/// Loads the catalog at `path`, or the built-in menu when there is no path
/// or the file is unusable.
pub fn load_catalog_or_fallback(path: Option<&Path>) -> CatalogSnapshot {
    let Some(path) = path else {
        info!("No catalog path configured, serving built-in menu");
        return fallback_catalog();
    };

    load_catalog(path).unwrap_or_else(|e| {
        warn!("{}. Serving built-in menu.", e);
        fallback_catalog()
    })
}

/// The built-in menu: five pizzas, three beverages, every flavor mode on.
pub fn fallback_catalog() -> CatalogSnapshot {
    CatalogSnapshot {
        products: vec![
            pizza("1", "Margherita", "Molho de tomate, mussarela e manjericão", 3500, 2500),
            pizza("2", "Pepperoni", "Molho de tomate, mussarela e pepperoni", 4200, 3200),
            pizza(
                "3",
                "Portuguesa",
                "Molho de tomate, mussarela, presunto, ovos, cebola e azeitona",
                4500,
                3500,
            ),
            pizza("4", "Chocolate", "Chocolate ao leite derretido", 3800, 2800),
            pizza("5", "Brigadeiro", "Chocolate, granulado e leite condensado", 4000, 3000),
            beverage("6", "Coca-Cola 2L", "Refrigerante Coca-Cola 2 litros", 800),
            beverage("7", "Guaraná Antarctica 2L", "Refrigerante Guaraná Antarctica 2 litros", 750),
            beverage("8", "Água Mineral 500ml", "Água mineral sem gás", 300),
        ],
        flavor_options: [FlavorMode::Single, FlavorMode::Double, FlavorMode::Triple]
            .into_iter()
            .map(|max_flavors| FlavorOption {
                max_flavors,
                active: true,
            })
            .collect(),
        stuffed_crusts: Vec::new(),
        config: Default::default(),
    }
}

fn pizza(id: &str, name: &str, description: &str, regular: i64, small: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        kind: ProductKind::Pizza,
        base_price: PriceTable::sized(Money::from_cents(regular), Money::from_cents(small)),
        promo_price: PriceTable::default(),
        is_promo_active: false,
        add_ons: Vec::new(),
        description: Some(description.to_string()),
        active: true,
    }
}

fn beverage(id: &str, name: &str, description: &str, price: i64) -> Product {
    Product {
        kind: ProductKind::Beverage,
        base_price: PriceTable::regular(Money::from_cents(price)),
        ..pizza(id, name, description, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forno_core::types::Size;
    use forno_core::PricingContext;

    #[test]
    fn test_fallback_catalog_is_valid() {
        let ctx = PricingContext::new(fallback_catalog()).unwrap();

        assert_eq!(ctx.active_products().count(), 8);
        assert_eq!(ctx.flavors().count(), 5);
        assert_eq!(ctx.active_modes().len(), 3);

        let portuguesa = ctx.product("3").unwrap();
        assert_eq!(ctx.unit_price(portuguesa, Size::Regular), Money::from_cents(4500));
        assert_eq!(ctx.unit_price(portuguesa, Size::Small), Money::from_cents(3500));

        let water = ctx.product("8").unwrap();
        assert!(!water.is_pizza());
        assert_eq!(ctx.unit_price(water, Size::Regular), Money::from_cents(300));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let path = std::env::temp_dir().join(format!("forno-catalog-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "products": [
                    { "id": "p1", "name": "Calabresa", "base_price": { "regular": 4000 } }
                ],
                "flavor_options": [ { "max_flavors": 1, "active": true } ]
            }"#,
        )
        .unwrap();

        let snapshot = load_catalog(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.products[0].name, "Calabresa");
    }

    #[test]
    fn test_unreadable_catalog_falls_back() {
        let missing = std::env::temp_dir().join("forno-catalog-missing.json");

        assert!(matches!(
            load_catalog(&missing),
            Err(StorefrontError::CatalogLoadFailed(_))
        ));

        let snapshot = load_catalog_or_fallback(Some(&missing));
        assert_eq!(snapshot.products.len(), 8);
        assert_eq!(load_catalog_or_fallback(None).products.len(), 8);
    }
}
