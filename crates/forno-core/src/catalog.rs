//! # Pricing Context
//!
//! Read-only snapshot of the catalog: products, flavor-count options,
//! stuffed-crust options and store configuration. Every lookup by id in the
//! crate goes through [`PricingContext`], so "missing product" is a single
//! code path.
//!
//! ## Snapshot Lifecycle
//! ```text
//! storage collaborator ──JSON──► CatalogSnapshot ──new()──► PricingContext
//!                                                               │
//!             FlavorSelector / CartStore / checkout ◄── &ctx ───┘
//!
//! A reload builds a fresh context; the session swaps it in and reconciles.
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing;
use crate::types::{FlavorMode, FlavorOption, Product, Size, StoreConfig, StuffedCrustOption};
use crate::validation::validate_product;

/// Raw catalog records as delivered by the storage collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub flavor_options: Vec<FlavorOption>,
    #[serde(default)]
    pub stuffed_crusts: Vec<StuffedCrustOption>,
    #[serde(default)]
    pub config: StoreConfig,
}

impl CatalogSnapshot {
    /// Decodes a snapshot from JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Indexed, validated catalog snapshot.
#[derive(Debug, Clone)]
pub struct PricingContext {
    products: Vec<Product>,
    index: HashMap<String, usize>,
    flavor_options: Vec<FlavorOption>,
    stuffed_crusts: Vec<StuffedCrustOption>,
    config: StoreConfig,
}

impl PricingContext {
    /// Builds a context from a snapshot.
    ///
    /// ## Errors
    /// - `Validation` when a product record is malformed
    /// - `InvalidCatalog` when two products share an id
    pub fn new(snapshot: CatalogSnapshot) -> CoreResult<Self> {
        let mut index = HashMap::with_capacity(snapshot.products.len());

        for (pos, product) in snapshot.products.iter().enumerate() {
            validate_product(product)?;
            if index.insert(product.id.clone(), pos).is_some() {
                return Err(CoreError::InvalidCatalog(format!(
                    "duplicate product id: {}",
                    product.id
                )));
            }
        }

        Ok(PricingContext {
            products: snapshot.products,
            index,
            flavor_options: snapshot.flavor_options,
            stuffed_crusts: snapshot.stuffed_crusts,
            config: snapshot.config,
        })
    }

    /// Decodes and indexes a JSON snapshot in one step.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Self::new(CatalogSnapshot::from_json(json)?)
    }

    /// Store configuration carried by the snapshot.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Product Lookup
    // =========================================================================

    /// Active product by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        let found = self
            .index
            .get(id)
            .and_then(|&pos| self.products.get(pos))
            .filter(|p| p.active);

        if found.is_none() {
            debug!(product_id = %id, "Product not in catalog snapshot");
        }
        found
    }

    /// Active product by id, as a `Result` for boundary code.
    pub fn require_product(&self, id: &str) -> CoreResult<&Product> {
        self.product(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Resolves every id, or `None` if any is unknown.
    pub fn products_for<S: AsRef<str>>(&self, ids: &[S]) -> Option<Vec<&Product>> {
        ids.iter().map(|id| self.product(id.as_ref())).collect()
    }

    /// Active products, in catalog order.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    /// Active pizza flavors, in catalog order.
    pub fn flavors(&self) -> impl Iterator<Item = &Product> {
        self.active_products().filter(|p| p.is_pizza())
    }

    // =========================================================================
    // Promotions and Prices
    // =========================================================================

    /// True when the product is currently under an active promotion.
    pub fn is_promotional(&self, product: &Product) -> bool {
        self.config.promotions_enabled && product.is_promo_active
    }

    /// True when any of the ids is currently promotional.
    ///
    /// A multi-flavor line with one promotional flavor counts as promotional.
    pub fn any_promotional<S: AsRef<str>>(&self, ids: &[S]) -> bool {
        ids.iter()
            .filter_map(|id| self.product(id.as_ref()))
            .any(|p| self.is_promotional(p))
    }

    /// Unit price of a single product at `size`, honoring promotions.
    pub fn unit_price(&self, product: &Product, size: Size) -> Money {
        pricing::unit_price(product, size, self.is_promotional(product))
    }

    // =========================================================================
    // Sizes, Modes and Crusts
    // =========================================================================

    /// True when `size` is currently sold.
    pub fn is_size_enabled(&self, size: Size) -> bool {
        match size {
            Size::Regular => true,
            Size::Small => self.config.small_size_enabled,
        }
    }

    /// True when the store currently offers `mode`.
    ///
    /// Single-flavor pizzas are always offered, even when the catalog has no
    /// option record for them.
    pub fn is_mode_active(&self, mode: FlavorMode) -> bool {
        if mode == FlavorMode::Single {
            return true;
        }
        self.flavor_options
            .iter()
            .any(|o| o.max_flavors == mode && o.active)
    }

    /// Offered flavor-count modes, ascending.
    pub fn active_modes(&self) -> Vec<FlavorMode> {
        [FlavorMode::Single, FlavorMode::Double, FlavorMode::Triple]
            .into_iter()
            .filter(|m| self.is_mode_active(*m))
            .collect()
    }

    /// Active stuffed-crust option by id.
    pub fn stuffed_crust(&self, id: &str) -> Option<&StuffedCrustOption> {
        if !self.config.stuffed_crust_enabled {
            return None;
        }
        self.stuffed_crusts.iter().find(|c| c.id == id && c.active)
    }

    /// Active stuffed-crust options.
    pub fn stuffed_crusts(&self) -> impl Iterator<Item = &StuffedCrustOption> {
        let enabled = self.config.stuffed_crust_enabled;
        self.stuffed_crusts
            .iter()
            .filter(move |c| enabled && c.active)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriceTable, ProductKind};

    fn pizza(id: &str, regular: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Pizza {id}"),
            kind: ProductKind::Pizza,
            base_price: PriceTable::regular(Money::from_cents(regular)),
            promo_price: PriceTable::default(),
            is_promo_active: false,
            add_ons: Vec::new(),
            description: None,
            active: true,
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let mut hidden = pizza("3", 3000);
        hidden.active = false;

        let ctx = PricingContext::new(CatalogSnapshot {
            products: vec![pizza("1", 4000), pizza("2", 4500), hidden],
            ..Default::default()
        })
        .unwrap();

        assert_eq!(ctx.product("2").map(|p| p.name.as_str()), Some("Pizza 2"));
        assert!(ctx.product("3").is_none());
        assert!(ctx.product("404").is_none());
        assert!(matches!(
            ctx.require_product("404"),
            Err(CoreError::ProductNotFound(_))
        ));
        assert!(ctx.products_for(&["1", "2"]).is_some());
        assert!(ctx.products_for(&["1", "404"]).is_none());
        assert_eq!(ctx.flavors().count(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = PricingContext::new(CatalogSnapshot {
            products: vec![pizza("1", 4000), pizza("1", 4500)],
            ..Default::default()
        });
        assert!(matches!(result, Err(CoreError::InvalidCatalog(_))));
    }

    #[test]
    fn test_modes() {
        let ctx = PricingContext::new(CatalogSnapshot {
            flavor_options: vec![
                FlavorOption {
                    max_flavors: FlavorMode::Double,
                    active: true,
                },
                FlavorOption {
                    max_flavors: FlavorMode::Triple,
                    active: false,
                },
            ],
            ..Default::default()
        })
        .unwrap();

        assert!(ctx.is_mode_active(FlavorMode::Single));
        assert!(ctx.is_mode_active(FlavorMode::Double));
        assert!(!ctx.is_mode_active(FlavorMode::Triple));
        assert_eq!(
            ctx.active_modes(),
            vec![FlavorMode::Single, FlavorMode::Double]
        );
    }

    #[test]
    fn test_promotions_master_switch() {
        let mut promo = pizza("1", 4000);
        promo.is_promo_active = true;
        promo.promo_price = PriceTable::regular(Money::from_cents(3000));

        let mut snapshot = CatalogSnapshot {
            products: vec![promo, pizza("2", 4500)],
            ..Default::default()
        };
        let ctx = PricingContext::new(snapshot.clone()).unwrap();
        assert!(ctx.any_promotional(&["2", "1"]));
        assert_eq!(
            ctx.unit_price(ctx.product("1").unwrap(), Size::Regular),
            Money::from_cents(3000)
        );

        snapshot.config.promotions_enabled = false;
        let ctx = PricingContext::new(snapshot).unwrap();
        assert!(!ctx.any_promotional(&["2", "1"]));
        assert_eq!(
            ctx.unit_price(ctx.product("1").unwrap(), Size::Regular),
            Money::from_cents(4000)
        );
    }

    #[test]
    fn test_crusts_respect_store_switch() {
        let crust = StuffedCrustOption {
            id: "catupiry".to_string(),
            name: "Catupiry".to_string(),
            price: Money::from_cents(800),
            active: true,
        };
        let mut snapshot = CatalogSnapshot {
            stuffed_crusts: vec![crust],
            ..Default::default()
        };
        let ctx = PricingContext::new(snapshot.clone()).unwrap();
        assert!(ctx.stuffed_crust("catupiry").is_some());
        assert_eq!(ctx.stuffed_crusts().count(), 1);

        snapshot.config.stuffed_crust_enabled = false;
        let ctx = PricingContext::new(snapshot).unwrap();
        assert!(ctx.stuffed_crust("catupiry").is_none());
        assert_eq!(ctx.stuffed_crusts().count(), 0);
    }

    #[test]
    fn test_from_json() {
        let ctx = PricingContext::from_json(
            r#"{
                "products": [
                    {"id": "1", "name": "Margherita",
                     "base_price": {"regular": 3500, "small": 2500}}
                ],
                "flavor_options": [{"max_flavors": 2}],
                "config": {"name": "Test Pizzeria"}
            }"#,
        )
        .unwrap();

        assert_eq!(ctx.config().name, "Test Pizzeria");
        assert!(ctx.is_mode_active(FlavorMode::Double));
        assert!(PricingContext::from_json("not json").is_err());
    }
}
