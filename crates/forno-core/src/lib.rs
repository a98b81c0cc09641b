//! # forno-core: Order Composition & Pricing Engine
//!
//! This crate is the **heart** of Forno. It holds the cart model, the
//! multi-flavor selection state machine, the pricing rules and the
//! serialization of a finished order into a messaging handoff, all as
//! in-memory logic with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Forno Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Menu UI (browser)                           │   │
//! │  │    Flavor picker ──► Cart drawer ──► Checkout form ──► Handoff  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  forno-storefront (glue)                        │   │
//! │  │    Session, config, catalog loading, postal lookup, transport   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ forno-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   catalog ──► selector ──► cart ──► checkout ──► message        │   │
//! │  │        └──────── pricing (pure functions) ────────┘             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO FAILURES IN CART OR SELECTOR         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog and checkout types (Product, Size, StoreConfig, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - `PricingContext`, the single lookup-by-id interface
//! - [`pricing`] - Unit, multi-flavor and line price rules
//! - [`selector`] - Flavor selection reducer
//! - [`cart`] - Cart lines, merge rules, subtotal
//! - [`checkout`] - Order assembly and validation
//! - [`message`] - Handoff message rendering and URL building
//! - [`validation`] - Field-level rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use forno_core::catalog::{CatalogSnapshot, PricingContext};
//! use forno_core::cart::{CartStore, LineDraft};
//! use forno_core::money::Money;
//! use forno_core::types::{PriceTable, Product, ProductKind, Size};
//!
//! let flavor = |id: &str, cents| Product {
//!     id: id.into(),
//!     name: id.into(),
//!     kind: ProductKind::Pizza,
//!     base_price: PriceTable::regular(Money::from_cents(cents)),
//!     promo_price: PriceTable::default(),
//!     is_promo_active: false,
//!     add_ons: vec![],
//!     description: None,
//!     active: true,
//! };
//! let ctx = PricingContext::new(CatalogSnapshot {
//!     products: vec![flavor("a", 4000), flavor("b", 4500)],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! // A half-and-half pizza costs its most expensive flavor
//! let products = ctx.products_for(&["a", "b"]).unwrap();
//! let mut cart = CartStore::new();
//! cart.add(LineDraft::from_products(&products, Size::Regular, &ctx));
//! assert_eq!(cart.subtotal(), Money::from_cents(4500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod message;
pub mod money;
pub mod pricing;
pub mod selector;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, CartStore, CartTotals, LineDraft, LineHandle, LineKey, LineRef};
pub use catalog::{CatalogSnapshot, PricingContext};
pub use checkout::{CheckoutFailure, CheckoutForm, CheckoutRejected, OrderDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use message::Handoff;
pub use money::Money;
pub use selector::{FlavorSelector, SelectorEvent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single cart line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: u32 = 999;
