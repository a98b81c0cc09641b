//! # Flavor Selector
//!
//! Reducer for "how many flavors, which ones". The selector state is an
//! explicit value owned by the caller; [`FlavorSelector::transition`] is a
//! pure function returning the next state plus the cart effects to apply.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Idle(mode, chosen)                                 │
//! │                                                                         │
//! │  mode = 1:  Toggle(p) ──► plain line {p, size} in cart? ──► Remove      │
//! │                                                     └──no──► Add        │
//! │                                                                         │
//! │  mode = 2|3:                                                            │
//! │    Toggle(p), p ∈ chosen        ──► drop p                              │
//! │                                     was complete? ──► RemoveOne(done)   │
//! │    Toggle(p), |chosen| < mode   ──► append p                            │
//! │                                     now complete? ──► Add(multi line)   │
//! │    Toggle(p), |chosen| == mode  ──► no-op (full)                        │
//! │                                                                         │
//! │  SetMode(m)        ──► chosen = []   (never carries a partial pick)     │
//! │  Clear             ──► chosen = []   (start the next pizza)             │
//! │  CatalogReloaded   ──► mode inactive? ──► mode 1, chosen = []           │
//! │                        else prune flavors that left the catalog         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Size of a Combined Line
//! Each flavor remembers the size the customer last picked for it. When
//! every chosen flavor agrees, that size is used; when they disagree the
//! line falls back to `Regular`. `Small` also falls back to `Regular` while
//! the store has small pizzas disabled.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::cart::{CartStore, LineDraft, LineHandle, LineKey};
use crate::catalog::PricingContext;
use crate::types::{FlavorMode, Size};

/// Input events of the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    /// Switch the flavor-count mode.
    SetMode(FlavorMode),
    /// Pick or unpick a flavor by product id.
    Toggle(String),
    /// Remember the size the customer wants for one flavor.
    SetSizePreference { product_id: String, size: Size },
    /// Forget the current selection without touching the cart.
    Clear,
    /// The pricing context was replaced by a fresh catalog snapshot.
    CatalogReloaded,
}

/// A cart mutation requested by a transition.
#[derive(Debug, Clone)]
pub enum CartEffect {
    Add(LineDraft),
    /// Drop the whole line.
    Remove(LineHandle),
    /// Take back one unit of the line.
    RemoveOne(LineHandle),
}

impl CartEffect {
    /// Applies the effect, returning the handle of an added line.
    pub fn apply(self, cart: &mut CartStore) -> Option<LineHandle> {
        match self {
            CartEffect::Add(draft) => Some(cart.add(draft)),
            CartEffect::Remove(handle) => {
                cart.remove(handle);
                None
            }
            CartEffect::RemoveOne(handle) => {
                cart.decrement(handle);
                None
            }
        }
    }
}

/// Result of one transition.
#[derive(Debug, Clone)]
#[must_use]
pub struct Transition {
    pub state: FlavorSelector,
    pub effects: Vec<CartEffect>,
}

/// Selector state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlavorSelector {
    mode: FlavorMode,
    /// Product ids in pick order, `0 ≤ len ≤ mode.count()`.
    chosen: Vec<String>,
    size_preferences: HashMap<String, Size>,
    /// Line that received the unit added when the current selection
    /// completed. Recorded by `dispatch`.
    completed: Option<LineHandle>,
}

impl FlavorSelector {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn mode(&self) -> FlavorMode {
        self.mode
    }

    /// Chosen product ids, in pick order.
    pub fn chosen(&self) -> &[String] {
        &self.chosen
    }

    pub fn is_chosen(&self, product_id: &str) -> bool {
        self.chosen.iter().any(|id| id == product_id)
    }

    /// True when the selection holds as many flavors as the mode allows.
    pub fn is_complete(&self) -> bool {
        self.chosen.len() == self.mode.count()
    }

    /// Flavors still to pick before the selection completes.
    pub fn remaining(&self) -> usize {
        self.mode.count().saturating_sub(self.chosen.len())
    }

    /// Size the customer last picked for a flavor.
    pub fn size_preference(&self, product_id: &str) -> Size {
        self.size_preferences
            .get(product_id)
            .copied()
            .unwrap_or_default()
    }

    /// Size a line made of `product_ids` would be sold at.
    pub fn effective_size<S: AsRef<str>>(&self, product_ids: &[S], ctx: &PricingContext) -> Size {
        let mut prefs = product_ids.iter().map(|id| self.size_preference(id.as_ref()));
        let size = match prefs.next() {
            Some(first) if prefs.all(|s| s == first) => first,
            _ => Size::Regular,
        };

        if ctx.is_size_enabled(size) {
            size
        } else {
            Size::Regular
        }
    }

    // =========================================================================
    // Transition
    // =========================================================================

    /// Computes the next state for `event`.
    ///
    /// Never fails: unknown products, inactive modes and toggles on a full
    /// selection are no-ops.
    pub fn transition(&self, event: SelectorEvent, ctx: &PricingContext, cart: &CartStore) -> Transition {
        let mut next = self.clone();
        let mut effects = Vec::new();

        match event {
            SelectorEvent::SetMode(mode) => {
                if ctx.is_mode_active(mode) {
                    next.mode = mode;
                    next.reset();
                } else {
                    debug!(mode = %mode, "Flavor mode not offered, ignoring");
                }
            }
            SelectorEvent::Toggle(product_id) => {
                next.toggle(product_id, ctx, cart, &mut effects);
            }
            SelectorEvent::SetSizePreference { product_id, size } => {
                next.size_preferences.insert(product_id, size);
            }
            SelectorEvent::Clear => next.reset(),
            SelectorEvent::CatalogReloaded => next.reconcile(ctx),
        }

        Transition { state: next, effects }
    }

    /// Runs a transition and applies its effects to `cart`.
    ///
    /// Returns the handle of the line added by a completed selection.
    pub fn dispatch(&mut self, event: SelectorEvent, ctx: &PricingContext, cart: &mut CartStore) -> Option<LineHandle> {
        let Transition { state, effects } = self.transition(event, ctx, cart);
        *self = state;

        let mut added = None;
        for effect in effects {
            if let Some(handle) = effect.apply(cart) {
                added = Some(handle);
            }
        }

        // Multi-flavor adds only happen on completion
        if self.mode.is_multi() && added.is_some() {
            self.completed = added;
        }
        added
    }

    fn reset(&mut self) {
        self.chosen.clear();
        self.completed = None;
    }

    fn toggle(&mut self, product_id: String, ctx: &PricingContext, cart: &CartStore, effects: &mut Vec<CartEffect>) {
        let Some(product) = ctx.product(&product_id) else {
            debug!(product_id = %product_id, "toggle: unknown product, ignoring");
            return;
        };
        if !product.is_pizza() {
            debug!(product_id = %product_id, "toggle: not a pizza flavor, ignoring");
            return;
        }

        if self.mode == FlavorMode::Single {
            let size = self.effective_size(&[product_id.as_str()], ctx);
            let key = LineKey::single(product_id.as_str(), size);
            match cart.plain_line(&key) {
                Some(handle) => effects.push(CartEffect::Remove(handle)),
                None => effects.push(CartEffect::Add(LineDraft::from_products(&[product], size, ctx))),
            }
            return;
        }

        if let Some(pos) = self.chosen.iter().position(|id| *id == product_id) {
            self.chosen.remove(pos);
            if let Some(handle) = self.completed.take() {
                effects.push(CartEffect::RemoveOne(handle));
            }
            return;
        }

        if self.is_complete() {
            debug!(product_id = %product_id, "toggle: selection is full, ignoring");
            return;
        }

        self.chosen.push(product_id);
        if !self.is_complete() {
            return;
        }

        let size = self.effective_size(self.chosen.as_slice(), ctx);
        match ctx.products_for(self.chosen.as_slice()) {
            Some(products) => {
                effects.push(CartEffect::Add(LineDraft::from_products(&products, size, ctx)));
            }
            None => debug!("toggle: chosen flavor left the catalog, not adding"),
        }
    }

    fn reconcile(&mut self, ctx: &PricingContext) {
        if !ctx.is_mode_active(self.mode) {
            debug!(mode = %self.mode, "Flavor mode no longer offered, falling back to single");
            self.mode = FlavorMode::Single;
            self.reset();
            return;
        }

        let before = self.chosen.len();
        self.chosen.retain(|id| ctx.product(id).is_some());
        if self.chosen.len() != before {
            self.completed = None;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
