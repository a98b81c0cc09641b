//! # Storefront Session
//!
//! One customer's visit: the catalog context, the in-progress flavor
//! selection, the cart, and the order waiting to be handed off.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Session Lifecycle                              │
//! │                                                                         │
//! │  Session::new(snapshot, config)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────┐  toggle_flavor   ┌──────────────┐                     │
//! │  │ FlavorSelector├────────────────►│  CartStore   │◄── toggle_product   │
//! │  └──────────────┘  (completed)     └──────┬───────┘    set_quantity     │
//! │                                           │            set_add_ons      │
//! │                                           │ checkout(form, lookup)      │
//! │                                           ▼                             │
//! │                                    ┌──────────────┐                     │
//! │                                    │ OrderDraft + │  any cart edit      │
//! │                                    │   Handoff    │──► discarded        │
//! │                                    └──────┬───────┘                     │
//! │                                           │ hand_off(transport)         │
//! │                                           ▼                             │
//! │                          Opened (cart cleared) | ManualFallback         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! `Session` itself is single-owner. UI glue that shares it between event
//! handlers wraps it in [`SessionState`].

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use forno_core::checkout::assemble;
use forno_core::message::build_handoff;
use forno_core::types::{AddOn, DeliveryType, FlavorMode, ResolvedAddress, Size, StuffedCrust};
use forno_core::validation::validate_postal_code;
use forno_core::{
    CartStore, CartTotals, CatalogSnapshot, CheckoutForm, CoreError, FlavorSelector, Handoff,
    LineDraft, LineHandle, LineKey, LineRef, OrderDraft, PricingContext, SelectorEvent,
};

use crate::config::StorefrontConfig;
use crate::error::{StorefrontError, StorefrontResult};
use crate::lookup::AddressLookup;
use crate::transport::{HandoffOutcome, HandoffTransport};

// =============================================================================
// Session
// =============================================================================

/// A single storefront visit.
#[derive(Debug)]
pub struct Session {
    ctx: PricingContext,
    selector: FlavorSelector,
    cart: CartStore,
    config: StorefrontConfig,
    pending: Option<PendingOrder>,
}

/// A validated order and its rendered handoff, waiting for `hand_off`.
#[derive(Debug, Clone)]
pub struct PendingOrder {
    pub order: OrderDraft,
    pub handoff: Handoff,
}

impl Session {
    /// Starts a session over a catalog snapshot.
    ///
    /// The configured store settings replace whatever settings the snapshot
    /// carried.
    pub fn new(snapshot: CatalogSnapshot, config: &StorefrontConfig) -> StorefrontResult<Self> {
        let ctx = build_context(snapshot, config)?;
        info!(
            store = %ctx.config().name,
            products = ctx.active_products().count(),
            "Storefront session started"
        );

        Ok(Session {
            ctx,
            selector: FlavorSelector::new(),
            cart: CartStore::new(),
            config: config.clone(),
            pending: None,
        })
    }

    // =========================================================================
    // Flavor Selection
    // =========================================================================

    /// Switches the flavor-count mode. Inactive modes are ignored.
    pub fn set_mode(&mut self, mode: FlavorMode) {
        self.dispatch(SelectorEvent::SetMode(mode));
    }

    /// Picks or unpicks a pizza flavor. Returns the handle of a line added
    /// as a result, if any.
    pub fn toggle_flavor(&mut self, product_id: &str) -> Option<LineHandle> {
        self.dispatch(SelectorEvent::Toggle(product_id.to_string()))
    }

    pub fn set_size_preference(&mut self, product_id: &str, size: Size) {
        self.dispatch(SelectorEvent::SetSizePreference {
            product_id: product_id.to_string(),
            size,
        });
    }

    /// Drops the in-progress selection without touching the cart.
    pub fn clear_selection(&mut self) {
        self.dispatch(SelectorEvent::Clear);
    }

    fn dispatch(&mut self, event: SelectorEvent) -> Option<LineHandle> {
        let before = self.cart.totals();
        let added = self.selector.dispatch(event, &self.ctx, &mut self.cart);
        if added.is_some() || self.cart.totals() != before {
            self.discard_pending();
        }
        added
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds a non-pizza product, or removes it if it is already in the cart.
    ///
    /// Pizzas go through the flavor selector instead.
    pub fn toggle_product(&mut self, product_id: &str) -> Option<LineHandle> {
        let Some(product) = self.ctx.product(product_id) else {
            debug!(product_id, "Toggle of unknown product ignored");
            return None;
        };

        if product.is_pizza() {
            return self.toggle_flavor(product_id);
        }

        let key = LineKey::single(product_id, Size::Regular);
        if let Some(handle) = self.cart.plain_line(&key) {
            self.discard_pending();
            self.cart.remove(handle);
            return None;
        }

        let draft = LineDraft::from_products(&[product], Size::Regular, &self.ctx);
        self.discard_pending();
        Some(self.cart.add(draft))
    }

    /// Adds one unit of a product at `size`, bypassing the selector.
    pub fn add_product(&mut self, product_id: &str, size: Size) -> StorefrontResult<LineHandle> {
        let product = self.ctx.require_product(product_id)?;
        let size = if product.is_pizza() && self.ctx.is_size_enabled(size) {
            size
        } else {
            Size::Regular
        };

        let draft = LineDraft::from_products(&[product], size, &self.ctx);
        self.discard_pending();
        Ok(self.cart.add(draft))
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn set_quantity<'a>(&mut self, line: impl Into<LineRef<'a>>, quantity: i64) {
        self.discard_pending();
        self.cart.set_quantity(line, quantity);
    }

    pub fn remove_line<'a>(&mut self, line: impl Into<LineRef<'a>>) {
        self.discard_pending();
        self.cart.remove(line);
    }

    /// Replaces the add-ons of one flavor on a line, by add-on name.
    ///
    /// ## Errors
    /// - `ProductNotFound` when the flavor is not in the catalog
    /// - `AddOnNotFound` when a name is not offered for that flavor
    pub fn set_add_ons<'a, S: AsRef<str>>(
        &mut self,
        line: impl Into<LineRef<'a>>,
        flavor_id: &str,
        names: &[S],
    ) -> StorefrontResult<()> {
        let product = self.ctx.require_product(flavor_id)?;
        let items = names
            .iter()
            .map(|name| {
                product.add_on(name.as_ref()).cloned().ok_or_else(|| CoreError::AddOnNotFound {
                    product_id: flavor_id.to_string(),
                    name: name.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<AddOn>, _>>()?;

        self.discard_pending();
        self.cart.set_add_ons(line, flavor_id, items);
        Ok(())
    }

    /// Sets or clears a line's stuffed crust, by crust id.
    pub fn set_crust<'a>(
        &mut self,
        line: impl Into<LineRef<'a>>,
        crust_id: Option<&str>,
    ) -> StorefrontResult<()> {
        let crust = match crust_id {
            None => None,
            Some(id) => {
                let option = self
                    .ctx
                    .stuffed_crust(id)
                    .ok_or_else(|| CoreError::CrustNotFound(id.to_string()))?;
                Some(StuffedCrust::from(option))
            }
        };

        self.discard_pending();
        self.cart.set_crust(line, crust);
        Ok(())
    }

    pub fn clear_cart(&mut self) {
        self.discard_pending();
        self.cart.clear();
    }

    // =========================================================================
    // Catalog Reload
    // =========================================================================

    /// Swaps in a fresh catalog snapshot, reconciling the selector and
    /// repricing the cart.
    pub fn reload_catalog(&mut self, snapshot: CatalogSnapshot) -> StorefrontResult<()> {
        let ctx = build_context(snapshot, &self.config)?;
        self.ctx = ctx;
        self.selector.dispatch(SelectorEvent::CatalogReloaded, &self.ctx, &mut self.cart);
        self.cart.reprice(&self.ctx);
        self.discard_pending();

        info!(
            products = self.ctx.active_products().count(),
            mode = %self.selector.mode(),
            "Catalog reloaded"
        );
        Ok(())
    }

    // =========================================================================
    // Checkout & Handoff
    // =========================================================================

    /// Validates the cart and form, resolving the postal code for delivery
    /// orders, and renders the handoff.
    ///
    /// ## Errors
    /// - `Checkout` listing every unmet condition
    /// - `LookupFailed` / `LookupTimeout` when the address service is down
    pub async fn checkout<L: AddressLookup>(
        &mut self,
        form: &CheckoutForm,
        lookup: &L,
    ) -> StorefrontResult<Handoff> {
        let resolved = resolve_address(form, lookup, self.config.lookup_timeout_secs).await?;
        self.finish_checkout(form, resolved.as_ref())
    }

    /// Runs the assembler against an already-resolved address.
    pub fn finish_checkout(
        &mut self,
        form: &CheckoutForm,
        resolved: Option<&ResolvedAddress>,
    ) -> StorefrontResult<Handoff> {
        self.pending = None;

        let order = assemble(&self.cart, form, resolved, &self.ctx)?;
        let handoff = build_handoff(&order, self.ctx.config());

        info!(
            order_id = %order.id,
            total = %order.total,
            truncated = handoff.truncated,
            "Order ready for handoff"
        );

        self.pending = Some(PendingOrder {
            order,
            handoff: handoff.clone(),
        });
        Ok(handoff)
    }

    /// Opens the pending order's messaging link.
    ///
    /// On success the cart and selection are cleared. On transport failure
    /// the order stays pending and the caller gets the link and text for
    /// manual copy.
    pub fn hand_off<T: HandoffTransport + ?Sized>(
        &mut self,
        transport: &T,
    ) -> StorefrontResult<HandoffOutcome> {
        let pending = self.pending.as_ref().ok_or(StorefrontError::NothingToHandOff)?;
        let url = pending.handoff.url.clone();

        match transport.open(&url) {
            Ok(()) => {
                info!(order_id = %pending.order.id, "Order handed off");
                self.pending = None;
                self.cart.clear();
                self.selector.dispatch(SelectorEvent::Clear, &self.ctx, &mut self.cart);
                Ok(HandoffOutcome::Opened { url })
            }
            Err(e) => {
                warn!(order_id = %pending.order.id, "Handoff failed, offering manual copy: {}", e);
                Ok(HandoffOutcome::ManualFallback {
                    url,
                    text: pending.handoff.text.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn discard_pending(&mut self) {
        if self.pending.take().is_some() {
            debug!("Cart changed, pending order discarded");
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn context(&self) -> &PricingContext {
        &self.ctx
    }

    pub fn selector(&self) -> &FlavorSelector {
        &self.selector
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn lookup_timeout_secs(&self) -> u64 {
        self.config.lookup_timeout_secs
    }
}

fn build_context(
    mut snapshot: CatalogSnapshot,
    config: &StorefrontConfig,
) -> StorefrontResult<PricingContext> {
    snapshot.config = config.store.clone();
    Ok(PricingContext::new(snapshot)?)
}

/// Looks up the delivery postal code, bounded by `timeout_secs`.
///
/// Pickup orders, missing addresses and malformed codes skip the lookup;
/// the assembler reports those itself.
pub async fn resolve_address<L: AddressLookup>(
    form: &CheckoutForm,
    lookup: &L,
    timeout_secs: u64,
) -> StorefrontResult<Option<ResolvedAddress>> {
    if form.delivery_type != DeliveryType::Delivery {
        return Ok(None);
    }
    let Some(address) = &form.address else {
        return Ok(None);
    };
    let Ok(code) = validate_postal_code(&address.postal_code) else {
        return Ok(None);
    };

    let resolved = tokio::time::timeout(Duration::from_secs(timeout_secs), lookup.lookup(&code))
        .await
        .map_err(|_| StorefrontError::LookupTimeout(timeout_secs))??;

    debug!(postal_code = %code, found = resolved.is_some(), "Postal code resolved");
    Ok(resolved)
}

// =============================================================================
// Shared State
// =============================================================================

/// Session shared between UI event handlers.
#[derive(Debug, Clone)]
pub struct SessionState {
    session: Arc<Mutex<Session>>,
}

impl SessionState {
    pub fn new(session: Session) -> Self {
        SessionState {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = state.with_session(|s| s.totals());
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.with_session_mut(|s| s.toggle_flavor("3"));
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut session)
    }

    /// Checkout without holding the lock across the address lookup.
    pub async fn checkout<L: AddressLookup>(
        &self,
        form: &CheckoutForm,
        lookup: &L,
    ) -> StorefrontResult<Handoff> {
        let timeout_secs = self.with_session(Session::lookup_timeout_secs);
        let resolved = resolve_address(form, lookup, timeout_secs).await?;
        self.with_session_mut(|s| s.finish_checkout(form, resolved.as_ref()))
    }
}
