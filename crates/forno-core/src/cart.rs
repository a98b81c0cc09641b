//! # Cart Store
//!
//! The canonical collection of finalized order lines plus the running
//! subtotal.
//!
//! ## Line Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Two identities per line                           │
//! │                                                                         │
//! │  LineKey (derived, structured)           LineHandle (UUID v4)          │
//! │  ─────────────────────────────           ────────────────────          │
//! │  Single { product_id, size }             assigned once on creation,    │
//! │  Multi  { sorted product_ids, size }     addresses exactly one line    │
//! │                                                                         │
//! │  Display (external id contract):                                        │
//! │    "{productId}-{size}"                                                 │
//! │    "multi-{sortedIds joined by '-'}-{size}"                             │
//! │                                                                         │
//! │  Merge rule: same LineKey AND same modifiers (add-ons, crust)           │
//! │              → quantity += 1 instead of a new line                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FlavorSelector completes ──► add(draft) ──────► merge or push         │
//! │  Change quantity ──────────► set_quantity() ───► n ≤ 0 removes         │
//! │  Pick add-ons ─────────────► set_add_ons() ────► reprice line          │
//! │  Pick crust ───────────────► set_crust() ──────► reprice line          │
//! │  Click remove ─────────────► remove() ─────────► drop line             │
//! │  Catalog reload ───────────► reprice(ctx) ─────► refresh base prices   │
//! │                                                                         │
//! │  Every mutation recomputes subtotal = Σ unit_price × quantity          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations are total: an unknown line reference is a logged no-op,
//! never an error.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::PricingContext;
use crate::money::Money;
use crate::pricing;
use crate::types::{AddOn, Product, ProductKind, Size, StuffedCrust};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Line Identity
// =============================================================================

/// Unique handle of one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineHandle(Uuid);

impl LineHandle {
    fn new() -> Self {
        LineHandle(Uuid::new_v4())
    }
}

impl fmt::Display for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Structured merge key of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LineKey {
    /// Single-flavor pizza or a simple product.
    Single { product_id: String, size: Size },
    /// Multi-flavor pizza; ids are kept sorted.
    Multi { product_ids: Vec<String>, size: Size },
}

impl LineKey {
    /// Key of a single product at `size`.
    pub fn single(product_id: impl Into<String>, size: Size) -> Self {
        LineKey::Single {
            product_id: product_id.into(),
            size,
        }
    }

    /// Key of a pizza made of `product_ids`; one id yields a `Single` key.
    pub fn for_flavors<S: AsRef<str>>(product_ids: &[S], size: Size) -> Self {
        let mut ids: Vec<String> = product_ids.iter().map(|s| s.as_ref().to_string()).collect();
        if ids.len() == 1 {
            return LineKey::Single {
                product_id: ids.remove(0),
                size,
            };
        }
        ids.sort();
        LineKey::Multi {
            product_ids: ids,
            size,
        }
    }

    pub fn size(&self) -> Size {
        match self {
            LineKey::Single { size, .. } | LineKey::Multi { size, .. } => *size,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, LineKey::Multi { .. })
    }
}

/// Renders the external derived id.
impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKey::Single { product_id, size } => write!(f, "{}-{}", product_id, size.as_str()),
            LineKey::Multi { product_ids, size } => {
                write!(f, "multi-{}-{}", product_ids.join("-"), size.as_str())
            }
        }
    }
}

impl Serialize for LineKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How callers address a line: by handle, or by a string that is either a
/// handle or an external derived id.
#[derive(Debug, Clone, Copy)]
pub enum LineRef<'a> {
    Handle(LineHandle),
    Id(&'a str),
}

impl From<LineHandle> for LineRef<'_> {
    fn from(handle: LineHandle) -> Self {
        LineRef::Handle(handle)
    }
}

impl<'a> From<&'a str> for LineRef<'a> {
    fn from(id: &'a str) -> Self {
        LineRef::Id(id)
    }
}

impl<'a> From<&'a String> for LineRef<'a> {
    fn from(id: &'a String) -> Self {
        LineRef::Id(id.as_str())
    }
}

impl fmt::Display for LineRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Handle(h) => h.fmt(f),
            LineRef::Id(id) => f.write_str(id),
        }
    }
}

// =============================================================================
// Line Contents
// =============================================================================

/// Product data frozen on the line when it is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct FlavorSnapshot {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Product> for FlavorSnapshot {
    fn from(product: &Product) -> Self {
        FlavorSnapshot {
            product_id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
        }
    }
}

/// Add-ons chosen for one flavor of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct AddOnGroup {
    pub flavor_id: String,
    pub items: Vec<AddOn>,
}

/// A line ready to be added: key, frozen product data, base price and
/// modifiers.
#[derive(Debug, Clone)]
pub struct LineDraft {
    pub key: LineKey,
    pub flavors: Vec<FlavorSnapshot>,
    pub kind: ProductKind,
    pub base_price: Money,
    pub add_ons: Vec<AddOnGroup>,
    pub stuffed_crust: Option<StuffedCrust>,
}

impl LineDraft {
    /// Prices `products` at `size` and freezes their data.
    ///
    /// One product yields a single-flavor line, several yield a
    /// multi-flavor line priced at the most expensive flavor.
    pub fn from_products(products: &[&Product], size: Size, ctx: &PricingContext) -> Self {
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        LineDraft {
            key: LineKey::for_flavors(&ids, size),
            flavors: products.iter().map(|p| FlavorSnapshot::from(*p)).collect(),
            kind: products.first().map(|p| p.kind).unwrap_or_default(),
            base_price: pricing::base_price(products, size, ctx),
            add_ons: Vec::new(),
            stuffed_crust: None,
        }
    }

    /// Builder-style add-on group.
    pub fn with_add_ons(mut self, flavor_id: impl Into<String>, items: Vec<AddOn>) -> Self {
        let flavor_id = flavor_id.into();
        self.add_ons.retain(|g| g.flavor_id != flavor_id);
        if !items.is_empty() {
            self.add_ons.push(AddOnGroup { flavor_id, items });
        }
        self
    }

    /// Builder-style stuffed crust.
    pub fn with_crust(mut self, crust: StuffedCrust) -> Self {
        self.stuffed_crust = Some(crust);
        self
    }
}

/// One distinct orderable entry in the cart.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CartLine {
    #[ts(as = "String")]
    pub handle: LineHandle,

    /// Derived merge key; serialized as the external id string.
    #[ts(as = "String")]
    pub key: LineKey,

    /// 1-3 flavors, in the order the customer picked them.
    pub flavors: Vec<FlavorSnapshot>,

    pub kind: ProductKind,
    pub size: Size,

    /// Always ≥ 1; a line reaching zero is removed.
    pub quantity: u32,

    /// Flavor price (max of flavors for multi-flavor lines), frozen at add.
    pub base_price: Money,

    /// base price + add-ons + crust.
    pub unit_price: Money,

    /// Add-ons scoped per flavor; empty groups are never stored.
    pub add_ons: Vec<AddOnGroup>,

    pub stuffed_crust: Option<StuffedCrust>,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_draft(draft: LineDraft) -> Self {
        let size = draft.key.size();
        let mut line = CartLine {
            handle: LineHandle::new(),
            key: draft.key,
            flavors: draft.flavors,
            kind: draft.kind,
            size,
            quantity: 1,
            base_price: draft.base_price,
            unit_price: draft.base_price,
            add_ons: draft.add_ons.into_iter().filter(|g| !g.items.is_empty()).collect(),
            stuffed_crust: draft.stuffed_crust,
            added_at: Utc::now(),
        };
        line.recompute_unit_price();
        line
    }

    /// External derived id (`"{id}-{size}"` / `"multi-…-{size}"`).
    pub fn id(&self) -> String {
        self.key.to_string()
    }

    /// Flavor product ids, in pick order.
    pub fn flavor_ids(&self) -> Vec<&str> {
        self.flavors.iter().map(|f| f.product_id.as_str()).collect()
    }

    pub fn is_multi_flavor(&self) -> bool {
        self.flavors.len() > 1
    }

    /// Name shown on the line: the product name, or "Pizza" for
    /// multi-flavor lines.
    pub fn display_name(&self) -> String {
        match self.flavors.as_slice() {
            [single] => single.name.clone(),
            _ => "Pizza".to_string(),
        }
    }

    /// unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Add-on group of one flavor, if any.
    pub fn add_ons_for(&self, flavor_id: &str) -> Option<&AddOnGroup> {
        self.add_ons.iter().find(|g| g.flavor_id == flavor_id)
    }

    fn recompute_unit_price(&mut self) {
        self.unit_price = self.base_price + pricing::modifier_total(self);
    }

    fn has_modifiers(&self, add_ons: &[AddOnGroup], crust: &Option<StuffedCrust>) -> bool {
        self.stuffed_crust == *crust && normalized(&self.add_ons) == normalized(add_ons)
    }
}

/// Add-on groups in a canonical order, for modifier comparison.
fn normalized(groups: &[AddOnGroup]) -> Vec<(&str, Vec<&AddOn>)> {
    let mut out: Vec<(&str, Vec<&AddOn>)> = groups
        .iter()
        .filter(|g| !g.items.is_empty())
        .map(|g| {
            let mut items: Vec<&AddOn> = g.items.iter().collect();
            items.sort();
            (g.flavor_id.as_str(), items)
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(b.0));
    out
}

// =============================================================================
// Cart Store
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Every line has `quantity ≥ 1`
/// - No two lines share both key and modifiers
/// - `subtotal == Σ unit_price × quantity`
#[derive(Debug, Clone, Serialize)]
pub struct CartStore {
    lines: Vec<CartLine>,
    subtotal: Money,
    created_at: DateTime<Utc>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        CartStore {
            lines: Vec::new(),
            subtotal: Money::zero(),
            created_at: Utc::now(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a line, or increments an identical existing line.
    ///
    /// ## Behavior
    /// - Same key and same modifiers already in cart: quantity + 1
    /// - Otherwise: new line with quantity 1
    ///
    /// Returns the handle of the line that now holds the addition.
    pub fn add(&mut self, draft: LineDraft) -> LineHandle {
        let existing = self
            .lines
            .iter_mut()
            .find(|l| l.key == draft.key && l.has_modifiers(&draft.add_ons, &draft.stuffed_crust));

        let handle = match existing {
            Some(line) => {
                line.quantity = clamp_quantity(u64::from(line.quantity) + 1);
                debug!(line_id = %line.key, quantity = line.quantity, "Merged into existing cart line");
                line.handle
            }
            None => {
                let line = CartLine::from_draft(draft);
                debug!(line_id = %line.key, unit_price = %line.unit_price, "Added cart line");
                let handle = line.handle;
                self.lines.push(line);
                handle
            }
        };

        self.recompute_subtotal();
        handle
    }

    /// Removes one line.
    pub fn remove<'a>(&mut self, line: impl Into<LineRef<'a>>) {
        let line = line.into();
        match self.position(line) {
            Some(pos) => {
                self.lines.remove(pos);
                self.recompute_subtotal();
            }
            None => debug!(line = %line, "remove: unknown cart line, ignoring"),
        }
    }

    /// Takes one unit off a line, removing the line at zero.
    pub fn decrement<'a>(&mut self, line: impl Into<LineRef<'a>>) {
        let line = line.into();
        match self.line(line).map(|l| l.quantity) {
            Some(qty) => self.set_quantity(line, i64::from(qty) - 1),
            None => debug!(line = %line, "decrement: unknown cart line, ignoring"),
        }
    }

    /// Sets a line's quantity; `n ≤ 0` removes the line.
    pub fn set_quantity<'a>(&mut self, line: impl Into<LineRef<'a>>, n: i64) {
        let line = line.into();
        if n <= 0 {
            self.remove(line);
            return;
        }

        match self.position(line) {
            Some(pos) => {
                let qty = clamp_quantity(n.unsigned_abs());
                if let Some(l) = self.lines.get_mut(pos) {
                    l.quantity = qty;
                }
                self.recompute_subtotal();
            }
            None => debug!(line = %line, "set_quantity: unknown cart line, ignoring"),
        }
    }

    /// Replaces the add-on group of one flavor of a line.
    ///
    /// An empty `items` list removes the group. Requests for a flavor the
    /// line does not contain are ignored.
    pub fn set_add_ons<'a>(&mut self, line: impl Into<LineRef<'a>>, flavor_id: &str, items: Vec<AddOn>) {
        let line = line.into();
        let Some(pos) = self.position(line) else {
            debug!(line = %line, "set_add_ons: unknown cart line, ignoring");
            return;
        };
        let Some(l) = self.lines.get_mut(pos) else {
            return;
        };
        if !l.flavors.iter().any(|f| f.product_id == flavor_id) {
            debug!(line = %line, flavor_id, "set_add_ons: flavor not on line, ignoring");
            return;
        }

        let existing = l.add_ons.iter().position(|g| g.flavor_id == flavor_id);
        match (existing, items.is_empty()) {
            (Some(i), false) => l.add_ons[i].items = items,
            (Some(i), true) => {
                l.add_ons.remove(i);
            }
            (None, false) => l.add_ons.push(AddOnGroup {
                flavor_id: flavor_id.to_string(),
                items,
            }),
            (None, true) => {}
        }
        l.recompute_unit_price();

        self.coalesce(pos);
        self.recompute_subtotal();
    }

    /// Replaces or clears the stuffed-crust modifier of a line.
    pub fn set_crust<'a>(&mut self, line: impl Into<LineRef<'a>>, crust: Option<StuffedCrust>) {
        let line = line.into();
        let Some(pos) = self.position(line) else {
            debug!(line = %line, "set_crust: unknown cart line, ignoring");
            return;
        };
        if let Some(l) = self.lines.get_mut(pos) {
            l.stuffed_crust = crust;
            l.recompute_unit_price();
        }

        self.coalesce(pos);
        self.recompute_subtotal();
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.subtotal = Money::zero();
        self.created_at = Utc::now();
    }

    /// Refreshes every line's base price against a new catalog snapshot.
    ///
    /// Lines whose flavors have left the catalog keep their frozen price.
    pub fn reprice(&mut self, ctx: &PricingContext) {
        for line in &mut self.lines {
            let unit_price = pricing::line_unit_price(line, ctx);
            line.base_price = unit_price - pricing::modifier_total(line);
            line.unit_price = unit_price;
        }
        self.recompute_subtotal();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Looks up one line.
    pub fn line<'a>(&self, line: impl Into<LineRef<'a>>) -> Option<&CartLine> {
        self.position(line.into()).and_then(|pos| self.lines.get(pos))
    }

    /// True when some line has `key`.
    pub fn contains_key(&self, key: &LineKey) -> bool {
        self.lines.iter().any(|l| l.key == *key)
    }

    /// Handle of the line with `key` and no add-ons or crust.
    pub fn plain_line(&self, key: &LineKey) -> Option<LineHandle> {
        self.lines
            .iter()
            .find(|l| l.key == *key && l.has_modifiers(&[], &None))
            .map(|l| l.handle)
    }

    /// Σ(unit price × quantity).
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Σ quantities.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position(&self, line: LineRef<'_>) -> Option<usize> {
        match line {
            LineRef::Handle(handle) => self.lines.iter().position(|l| l.handle == handle),
            LineRef::Id(id) => self
                .lines
                .iter()
                .position(|l| l.handle.to_string() == id)
                .or_else(|| self.lines.iter().position(|l| l.key.to_string() == id)),
        }
    }

    /// Folds the line at `pos` into another line with the same key and
    /// modifiers, if one exists.
    fn coalesce(&mut self, pos: usize) {
        let Some(edited) = self.lines.get(pos) else {
            return;
        };
        let twin = self.lines.iter().enumerate().position(|(i, l)| {
            i != pos && l.key == edited.key && l.has_modifiers(&edited.add_ons, &edited.stuffed_crust)
        });

        if let Some(twin) = twin {
            let moved = self.lines.remove(pos);
            let twin = if twin > pos { twin - 1 } else { twin };
            if let Some(target) = self.lines.get_mut(twin) {
                target.quantity =
                    clamp_quantity(u64::from(target.quantity) + u64::from(moved.quantity));
                debug!(line_id = %target.key, quantity = target.quantity, "Folded identical cart lines");
            }
        }
    }

    fn recompute_subtotal(&mut self) {
        self.subtotal = self.lines.iter().map(CartLine::line_total).sum();
    }
}

fn clamp_quantity(qty: u64) -> u32 {
    let max = u64::from(MAX_ITEM_QUANTITY);
    if qty > max {
        warn!(requested = qty, max, "Quantity above maximum, clamping");
        MAX_ITEM_QUANTITY
    } else {
        // qty ≤ 999 here
        qty as u32
    }
}

/// Cart totals summary for UI responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: u32,
    pub total_quantity: u32,
    pub subtotal: Money,
}

impl From<&CartStore> for CartTotals {
    fn from(cart: &CartStore) -> Self {
        CartTotals {
            line_count: cart.lines.len() as u32,
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
