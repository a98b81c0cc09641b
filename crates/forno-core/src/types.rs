//! # Domain Types
//!
//! Catalog and checkout types shared by every forno-core module.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  FlavorOption   │   │ StuffedCrust    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │    Option       │       │
//! │  │  id             │   │  max_flavors    │   │  ─────────────  │       │
//! │  │  kind           │   │  (1 | 2 | 3)    │   │  id, name       │       │
//! │  │  base_price     │   │  active         │   │  price, active  │       │
//! │  │  promo_price    │   └─────────────────┘   └─────────────────┘       │
//! │  │  add_ons        │                                                   │
//! │  └─────────────────┘   ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │  StoreConfig    │   │ DeliveryType    │       │
//! │  ┌─────────────────┐   │  ─────────────  │   │  Pickup         │       │
//! │  │      Size       │   │  minimum order  │   │  Delivery       │       │
//! │  │  Regular (8)    │   │  delivery fee   │   └─────────────────┘       │
//! │  │  Small   (4)    │   │  payment flags  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog records are an immutable snapshot for the duration of a cart
//! session; they arrive from the storage collaborator as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Size
// =============================================================================

/// Pizza size. Non-pizza products are always sold as `Regular`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    /// Full pizza, 8 slices.
    #[default]
    Regular,
    /// Half-size pizza, 4 slices.
    Small,
}

impl Size {
    /// Number of slices for this size.
    pub const fn slices(&self) -> u8 {
        match self {
            Size::Regular => 8,
            Size::Small => 4,
        }
    }

    /// Identifier used inside derived line ids.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Size::Regular => "regular",
            Size::Small => "small",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Regular => write!(f, "Regular"),
            Size::Small => write!(f, "Small"),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// What kind of menu item a product is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A pizza flavor (usable in multi-flavor pizzas).
    #[default]
    Pizza,
    /// A drink, sold as-is.
    Beverage,
    /// Anything else on the menu.
    Other,
}

/// Per-size price table. A missing entry means the size is not sold at that
/// tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceTable {
    #[serde(default)]
    pub regular: Option<Money>,
    #[serde(default)]
    pub small: Option<Money>,
}

impl PriceTable {
    /// Price table with only a regular entry.
    pub const fn regular(price: Money) -> Self {
        PriceTable {
            regular: Some(price),
            small: None,
        }
    }

    /// Price table with both entries.
    pub const fn sized(regular: Money, small: Money) -> Self {
        PriceTable {
            regular: Some(regular),
            small: Some(small),
        }
    }

    /// Returns the entry for `size`, if any.
    pub const fn get(&self, size: Size) -> Option<Money> {
        match size {
            Size::Regular => self.regular,
            Size::Small => self.small,
        }
    }

    /// True when neither size has a price.
    pub const fn is_empty(&self) -> bool {
        self.regular.is_none() && self.small.is_none()
    }
}

/// An optional extra ingredient, priced per flavor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddOn {
    pub name: String,
    pub price: Money,
}

impl AddOn {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        AddOn {
            name: name.into(),
            price,
        }
    }
}

/// A menu item from the catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Catalog identifier.
    pub id: String,

    /// Display name shown on the menu and in the handoff message.
    pub name: String,

    #[serde(default)]
    pub kind: ProductKind,

    /// Regular price per size.
    pub base_price: PriceTable,

    /// Promotional price per size, used while `is_promo_active`.
    #[serde(default)]
    pub promo_price: PriceTable,

    #[serde(default)]
    pub is_promo_active: bool,

    /// Add-ons offered for this flavor.
    #[serde(default)]
    pub add_ons: Vec<AddOn>,

    /// Ingredients / description, rendered next to the flavor name.
    #[serde(default)]
    pub description: Option<String>,

    /// Soft-delete flag; inactive products are not offered.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Product {
    /// True for pizza flavors.
    pub fn is_pizza(&self) -> bool {
        self.kind == ProductKind::Pizza
    }

    /// Looks up an offered add-on by name.
    pub fn add_on(&self, name: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| a.name == name)
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Flavor Options
// =============================================================================

/// How many flavors share one pizza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FlavorMode {
    #[default]
    Single,
    Double,
    Triple,
}

impl FlavorMode {
    /// Number of flavors a completed selection holds.
    pub const fn count(&self) -> usize {
        match self {
            FlavorMode::Single => 1,
            FlavorMode::Double => 2,
            FlavorMode::Triple => 3,
        }
    }

    /// True for the accumulating (2 and 3 flavor) modes.
    pub const fn is_multi(&self) -> bool {
        !matches!(self, FlavorMode::Single)
    }
}

impl TryFrom<u8> for FlavorMode {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FlavorMode::Single),
            2 => Ok(FlavorMode::Double),
            3 => Ok(FlavorMode::Triple),
            other => Err(ValidationError::OutOfRange {
                field: format!("max_flavors ({other})"),
                min: 1,
                max: 3,
            }),
        }
    }
}

impl From<FlavorMode> for u8 {
    fn from(mode: FlavorMode) -> Self {
        mode.count() as u8
    }
}

impl fmt::Display for FlavorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlavorMode::Single => write!(f, "1 flavor"),
            other => write!(f, "{} flavors", other.count()),
        }
    }
}

/// A flavor-count mode the store currently offers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FlavorOption {
    #[ts(as = "u8")]
    pub max_flavors: FlavorMode,
    #[serde(default = "default_true")]
    pub active: bool,
}

// =============================================================================
// Stuffed Crust
// =============================================================================

/// A stuffed-crust option from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StuffedCrustOption {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// The stuffed-crust modifier as frozen on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StuffedCrust {
    pub id: String,
    pub name: String,
    pub price: Money,
}

impl From<&StuffedCrustOption> for StuffedCrust {
    fn from(option: &StuffedCrustOption) -> Self {
        StuffedCrust {
            id: option.id.clone(),
            name: option.name.clone(),
            price: option.price,
        }
    }
}

// =============================================================================
// Checkout Types
// =============================================================================

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Customer collects at the counter.
    Pickup,
    /// Courier delivers to an address; a delivery fee applies.
    #[default]
    Delivery,
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryType::Pickup => write!(f, "Pickup"),
            DeliveryType::Delivery => write!(f, "Delivery"),
        }
    }
}

/// Payment method the customer will use on delivery or pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash, possibly needing change.
    Cash,
    /// Card on the courier's or counter terminal.
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
        }
    }
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

/// An address resolved from a postal code by the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedAddress {
    /// Normalized, digits only.
    pub postal_code: String,
    pub street: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

impl ResolvedAddress {
    /// `street, neighborhood, city/state`, skipping empty parts.
    pub fn full_address(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !self.street.is_empty() {
            parts.push(self.street.clone());
        }
        if !self.neighborhood.is_empty() {
            parts.push(self.neighborhood.clone());
        }
        if !self.city.is_empty() && !self.state.is_empty() {
            parts.push(format!("{}/{}", self.city, self.state));
        }
        parts.join(", ")
    }
}

/// A resolved address plus the parts only the customer knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryAddress {
    pub resolved: ResolvedAddress,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Store-wide settings consumed by pricing, checkout and the message.
///
/// ## Example Config File
/// ```toml
/// [store]
/// name = "Pizzaria Bella Vista"
/// whatsapp = "5511999887766"
/// delivery_fee = 500          # cents
/// minimum_order_value = 2000  # cents
/// accepts_cash = true
/// accepts_card = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store name, rendered as the message header.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Destination number for the messaging handoff.
    #[serde(default = "default_whatsapp")]
    pub whatsapp: String,

    /// Country calling code prepended to the destination number.
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Added to delivery orders only; never counts toward the minimum.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Money,

    /// Smallest accepted subtotal.
    #[serde(default = "default_minimum_order")]
    pub minimum_order_value: Money,

    #[serde(default = "default_true")]
    pub accepts_cash: bool,

    #[serde(default = "default_true")]
    pub accepts_card: bool,

    /// Master switch for product promotions.
    #[serde(default = "default_true")]
    pub promotions_enabled: bool,

    /// Whether the small size is sold at all.
    #[serde(default = "default_true")]
    pub small_size_enabled: bool,

    /// Whether stuffed crusts are sold at all.
    #[serde(default = "default_true")]
    pub stuffed_crust_enabled: bool,

    /// Delivery estimate lower bound, in minutes.
    #[serde(default = "default_delivery_time_min")]
    pub delivery_time_min: u32,

    /// Delivery estimate upper bound, in minutes.
    #[serde(default = "default_delivery_time_max")]
    pub delivery_time_max: u32,
}

fn default_store_name() -> String {
    "Pizzaria Bella Vista".to_string()
}

fn default_whatsapp() -> String {
    "5511999887766".to_string()
}

fn default_country_code() -> String {
    "55".to_string()
}

fn default_delivery_fee() -> Money {
    Money::from_cents(500)
}

fn default_minimum_order() -> Money {
    Money::from_cents(2000)
}

fn default_delivery_time_min() -> u32 {
    60
}

fn default_delivery_time_max() -> u32 {
    90
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: default_store_name(),
            whatsapp: default_whatsapp(),
            country_code: default_country_code(),
            delivery_fee: default_delivery_fee(),
            minimum_order_value: default_minimum_order(),
            accepts_cash: true,
            accepts_card: true,
            promotions_enabled: true,
            small_size_enabled: true,
            stuffed_crust_enabled: true,
            delivery_time_min: default_delivery_time_min(),
            delivery_time_max: default_delivery_time_max(),
        }
    }
}

impl StoreConfig {
    /// Payment methods currently accepted, in display order.
    pub fn enabled_payment_methods(&self) -> Vec<PaymentMethod> {
        let mut methods = Vec::with_capacity(2);
        if self.accepts_cash {
            methods.push(PaymentMethod::Cash);
        }
        if self.accepts_card {
            methods.push(PaymentMethod::Card);
        }
        methods
    }

    /// True when `method` is currently accepted.
    pub fn accepts(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Cash => self.accepts_cash,
            PaymentMethod::Card => self.accepts_card,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
