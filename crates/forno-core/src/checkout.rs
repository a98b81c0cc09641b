//! # Order Assembler
//!
//! Turns a cart snapshot plus the checkout form into a validated
//! [`OrderDraft`], or rejects it with every unmet condition at once.
//!
//! ## Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart          at least one line                                        │
//! │  customer      name present, phone ≥ 10 digits                          │
//! │  delivery      postal code resolved, house number present,              │
//! │                no promotional line (promotions are pickup-only)         │
//! │  minimum       subtotal ≥ minimum order value (fee excluded)            │
//! │  payment       chosen and currently accepted                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The postal-code lookup is an I/O collaborator; callers resolve the
//! address first and hand the result in. A draft is never partially built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{CartLine, CartStore};
use crate::catalog::PricingContext;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Customer, DeliveryAddress, DeliveryType, PaymentMethod, ResolvedAddress};
use crate::validation::{normalize_postal_code, validate_customer_name, validate_phone, validate_postal_code};

// =============================================================================
// Form Input
// =============================================================================

/// Address fields as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddressForm {
    pub postal_code: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
}

/// Everything the checkout form collects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutForm {
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub customer: Customer,
    /// Required for delivery, ignored for pickup.
    #[serde(default)]
    pub address: Option<AddressForm>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Failures
// =============================================================================

/// One unmet checkout condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutFailure {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Customer name: {0}")]
    CustomerName(ValidationError),

    #[error("Customer phone: {0}")]
    Phone(ValidationError),

    #[error("Delivery address is required")]
    MissingAddress,

    #[error("Postal code: {0}")]
    PostalCode(ValidationError),

    #[error("Postal code {0} was not found")]
    UnknownPostalCode(String),

    #[error("House number is required")]
    MissingHouseNumber,

    /// Promotions are pickup-only; lists the offending line ids.
    #[error("Promotional items are pickup-only: {}", .lines.join(", "))]
    PromotionalDelivery { lines: Vec<String> },

    /// Subtotal (without delivery fee) below the store minimum.
    #[error("Minimum order is {minimum}, subtotal is {subtotal}")]
    BelowMinimum { subtotal: Money, minimum: Money },

    #[error("Payment method is required")]
    MissingPaymentMethod,

    #[error("Payment method {0} is not accepted")]
    PaymentMethodDisabled(PaymentMethod),
}

/// Every failed check of one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Order rejected: {}", summarize(.failures))]
pub struct CheckoutRejected {
    pub failures: Vec<CheckoutFailure>,
}

impl CheckoutRejected {
    /// True when `pred` matches one of the failures.
    pub fn has(&self, pred: impl Fn(&CheckoutFailure) -> bool) -> bool {
        self.failures.iter().any(pred)
    }
}

fn summarize(failures: &[CheckoutFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Order Draft
// =============================================================================

/// A validated order, ready to be rendered for handoff.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    #[ts(as = "String")]
    pub id: Uuid,
    pub lines: Vec<CartLine>,
    pub delivery_type: DeliveryType,
    pub customer: Customer,
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub subtotal: Money,
    /// Zero for pickup.
    pub delivery_fee: Money,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    pub fn is_delivery(&self) -> bool {
        self.delivery_type == DeliveryType::Delivery
    }
}

/// Validates `form` against `cart` and builds the order.
///
/// `resolved` is the address the lookup collaborator returned for the
/// form's postal code, or `None` when the code is unknown or was not
/// looked up.
///
/// ## Errors
/// `CheckoutRejected` listing every failed check, in check order.
pub fn assemble(
    cart: &CartStore,
    form: &CheckoutForm,
    resolved: Option<&ResolvedAddress>,
    ctx: &PricingContext,
) -> Result<OrderDraft, CheckoutRejected> {
    let config = ctx.config();
    let mut failures = Vec::new();

    if cart.is_empty() {
        failures.push(CheckoutFailure::EmptyCart);
    }

    if let Err(e) = validate_customer_name(&form.customer.name) {
        failures.push(CheckoutFailure::CustomerName(e));
    }
    if let Err(e) = validate_phone(&form.customer.phone) {
        failures.push(CheckoutFailure::Phone(e));
    }

    let delivery_address = match form.delivery_type {
        DeliveryType::Pickup => None,
        DeliveryType::Delivery => check_delivery(cart, form, resolved, ctx, &mut failures),
    };

    let subtotal = cart.subtotal();
    if subtotal < config.minimum_order_value {
        failures.push(CheckoutFailure::BelowMinimum {
            subtotal,
            minimum: config.minimum_order_value,
        });
    }

    let payment_method = match form.payment_method {
        None => {
            failures.push(CheckoutFailure::MissingPaymentMethod);
            None
        }
        Some(method) if !config.accepts(method) => {
            failures.push(CheckoutFailure::PaymentMethodDisabled(method));
            None
        }
        Some(method) => Some(method),
    };

    let payment_method = match payment_method {
        Some(method) if failures.is_empty() => method,
        _ => {
            tracing::debug!(failures = failures.len(), "Checkout rejected");
            return Err(CheckoutRejected { failures });
        }
    };

    let delivery_fee = match form.delivery_type {
        DeliveryType::Pickup => Money::zero(),
        DeliveryType::Delivery => config.delivery_fee,
    };

    Ok(OrderDraft {
        id: Uuid::new_v4(),
        lines: cart.lines().to_vec(),
        delivery_type: form.delivery_type,
        customer: Customer {
            name: form.customer.name.trim().to_string(),
            phone: form.customer.phone.trim().to_string(),
        },
        delivery_address,
        payment_method,
        notes: non_blank(form.notes.as_deref()),
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
        created_at: Utc::now(),
    })
}

fn check_delivery(
    cart: &CartStore,
    form: &CheckoutForm,
    resolved: Option<&ResolvedAddress>,
    ctx: &PricingContext,
    failures: &mut Vec<CheckoutFailure>,
) -> Option<DeliveryAddress> {
    let promotional: Vec<String> = cart
        .lines()
        .iter()
        .filter(|line| ctx.any_promotional(line.flavor_ids().as_slice()))
        .map(CartLine::id)
        .collect();
    if !promotional.is_empty() {
        failures.push(CheckoutFailure::PromotionalDelivery { lines: promotional });
    }

    let Some(address) = &form.address else {
        failures.push(CheckoutFailure::MissingAddress);
        return None;
    };

    let resolved = match validate_postal_code(&address.postal_code) {
        Err(e) => {
            failures.push(CheckoutFailure::PostalCode(e));
            None
        }
        Ok(code) => {
            let found = resolved.filter(|r| normalize_postal_code(&r.postal_code) == code);
            if found.is_none() {
                failures.push(CheckoutFailure::UnknownPostalCode(code));
            }
            found
        }
    };

    if address.number.trim().is_empty() {
        failures.push(CheckoutFailure::MissingHouseNumber);
    }

    resolved.map(|r| DeliveryAddress {
        resolved: r.clone(),
        number: address.number.trim().to_string(),
        complement: non_blank(address.complement.as_deref()),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
