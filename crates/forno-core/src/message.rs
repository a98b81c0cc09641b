//! # Message Serializer
//!
//! Renders an [`OrderDraft`] into the text a human operator receives through
//! the messaging link, and builds that link.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDraft ──► render() ──► sanitize() ──► truncate(1500)              │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                         percent-encode ──► URL          │
//! │                                                  │                      │
//! │                         URL > 2000? ──yes──► truncate(1000), then       │
//! │                                              halve until the URL fits   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Accented letters and emoji expand up to twelve-fold when percent-encoded,
//! so the character ceiling alone does not bound the URL.
//!
//! ## Section Order
//! header → items → delivery type → customer → address → notes → payment →
//! subtotal / delivery fee / total.

use std::fmt::Write as _;

use crate::cart::CartLine;
use crate::checkout::OrderDraft;
use crate::types::{ProductKind, StoreConfig};
use crate::validation::{digits_only, mask_postal_code};

// =============================================================================
// Limits
// =============================================================================

/// Character ceiling of the sanitized message.
pub const MAX_MESSAGE_CHARS: usize = 1500;

/// Ceiling of the full transport URL, after encoding.
pub const MAX_URL_CHARS: usize = 2000;

/// Character ceiling used when the encoded URL is still too long.
pub const FALLBACK_MESSAGE_CHARS: usize = 1000;

/// Appended, on its own line, to every truncated message.
pub const TRUNCATION_MARKER: &str = "(message truncated)";

/// Prefix of the messaging transport link.
pub const TRANSPORT_BASE_URL: &str = "https://wa.me/";

/// Longest national number (area code plus subscriber) a destination can have.
pub const MAX_NATIONAL_DIGITS: usize = 11;

// =============================================================================
// Handoff
// =============================================================================

/// The rendered order, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, ts_rs::TS)]
#[ts(export)]
pub struct Handoff {
    /// Normalized destination number (country code + digits).
    pub phone: String,
    /// The message as encoded in `url`; shown for manual copy when the
    /// link cannot be opened.
    pub text: String,
    pub url: String,
    pub truncated: bool,
}

/// Renders, sanitizes and bounds the order message, and builds the link.
pub fn build_handoff(order: &OrderDraft, config: &StoreConfig) -> Handoff {
    let phone = normalize_phone(&config.whatsapp, &config.country_code);
    let full = sanitize(&render(order, config));

    let mut limit = MAX_MESSAGE_CHARS;
    loop {
        let (text, truncated) = truncate(&full, limit);
        let url = transport_url(&phone, &text);

        if url.len() <= MAX_URL_CHARS || limit == 0 {
            if truncated {
                tracing::warn!(
                    order_id = %order.id,
                    limit,
                    url_len = url.len(),
                    "Handoff message truncated"
                );
            }
            return Handoff {
                phone,
                text,
                url,
                truncated,
            };
        }

        limit = if limit > FALLBACK_MESSAGE_CHARS {
            FALLBACK_MESSAGE_CHARS
        } else {
            limit / 2
        };
    }
}

/// `https://wa.me/<phone>?text=<percent-encoded text>`.
pub fn transport_url(phone: &str, text: &str) -> String {
    format!("{}{}?text={}", TRANSPORT_BASE_URL, phone, encode(text))
}

/// Percent-encodes `text` for a query value; spaces become `%20`.
pub fn encode(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Normalizes a destination number for the transport.
///
/// Strips non-digits and drops one leading zero. A number that fits in
/// [`MAX_NATIONAL_DIGITS`] is national and always gets `country_code`
/// prepended, even when its area code happens to equal the country code.
/// Longer numbers keep an existing `country_code` prefix. Best effort:
/// never fails.
///
/// ## Example
/// ```rust
/// use forno_core::message::normalize_phone;
///
/// assert_eq!(normalize_phone("(011) 99988-7766", "55"), "5511999887766");
/// assert_eq!(normalize_phone("+55 11 99988-7766", "55"), "5511999887766");
/// assert_eq!(normalize_phone("(55) 99988-7766", "55"), "5555999887766");
/// ```
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits = digits_only(raw);
    let digits = digits.strip_prefix('0').unwrap_or(&digits);
    let country_code = digits_only(country_code);

    if digits.len() > MAX_NATIONAL_DIGITS && digits.starts_with(&country_code) {
        digits.to_string()
    } else {
        format!("{country_code}{digits}")
    }
}

// =============================================================================
// Sanitize / Truncate
// =============================================================================

/// Drops zero-width and bidi marks, soft hyphens, U+FFFD and every control
/// character except `\n`.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| match c {
            '\n' => true,
            '\u{200B}'..='\u{200F}' | '\u{00AD}' | '\u{2060}' | '\u{FEFF}' | '\u{FFFD}' => false,
            c => !c.is_control(),
        })
        .collect()
}

/// Cuts `text` to at most `limit` characters, ending with the marker.
///
/// Returns the text and whether it was cut.
pub fn truncate(text: &str, limit: usize) -> (String, bool) {
    if text.chars().count() <= limit {
        return (text.to_string(), false);
    }

    let marker_len = TRUNCATION_MARKER.chars().count() + 1;
    if limit < marker_len {
        return (TRUNCATION_MARKER.chars().take(limit).collect(), true);
    }

    let kept: String = text.chars().take(limit - marker_len).collect();
    (format!("{}\n{}", kept.trim_end(), TRUNCATION_MARKER), true)
}

// =============================================================================
// Rendering
// =============================================================================

/// Renders the unbounded message text.
pub fn render(order: &OrderDraft, config: &StoreConfig) -> String {
    let mut out = String::new();

    // Writes to a String cannot fail
    let _ = writeln!(out, "*{}*", config.name.trim());
    out.push('\n');

    out.push_str("*Order*\n");
    for line in &order.lines {
        render_line(&mut out, line);
    }
    out.push('\n');

    if order.is_delivery() {
        let _ = writeln!(
            out,
            "*Delivery type:* {} ({}-{} min)",
            order.delivery_type, config.delivery_time_min, config.delivery_time_max
        );
    } else {
        let _ = writeln!(out, "*Delivery type:* {}", order.delivery_type);
    }

    let _ = writeln!(out, "*Customer:* {}", order.customer.name);
    let _ = writeln!(out, "*Phone:* {}", order.customer.phone);

    if let Some(address) = &order.delivery_address {
        let mut street = address.resolved.full_address();
        let _ = write!(street, ", {}", address.number);
        if let Some(complement) = &address.complement {
            let _ = write!(street, " - {complement}");
        }
        let _ = writeln!(out, "*Address:* {street}");
        let _ = writeln!(
            out,
            "*Postal code:* {}",
            mask_postal_code(&address.resolved.postal_code)
        );
    }

    if let Some(notes) = &order.notes {
        let _ = writeln!(out, "*Notes:* {notes}");
    }

    let _ = writeln!(out, "*Payment:* {}", order.payment_method);
    out.push('\n');

    let _ = writeln!(out, "Subtotal: {}", order.subtotal);
    if !order.delivery_fee.is_zero() {
        let _ = writeln!(out, "Delivery fee: {}", order.delivery_fee);
    }
    let _ = write!(out, "*Total: {}*", order.total);

    out
}

fn render_line(out: &mut String, line: &CartLine) {
    if line.kind == ProductKind::Pizza {
        let _ = writeln!(out, "{}x {} ({})", line.quantity, line.display_name(), line.size);
    } else {
        let _ = writeln!(out, "{}x {}", line.quantity, line.display_name());
    }

    let share = line.flavors.len();
    for flavor in &line.flavors {
        let description = flavor
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        match (share, description) {
            (1, Some(d)) => {
                let _ = writeln!(out, "   {d}");
            }
            (1, None) => {}
            (n, Some(d)) => {
                let _ = writeln!(out, "   1/{n} {} - {d}", flavor.name);
            }
            (n, None) => {
                let _ = writeln!(out, "   1/{n} {}", flavor.name);
            }
        }

        if let Some(group) = line.add_ons_for(&flavor.product_id) {
            for item in &group.items {
                if share > 1 {
                    let _ = writeln!(out, "   + {} ({}): {}", item.name, flavor.name, item.price);
                } else {
                    let _ = writeln!(out, "   + {}: {}", item.name, item.price);
                }
            }
        }
    }

    if let Some(crust) = &line.stuffed_crust {
        let _ = writeln!(out, "   Stuffed crust: {}: {}", crust.name, crust.price);
    }

    let _ = writeln!(out, "   {}", line.line_total());
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartStore, LineDraft};
    use crate::catalog::{CatalogSnapshot, PricingContext};
    use crate::checkout::{assemble, AddressForm, CheckoutForm};
    use crate::money::Money;
    use crate::types::{
        AddOn, Customer, DeliveryType, PaymentMethod, PriceTable, Product, ResolvedAddress, Size,
        StuffedCrust,
    };

    fn product(id: &str, name: &str, kind: ProductKind, cents: i64, description: Option<&str>) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            base_price: PriceTable::regular(Money::from_cents(cents)),
            promo_price: PriceTable::default(),
            is_promo_active: false,
            add_ons: Vec::new(),
            description: description.map(str::to_string),
            active: true,
        }
    }

    fn context() -> PricingContext {
        PricingContext::new(CatalogSnapshot {
            products: vec![
                product("1", "Margherita", ProductKind::Pizza, 4000, Some("Tomato, mozzarella, basil")),
                product("2", "Pepperoni", ProductKind::Pizza, 4500, None),
                product("6", "Coca-Cola 2L", ProductKind::Beverage, 800, None),
            ],
            ..Default::default()
        })
        .unwrap()
    }

    fn order(ctx: &PricingContext, delivery_type: DeliveryType, notes: Option<String>) -> OrderDraft {
        let mut cart = CartStore::new();
        let pizza = ctx.products_for(&["1", "2"]).unwrap();
        let handle = cart.add(LineDraft::from_products(&pizza, Size::Regular, ctx));
        cart.set_add_ons(handle, "2", vec![AddOn::new("Bacon", Money::from_cents(500))]);
        cart.set_crust(
            handle,
            Some(StuffedCrust {
                id: "catupiry".to_string(),
                name: "Catupiry".to_string(),
                price: Money::from_cents(800),
            }),
        );
        let cola = ctx.products_for(&["6"]).unwrap();
        cart.add(LineDraft::from_products(&cola, Size::Regular, ctx));

        let form = CheckoutForm {
            delivery_type,
            customer: Customer {
                name: "Ana Souza".to_string(),
                phone: "(11) 99988-7766".to_string(),
            },
            address: Some(AddressForm {
                postal_code: "01001000".to_string(),
                number: "42".to_string(),
                complement: Some("Apt 3".to_string()),
            }),
            payment_method: Some(PaymentMethod::Cash),
            notes,
        };
        let address = ResolvedAddress {
            postal_code: "01001000".to_string(),
            street: "Praça da Sé".to_string(),
            neighborhood: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        };
        assemble(&cart, &form, Some(&address), ctx).unwrap()
    }

    #[test]
    fn test_render_sections_in_order() {
        let ctx = context();
        let order = order(&ctx, DeliveryType::Delivery, Some("Ring twice".to_string()));
        let text = render(&order, ctx.config());

        let expected = "\
*Pizzaria Bella Vista*

*Order*
1x Pizza (Regular)
   1/2 Margherita - Tomato, mozzarella, basil
   1/2 Pepperoni
   + Bacon (Pepperoni): R$ 5,00
   Stuffed crust: Catupiry: R$ 8,00
   R$ 58,00
1x Coca-Cola 2L
   R$ 8,00

*Delivery type:* Delivery (60-90 min)
*Customer:* Ana Souza
*Phone:* (11) 99988-7766
*Address:* Praça da Sé, Sé, São Paulo/SP, 42 - Apt 3
*Postal code:* 01001-000
*Notes:* Ring twice
*Payment:* Cash

Subtotal: R$ 66,00
Delivery fee: R$ 5,00
*Total: R$ 71,00*";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_pickup_has_no_fee_or_address() {
        let ctx = context();
        let order = order(&ctx, DeliveryType::Pickup, None);
        let text = render(&order, ctx.config());

        assert!(text.contains("*Delivery type:* Pickup\n"));
        assert!(!text.contains("Delivery fee"));
        assert!(!text.contains("*Address:*"));
        assert!(text.ends_with("*Total: R$ 66,00*"));
    }

    #[test]
    fn test_sanitize_strips_controls_and_invisibles() {
        let dirty = "a\u{0}b\tc\r\nd\u{200B}e\u{FEFF}f\u{FFFD}g\u{85}h\u{7F}";
        assert_eq!(sanitize(dirty), "abc\ndefgh");
        assert!(sanitize(dirty)
            .chars()
            .all(|c| c == '\n' || !c.is_control()));
    }

    #[test]
    fn test_sanitize_strips_bidi_marks_and_soft_hyphen() {
        assert_eq!(sanitize("Rua\u{200E} das\u{200F} Flo\u{00AD}res"), "Rua das Flores");
        assert_eq!(sanitize("Jo\u{00E3}o"), "João");
    }

    #[test]
    fn test_truncate_just_over_limit() {
        let text = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let (out, truncated) = truncate(&text, MAX_MESSAGE_CHARS);

        assert!(truncated);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert!(out.chars().count() <= MAX_MESSAGE_CHARS);

        let short = "hello";
        assert_eq!(truncate(short, MAX_MESSAGE_CHARS), (short.to_string(), false));
    }

    #[test]
    fn test_encode_uses_percent_twenty() {
        assert_eq!(encode("a b+c\n"), "a%20b%2Bc%0A");
        assert_eq!(
            transport_url("5511999887766", "Hi there"),
            "https://wa.me/5511999887766?text=Hi%20there"
        );
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("5511999887766", "55"), "5511999887766");
        assert_eq!(normalize_phone("11 99988-7766", "55"), "5511999887766");
        assert_eq!(normalize_phone("011 99988-7766", "55"), "5511999887766");
        assert_eq!(normalize_phone("", "55"), "55");
    }

    #[test]
    fn test_normalize_phone_area_code_equal_to_country_code() {
        // Area code 55 (Rio Grande do Sul) is not a country prefix
        assert_eq!(normalize_phone("(55) 99988-7766", "55"), "5555999887766");
        assert_eq!(normalize_phone("55 3222-1100", "55"), "555532221100");
        assert_eq!(normalize_phone("+55 55 99988-7766", "55"), "5555999887766");
    }

    #[test]
    fn test_handoff_url_respects_ceiling() {
        let ctx = context();
        let notes = "🍕 ".repeat(1400);
        let order = order(&ctx, DeliveryType::Delivery, Some(notes));

        let handoff = build_handoff(&order, ctx.config());

        assert!(handoff.truncated);
        assert!(handoff.url.len() <= MAX_URL_CHARS);
        assert!(handoff.text.ends_with(TRUNCATION_MARKER));
        assert!(handoff.text.starts_with("*Pizzaria Bella Vista*"));
        assert_eq!(handoff.url, transport_url(&handoff.phone, &handoff.text));
    }

    #[test]
    fn test_short_handoff_is_untouched() {
        let ctx = context();
        let order = order(&ctx, DeliveryType::Pickup, None);

        let handoff = build_handoff(&order, ctx.config());

        assert!(!handoff.truncated);
        assert_eq!(handoff.phone, "5511999887766");
        assert_eq!(handoff.text, render(&order, ctx.config()));
        assert!(handoff.url.starts_with("https://wa.me/5511999887766?text=*Pizzaria%20Bella%20Vista*"));
    }
}
