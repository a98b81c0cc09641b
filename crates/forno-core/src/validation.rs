//! # Validation Module
//!
//! Input validation for the checkout form and catalog records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Menu UI                                                      │
//! │  ├── Input masks (phone, postal code)                                  │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (field rules)                                    │
//! │  ├── Customer name and phone                                           │
//! │  └── Postal code format                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: checkout::assemble (order rules)                             │
//! │  ├── Minimum order, payment method                                     │
//! │  └── Pickup-only promotions                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forno_core::validation::{mask_postal_code, validate_phone};
//!
//! assert!(validate_phone("(11) 99988-7766").is_ok());
//! assert_eq!(mask_postal_code("01001000"), "01001-000");
//! ```

use crate::error::ValidationError;
use crate::types::Product;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum digits in a customer phone (area code + number).
pub const MIN_PHONE_DIGITS: usize = 10;

/// Digits in a Brazilian postal code (CEP).
pub const POSTAL_CODE_DIGITS: usize = 8;

/// Maximum customer name length.
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

// =============================================================================
// Digit Helpers
// =============================================================================

/// Strips everything that is not an ASCII digit.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Phone digits with punctuation and spaces removed.
pub fn phone_digits(phone: &str) -> String {
    digits_only(phone)
}

// =============================================================================
// Customer Validators
// =============================================================================

/// Validates the customer name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a customer phone number.
///
/// ## Rules
/// - At least 10 digits once punctuation is stripped
///
/// ## Example
/// ```rust
/// use forno_core::validation::validate_phone;
///
/// assert!(validate_phone("11 99988-7766").is_ok());
/// assert!(validate_phone("9988-7766").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let digits = phone_digits(phone);

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if digits.len() < MIN_PHONE_DIGITS {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: MIN_PHONE_DIGITS,
        });
    }

    Ok(())
}

// =============================================================================
// Postal Code
// =============================================================================

/// Postal code with every non-digit removed.
pub fn normalize_postal_code(postal_code: &str) -> String {
    digits_only(postal_code)
}

/// True when the postal code has exactly 8 digits once normalized.
pub fn is_valid_postal_code(postal_code: &str) -> bool {
    normalize_postal_code(postal_code).len() == POSTAL_CODE_DIGITS
}

/// Validates a postal code and returns its normalized form.
pub fn validate_postal_code(postal_code: &str) -> ValidationResult<String> {
    let normalized = normalize_postal_code(postal_code);

    if normalized.is_empty() {
        return Err(ValidationError::Required {
            field: "postal code".to_string(),
        });
    }

    if normalized.len() != POSTAL_CODE_DIGITS {
        return Err(ValidationError::InvalidFormat {
            field: "postal code".to_string(),
            reason: format!("must have {} digits", POSTAL_CODE_DIGITS),
        });
    }

    Ok(normalized)
}

/// Renders a postal code as `00000-000`, tolerating partial input.
///
/// ## Example
/// ```rust
/// use forno_core::validation::mask_postal_code;
///
/// assert_eq!(mask_postal_code("01001-000"), "01001-000");
/// assert_eq!(mask_postal_code("010010"), "01001-0");
/// assert_eq!(mask_postal_code("0100"), "0100");
/// ```
pub fn mask_postal_code(postal_code: &str) -> String {
    let digits: String = normalize_postal_code(postal_code)
        .chars()
        .take(POSTAL_CODE_DIGITS)
        .collect();

    if digits.len() > 5 {
        format!("{}-{}", &digits[..5], &digits[5..])
    } else {
        digits
    }
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a catalog product record.
///
/// ## Rules
/// - Non-empty id and name
/// - At least one base price
/// - No negative prices anywhere
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product id".to_string(),
        });
    }

    if product.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: format!("name of product {}", product.id),
        });
    }

    if product.base_price.is_empty() {
        return Err(ValidationError::Required {
            field: format!("base price of product {}", product.id),
        });
    }

    let negative = [product.base_price, product.promo_price]
        .iter()
        .flat_map(|t| [t.regular, t.small])
        .flatten()
        .chain(product.add_ons.iter().map(|a| a.price))
        .any(|p| p.is_negative());

    if negative {
        return Err(ValidationError::OutOfRange {
            field: format!("prices of product {}", product.id),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{AddOn, PriceTable, ProductKind};

    fn product(id: &str, name: &str, base: PriceTable) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            kind: ProductKind::Pizza,
            base_price: base,
            promo_price: PriceTable::default(),
            is_promo_active: false,
            add_ons: Vec::new(),
            description: None,
            active: true,
        }
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Ana").is_ok());
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("(11) 99988-7766").is_ok());
        assert!(validate_phone("1133334444").is_ok());

        assert_eq!(
            validate_phone(""),
            Err(ValidationError::Required {
                field: "phone".to_string()
            })
        );
        assert!(matches!(
            validate_phone("(11) 9988-776"),
            Err(ValidationError::TooShort { min: 10, .. })
        ));
    }

    #[test]
    fn test_postal_code_rules() {
        assert!(is_valid_postal_code("01001-000"));
        assert!(!is_valid_postal_code("01001-00"));
        assert_eq!(validate_postal_code("01001-000").unwrap(), "01001000");
        assert!(validate_postal_code("").is_err());
        assert!(validate_postal_code("123").is_err());
    }

    #[test]
    fn test_mask_postal_code() {
        assert_eq!(mask_postal_code("01001000"), "01001-000");
        assert_eq!(mask_postal_code("01001000999"), "01001-000");
        assert_eq!(mask_postal_code("01001"), "01001");
    }

    #[test]
    fn test_validate_product() {
        let ok = product("1", "Margherita", PriceTable::regular(Money::from_cents(3500)));
        assert!(validate_product(&ok).is_ok());

        let unpriced = product("2", "Pepperoni", PriceTable::default());
        assert!(validate_product(&unpriced).is_err());

        let unnamed = product("3", " ", PriceTable::regular(Money::from_cents(100)));
        assert!(validate_product(&unnamed).is_err());

        let mut negative = product("4", "Calabresa", PriceTable::regular(Money::from_cents(100)));
        negative.add_ons.push(AddOn::new("Onion", Money::from_cents(-1)));
        assert!(validate_product(&negative).is_err());
    }
}
