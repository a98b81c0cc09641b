//! # Error Types
//!
//! Domain-specific error types for forno-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  forno-core errors (this file)                                          │
//! │  ├── CoreError         - Catalog and lookup failures                    │
//! │  └── ValidationError   - Input validation failures                      │
//! │                                                                         │
//! │  forno-core checkout (checkout.rs)                                      │
//! │  └── CheckoutRejected  - Every unmet checkout condition, as a list      │
//! │                                                                         │
//! │  forno-storefront errors (separate crate)                               │
//! │  ├── StorefrontError   - Config, catalog file, lookup, transport        │
//! │  └── ApiError          - What the menu UI sees (serialized)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart and selector operations never return errors: unknown ids are a
//! logged no-op. Pricing never returns errors either: a missing price
//! degrades to zero or to the non-promotional tier.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core errors raised while building a pricing context or resolving catalog
/// references at the boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the current catalog snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Stuffed crust option cannot be found or is inactive.
    #[error("Stuffed crust not found: {0}")]
    CrustNotFound(String),

    /// Add-on name is not offered by the flavor it was requested for.
    #[error("Add-on '{name}' is not offered for product {product_id}")]
    AddOnNotFound { product_id: String, name: String },

    /// The catalog snapshot violates a structural rule.
    ///
    /// ## When This Occurs
    /// - Two products share the same id
    /// - A product has no price at all
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// The catalog snapshot could not be decoded.
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when customer or admin input doesn't meet requirements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must have at least {min} digits")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., postal code with the wrong digit count).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AddOnNotFound {
            product_id: "pepperoni".to_string(),
            name: "Bacon".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Add-on 'Bacon' is not offered for product pepperoni"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "phone".to_string(),
            min: 10,
        };
        assert_eq!(err.to_string(), "phone must have at least 10 digits");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "postal code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
