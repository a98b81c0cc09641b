//! # Storefront Errors
//!
//! `StorefrontError` covers everything the glue layer can fail at;
//! `ApiError` is the serialized shape the menu UI receives.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Menu UI                         Storefront                             │
//! │  ───────                         ──────────                             │
//! │                                                                         │
//! │  checkout(form) ───────────────► Session::checkout                      │
//! │                                    │                                    │
//! │                                    ├─ lookup failed ── LookupFailed ─┐  │
//! │                                    ├─ rules failed ─── Checkout ─────┤  │
//! │                                    ▼                                 ▼  │
//! │                                  Handoff                       ApiError │
//! │                                                                         │
//! │  catch (e) {                                                            │
//! │    e.code    = "CHECKOUT_REJECTED"                                      │
//! │    e.details = ["Customer phone: phone must have at least 10 digits"]   │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use forno_core::{CheckoutRejected, CoreError};

/// Result type alias for storefront operations.
pub type StorefrontResult<T> = Result<T, StorefrontError>;

/// Storefront error type.
#[derive(Debug, Error)]
pub enum StorefrontError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Config loaded but violates a rule.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Catalog Errors
    // =========================================================================
    /// Catalog file could not be read or decoded.
    #[error("Failed to load catalog: {0}")]
    CatalogLoadFailed(String),

    /// Catalog decoded but rejected by the core, or a catalog reference
    /// did not resolve.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Checkout Errors
    // =========================================================================
    /// One or more checkout rules failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutRejected),

    /// The postal-code collaborator failed (not the same as "not found").
    #[error("Address lookup failed: {0}")]
    LookupFailed(String),

    /// The postal-code collaborator did not answer in time.
    #[error("Address lookup timed out after {0} seconds")]
    LookupTimeout(u64),

    /// `hand_off` was called before a successful checkout.
    #[error("No order is ready for handoff")]
    NothingToHandOff,

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The messaging link could not be opened.
    #[error("Could not open messaging link: {0}")]
    TransportFailed(String),
}

impl From<std::io::Error> for StorefrontError {
    fn from(err: std::io::Error) -> Self {
        StorefrontError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for StorefrontError {
    fn from(err: toml::de::Error) -> Self {
        StorefrontError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// API Error
// =============================================================================

/// Error returned to the menu UI.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CHECKOUT_REJECTED",
///   "message": "Order rejected: Cart is empty",
///   "details": ["Cart is empty"]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// One entry per failed check, for form highlighting
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Catalog reference did not resolve
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Checkout rules failed; see `details`
    CheckoutRejected,

    /// Configuration or catalog data is unusable
    ConfigError,

    /// Postal-code service failed or timed out
    LookupError,

    /// Messaging link could not be opened
    TransportError,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::CrustNotFound(id) => ApiError::not_found("Stuffed crust", &id),
            CoreError::AddOnNotFound { product_id, name } => ApiError::not_found(
                "Add-on",
                &format!("{} (product {})", name, product_id),
            ),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::InvalidCatalog(_) | CoreError::Json(_) => {
                tracing::error!("Catalog rejected: {}", err);
                ApiError::new(ErrorCode::ConfigError, "Menu data is unavailable")
            }
        }
    }
}

/// Converts checkout rejections, keeping one detail per failure.
impl From<CheckoutRejected> for ApiError {
    fn from(err: CheckoutRejected) -> Self {
        ApiError {
            code: ErrorCode::CheckoutRejected,
            message: err.to_string(),
            details: err.failures.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Converts storefront errors to API errors.
impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Core(e) => e.into(),
            StorefrontError::Checkout(e) => e.into(),
            StorefrontError::ConfigLoadFailed(_)
            | StorefrontError::InvalidConfig(_)
            | StorefrontError::CatalogLoadFailed(_) => {
                tracing::error!("Storefront setup error: {}", err);
                ApiError::new(ErrorCode::ConfigError, err.to_string())
            }
            StorefrontError::LookupFailed(_) | StorefrontError::LookupTimeout(_) => {
                ApiError::new(ErrorCode::LookupError, err.to_string())
            }
            StorefrontError::NothingToHandOff => ApiError::validation(err.to_string()),
            StorefrontError::TransportFailed(_) => {
                ApiError::new(ErrorCode::TransportError, err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use forno_core::CheckoutFailure;

    #[test]
    fn test_checkout_rejection_keeps_details() {
        let rejected = CheckoutRejected {
            failures: vec![CheckoutFailure::EmptyCart, CheckoutFailure::MissingHouseNumber],
        };
        let api: ApiError = StorefrontError::from(rejected).into();

        assert_eq!(api.code, ErrorCode::CheckoutRejected);
        assert_eq!(api.details, vec!["Cart is empty", "House number is required"]);

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "CHECKOUT_REJECTED");
    }

    #[test]
    fn test_not_found_mapping() {
        let api: ApiError = CoreError::ProductNotFound("42".to_string()).into();
        assert_eq!(api.code, ErrorCode::NotFound);
        assert_eq!(api.message, "Product not found: 42");

        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_every_storefront_error_has_specific_code() {
        let cases = [
            (StorefrontError::InvalidConfig("x".to_string()), ErrorCode::ConfigError),
            (StorefrontError::LookupTimeout(5), ErrorCode::LookupError),
            (StorefrontError::NothingToHandOff, ErrorCode::ValidationError),
            (StorefrontError::TransportFailed("x".to_string()), ErrorCode::TransportError),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).code, code);
        }

        let json = serde_json::to_value(ApiError::from(StorefrontError::LookupTimeout(5))).unwrap();
        assert_eq!(json["code"], "LOOKUP_ERROR");
    }
}
