//! # Storefront Configuration
//!
//! Store settings plus where to find the catalog.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FORNO_STORE_NAME, FORNO_WHATSAPP,                                  │
//! │     FORNO_DELIVERY_FEE_CENTS, FORNO_MINIMUM_ORDER_CENTS,               │
//! │     FORNO_CATALOG_PATH                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/forno/forno.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.forno.storefront/forno.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Pizzaria Bella Vista, fee R$ 5,00, minimum R$ 20,00                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # forno.toml
//! catalog_path = "/srv/forno/catalog.json"
//! lookup_timeout_secs = 5
//!
//! [store]
//! name = "Pizzaria Bella Vista"
//! whatsapp = "5511999887766"
//! delivery_fee = 500
//! minimum_order_value = 2000
//! accepts_cash = true
//! accepts_card = true
//! small_size_enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use forno_core::validation::phone_digits;
use forno_core::{Money, StoreConfig};

use crate::error::{StorefrontError, StorefrontResult};

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Store-wide settings; authoritative over any settings carried by the
    /// catalog file.
    #[serde(default)]
    pub store: StoreConfig,

    /// Catalog JSON file. `None` serves the built-in menu.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Upper bound on one postal-code lookup.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

fn default_lookup_timeout() -> u64 {
    5
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        StorefrontConfig {
            store: StoreConfig::default(),
            catalog_path: None,
            lookup_timeout_secs: default_lookup_timeout(),
        }
    }
}

impl StorefrontConfig {
    /// Loads configuration from file and environment.
    pub fn load(config_path: Option<PathBuf>) -> StorefrontResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load storefront config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorefrontResult<()> {
        let store = &self.store;

        if store.name.trim().is_empty() {
            return Err(StorefrontError::InvalidConfig("store name must not be empty".into()));
        }

        if phone_digits(&store.whatsapp).len() < 10 {
            return Err(StorefrontError::InvalidConfig(format!(
                "whatsapp number must have at least 10 digits, got: {}",
                store.whatsapp
            )));
        }

        if store.delivery_fee.is_negative() || store.minimum_order_value.is_negative() {
            return Err(StorefrontError::InvalidConfig(
                "delivery fee and minimum order value must not be negative".into(),
            ));
        }

        if store.delivery_time_min > store.delivery_time_max {
            return Err(StorefrontError::InvalidConfig(format!(
                "delivery_time_min ({}) exceeds delivery_time_max ({})",
                store.delivery_time_min, store.delivery_time_max
            )));
        }

        if store.enabled_payment_methods().is_empty() {
            return Err(StorefrontError::InvalidConfig(
                "at least one payment method must be accepted".into(),
            ));
        }

        if self.lookup_timeout_secs == 0 {
            return Err(StorefrontError::InvalidConfig(
                "lookup_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key/value source.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(name) = var("FORNO_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        if let Some(whatsapp) = var("FORNO_WHATSAPP") {
            self.store.whatsapp = whatsapp;
        }

        if let Some(fee) = var("FORNO_DELIVERY_FEE_CENTS") {
            match fee.trim().parse::<i64>() {
                Ok(cents) => self.store.delivery_fee = Money::from_cents(cents),
                Err(_) => warn!(value = %fee, "Ignoring unparsable FORNO_DELIVERY_FEE_CENTS"),
            }
        }

        if let Some(minimum) = var("FORNO_MINIMUM_ORDER_CENTS") {
            match minimum.trim().parse::<i64>() {
                Ok(cents) => self.store.minimum_order_value = Money::from_cents(cents),
                Err(_) => warn!(value = %minimum, "Ignoring unparsable FORNO_MINIMUM_ORDER_CENTS"),
            }
        }

        if let Some(path) = var("FORNO_CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "forno", "storefront")
            .map(|dirs| dirs.config_dir().join("forno.toml"))
    }
}
