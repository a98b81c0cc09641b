//! # forno-storefront
//!
//! Session glue between the Forno menu UI and [`forno_core`].
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          forno-storefront                               │
//! │                                                                         │
//! │  ┌─────────┐  ┌─────────┐  ┌────────────────────────────────────────┐  │
//! │  │ config  │  │ catalog │  │ session                                │  │
//! │  │ TOML +  │─►│ JSON or │─►│ Session / SessionState                 │  │
//! │  │ env     │  │ built-in│  │ selector · cart · checkout · hand_off  │  │
//! │  └─────────┘  └─────────┘  └──────────┬─────────────────┬───────────┘  │
//! │                                       │                 │              │
//! │                               ┌───────▼──────┐  ┌───────▼──────┐       │
//! │                               │ lookup       │  │ transport    │       │
//! │                               │ AddressLookup│  │ HandoffTrans.│       │
//! │                               └──────────────┘  └──────────────┘       │
//! │                                                                         │
//! │  error: StorefrontError (internal) → ApiError (what the UI receives)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup
//! ```rust,ignore
//! use forno_storefront::{catalog, init_tracing, Session, SessionState, StorefrontConfig};
//!
//! init_tracing();
//! let config = StorefrontConfig::load_or_default(None);
//! let snapshot = catalog::load_catalog_or_fallback(config.catalog_path.as_deref());
//! let state = SessionState::new(Session::new(snapshot, &config)?);
//! ```

use tracing_subscriber::EnvFilter;

pub mod catalog;
pub mod config;
pub mod error;
pub mod lookup;
pub mod session;
pub mod transport;

pub use config::StorefrontConfig;
pub use error::{ApiError, ErrorCode, StorefrontError, StorefrontResult};
pub use lookup::{AddressLookup, StaticAddressBook};
pub use session::{PendingOrder, Session, SessionState};
pub use transport::{HandoffOutcome, HandoffTransport, NoOpTransport, RecordingTransport};

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=forno_core=trace` - Show trace for the core only
/// - Default: INFO, DEBUG for the forno crates
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forno=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
