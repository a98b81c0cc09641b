//! Handoff transport: opens the prefilled messaging link.
//!
//! Opening the link is the only outward side effect of the storefront. If it
//! fails, the customer gets the raw link and text to copy by hand; the
//! composed order is never dropped.

use serde::Serialize;
use std::sync::Mutex;

use crate::error::{StorefrontError, StorefrontResult};

/// Opens messaging links.
pub trait HandoffTransport: Send + Sync {
    /// Opens `url` in the messaging app.
    fn open(&self, url: &str) -> StorefrontResult<()>;
}

/// Transport that accepts every link without doing anything.
pub struct NoOpTransport;

impl HandoffTransport for NoOpTransport {
    fn open(&self, _url: &str) -> StorefrontResult<()> {
        Ok(())
    }
}

/// Transport that records the links it was asked to open, optionally
/// failing every call.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    opened: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every `open` fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        RecordingTransport {
            opened: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Links opened so far, oldest first.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl HandoffTransport for RecordingTransport {
    fn open(&self, url: &str) -> StorefrontResult<()> {
        if let Some(reason) = &self.failure {
            return Err(StorefrontError::TransportFailed(reason.clone()));
        }
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        Ok(())
    }
}

/// What happened when the storefront tried to hand the order off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandoffOutcome {
    /// The messaging app was opened with the prefilled order.
    Opened { url: String },

    /// The link could not be opened; show `url` and `text` for manual copy.
    ManualFallback {
        url: String,
        text: String,
        reason: String,
    },
}

impl HandoffOutcome {
    pub fn url(&self) -> &str {
        match self {
            HandoffOutcome::Opened { url } | HandoffOutcome::ManualFallback { url, .. } => url,
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self, HandoffOutcome::Opened { .. })
    }
}
