//! # Postal Code Lookup
//!
//! The address service is an external collaborator. The session only needs
//! one question answered: "which street does this postal code belong to?"
//!
//! ```text
//! Session::checkout ──► validate format ──► AddressLookup::lookup ──► assemble
//!                         (8 digits)          (timeout-bounded)
//! ```
//!
//! `Ok(None)` means the service answered and the code does not exist;
//! `Err(_)` means the service itself failed.

use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

use forno_core::validation::normalize_postal_code;
use forno_core::ResolvedAddress;

use crate::error::StorefrontResult;

/// Resolves postal codes to addresses.
pub trait AddressLookup: Send + Sync {
    /// Looks up a postal code. Callers pass the normalized 8-digit form.
    fn lookup(
        &self,
        postal_code: &str,
    ) -> impl Future<Output = StorefrontResult<Option<ResolvedAddress>>> + Send;
}

/// In-memory address book, keyed by normalized postal code.
#[derive(Debug, Clone, Default)]
pub struct StaticAddressBook {
    addresses: HashMap<String, ResolvedAddress>,
}

impl StaticAddressBook {
    /// Creates an empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an address, keyed by its own postal code.
    pub fn with_address(mut self, address: ResolvedAddress) -> Self {
        self.insert(address);
        self
    }

    /// Adds or replaces an address.
    pub fn insert(&mut self, address: ResolvedAddress) {
        let key = normalize_postal_code(&address.postal_code);
        self.addresses.insert(key, address);
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl AddressLookup for StaticAddressBook {
    async fn lookup(&self, postal_code: &str) -> StorefrontResult<Option<ResolvedAddress>> {
        let key = normalize_postal_code(postal_code);
        let found = self.addresses.get(&key).cloned();
        debug!(postal_code = %key, found = found.is_some(), "Static address lookup");
        Ok(found)
    }
}
