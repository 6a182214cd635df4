//! Per-family address derivation and gap-limit discovery.
//!
//! An [`AddressManager`] owns the derived address sequence of one
//! (scheme, account) pair. The sequence grows contiguously by index and
//! never shrinks. Discovery scans it in batches of `gap_limit` and stops at
//! the first batch the explorer reports as entirely unused.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lode_core::address::{address_to_hex, AddressScheme, DerivationPath};
use lode_core::traits::{AddressProvider, Explorer};

use crate::error::WalletError;

/// A derived address with its discovery metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub value: String,
    pub path: DerivationPath,
    pub scheme: AddressScheme,
    pub index: u32,
    /// Whether the last discovery saw this address on chain.
    pub used: bool,
}

/// Hex form used to compare addresses across encodings.
pub(crate) fn canonical(address: &str) -> String {
    address_to_hex(address).unwrap_or_else(|_| address.to_string())
}

/// Derives and discovers the addresses of one family.
pub struct AddressManager {
    provider: Arc<dyn AddressProvider>,
    explorer: Arc<dyn Explorer>,
    gap_limit: u32,
    addresses: Vec<Address>,
}

impl AddressManager {
    /// Create a manager. A zero gap limit is rejected.
    pub fn new(
        provider: Arc<dyn AddressProvider>,
        explorer: Arc<dyn Explorer>,
        gap_limit: u32,
    ) -> Result<Self, WalletError> {
        if gap_limit == 0 {
            return Err(WalletError::Config("gap limit must be at least 1".into()));
        }
        Ok(Self {
            provider,
            explorer,
            gap_limit,
            addresses: Vec::new(),
        })
    }

    pub fn scheme(&self) -> AddressScheme {
        self.provider.scheme()
    }

    pub fn gap_limit(&self) -> u32 {
        self.gap_limit
    }

    /// Number of addresses derived so far.
    pub fn derived_count(&self) -> usize {
        self.addresses.len()
    }

    /// Derive the address at `index`, extending the sequence up to it.
    ///
    /// Idempotent: an already-derived index is returned as is.
    pub fn derive_address(&mut self, index: u32) -> Result<&Address, WalletError> {
        while self.addresses.len() <= index as usize {
            let next = self.addresses.len() as u32;
            let derived = self.provider.derive(next)?;
            self.addresses.push(Address {
                value: derived.address,
                path: derived.path,
                scheme: self.provider.scheme(),
                index: next,
                used: false,
            });
        }
        Ok(&self.addresses[index as usize])
    }

    /// Gap-limit scan. Returns how many addresses the scan covered.
    async fn scan(&mut self) -> Result<usize, WalletError> {
        let scheme = self.scheme();
        let mut start: u32 = 0;
        loop {
            let end = start
                .checked_add(self.gap_limit)
                .ok_or_else(|| WalletError::Config("address index space exhausted".into()))?;
            self.derive_address(end - 1)?;

            let batch: Vec<String> = self.addresses[start as usize..end as usize]
                .iter()
                .map(|a| a.value.clone())
                .collect();
            let used: HashSet<String> = self
                .explorer
                .filter_used_addresses(&batch)
                .await?
                .iter()
                .map(|a| canonical(a))
                .collect();

            let mut used_in_batch = 0usize;
            for address in &mut self.addresses[start as usize..end as usize] {
                address.used = used.contains(&canonical(&address.value));
                used_in_batch += usize::from(address.used);
            }
            debug!(scheme = %scheme, start, end, used = used_in_batch, "scanned address batch");

            if used_in_batch == 0 {
                return Ok(end as usize);
            }
            start = end;
        }
    }

    /// Discover used addresses.
    ///
    /// Returns every derived address up to and including the last used one;
    /// empty when nothing is used.
    pub async fn discover_addresses(&mut self) -> Result<Vec<String>, WalletError> {
        let scanned = self.scan().await?;
        let last_used = self.addresses[..scanned].iter().rposition(|a| a.used);
        let discovered: Vec<String> = match last_used {
            Some(pos) => self.addresses[..=pos].iter().map(|a| a.value.clone()).collect(),
            None => Vec::new(),
        };
        info!(scheme = %self.scheme(), count = discovered.len(), "discovered addresses");
        Ok(discovered)
    }

    /// Same scan as [`discover_addresses`](Self::discover_addresses), keeping
    /// metadata and the terminating unused batch.
    pub async fn discover_addresses_with_meta(&mut self) -> Result<Vec<Address>, WalletError> {
        let scanned = self.scan().await?;
        Ok(self.addresses[..scanned].to_vec())
    }

    /// `value -> path` over every address derived so far.
    pub fn address_to_path_mapping(&self) -> HashMap<String, DerivationPath> {
        self.addresses
            .iter()
            .map(|a| (a.value.clone(), a.path.clone()))
            .collect()
    }
}

impl std::fmt::Debug for AddressManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressManager")
            .field("scheme", &self.scheme())
            .field("gap_limit", &self.gap_limit)
            .field("derived", &self.addresses.len())
            .finish()
    }
}
