//! Unified discovery and path lookup across the five address families.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use lode_core::address::DerivationPath;
use lode_core::traits::{AddressProvider, Explorer, PathLookup};

use crate::address_manager::{canonical, Address, AddressManager};
use crate::config::{DerivationScheme, WalletConfig};
use crate::error::WalletError;
use crate::keys::AddressProviders;
use crate::random::{pick, PseudoRandom};

/// Used addresses of an account, grouped by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAddresses {
    /// Legacy addresses, internal then external (internal only on V1).
    pub legacy: Vec<String>,
    /// Base addresses, internal then external.
    pub base: Vec<String>,
    /// The staking account address.
    pub account: String,
}

impl DiscoveredAddresses {
    /// Every discovered address: base, then legacy, then the account.
    pub fn all(&self) -> Vec<String> {
        let mut all = Vec::with_capacity(self.base.len() + self.legacy.len() + 1);
        all.extend(self.base.iter().cloned());
        all.extend(self.legacy.iter().cloned());
        all.push(self.account.clone());
        all
    }
}

/// Address to path lookup over ordered tiers. The first tier holding the
/// address wins.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    tiers: Vec<HashMap<String, DerivationPath>>,
}

impl PathMapper {
    pub fn new(tiers: Vec<HashMap<String, DerivationPath>>) -> Self {
        Self { tiers }
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(HashMap::is_empty)
    }
}

impl PathLookup for PathMapper {
    fn path_for(&self, address: &str) -> Option<DerivationPath> {
        self.tiers.iter().find_map(|tier| tier.get(address)).cloned()
    }
}

/// Owns one [`AddressManager`] per address family of an account.
pub struct AddressAggregator {
    legacy_external: AddressManager,
    legacy_internal: AddressManager,
    base_external: AddressManager,
    base_internal: AddressManager,
    staking_account: AddressManager,
    staking_provider: Arc<dyn AddressProvider>,
    derivation_scheme: DerivationScheme,
}

impl AddressAggregator {
    pub fn new(
        providers: AddressProviders,
        explorer: Arc<dyn Explorer>,
        config: &WalletConfig,
    ) -> Result<Self, WalletError> {
        config.validate()?;
        let gap = config.gap_limit;
        let manager = |provider: &Arc<dyn AddressProvider>, gap_limit: u32| {
            AddressManager::new(Arc::clone(provider), Arc::clone(&explorer), gap_limit)
        };
        Ok(Self {
            legacy_external: manager(&providers.legacy_external, gap)?,
            legacy_internal: manager(&providers.legacy_internal, gap)?,
            base_external: manager(&providers.base_external, gap)?,
            base_internal: manager(&providers.base_internal, gap)?,
            staking_account: manager(
                &providers.staking_account,
                lode_core::constants::STAKING_ACCOUNT_GAP_LIMIT,
            )?,
            staking_provider: providers.staking_account,
            derivation_scheme: config.derivation_scheme,
        })
    }

    /// Run all five discoveries concurrently and group the results.
    pub async fn discover_all_addresses(&mut self) -> Result<DiscoveredAddresses, WalletError> {
        let (base_int, base_ext, legacy_int, legacy_ext, _) = tokio::try_join!(
            self.base_internal.discover_addresses(),
            self.base_external.discover_addresses(),
            self.legacy_internal.discover_addresses(),
            self.legacy_external.discover_addresses(),
            self.staking_account.discover_addresses(),
        )?;
        let account = self.staking_account.derive_address(0)?.value.clone();

        let legacy = match self.derivation_scheme {
            DerivationScheme::V1 => legacy_int,
            DerivationScheme::V2 => [legacy_int, legacy_ext].concat(),
        };
        let base = [base_int, base_ext].concat();

        info!(legacy = legacy.len(), base = base.len(), "address discovery complete");
        Ok(DiscoveredAddresses {
            legacy,
            base,
            account,
        })
    }

    fn managers(&self) -> [&AddressManager; 5] {
        [
            &self.legacy_internal,
            &self.legacy_external,
            &self.base_internal,
            &self.base_external,
            &self.staking_account,
        ]
    }

    /// Single-tier mapper over the raw mappings of all five managers.
    ///
    /// Only resolves addresses given in the encoding they were derived in.
    pub fn address_to_path_mapper(&self) -> PathMapper {
        let mut merged = HashMap::new();
        for manager in self.managers() {
            merged.extend(manager.address_to_path_mapping());
        }
        PathMapper::new(vec![merged])
    }

    /// Mapper tolerant of both staking-address encodings.
    ///
    /// Tiers, in lookup order: legacy mapping, staking mapping keyed by
    /// canonical hex, raw staking mapping. Addresses reach the signer either
    /// as derived or as reported by the explorer, so both must resolve.
    pub fn fixed_path_mapper(&self) -> PathMapper {
        let mut legacy = self.legacy_internal.address_to_path_mapping();
        legacy.extend(self.legacy_external.address_to_path_mapping());

        let mut staking = self.base_internal.address_to_path_mapping();
        staking.extend(self.base_external.address_to_path_mapping());
        staking.extend(self.staking_account.address_to_path_mapping());

        let normalized: HashMap<String, DerivationPath> = staking
            .iter()
            .map(|(address, path)| (canonical(address), path.clone()))
            .collect();

        debug!(legacy = legacy.len(), staking = staking.len(), "built path mapper");
        PathMapper::new(vec![legacy, normalized, staking])
    }

    /// Receiving (base external) addresses with usage metadata.
    pub async fn visible_addresses_with_meta(&mut self) -> Result<Vec<Address>, WalletError> {
        self.base_external.discover_addresses_with_meta().await
    }

    /// Pick a change address among the visible addresses.
    ///
    /// A receiving address is reused as change; no dedicated change chain is
    /// consulted.
    pub async fn change_address(&mut self, seed: u32) -> Result<String, WalletError> {
        let candidates = self.visible_addresses_with_meta().await?;
        let mut rng = PseudoRandom::new(seed);
        pick(&candidates, &mut rng)
            .map(|a| a.value.clone())
            .ok_or(WalletError::NoChangeAddress)
    }

    /// The staking account address (index 0).
    pub fn staking_account_address(&mut self) -> Result<String, WalletError> {
        Ok(self.staking_account.derive_address(0)?.value.clone())
    }

    /// Hex of the staking account public key, as the explorer indexes it.
    pub fn staking_account_pubkey_hex(&self) -> Result<String, WalletError> {
        Ok(self.staking_provider.derive(0)?.public_key_hex)
    }

    pub fn derivation_scheme(&self) -> DerivationScheme {
        self.derivation_scheme
    }
}
