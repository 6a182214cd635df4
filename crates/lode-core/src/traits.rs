//! Trait interfaces for Lode's collaborators.
//!
//! These traits define the contracts between the wallet core and the
//! surrounding system:
//! - [`Explorer`] : ledger indexer access (network transport lives outside)
//! - [`Signer`] : key custody and signing (software or hardware)
//! - [`PathLookup`] : address to derivation path resolution handed to the signer
//! - [`FeeCalculator`] : chain fee formula
//! - [`AddressProvider`] : per-family address derivation

use std::collections::HashMap;

use async_trait::async_trait;

use crate::address::{AddressScheme, DerivationPath};
use crate::error::{AddressError, NetworkError, SignerError};
use crate::types::{
    AccountInfo, Certificate, Lovelace, Output, PoolInfo, SignedTx, StakePool, SubmitAck, TxHistoryEntry,
    TxInfo, TxInput, TxPlan, Utxo,
};

/// Ledger indexer.
///
/// Address arguments may be given in any supported encoding; adapters such
/// as a hex-normalizing wrapper decide what goes on the wire. Every method
/// fails with [`NetworkError`] on transport failure or non-2xx responses.
#[async_trait]
pub trait Explorer: Send + Sync {
    /// Total balance held by the given addresses.
    async fn get_balance(&self, addresses: &[String]) -> Result<Lovelace, NetworkError>;

    /// All unspent outputs owned by the given addresses.
    async fn fetch_unspent_tx_outputs(&self, addresses: &[String]) -> Result<Vec<Utxo>, NetworkError>;

    /// Whether any of the given addresses appears on chain.
    async fn is_some_address_used(&self, addresses: &[String]) -> Result<bool, NetworkError>;

    /// The subset of the given addresses that appears on chain.
    async fn filter_used_addresses(&self, addresses: &[String]) -> Result<Vec<String>, NetworkError>;

    async fn get_tx_history(&self, addresses: &[String]) -> Result<Vec<TxHistoryEntry>, NetworkError>;

    async fn fetch_tx_info(&self, tx_hash: &str) -> Result<TxInfo, NetworkError>;

    /// Submit a raw hex transaction under its fragment id.
    async fn submit_tx_raw(&self, tx_id: &str, raw_tx: &str) -> Result<SubmitAck, NetworkError>;

    async fn get_account_info(&self, account_pubkey_hex: &str) -> Result<AccountInfo, NetworkError>;

    /// Pools currently accepting delegation, keyed by pool hash.
    async fn get_valid_stakepools(&self) -> Result<HashMap<String, StakePool>, NetworkError>;

    /// Pool metadata behind a pool URL.
    async fn get_pool_info(&self, url: &str) -> Result<PoolInfo, NetworkError>;
}

/// Resolves an address to the derivation path of its key.
pub trait PathLookup: Send + Sync {
    fn path_for(&self, address: &str) -> Option<DerivationPath>;
}

/// Signing collaborator.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign every input of `plan`, resolving keys through `paths`.
    async fn sign_tx(&self, plan: &TxPlan, paths: &dyn PathLookup) -> Result<SignedTx, SignerError>;
}

/// Chain fee formula.
///
/// Must be pure and monotonic non-decreasing in the number of inputs and
/// outputs and in certificate presence; the plan builder relies on this.
pub trait FeeCalculator: Send + Sync {
    fn required_fee(
        &self,
        inputs: &[TxInput],
        outputs: &[Output],
        certificate: Option<&Certificate>,
    ) -> Lovelace;
}

/// An address freshly derived by an [`AddressProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: String,
    pub path: DerivationPath,
    /// Hex of the public key the address is derived from.
    pub public_key_hex: String,
}

/// Derives addresses of one family for one account.
///
/// `derive` must be a pure function of the provider's key material and
/// `index`.
pub trait AddressProvider: Send + Sync {
    fn scheme(&self) -> AddressScheme;

    fn derive(&self, index: u32) -> Result<DerivedAddress, AddressError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingFee;

    impl FeeCalculator for CountingFee {
        fn required_fee(&self, inputs: &[TxInput], outputs: &[Output], certificate: Option<&Certificate>) -> Lovelace {
            (inputs.len() + outputs.len() + usize::from(certificate.is_some())) as Lovelace
        }
    }

    struct StaticLookup;

    impl PathLookup for StaticLookup {
        fn path_for(&self, address: &str) -> Option<DerivationPath> {
            (address == "known").then(|| DerivationPath::new(vec![0, 1]))
        }
    }

    // ------------------------------------------------------------------
    // Object safety: verify each trait is dyn-compatible
    // ------------------------------------------------------------------

    fn _assert_explorer_object_safe(_e: &dyn Explorer) {}

    fn _assert_signer_object_safe(_s: &dyn Signer) {}

    fn _assert_provider_object_safe(p: &dyn AddressProvider) {
        let _ = p.scheme();
    }

    #[test]
    fn fee_calculator_through_dyn() {
        let fee: &dyn FeeCalculator = &CountingFee;
        assert_eq!(fee.required_fee(&[], &[Output::new("a", 1)], None), 1);
    }

    #[test]
    fn path_lookup_through_dyn() {
        let lookup: &dyn PathLookup = &StaticLookup;
        assert_eq!(lookup.path_for("known"), Some(DerivationPath::new(vec![0, 1])));
        assert_eq!(lookup.path_for("other"), None);
    }
}
