//! Wallet configuration.
//!
//! Provides [`WalletConfig`] with mainnet defaults and a testnet preset.
//! Callers may build it programmatically, deserialize it from a file, or
//! read it from `LODE_*` environment variables with [`WalletConfig::from_env`].

use serde::{Deserialize, Serialize};

use lode_core::address::Network;
use lode_core::constants::{DEFAULT_DONATION_ADDRESS, DEFAULT_GAP_LIMIT};
use lode_core::fee::ChainConfig;

use crate::error::WalletError;

/// Legacy key derivation scheme of the wallet.
///
/// V1 wallets only ever used the internal legacy chain, so their external
/// legacy addresses are not reported by discovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivationScheme {
    V1,
    #[default]
    V2,
}

impl std::str::FromStr for DerivationScheme {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(DerivationScheme::V1),
            "v2" => Ok(DerivationScheme::V2),
            other => Err(WalletError::Config(format!("unknown derivation scheme: {other}"))),
        }
    }
}

/// Configuration for one wallet account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub network: Network,
    /// Hardened account index all five address families derive under.
    pub account_index: u32,
    /// Consecutive unused addresses that end discovery.
    pub gap_limit: u32,
    pub derivation_scheme: DerivationScheme,
    /// Fee parameters for the default fee formula.
    pub chain: ChainConfig,
    /// Destination of donation outputs.
    pub donation_address: String,
    /// Pinned input-ordering seed. Random per session when unset.
    pub input_seed: Option<u32>,
    /// Pinned change-address seed. Random per session when unset.
    pub change_seed: Option<u32>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            account_index: 0,
            gap_limit: DEFAULT_GAP_LIMIT,
            derivation_scheme: DerivationScheme::V2,
            chain: ChainConfig::default(),
            donation_address: DEFAULT_DONATION_ADDRESS.to_string(),
            input_seed: None,
            change_seed: None,
        }
    }
}

impl WalletConfig {
    /// Mainnet defaults.
    pub fn mainnet() -> Self {
        Self::default()
    }

    /// Testnet preset.
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            ..Self::default()
        }
    }

    /// Reject configurations the wallet cannot run with.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.gap_limit == 0 {
            return Err(WalletError::Config("gap limit must be at least 1".into()));
        }
        if self.donation_address.is_empty() {
            return Err(WalletError::Config("donation address must not be empty".into()));
        }
        Ok(())
    }

    /// Read overrides from the process environment on top of defaults.
    ///
    /// Recognized variables: `LODE_NETWORK`, `LODE_ACCOUNT_INDEX`,
    /// `LODE_GAP_LIMIT`, `LODE_DERIVATION_SCHEME`, `LODE_FEE_CONSTANT`,
    /// `LODE_FEE_COEFFICIENT`, `LODE_FEE_CERTIFICATE`,
    /// `LODE_DONATION_ADDRESS`, `LODE_INPUT_SEED`, `LODE_CHANGE_SEED`.
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(network) = lookup("LODE_NETWORK") {
            config.network = network
                .parse()
                .map_err(|e| WalletError::Config(format!("LODE_NETWORK: {e}")))?;
        }
        if let Some(scheme) = lookup("LODE_DERIVATION_SCHEME") {
            config.derivation_scheme = scheme.parse()?;
        }
        if let Some(v) = parse_var(&lookup, "LODE_ACCOUNT_INDEX")? {
            config.account_index = v;
        }
        if let Some(v) = parse_var(&lookup, "LODE_GAP_LIMIT")? {
            config.gap_limit = v;
        }
        if let Some(v) = parse_var(&lookup, "LODE_FEE_CONSTANT")? {
            config.chain.fee_constant = v;
        }
        if let Some(v) = parse_var(&lookup, "LODE_FEE_COEFFICIENT")? {
            config.chain.fee_coefficient = v;
        }
        if let Some(v) = parse_var(&lookup, "LODE_FEE_CERTIFICATE")? {
            config.chain.fee_certificate = v;
        }
        if let Some(address) = lookup("LODE_DONATION_ADDRESS") {
            config.donation_address = address;
        }
        config.input_seed = parse_var(&lookup, "LODE_INPUT_SEED")?;
        config.change_seed = parse_var(&lookup, "LODE_CHANGE_SEED")?;

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, WalletError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| WalletError::Config(format!("{key}: {e}")))
        })
        .transpose()
}
