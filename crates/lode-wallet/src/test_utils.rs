//! Hand-written collaborators shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use lode_core::address::{address_to_hex, AddressScheme, DerivationPath};
use lode_core::error::{AddressError, NetworkError, SignerError};
use lode_core::traits::{AddressProvider, DerivedAddress, Explorer, FeeCalculator, PathLookup, Signer};
use lode_core::types::*;

/// Canonical comparison key: hex when the address parses, raw otherwise.
pub fn canon(address: &str) -> String {
    address_to_hex(address).unwrap_or_else(|_| address.to_string())
}

/// Provider producing readable, non-encodable addresses like `be-3`.
pub struct SeqProvider {
    pub scheme: AddressScheme,
}

impl SeqProvider {
    pub fn label(scheme: AddressScheme) -> &'static str {
        match scheme {
            AddressScheme::LegacyExternal => "le",
            AddressScheme::LegacyInternal => "li",
            AddressScheme::BaseExternal => "be",
            AddressScheme::BaseInternal => "bi",
            AddressScheme::StakingAccount => "sa",
        }
    }

    pub fn address(scheme: AddressScheme, index: u32) -> String {
        format!("{}-{index}", Self::label(scheme))
    }
}

impl AddressProvider for SeqProvider {
    fn scheme(&self) -> AddressScheme {
        self.scheme
    }

    fn derive(&self, index: u32) -> Result<DerivedAddress, AddressError> {
        Ok(DerivedAddress {
            address: Self::address(self.scheme, index),
            path: DerivationPath::new(vec![self.scheme as u32, index]),
            public_key_hex: format!("{:064x}", index),
        })
    }
}

/// In-memory explorer keyed by canonical address.
#[derive(Default)]
pub struct MockExplorer {
    pub used: HashSet<String>,
    pub utxos: Vec<Utxo>,
    pub history: Vec<TxHistoryEntry>,
    pub account_info: AccountInfo,
    pub pools: HashMap<String, StakePool>,
    pub pool_info: Option<PoolInfo>,
    pub fail_with: Option<NetworkError>,
    /// Every address list the explorer was queried with.
    pub queries: Mutex<Vec<Vec<String>>>,
    pub submitted: Mutex<Vec<(String, String)>>,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_used<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.used.extend(addresses.into_iter().map(|a| canon(a.as_ref())));
        self
    }

    pub fn with_utxo(mut self, address: &str, coins: Lovelace) -> Self {
        let index = self.utxos.len() as u32;
        self.utxos.push(Utxo {
            tx_hash: format!("{:064x}", index + 1),
            output_index: index,
            address: address.to_string(),
            coins,
        });
        self.used.insert(canon(address));
        self
    }

    fn check(&self, addresses: &[String]) -> Result<HashSet<String>, NetworkError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.queries.lock().unwrap().push(addresses.to_vec());
        Ok(addresses.iter().map(|a| canon(a)).collect())
    }

    fn fail(&self) -> Result<(), NetworkError> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Explorer for MockExplorer {
    async fn get_balance(&self, addresses: &[String]) -> Result<Lovelace, NetworkError> {
        let wanted = self.check(addresses)?;
        Ok(self
            .utxos
            .iter()
            .filter(|u| wanted.contains(&canon(&u.address)))
            .map(|u| u.coins)
            .sum())
    }

    async fn fetch_unspent_tx_outputs(&self, addresses: &[String]) -> Result<Vec<Utxo>, NetworkError> {
        let wanted = self.check(addresses)?;
        Ok(self
            .utxos
            .iter()
            .filter(|u| wanted.contains(&canon(&u.address)))
            .cloned()
            .collect())
    }

    async fn is_some_address_used(&self, addresses: &[String]) -> Result<bool, NetworkError> {
        let wanted = self.check(addresses)?;
        Ok(wanted.iter().any(|a| self.used.contains(a)))
    }

    async fn filter_used_addresses(&self, addresses: &[String]) -> Result<Vec<String>, NetworkError> {
        self.check(addresses)?;
        Ok(addresses
            .iter()
            .filter(|a| self.used.contains(&canon(a)))
            .cloned()
            .collect())
    }

    async fn get_tx_history(&self, addresses: &[String]) -> Result<Vec<TxHistoryEntry>, NetworkError> {
        self.check(addresses)?;
        Ok(self.history.clone())
    }

    async fn fetch_tx_info(&self, tx_hash: &str) -> Result<TxInfo, NetworkError> {
        self.fail()?;
        Ok(TxInfo {
            tx_hash: tx_hash.to_string(),
            inputs: vec![],
            outputs: vec![],
            fee: 0,
            block_height: None,
        })
    }

    async fn submit_tx_raw(&self, tx_id: &str, raw_tx: &str) -> Result<SubmitAck, NetworkError> {
        self.fail()?;
        self.submitted
            .lock()
            .unwrap()
            .push((tx_id.to_string(), raw_tx.to_string()));
        Ok(SubmitAck {
            tx_hash: tx_id.to_string(),
        })
    }

    async fn get_account_info(&self, _account_pubkey_hex: &str) -> Result<AccountInfo, NetworkError> {
        self.fail()?;
        Ok(self.account_info.clone())
    }

    async fn get_valid_stakepools(&self) -> Result<HashMap<String, StakePool>, NetworkError> {
        self.fail()?;
        Ok(self.pools.clone())
    }

    async fn get_pool_info(&self, _url: &str) -> Result<PoolInfo, NetworkError> {
        self.pool_info
            .clone()
            .ok_or_else(|| NetworkError::Request("pool metadata unreachable".into()))
    }
}

/// Fee formula returning the same value regardless of shape.
pub struct FixedFee(pub Lovelace);

impl FeeCalculator for FixedFee {
    fn required_fee(&self, _: &[TxInput], _: &[Output], _: Option<&Certificate>) -> Lovelace {
        self.0
    }
}

/// Fee of `without` when the plan has no change slot, `with` otherwise.
pub struct StepFee {
    pub without: Lovelace,
    pub with: Lovelace,
    pub base_outputs: usize,
}

impl FeeCalculator for StepFee {
    fn required_fee(&self, _: &[TxInput], outputs: &[Output], _: Option<&Certificate>) -> Lovelace {
        if outputs.len() > self.base_outputs {
            self.with
        } else {
            self.without
        }
    }
}

/// Signer that either echoes the plan or refuses with a fixed message.
pub struct MockSigner {
    pub reject: Option<String>,
    /// Paths resolved for each input during the last call.
    pub resolved: Mutex<Vec<Option<DerivationPath>>>,
}

impl MockSigner {
    pub fn accepting() -> Self {
        Self {
            reject: None,
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            reject: Some(message.to_string()),
            resolved: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn sign_tx(&self, plan: &TxPlan, paths: &dyn PathLookup) -> Result<SignedTx, SignerError> {
        if let Some(message) = &self.reject {
            return Err(SignerError(message.clone()));
        }
        let resolved = plan.inputs.iter().map(|i| paths.path_for(i.address())).collect();
        *self.resolved.lock().unwrap() = resolved;
        Ok(SignedTx {
            transaction: hex::encode(serde_json::to_vec(plan).unwrap()),
            fragment_id: format!("frag-{}", plan.inputs.len()),
        })
    }
}
