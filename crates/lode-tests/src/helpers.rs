//! Shared collaborators and builders for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lode_core::address::address_to_hex;
use lode_core::error::{NetworkError, SignerError};
use lode_core::traits::{Explorer, FeeCalculator, PathLookup, Signer};
use lode_core::types::*;
use lode_wallet::{Seed, Wallet, WalletConfig};

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn key(address: &str) -> String {
    address_to_hex(address).unwrap_or_else(|_| address.to_string())
}

#[derive(Default)]
struct Ledger {
    utxos: Vec<Utxo>,
    history: HashMap<String, Vec<TxHistoryEntry>>,
    submitted: Vec<(String, String)>,
    address_queries: usize,
}

/// Explorer over an in-memory ledger. Addresses are matched in canonical
/// hex, so either encoding may be queried or stored.
#[derive(Default)]
pub struct MemoryExplorer {
    ledger: Mutex<Ledger>,
    pub account: AccountInfo,
    pub pools: HashMap<String, StakePool>,
    pub pool_metadata: HashMap<String, PoolInfo>,
}

impl MemoryExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: AccountInfo) -> Self {
        self.account = account;
        self
    }

    pub fn with_pool(mut self, pool: StakePool) -> Self {
        self.pools.insert(pool.pool_hash.clone(), pool);
        self
    }

    /// Serve `info` for metadata lookups of `url`.
    pub fn with_pool_metadata(mut self, url: &str, info: PoolInfo) -> Self {
        self.pool_metadata.insert(url.to_string(), info);
        self
    }

    /// Credit `coins` to `address` as a fresh UTXO.
    pub fn fund(&self, address: &str, coins: Lovelace) {
        let mut ledger = self.ledger.lock().unwrap();
        let n = ledger.utxos.len() as u32;
        let tx_hash = format!("{:064x}", u64::from(n) + 0xA000);
        ledger.utxos.push(Utxo {
            tx_hash: tx_hash.clone(),
            output_index: 0,
            address: address.to_string(),
            coins,
        });
        ledger.history.entry(key(address)).or_default().push(TxHistoryEntry {
            tx_hash,
            effect: coins as i64,
            fee: 0,
            timestamp: None,
        });
    }

    /// Mark `address` used without funding it.
    pub fn touch(&self, address: &str) {
        self.fund(address, 0);
    }

    pub fn submitted(&self) -> Vec<(String, String)> {
        self.ledger.lock().unwrap().submitted.clone()
    }

    /// Number of address-list queries served so far.
    pub fn address_queries(&self) -> usize {
        self.ledger.lock().unwrap().address_queries
    }

    fn matching<T>(&self, addresses: &[String], f: impl Fn(&Ledger, &str) -> Vec<T>) -> Vec<T> {
        let mut guard = self.ledger.lock().unwrap();
        guard.address_queries += 1;
        let ledger: &Ledger = &guard;
        addresses.iter().flat_map(|a| f(ledger, &key(a))).collect()
    }
}

#[async_trait]
impl Explorer for MemoryExplorer {
    async fn get_balance(&self, addresses: &[String]) -> Result<Lovelace, NetworkError> {
        Ok(self
            .fetch_unspent_tx_outputs(addresses)
            .await?
            .iter()
            .map(|u| u.coins)
            .sum())
    }

    async fn fetch_unspent_tx_outputs(&self, addresses: &[String]) -> Result<Vec<Utxo>, NetworkError> {
        Ok(self.matching(addresses, |ledger, k| {
            ledger
                .utxos
                .iter()
                .filter(|u| u.coins > 0 && key(&u.address) == k)
                .cloned()
                .collect()
        }))
    }

    async fn is_some_address_used(&self, addresses: &[String]) -> Result<bool, NetworkError> {
        Ok(!self.filter_used_addresses(addresses).await?.is_empty())
    }

    async fn filter_used_addresses(&self, addresses: &[String]) -> Result<Vec<String>, NetworkError> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.address_queries += 1;
        Ok(addresses
            .iter()
            .filter(|a| ledger.history.contains_key(&key(a)))
            .cloned()
            .collect())
    }

    async fn get_tx_history(&self, addresses: &[String]) -> Result<Vec<TxHistoryEntry>, NetworkError> {
        Ok(self.matching(addresses, |ledger, k| ledger.history.get(k).cloned().unwrap_or_default()))
    }

    async fn fetch_tx_info(&self, tx_hash: &str) -> Result<TxInfo, NetworkError> {
        let ledger = self.ledger.lock().unwrap();
        let outputs: Vec<Output> = ledger
            .utxos
            .iter()
            .filter(|u| u.tx_hash == tx_hash)
            .map(|u| Output::new(u.address.clone(), u.coins))
            .collect();
        if outputs.is_empty() {
            return Err(NetworkError::Status {
                code: 404,
                message: format!("unknown transaction {tx_hash}"),
            });
        }
        Ok(TxInfo {
            tx_hash: tx_hash.to_string(),
            inputs: vec![],
            outputs,
            fee: 0,
            block_height: Some(1),
        })
    }

    async fn submit_tx_raw(&self, tx_id: &str, raw_tx: &str) -> Result<SubmitAck, NetworkError> {
        if hex::decode(raw_tx).is_err() {
            return Err(NetworkError::Status {
                code: 400,
                message: "transaction is not hex".into(),
            });
        }
        self.ledger
            .lock()
            .unwrap()
            .submitted
            .push((tx_id.to_string(), raw_tx.to_string()));
        Ok(SubmitAck {
            tx_hash: tx_id.to_string(),
        })
    }

    async fn get_account_info(&self, _account_pubkey_hex: &str) -> Result<AccountInfo, NetworkError> {
        Ok(self.account.clone())
    }

    async fn get_valid_stakepools(&self) -> Result<HashMap<String, StakePool>, NetworkError> {
        Ok(self.pools.clone())
    }

    async fn get_pool_info(&self, url: &str) -> Result<PoolInfo, NetworkError> {
        self.pool_metadata
            .get(url)
            .cloned()
            .ok_or_else(|| NetworkError::Status {
                code: 404,
                message: url.to_string(),
            })
    }
}

/// Signer serializing the plan as its "transaction".
///
/// Refuses plans with any input whose path cannot be resolved.
#[derive(Default)]
pub struct JsonSigner {
    pub last_paths: Mutex<Vec<String>>,
}

#[async_trait]
impl Signer for JsonSigner {
    async fn sign_tx(&self, plan: &TxPlan, paths: &dyn PathLookup) -> Result<SignedTx, SignerError> {
        let mut resolved = Vec::with_capacity(plan.inputs.len());
        for input in &plan.inputs {
            let path = paths
                .path_for(input.address())
                .ok_or_else(|| SignerError(format!("no key for {}", input.address())))?;
            resolved.push(path.to_string());
        }
        *self.last_paths.lock().unwrap() = resolved;
        let body = serde_json::to_vec(plan).map_err(|e| SignerError(e.to_string()))?;
        Ok(SignedTx {
            transaction: hex::encode(&body),
            fragment_id: blake3::hash(&body).to_hex().to_string(),
        })
    }
}

/// Fee that ignores the transaction shape.
pub struct FlatFee(pub Lovelace);

impl FeeCalculator for FlatFee {
    fn required_fee(&self, _: &[TxInput], _: &[Output], _: Option<&Certificate>) -> Lovelace {
        self.0
    }
}

/// Config with pinned seeds and a small gap limit.
pub fn test_config() -> WalletConfig {
    WalletConfig {
        gap_limit: 4,
        input_seed: Some(1234),
        change_seed: Some(5678),
        ..WalletConfig::testnet()
    }
}

pub fn test_seed(byte: u8) -> Seed {
    Seed::from_bytes([byte; 32])
}

/// Wallet over a shared [`MemoryExplorer`] and [`JsonSigner`].
pub fn test_wallet(seed: u8, explorer: Arc<MemoryExplorer>, signer: Arc<JsonSigner>) -> Wallet {
    Wallet::from_seed(test_seed(seed), explorer, signer, test_config()).unwrap()
}
