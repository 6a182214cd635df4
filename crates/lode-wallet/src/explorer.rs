//! Explorer adapter normalizing address arguments to canonical hex.
//!
//! Derivation yields bech32 and base58 strings while the indexer keys
//! addresses by payload hex. Wrapping an explorer in [`HexAddressExplorer`]
//! converts every address argument before delegating. Strings that do not
//! parse as an address are forwarded unchanged.

use std::collections::HashMap;

use async_trait::async_trait;

use lode_core::error::NetworkError;
use lode_core::traits::Explorer;
use lode_core::types::{AccountInfo, Lovelace, PoolInfo, StakePool, SubmitAck, TxHistoryEntry, TxInfo, Utxo};

use crate::address_manager::canonical;

fn to_hex(addresses: &[String]) -> Vec<String> {
    addresses.iter().map(|a| canonical(a)).collect()
}

#[derive(Debug, Clone)]
pub struct HexAddressExplorer<E> {
    inner: E,
}

impl<E: Explorer> HexAddressExplorer<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

#[async_trait]
impl<E: Explorer> Explorer for HexAddressExplorer<E> {
    async fn get_balance(&self, addresses: &[String]) -> Result<Lovelace, NetworkError> {
        self.inner.get_balance(&to_hex(addresses)).await
    }

    async fn fetch_unspent_tx_outputs(&self, addresses: &[String]) -> Result<Vec<Utxo>, NetworkError> {
        self.inner.fetch_unspent_tx_outputs(&to_hex(addresses)).await
    }

    async fn is_some_address_used(&self, addresses: &[String]) -> Result<bool, NetworkError> {
        self.inner.is_some_address_used(&to_hex(addresses)).await
    }

    async fn filter_used_addresses(&self, addresses: &[String]) -> Result<Vec<String>, NetworkError> {
        self.inner.filter_used_addresses(&to_hex(addresses)).await
    }

    async fn get_tx_history(&self, addresses: &[String]) -> Result<Vec<TxHistoryEntry>, NetworkError> {
        self.inner.get_tx_history(&to_hex(addresses)).await
    }

    async fn fetch_tx_info(&self, tx_hash: &str) -> Result<TxInfo, NetworkError> {
        self.inner.fetch_tx_info(tx_hash).await
    }

    async fn submit_tx_raw(&self, tx_id: &str, raw_tx: &str) -> Result<SubmitAck, NetworkError> {
        self.inner.submit_tx_raw(tx_id, raw_tx).await
    }

    async fn get_account_info(&self, account_pubkey_hex: &str) -> Result<AccountInfo, NetworkError> {
        self.inner.get_account_info(account_pubkey_hex).await
    }

    async fn get_valid_stakepools(&self) -> Result<HashMap<String, StakePool>, NetworkError> {
        self.inner.get_valid_stakepools().await
    }

    async fn get_pool_info(&self, url: &str) -> Result<PoolInfo, NetworkError> {
        self.inner.get_pool_info(url).await
    }
}
