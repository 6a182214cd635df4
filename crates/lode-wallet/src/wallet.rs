//! Wallet composition: discovery, balances, planning, signing, submission.
//!
//! The [`Wallet`] ties the address aggregator to the explorer, signer and fee
//! formula collaborators. Addresses and UTXOs are re-discovered on every call
//! that needs them; nothing chain-derived is cached between calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lode_core::address::is_base;
use lode_core::constants::LOVELACE_PER_COIN;
use lode_core::fee::LinearFee;
use lode_core::traits::{Explorer, FeeCalculator, Signer};
use lode_core::types::{
    AccountInfo, Lovelace, PlanOutcome, PoolDelegation, PoolInfo, SignedTx, StakePool, SubmitAck, TxHistoryEntry,
    TxInfo, TxPlan, Utxo,
};

use crate::address_manager::Address;
use crate::aggregator::{AddressAggregator, DiscoveredAddresses};
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::keys::{AddressProviders, Seed};
use crate::max_amount::MaxAmountCalculator;
use crate::selection::TxPlanner;
use crate::session::SessionSeeds;

/// Balance summary across address families.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Held on legacy addresses.
    pub non_staking: Lovelace,
    /// Held on base addresses, plus rewards.
    pub staking: Lovelace,
    /// Reward balance of the staking account.
    pub rewards: Lovelace,
    pub total: Lovelace,
}

impl WalletBalance {
    /// Total in whole coins (display helper).
    pub fn total_coins(&self) -> f64 {
        self.total as f64 / LOVELACE_PER_COIN as f64
    }
}

/// Everything a wallet overview needs, fetched in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub balance: WalletBalance,
    pub account_info: AccountInfo,
    pub history: Vec<TxHistoryEntry>,
    pub visible_addresses: Vec<Address>,
}

/// A transaction the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxRequest {
    /// Pay `coins` to `address`, optionally donating.
    Send {
        address: String,
        coins: Lovelace,
        donation: Lovelace,
    },
    /// Move non-staking funds to `address`, spending legacy UTXOs only.
    Convert { address: String, coins: Lovelace },
    /// Delegate the staking account to weighted pools.
    Delegate { pools: Vec<PoolDelegation> },
}

fn merge_pool_info(base: PoolInfo, overlay: PoolInfo) -> PoolInfo {
    PoolInfo {
        name: overlay.name.or(base.name),
        ticker: overlay.ticker.or(base.ticker),
        homepage: overlay.homepage.or(base.homepage),
        description: overlay.description.or(base.description),
    }
}

/// Non-custodial wallet over one account.
pub struct Wallet {
    aggregator: AddressAggregator,
    explorer: Arc<dyn Explorer>,
    signer: Arc<dyn Signer>,
    fee: Arc<dyn FeeCalculator>,
    config: WalletConfig,
    seeds: SessionSeeds,
}

impl Wallet {
    pub fn new(
        providers: AddressProviders,
        explorer: Arc<dyn Explorer>,
        signer: Arc<dyn Signer>,
        fee: Arc<dyn FeeCalculator>,
        config: WalletConfig,
    ) -> Result<Self, WalletError> {
        let aggregator = AddressAggregator::new(providers, Arc::clone(&explorer), &config)?;
        let seeds = SessionSeeds::new(config.input_seed, config.change_seed);
        Ok(Self {
            aggregator,
            explorer,
            signer,
            fee,
            config,
            seeds,
        })
    }

    /// Seed-backed wallet using the linear fee of `config.chain`.
    pub fn from_seed(
        seed: Seed,
        explorer: Arc<dyn Explorer>,
        signer: Arc<dyn Signer>,
        config: WalletConfig,
    ) -> Result<Self, WalletError> {
        let providers = AddressProviders::from_seed(seed, &config)?;
        let fee = Arc::new(LinearFee::new(config.chain));
        Self::new(providers, explorer, signer, fee, config)
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn seeds(&self) -> &SessionSeeds {
        &self.seeds
    }

    /// Draw new unpinned session seeds.
    pub fn regenerate_seeds(&mut self) {
        self.seeds.regenerate();
        debug!(input_seed = self.seeds.input_seed, change_seed = self.seeds.change_seed, "regenerated seeds");
    }

    pub async fn discover_all_addresses(&mut self) -> Result<DiscoveredAddresses, WalletError> {
        self.aggregator.discover_all_addresses().await
    }

    async fn balance_of(&self, addresses: &[String]) -> Result<Lovelace, WalletError> {
        if addresses.is_empty() {
            return Ok(0);
        }
        Ok(self.explorer.get_balance(addresses).await?)
    }

    async fn utxos_of(&self, addresses: &[String]) -> Result<Vec<Utxo>, WalletError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.explorer.fetch_unspent_tx_outputs(addresses).await?)
    }

    /// Balances per family. Staking includes the account rewards.
    pub async fn balance(&mut self) -> Result<WalletBalance, WalletError> {
        let discovered = self.aggregator.discover_all_addresses().await?;
        let (non_staking, base) = tokio::try_join!(
            self.balance_of(&discovered.legacy),
            self.balance_of(&discovered.base),
        )?;
        let rewards = self.raw_account_info().await?.value;

        let staking = base.checked_add(rewards).ok_or(WalletError::AmountOverflow)?;
        let total = non_staking.checked_add(staking).ok_or(WalletError::AmountOverflow)?;
        Ok(WalletBalance {
            non_staking,
            staking,
            rewards,
            total,
        })
    }

    /// History over base, legacy and staking account addresses.
    pub async fn history(&mut self) -> Result<Vec<TxHistoryEntry>, WalletError> {
        let discovered = self.aggregator.discover_all_addresses().await?;
        Ok(self.explorer.get_tx_history(&discovered.all()).await?)
    }

    /// Spendable UTXOs: legacy first, then base.
    pub async fn utxos(&mut self) -> Result<Vec<Utxo>, WalletError> {
        let discovered = self.aggregator.discover_all_addresses().await?;
        let (mut legacy, base) = tokio::try_join!(
            self.utxos_of(&discovered.legacy),
            self.utxos_of(&discovered.base),
        )?;
        legacy.extend(base);
        Ok(legacy)
    }

    pub async fn visible_addresses(&mut self) -> Result<Vec<Address>, WalletError> {
        self.aggregator.visible_addresses_with_meta().await
    }

    /// Change address for the current change seed.
    pub async fn change_address(&mut self) -> Result<String, WalletError> {
        self.aggregator.change_address(self.seeds.change_seed).await
    }

    /// Plan a transaction for `request`.
    ///
    /// Running out of funds is reported as
    /// [`PlanOutcome::InsufficientFunds`], not as an error.
    pub async fn tx_plan(&mut self, request: TxRequest) -> Result<PlanOutcome, WalletError> {
        let seeds = self.seeds.clone();
        let account_address = self.aggregator.staking_account_address()?;
        let change_address = self.aggregator.change_address(seeds.change_seed).await?;
        let utxos = self.utxos().await?;

        let mut planner = TxPlanner::new(self.fee.as_ref());
        match &request {
            TxRequest::Send {
                address,
                coins,
                donation,
            } => {
                planner
                    .destination(address, *coins)
                    .donation(&self.config.donation_address, *donation);
            }
            TxRequest::Convert { address, coins } => {
                planner.destination(address, *coins).non_staking_only();
            }
            TxRequest::Delegate { pools } => {
                planner.delegation(pools.clone(), &account_address)?;
            }
        }

        let outcome = planner.select(utxos, &change_address, seeds.input_seed)?;
        debug!(request = ?request, ready = outcome.plan().is_some(), "planned transaction");
        Ok(outcome)
    }

    /// Sign `plan` through the signer, resolving keys with the fixed path
    /// mapper.
    pub async fn sign_tx(&self, plan: &TxPlan) -> Result<SignedTx, WalletError> {
        let mapper = self.aggregator.fixed_path_mapper();
        self.signer.sign_tx(plan, &mapper).await.map_err(|e| {
            debug!(error = %e, "signer rejected transaction");
            WalletError::SigningRejected(e.0)
        })
    }

    pub async fn submit_tx(&self, signed: &SignedTx) -> Result<SubmitAck, WalletError> {
        let ack = self
            .explorer
            .submit_tx_raw(&signed.fragment_id, &signed.transaction)
            .await?;
        info!(fragment_id = %signed.fragment_id, tx_hash = %ack.tx_hash, "submitted transaction");
        Ok(ack)
    }

    async fn raw_account_info(&self) -> Result<AccountInfo, WalletError> {
        let pubkey = self.aggregator.staking_account_pubkey_hex()?;
        Ok(self.explorer.get_account_info(&pubkey).await?)
    }

    /// Staking account state with the delegated pool's metadata merged in.
    pub async fn account_info(&self) -> Result<AccountInfo, WalletError> {
        let mut info = self.raw_account_info().await?;
        if let Some(url) = info.delegation.url.clone() {
            let pool = self.pool_info(&url).await;
            info.delegation.metadata = merge_pool_info(info.delegation.metadata, pool);
        }
        Ok(info)
    }

    /// Pool metadata behind `url`. Lookup failures yield empty metadata.
    pub async fn pool_info(&self, url: &str) -> PoolInfo {
        match self.explorer.get_pool_info(url).await {
            Ok(info) => info,
            Err(e) => {
                warn!(url, error = %e, "pool metadata unavailable");
                PoolInfo::default()
            }
        }
    }

    pub async fn valid_stakepools(&self) -> Result<HashMap<String, StakePool>, WalletError> {
        Ok(self.explorer.get_valid_stakepools().await?)
    }

    pub async fn fetch_tx_info(&self, tx_hash: &str) -> Result<TxInfo, WalletError> {
        Ok(self.explorer.fetch_tx_info(tx_hash).await?)
    }

    pub async fn wallet_info(&mut self) -> Result<WalletInfo, WalletError> {
        let balance = self.balance().await?;
        let account_info = self.account_info().await?;
        let visible_addresses = self.visible_addresses().await?;
        let history = self.history().await?;
        Ok(WalletInfo {
            balance,
            account_info,
            history,
            visible_addresses,
        })
    }

    pub async fn max_sendable_amount(&mut self, address: &str, donation: Lovelace) -> Result<Lovelace, WalletError> {
        let utxos = self.utxos().await?;
        MaxAmountCalculator::new(self.fee.as_ref(), &self.config.donation_address)
            .max_sendable_amount(&utxos, address, donation)
    }

    pub async fn max_donation_amount(&mut self, address: &str, send_amount: Lovelace) -> Result<Lovelace, WalletError> {
        let utxos = self.utxos().await?;
        MaxAmountCalculator::new(self.fee.as_ref(), &self.config.donation_address)
            .max_donation_amount(&utxos, address, send_amount)
    }

    /// Maximum amount a convert request can move.
    pub async fn max_non_staking_amount(&mut self, address: &str) -> Result<Lovelace, WalletError> {
        let utxos: Vec<Utxo> = self
            .utxos()
            .await?
            .into_iter()
            .filter(|u| !is_base(&u.address))
            .collect();
        MaxAmountCalculator::new(self.fee.as_ref(), &self.config.donation_address)
            .max_sendable_amount(&utxos, address, 0)
    }

    /// Address ownership checks need a device; software wallets cannot
    /// perform them.
    pub fn verify_address(&self, _address: &str) -> Result<(), WalletError> {
        Err(WalletError::UnsupportedOperation("verify_address".into()))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("network", &self.config.network)
            .field("account_index", &self.config.account_index)
            .field("seeds", &self.seeds)
            .finish()
    }
}
