//! Core wallet types: UTXOs, plan inputs and outputs, certificates, plans,
//! and explorer payloads.
//!
//! All monetary values are in lovelace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coin amount in the smallest unit.
pub type Lovelace = u64;

/// An unspent transaction output as reported by the explorer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub tx_hash: String,
    pub output_index: u32,
    /// Owning address, usually in canonical hex.
    pub address: String,
    pub coins: Lovelace,
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.output_index)
    }
}

/// Spend from a staking account rather than from a UTXO.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    pub address: String,
    pub coins: Lovelace,
    /// Account spending counter, bumped by the ledger on every spend.
    pub counter: u32,
}

/// A plan input, discriminated by an explicit tag.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxInput {
    Utxo(Utxo),
    Account(AccountInput),
}

impl TxInput {
    pub fn coins(&self) -> Lovelace {
        match self {
            TxInput::Utxo(utxo) => utxo.coins,
            TxInput::Account(account) => account.coins,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            TxInput::Utxo(utxo) => &utxo.address,
            TxInput::Account(account) => &account.address,
        }
    }
}

impl From<Utxo> for TxInput {
    fn from(utxo: Utxo) -> Self {
        TxInput::Utxo(utxo)
    }
}

/// A transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub address: String,
    pub coins: Lovelace,
}

impl Output {
    pub fn new(address: impl Into<String>, coins: Lovelace) -> Self {
        Self {
            address: address.into(),
            coins,
        }
    }
}

/// One pool in a delegation, weighted by `ratio` parts.
///
/// A pool's share of the stake is `ratio / sum of all ratios`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolDelegation {
    pub pool_id: String,
    pub ratio: u32,
}

/// On-chain instruction attached to a transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Certificate {
    StakeDelegation {
        pools: Vec<PoolDelegation>,
        account_address: String,
    },
}

/// Whether a plan spends UTXOs or a staking account.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxPlanKind {
    Utxo,
    Account,
}

/// A fee-correct transaction plan ready for signing.
///
/// `total_input() == total_output() + fee + change` always holds for plans
/// produced by the plan builder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxPlan {
    pub kind: TxPlanKind,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<Output>,
    pub change: Option<Output>,
    pub certificate: Option<Certificate>,
    pub fee: Lovelace,
}

impl TxPlan {
    pub fn total_input(&self) -> u128 {
        self.inputs.iter().map(|i| i.coins() as u128).sum()
    }

    /// Sum of outputs, excluding change.
    pub fn total_output(&self) -> u128 {
        self.outputs.iter().map(|o| o.coins as u128).sum()
    }

    pub fn change_coins(&self) -> Lovelace {
        self.change.as_ref().map_or(0, |c| c.coins)
    }

    /// Whether inputs exactly cover outputs, fee and change.
    pub fn is_balanced(&self) -> bool {
        self.total_input()
            == self.total_output() + self.fee as u128 + self.change_coins() as u128
    }
}

/// Result of UTXO selection.
///
/// Insufficient funds is an expected outcome, not an error: callers must
/// treat it as "no plan" and may show the estimated fee.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    Ready(TxPlan),
    InsufficientFunds { estimated_fee: Lovelace },
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&TxPlan> {
        match self {
            PlanOutcome::Ready(plan) => Some(plan),
            PlanOutcome::InsufficientFunds { .. } => None,
        }
    }

    pub fn into_plan(self) -> Option<TxPlan> {
        match self {
            PlanOutcome::Ready(plan) => Some(plan),
            PlanOutcome::InsufficientFunds { .. } => None,
        }
    }
}

/// Signed transaction returned by the signer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedTx {
    /// Hex-encoded raw transaction.
    pub transaction: String,
    pub fragment_id: String,
}

/// Explorer acknowledgement of a submitted transaction.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    pub tx_hash: String,
}

/// One entry of an address set's transaction history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxHistoryEntry {
    pub tx_hash: String,
    /// Net effect on the queried address set, may be negative.
    pub effect: i64,
    pub fee: Lovelace,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Detailed transaction as reported by the explorer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxInfo {
    pub tx_hash: String,
    pub inputs: Vec<Output>,
    pub outputs: Vec<Output>,
    pub fee: Lovelace,
    #[serde(default)]
    pub block_height: Option<u64>,
}

/// Current delegation of a staking account.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DelegationInfo {
    #[serde(default)]
    pub pool_hash: Option<String>,
    /// Metadata URL of the delegated pool.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub metadata: PoolInfo,
}

/// Staking account state.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub delegation: DelegationInfo,
    /// Accrued reward balance.
    #[serde(default)]
    pub value: Lovelace,
    #[serde(default)]
    pub counter: u32,
}

/// Cosmetic pool metadata. Empty when the lookup failed.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PoolInfo {
    pub fn is_empty(&self) -> bool {
        *self == PoolInfo::default()
    }
}

/// A stake pool accepting delegation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StakePool {
    pub pool_hash: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub metadata: PoolInfo,
}
