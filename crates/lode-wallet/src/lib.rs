//! # lode-wallet: address discovery and transaction planning.
//!
//! Derives the five address families of an account from a master seed,
//! discovers which addresses are in use through an explorer, and builds
//! fee-correct transaction plans from the wallet's UTXOs with seeded,
//! reproducible input ordering.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`random`]: Park–Miller generator, shuffle and pick
//! - [`keys`]: Seed, BLAKE3-based key derivation, address providers
//! - [`address_manager`]: per-family derivation and gap-limit discovery
//! - [`aggregator`]: five managers, path mappers, change address choice
//! - [`plan`]: fee and change reconciliation for a fixed input set
//! - [`selection`]: UTXO ordering, greedy selection, `TxPlanner`
//! - [`max_amount`]: largest sendable and donatable amounts
//! - [`explorer`]: hex-normalizing explorer adapter
//! - [`config`]: `WalletConfig`
//! - [`session`]: per-session randomization seeds
//! - [`wallet`]: high-level wallet composition

pub mod address_manager;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod explorer;
pub mod keys;
pub mod max_amount;
pub mod plan;
pub mod random;
pub mod selection;
pub mod session;
pub mod wallet;

#[cfg(test)]
mod test_utils;

// Re-exports for convenient access
pub use address_manager::{Address, AddressManager};
pub use aggregator::{AddressAggregator, DiscoveredAddresses, PathMapper};
pub use config::{DerivationScheme, WalletConfig};
pub use error::WalletError;
pub use explorer::HexAddressExplorer;
pub use keys::{AddressProviders, KeyAddressProvider, Seed};
pub use max_amount::MaxAmountCalculator;
pub use plan::{compute_account_tx_plan, compute_tx_plan};
pub use random::PseudoRandom;
pub use selection::{order_utxos, select_minimal_tx_plan, SelectionMode, TxPlanner};
pub use session::SessionSeeds;
pub use wallet::{TxRequest, Wallet, WalletBalance, WalletInfo};
