//! Wallet error types.

use lode_core::error::{AddressError, NetworkError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
///
/// Running out of funds is not an error: selection reports it through
/// [`lode_core::types::PlanOutcome::InsufficientFunds`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Explorer request failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Address encoding or derivation failure.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// A coin sum left the representable range.
    #[error("coin amount overflow")]
    AmountOverflow,

    /// The signer refused or failed; carries the signer's message.
    #[error("transaction rejected while signing: {0}")]
    SigningRejected(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Delegation request with no pools or zero total weight.
    #[error("invalid delegation: {0}")]
    InvalidDelegation(String),

    /// No address is available to receive change.
    #[error("no change address available")]
    NoChangeAddress,

    #[error("configuration: {0}")]
    Config(String),
}
