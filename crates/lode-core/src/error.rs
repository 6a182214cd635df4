//! Error types shared by Lode crates and collaborators.
use thiserror::Error;

/// Failure talking to the ledger explorer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request failed: {0}")] Request(String),
    #[error("explorer returned status {code}: {message}")] Status { code: u16, message: String },
    #[error("malformed explorer response: {0}")] Decode(String),
    #[error("timeout")] Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid HRP")] InvalidHrp,
    #[error("invalid length")] InvalidLength,
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("invalid padding bits")] InvalidPadding,
    #[error("unknown network: {0}")] UnknownNetwork(String),
    #[error("unknown address header: {0:#04x}")] UnknownHeader(u8),
    #[error("missing separator")] MissingSeparator,
    #[error("mixed case")] MixedCase,
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("unrecognized address encoding: {0}")] Unrecognized(String),
    #[error("key derivation: {0}")] Derivation(String),
}

/// Failure reported by the signing collaborator. The message is kept verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SignerError(pub String);
