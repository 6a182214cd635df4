//! Protocol constants for Lode.
//!
//! All monetary values are in lovelace (1 ADA = 10^6 lovelace).

/// Number of lovelace in one whole coin.
pub const LOVELACE_PER_COIN: u64 = 1_000_000;

/// Largest coin amount a single plan may move (total supply, in lovelace).
pub const MAX_LOVELACE: u64 = 45_000_000_000 * LOVELACE_PER_COIN;

/// Bit marking a hardened derivation index.
pub const HARDENED: u32 = 0x8000_0000;

/// BIP-44 purpose used by legacy addresses.
pub const LEGACY_PURPOSE: u32 = 44;

/// Purpose used by staking-scheme addresses.
pub const STAKING_PURPOSE: u32 = 1852;

/// Registered coin type.
pub const COIN_TYPE: u32 = 1815;

/// Chain index of receiving addresses.
pub const EXTERNAL_CHAIN: u32 = 0;

/// Chain index of change addresses.
pub const INTERNAL_CHAIN: u32 = 1;

/// Chain index of the staking key.
pub const STAKING_CHAIN: u32 = 2;

/// Default number of consecutive unused addresses that ends discovery.
pub const DEFAULT_GAP_LIMIT: u32 = 20;

/// Gap limit of the single-address staking account family.
pub const STAKING_ACCOUNT_GAP_LIMIT: u32 = 1;

/// Default linear fee: constant part.
pub const DEFAULT_FEE_CONSTANT: u64 = 200_000;

/// Default linear fee: cost per input and per output.
pub const DEFAULT_FEE_COEFFICIENT: u64 = 100_000;

/// Default linear fee: cost of attaching a certificate.
pub const DEFAULT_FEE_CERTIFICATE: u64 = 400_000;

/// Address receiving optional donations.
pub const DEFAULT_DONATION_ADDRESS: &str = "DdzFFzCqrhsfYMUNRxtQ5NNKbWVw3ZJBNcMLLZSoqmD5trHHPBDwsjonoBgw1K6e8Qi8bEMs5Y62yZfReEVSFFMncFYDUHUTMM436KjQ";
