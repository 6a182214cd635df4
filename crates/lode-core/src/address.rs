//! Address encodings for both address schemes.
//!
//! Every address is a binary payload whose first byte is a header:
//! `discrimination | kind`, where discrimination is `0x80` on testnet.
//!
//! - Legacy: `header || blake3(pubkey)[..28] || checksum(4)`, base58 text
//! - Base: `header || spending key (32) || staking key (32)`, bech32 text
//! - Account: `header || staking key (32)`, bech32 text
//!
//! The canonical hex form of an address is the lowercase hex of its payload.
//! The explorer reports addresses in hex while derivation produces the
//! human-readable forms, so both directions are needed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::HARDENED;
use crate::error::AddressError;

/// Bech32 checksum constant (BIP-173).
const BECH32_CONST: u32 = 1;

/// Bech32 character set for encoding 5-bit values.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Discrimination bit set in testnet headers.
const TESTNET_BIT: u8 = 0x80;

const LEGACY_KIND: u8 = 0x02;
const BASE_KIND: u8 = 0x04;
const ACCOUNT_KIND: u8 = 0x05;

/// Length of the key hash embedded in a legacy address.
const LEGACY_HASH_LEN: usize = 28;
const LEGACY_CHECKSUM_LEN: usize = 4;
const LEGACY_LEN: usize = 1 + LEGACY_HASH_LEN + LEGACY_CHECKSUM_LEN;
const BASE_LEN: usize = 1 + 32 + 32;
const ACCOUNT_LEN: usize = 1 + 32;

/// Network identifier determining header discrimination and bech32 prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet (HRP: "ca").
    Mainnet,
    /// Testnet (HRP: "ta").
    Testnet,
}

impl Network {
    /// Human-readable prefix for bech32 addresses on this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "ca",
            Network::Testnet => "ta",
        }
    }

    /// Look up network from a human-readable prefix.
    pub fn from_hrp(hrp: &str) -> Result<Self, AddressError> {
        match hrp {
            "ca" => Ok(Network::Mainnet),
            "ta" => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownNetwork(hrp.to_string())),
        }
    }

    fn discrimination(&self) -> u8 {
        match self {
            Network::Mainnet => 0,
            Network::Testnet => TESTNET_BIT,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(AddressError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Structural kind of an address payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Legacy UTXO-only address.
    Legacy,
    /// Base address carrying both spending and staking keys.
    Base,
    /// Staking account address.
    Account,
}

/// The five address families a wallet account derives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressScheme {
    LegacyExternal,
    LegacyInternal,
    BaseExternal,
    BaseInternal,
    StakingAccount,
}

impl AddressScheme {
    /// All families, in the order the aggregator owns them.
    pub const ALL: [AddressScheme; 5] = [
        AddressScheme::LegacyExternal,
        AddressScheme::LegacyInternal,
        AddressScheme::BaseExternal,
        AddressScheme::BaseInternal,
        AddressScheme::StakingAccount,
    ];

    /// Whether addresses of this family belong to the staking scheme.
    pub fn is_staking(&self) -> bool {
        !self.is_legacy()
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, AddressScheme::LegacyExternal | AddressScheme::LegacyInternal)
    }

    /// Kind of payload this family produces.
    pub fn kind(&self) -> AddressKind {
        match self {
            AddressScheme::LegacyExternal | AddressScheme::LegacyInternal => AddressKind::Legacy,
            AddressScheme::BaseExternal | AddressScheme::BaseInternal => AddressKind::Base,
            AddressScheme::StakingAccount => AddressKind::Account,
        }
    }
}

impl fmt::Display for AddressScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressScheme::LegacyExternal => "legacy-external",
            AddressScheme::LegacyInternal => "legacy-internal",
            AddressScheme::BaseExternal => "base-external",
            AddressScheme::BaseInternal => "base-internal",
            AddressScheme::StakingAccount => "staking-account",
        };
        f.write_str(name)
    }
}

/// Ordered derivation path. Hardened indices carry [`HARDENED`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
    pub fn new(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Last index of the path, i.e. the address index within its chain.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Little-endian byte form used as key-derivation input.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|i| i.to_le_bytes()).collect()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            if index & HARDENED != 0 {
                write!(f, "/{}'", index & !HARDENED)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(indices: Vec<u32>) -> Self {
        Self(indices)
    }
}

// --- Construction ---

/// Encode a legacy address for a public key.
pub fn encode_legacy(public_key: &[u8; 32], network: Network) -> String {
    let mut payload = Vec::with_capacity(LEGACY_LEN);
    payload.push(network.discrimination() | LEGACY_KIND);
    payload.extend_from_slice(&blake3::hash(public_key).as_bytes()[..LEGACY_HASH_LEN]);
    let checksum = legacy_checksum(&payload);
    payload.extend_from_slice(&checksum);
    bs58::encode(payload).into_string()
}

/// Encode a base address from its spending and staking public keys.
pub fn encode_base(spending_key: &[u8; 32], staking_key: &[u8; 32], network: Network) -> String {
    let mut payload = Vec::with_capacity(BASE_LEN);
    payload.push(network.discrimination() | BASE_KIND);
    payload.extend_from_slice(spending_key);
    payload.extend_from_slice(staking_key);
    encode_bech32(network.hrp(), &payload)
}

/// Encode a staking account address from its staking public key.
pub fn encode_account(staking_key: &[u8; 32], network: Network) -> String {
    let mut payload = Vec::with_capacity(ACCOUNT_LEN);
    payload.push(network.discrimination() | ACCOUNT_KIND);
    payload.extend_from_slice(staking_key);
    encode_bech32(network.hrp(), &payload)
}

fn legacy_checksum(body: &[u8]) -> [u8; LEGACY_CHECKSUM_LEN] {
    let mut out = [0u8; LEGACY_CHECKSUM_LEN];
    out.copy_from_slice(&blake3::hash(body).as_bytes()[..LEGACY_CHECKSUM_LEN]);
    out
}

// --- Format conversion ---

/// Whether `address` is a well-formed bech32 string (staking-scheme text form).
pub fn is_bech32(address: &str) -> bool {
    decode_bech32(address).is_ok()
}

/// Convert a bech32 address to canonical hex.
pub fn bech32_to_hex(address: &str) -> Result<String, AddressError> {
    let (_, payload) = decode_bech32(address)?;
    classify(&payload)?;
    Ok(hex::encode(payload))
}

/// Convert a base58 legacy address to canonical hex.
pub fn base58_to_hex(address: &str) -> Result<String, AddressError> {
    let payload = decode_legacy_base58(address)?;
    Ok(hex::encode(payload))
}

/// Convert an address in any supported encoding to canonical hex.
pub fn address_to_hex(address: &str) -> Result<String, AddressError> {
    address_payload(address).map(hex::encode)
}

/// Decode an address in bech32, hex or base58 form into its payload.
pub fn address_payload(address: &str) -> Result<Vec<u8>, AddressError> {
    if let Ok((_, payload)) = decode_bech32(address) {
        classify(&payload)?;
        return Ok(payload);
    }
    if let Ok(payload) = hex::decode(address) {
        if classify(&payload).is_ok() {
            return Ok(payload);
        }
    }
    decode_legacy_base58(address)
        .map_err(|_| AddressError::Unrecognized(address.to_string()))
}

/// Structural kind of an address in any supported encoding.
pub fn address_kind(address: &str) -> Result<AddressKind, AddressError> {
    let payload = address_payload(address)?;
    classify(&payload)
}

/// Whether the address is a staking-scheme base address.
///
/// Unrecognized strings are treated as non-base.
pub fn is_base(address: &str) -> bool {
    matches!(address_kind(address), Ok(AddressKind::Base))
}

fn classify(payload: &[u8]) -> Result<AddressKind, AddressError> {
    let header = *payload.first().ok_or(AddressError::InvalidLength)?;
    let (kind, expected_len) = match header & !TESTNET_BIT {
        LEGACY_KIND => (AddressKind::Legacy, LEGACY_LEN),
        BASE_KIND => (AddressKind::Base, BASE_LEN),
        ACCOUNT_KIND => (AddressKind::Account, ACCOUNT_LEN),
        _ => return Err(AddressError::UnknownHeader(header)),
    };
    if payload.len() != expected_len {
        return Err(AddressError::InvalidLength);
    }
    if kind == AddressKind::Legacy {
        let (body, checksum) = payload.split_at(LEGACY_LEN - LEGACY_CHECKSUM_LEN);
        if legacy_checksum(body) != checksum {
            return Err(AddressError::InvalidChecksum);
        }
    }
    Ok(kind)
}

fn decode_legacy_base58(address: &str) -> Result<Vec<u8>, AddressError> {
    let payload = bs58::decode(address)
        .into_vec()
        .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
    match classify(&payload)? {
        AddressKind::Legacy => Ok(payload),
        _ => Err(AddressError::UnknownHeader(payload[0])),
    }
}

// --- Bech32 internals ---

/// Encode a byte payload as bech32 under the given HRP.
pub fn encode_bech32(hrp: &str, payload: &[u8]) -> String {
    let data = convert_bits(payload, 8, 5, true).unwrap_or_default();
    let checksum = bech32_create_checksum(hrp, &data);

    let mut result = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    result.push_str(hrp);
    result.push('1');
    for &d in data.iter().chain(checksum.iter()) {
        result.push(CHARSET[d as usize] as char);
    }
    result
}

/// Decode a bech32 string into its network and byte payload.
pub fn decode_bech32(s: &str) -> Result<(Network, Vec<u8>), AddressError> {
    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }

    let s_lower = s.to_ascii_lowercase();
    let sep_pos = s_lower.rfind('1').ok_or(AddressError::MissingSeparator)?;
    if sep_pos == 0 {
        return Err(AddressError::InvalidHrp);
    }
    if sep_pos + 7 > s_lower.len() {
        return Err(AddressError::InvalidLength);
    }

    let hrp = &s_lower[..sep_pos];
    let network = Network::from_hrp(hrp)?;

    let mut data = Vec::with_capacity(s_lower.len() - sep_pos - 1);
    for c in s_lower[sep_pos + 1..].chars() {
        let pos = CHARSET
            .iter()
            .position(|&ch| ch as char == c)
            .ok_or(AddressError::InvalidCharacter(c))?;
        data.push(pos as u8);
    }

    if !bech32_verify_checksum(hrp, &data) {
        return Err(AddressError::InvalidChecksum);
    }

    let payload = convert_bits(&data[..data.len() - 6], 5, 8, false)
        .ok_or(AddressError::InvalidPadding)?;
    Ok((network, payload))
}

fn bech32_polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    let mut chk: u32 = 1;
    for &v in values {
        let b = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (v as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk
}

fn bech32_hrp_expand(hrp: &str) -> Vec<u8> {
    let mut ret = Vec::with_capacity(hrp.len() * 2 + 1);
    ret.extend(hrp.bytes().map(|c| c >> 5));
    ret.push(0);
    ret.extend(hrp.bytes().map(|c| c & 31));
    ret
}

fn bech32_create_checksum(hrp: &str, data: &[u8]) -> Vec<u8> {
    let mut values = bech32_hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; 6]);
    let polymod = bech32_polymod(&values) ^ BECH32_CONST;
    (0..6)
        .map(|i| ((polymod >> (5 * (5 - i))) & 31) as u8)
        .collect()
}

fn bech32_verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = bech32_hrp_expand(hrp);
    values.extend_from_slice(data);
    bech32_polymod(&values) == BECH32_CONST
}

/// Convert between bit widths (e.g. 8-bit bytes to 5-bit groups).
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::new();
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}
