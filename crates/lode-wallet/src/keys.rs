//! Seed management and deterministic address derivation.
//!
//! Child keys come from BLAKE3 keyed derivation over the master seed and the
//! little-endian derivation path, turned into Ed25519 keypairs. Every address
//! is therefore a pure function of (seed, scheme, account, index), which is
//! what gap-limit discovery relies on.

use std::fmt;
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use lode_core::address::{encode_account, encode_base, encode_legacy, AddressScheme, DerivationPath, Network};
use lode_core::constants::{
    COIN_TYPE, EXTERNAL_CHAIN, HARDENED, INTERNAL_CHAIN, LEGACY_PURPOSE, STAKING_CHAIN, STAKING_PURPOSE,
};
use lode_core::error::AddressError;
use lode_core::traits::{AddressProvider, DerivedAddress};

use crate::config::{DerivationScheme, WalletConfig};

/// BLAKE3 KDF context for child key derivation.
const KDF_CONTEXT: &str = "lode-wallet-key-derivation-v1";

/// A 32-byte master seed for deterministic key derivation.
///
/// Secret material is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 32],
}

impl Seed {
    /// Generate a random seed from the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed").field("bytes", &"[REDACTED]").finish()
    }
}

/// Derive the Ed25519 signing key at `path`.
pub fn derive_signing_key(seed: &Seed, path: &DerivationPath) -> SigningKey {
    let mut material = Vec::with_capacity(32 + path.as_slice().len() * 4);
    material.extend_from_slice(seed.as_bytes());
    material.extend_from_slice(&path.to_le_bytes());
    let mut secret = blake3::derive_key(KDF_CONTEXT, &material);
    material.zeroize();
    let key = SigningKey::from_bytes(&secret);
    secret.zeroize();
    key
}

/// Derive the public key bytes at `path`.
pub fn derive_public_key(seed: &Seed, path: &DerivationPath) -> [u8; 32] {
    derive_signing_key(seed, path).verifying_key().to_bytes()
}

/// Path of the account's staking key, shared by every base address.
pub fn staking_key_path(account: u32) -> DerivationPath {
    DerivationPath::new(vec![
        HARDENED | STAKING_PURPOSE,
        HARDENED | COIN_TYPE,
        HARDENED | account,
        STAKING_CHAIN,
        0,
    ])
}

fn hardened(index: u32) -> Result<u32, AddressError> {
    if index & HARDENED != 0 {
        return Err(AddressError::Derivation(format!("index {index} out of range")));
    }
    Ok(HARDENED | index)
}

fn soft(index: u32) -> Result<u32, AddressError> {
    if index & HARDENED != 0 {
        return Err(AddressError::Derivation(format!("index {index} out of range")));
    }
    Ok(index)
}

/// Derivation path of address `index` in `scheme` for `account`.
pub fn address_path(
    scheme: AddressScheme,
    derivation: DerivationScheme,
    account: u32,
    index: u32,
) -> Result<DerivationPath, AddressError> {
    let account = hardened(account)?;
    let indices = match scheme {
        AddressScheme::LegacyExternal | AddressScheme::LegacyInternal => {
            let chain = if scheme == AddressScheme::LegacyExternal {
                EXTERNAL_CHAIN
            } else {
                INTERNAL_CHAIN
            };
            match derivation {
                DerivationScheme::V1 => vec![account, HARDENED | chain, hardened(index)?],
                DerivationScheme::V2 => vec![
                    HARDENED | LEGACY_PURPOSE,
                    HARDENED | COIN_TYPE,
                    account,
                    chain,
                    soft(index)?,
                ],
            }
        }
        AddressScheme::BaseExternal | AddressScheme::BaseInternal => {
            let chain = if scheme == AddressScheme::BaseExternal {
                EXTERNAL_CHAIN
            } else {
                INTERNAL_CHAIN
            };
            vec![HARDENED | STAKING_PURPOSE, HARDENED | COIN_TYPE, account, chain, soft(index)?]
        }
        AddressScheme::StakingAccount => vec![
            HARDENED | STAKING_PURPOSE,
            HARDENED | COIN_TYPE,
            account,
            STAKING_CHAIN,
            soft(index)?,
        ],
    };
    Ok(DerivationPath::new(indices))
}

/// Seed-backed [`AddressProvider`] for one address family.
pub struct KeyAddressProvider {
    seed: Arc<Seed>,
    scheme: AddressScheme,
    derivation: DerivationScheme,
    account: u32,
    network: Network,
    /// Staking public key embedded in base addresses.
    staking_key: [u8; 32],
}

impl KeyAddressProvider {
    pub fn new(
        seed: Arc<Seed>,
        scheme: AddressScheme,
        derivation: DerivationScheme,
        account: u32,
        network: Network,
    ) -> Result<Self, AddressError> {
        hardened(account)?;
        let staking_key = derive_public_key(&seed, &staking_key_path(account));
        Ok(Self {
            seed,
            scheme,
            derivation,
            account,
            network,
            staking_key,
        })
    }

    /// Hex of the account's staking public key.
    pub fn staking_key_hex(&self) -> String {
        hex::encode(self.staking_key)
    }
}

impl AddressProvider for KeyAddressProvider {
    fn scheme(&self) -> AddressScheme {
        self.scheme
    }

    fn derive(&self, index: u32) -> Result<DerivedAddress, AddressError> {
        let path = address_path(self.scheme, self.derivation, self.account, index)?;
        let public_key = derive_public_key(&self.seed, &path);
        let address = match self.scheme {
            AddressScheme::LegacyExternal | AddressScheme::LegacyInternal => {
                encode_legacy(&public_key, self.network)
            }
            AddressScheme::BaseExternal | AddressScheme::BaseInternal => {
                encode_base(&public_key, &self.staking_key, self.network)
            }
            AddressScheme::StakingAccount => encode_account(&public_key, self.network),
        };
        Ok(DerivedAddress {
            address,
            path,
            public_key_hex: hex::encode(public_key),
        })
    }
}

impl fmt::Debug for KeyAddressProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAddressProvider")
            .field("scheme", &self.scheme)
            .field("account", &self.account)
            .field("network", &self.network)
            .finish()
    }
}

/// One provider per address family of an account.
#[derive(Clone)]
pub struct AddressProviders {
    pub legacy_external: Arc<dyn AddressProvider>,
    pub legacy_internal: Arc<dyn AddressProvider>,
    pub base_external: Arc<dyn AddressProvider>,
    pub base_internal: Arc<dyn AddressProvider>,
    pub staking_account: Arc<dyn AddressProvider>,
}

impl AddressProviders {
    /// Seed-backed providers for the account named by `config`.
    pub fn from_seed(seed: Seed, config: &WalletConfig) -> Result<Self, AddressError> {
        let seed = Arc::new(seed);
        let make = |scheme: AddressScheme| -> Result<Arc<dyn AddressProvider>, AddressError> {
            Ok(Arc::new(KeyAddressProvider::new(
                Arc::clone(&seed),
                scheme,
                config.derivation_scheme,
                config.account_index,
                config.network,
            )?))
        };
        Ok(Self {
            legacy_external: make(AddressScheme::LegacyExternal)?,
            legacy_internal: make(AddressScheme::LegacyInternal)?,
            base_external: make(AddressScheme::BaseExternal)?,
            base_internal: make(AddressScheme::BaseInternal)?,
            staking_account: make(AddressScheme::StakingAccount)?,
        })
    }
}
