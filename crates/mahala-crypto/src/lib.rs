// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MAHALA - WALLET IDENTITY MODULE
//
// Deterministic wallet derivation from an irreversible biometric fingerprint.
// - Strict parsing of the 256-bit fingerprint (hex)
// - HKDF-SHA256 seed derivation with a versioned context string
// - Ed25519 keypair from the derived seed
// - Account address = lowercase hex of the Ed25519 public key
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use ed25519_dalek::{SigningKey, VerifyingKey};
use hkdf::Hkdf;
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

/// Width of the fingerprint hash in bytes (SHA-256 output).
pub const FINGERPRINT_LEN: usize = 32;

/// Width of the fingerprint hash as hex characters.
pub const FINGERPRINT_HEX_LEN: usize = FINGERPRINT_LEN * 2;

/// Current derivation scheme. Bumping it changes every derived address.
pub const DERIVATION_VERSION: u32 = 1;

/// Length of host-generated device salts.
pub const DEVICE_SALT_LEN: usize = 32;

/// HKDF extract salt. Fixed across versions; the version lives in `info`.
const HKDF_SALT: &[u8] = b"mahala-biometric-wallet";

/// Length of an account address (hex of a 32-byte public key).
pub const ADDRESS_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("fingerprint must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("fingerprint contains non-hex character {found:?} at position {position}")]
    InvalidHex { position: usize, found: char },

    #[error("unsupported derivation version {0}")]
    UnsupportedVersion(u32),

    #[error("key derivation failed: {0}")]
    Kdf(String),
}

/// A 256-bit fingerprint computed by the host from biometric material and a
/// per-device salt. Only this irreversible value ever reaches the core.
#[derive(Clone, PartialEq, Eq)]
pub struct Fingerprint(Zeroizing<[u8; FINGERPRINT_LEN]>);

impl Fingerprint {
    /// Parse a fingerprint from exactly 64 hex characters.
    ///
    /// Input is never trimmed, padded or truncated: any deviation in width or
    /// alphabet is rejected.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let actual = input.chars().count();
        if actual != FINGERPRINT_HEX_LEN {
            return Err(CryptoError::InvalidLength {
                expected: FINGERPRINT_HEX_LEN,
                actual,
            });
        }

        if let Some((position, found)) = input
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_hexdigit())
        {
            return Err(CryptoError::InvalidHex { position, found });
        }

        let mut bytes = Zeroizing::new([0u8; FINGERPRINT_LEN]);
        hex::decode_to_slice(input, &mut bytes[..]).map_err(|_| CryptoError::InvalidLength {
            expected: FINGERPRINT_HEX_LEN,
            actual,
        })?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Fingerprint(<redacted>)")
    }
}

/// Wallet identity derived from a fingerprint.
///
/// Immutable once created. The seed is zeroized on drop and never printed.
pub struct WalletIdentity {
    seed_material: Zeroizing<[u8; 32]>,
    address: String,
    derivation_version: u32,
}

impl WalletIdentity {
    /// Account address on the ledger.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn derivation_version(&self) -> u32 {
        self.derivation_version
    }

    /// Ed25519 verifying key, recomputed from the seed.
    pub fn verifying_key(&self) -> VerifyingKey {
        SigningKey::from_bytes(&self.seed_material).verifying_key()
    }
}

impl std::fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address)
            .field("derivation_version", &self.derivation_version)
            .field("seed_material", &"<redacted>")
            .finish()
    }
}

/// Derive the wallet identity for a hex fingerprint with the current scheme.
pub fn derive_identity(fingerprint_hex: &str) -> Result<WalletIdentity, CryptoError> {
    let fingerprint = Fingerprint::from_hex(fingerprint_hex)?;
    derive_identity_versioned(&fingerprint, DERIVATION_VERSION)
}

/// Derive the wallet identity for a parsed fingerprint and explicit scheme version.
///
/// Pure function: the same `(fingerprint, version)` always yields the same
/// address on every device.
pub fn derive_identity_versioned(
    fingerprint: &Fingerprint,
    version: u32,
) -> Result<WalletIdentity, CryptoError> {
    let seed_material = derive_seed(fingerprint, version)?;
    let verifying_key = SigningKey::from_bytes(&seed_material).verifying_key();
    let address = public_key_to_address(verifying_key.as_bytes());

    Ok(WalletIdentity {
        seed_material,
        address,
        derivation_version: version,
    })
}

/// HKDF-SHA256 over the fingerprint.
///
///   prk  = HKDF-Extract(salt = "mahala-biometric-wallet", ikm = fingerprint)
///   seed = HKDF-Expand(prk, info = "mahala/wallet-seed/v{version}", 32)
fn derive_seed(fingerprint: &Fingerprint, version: u32) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    if version != DERIVATION_VERSION {
        return Err(CryptoError::UnsupportedVersion(version));
    }

    let info = format!("mahala/wallet-seed/v{}", version);
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), fingerprint.as_bytes());
    let mut seed = Zeroizing::new([0u8; 32]);
    hk.expand(info.as_bytes(), &mut seed[..])
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;
    Ok(seed)
}

/// Ledger account rule: the address is the lowercase hex public key.
pub fn public_key_to_address(public_key: &[u8; 32]) -> String {
    hex::encode(public_key)
}

/// Check that a string is a well-formed account address.
pub fn validate_address(address: &str) -> bool {
    address.len() == ADDRESS_LEN
        && address
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HOST HELPERS
//
// The core only ever receives the fingerprint. These helpers let a host build
// one the same way the mobile front-ends do.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// SHA-256("{device_id}:{salt}") as a fingerprint.
pub fn fingerprint_from_device(device_id: &str, salt: &str) -> Fingerprint {
    let digest = Sha256::digest(format!("{}:{}", device_id, salt).as_bytes());
    Fingerprint::from_bytes(digest.into())
}

/// Hex form of [`fingerprint_from_device`], ready for `derive_wallet`.
pub fn fingerprint_hex_from_device(device_id: &str, salt: &str) -> String {
    hex::encode(fingerprint_from_device(device_id, salt).as_bytes())
}

/// Fresh random alphanumeric salt. Generated once per device and kept by the host.
pub fn generate_device_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DEVICE_SALT_LEN)
        .map(char::from)
        .collect()
}
