//! Certload Crypto: key material for the certificate login handshake.
//!
//! Every simulated user gets its own Ed25519 identity:
//! - 32 bytes are drawn from the OS CSPRNG and used as the signing seed
//! - The public key is registered with the certificate service
//! - The issued certificate is signed with a detached signature
//! - Secret bytes implement `Zeroize` and are wiped on drop

#![forbid(unsafe_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Length of an Ed25519 seed in bytes.
pub const SEED_LEN: usize = 32;

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the expanded private key (seed followed by public key).
pub const PRIVATE_KEY_LEN: usize = 64;

/// Length of a detached Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Error types for crypto operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The OS random source could not provide seed bytes
    RandomSource(String),
    /// Public key is malformed (not 32 bytes or not a curve point)
    InvalidPublicKey,
    /// Signature is malformed (not 64 bytes)
    InvalidSignature,
    /// Signature verification failed
    VerificationFailed,
    /// Base64 input could not be decoded
    InvalidEncoding(String),
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RandomSource(msg) => write!(f, "random source unavailable: {}", msg),
            Self::InvalidPublicKey => write!(f, "invalid public key format"),
            Self::InvalidSignature => write!(f, "invalid signature format"),
            Self::VerificationFailed => write!(f, "signature verification failed"),
            Self::InvalidEncoding(msg) => write!(f, "invalid base64: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Ed25519 identity of one simulated user.
///
/// Deliberately not `Clone`: a keypair belongs to exactly one handshake and is
/// consumed by it.
pub struct KeyMaterial {
    signing_key: SigningKey,
}

impl KeyMaterial {
    /// Generate a fresh keypair from 32 bytes of OS randomness.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; SEED_LEN];
        getrandom::getrandom(&mut seed).map_err(|e| CryptoError::RandomSource(e.to_string()))?;
        let key = Self::from_seed(&seed);
        seed.zeroize();
        Ok(key)
    }

    /// Derive a keypair deterministically from a seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Raw 32-byte public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Expanded 64-byte private key (seed ‖ public key).
    pub fn private_key(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.signing_key.to_keypair_bytes()
    }

    /// Public key in standard padded base64, as registered with the CA.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key())
    }

    /// Short hex fingerprint of the public key, safe to log.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public_key())
    }

    /// Produce a detached signature over `message`.
    pub fn sign_detached(&self, message: &[u8]) -> DetachedSignature {
        DetachedSignature::from_bytes(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("fingerprint", &self.fingerprint())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// A 64-byte detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DetachedSignature([u8; SIGNATURE_LEN]);

impl DetachedSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode a base64 signature as carried in the `signature` header.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        let bytes: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self(bytes))
    }

    /// Raw signature bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    /// Standard padded base64 encoding for transport.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl std::fmt::Debug for DetachedSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DetachedSignature({})", self.to_base64())
    }
}

/// Verify a detached Ed25519 signature.
///
/// - `public_key`: 32-byte Ed25519 public key
/// - `message`: the exact bytes that were signed
/// - `signature`: 64-byte Ed25519 signature
pub fn verify_detached(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let vk_bytes: [u8; PUBLIC_KEY_LEN] = public_key
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let verifying_key =
        VerifyingKey::from_bytes(&vk_bytes).map_err(|_| CryptoError::InvalidPublicKey)?;

    let sig_bytes: [u8; SIGNATURE_LEN] = signature
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;
    let sig = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Decode a base64 public key as sent in a certificate request.
pub fn decode_public_key(encoded: &str) -> Result<[u8; PUBLIC_KEY_LEN]> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
    bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)
}

/// First 8 bytes of SHA-256 over the public key, hex encoded.
pub fn fingerprint(public_key: &[u8]) -> String {
    Sha256::digest(public_key)
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}
