//! secp256k1 signing, recovery and verification over 32-byte digests

use super::eip712::keccak256;
use ethereum_types::{Address, H256, U256};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use once_cell::sync::Lazy;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// secp256k1 group order `n`
static CURVE_ORDER: Lazy<U256> = Lazy::new(|| {
    U256::from_big_endian(&[
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
        0x41, 0x41,
    ])
});

/// `n / 2`; any `S` above it is the malleable twin of a low-S signature
static HALF_CURVE_ORDER: Lazy<U256> = Lazy::new(|| *CURVE_ORDER >> 1);

/// Signature engine failures
///
/// Variants never carry key material or signature bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature must be {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },
    #[error("recovery id {0} is not one of 0, 1, 27, 28")]
    InvalidRecoveryId(u8),
    #[error("signature scalar is zero or not below the curve order")]
    ScalarOverflow,
    #[error("signature S value is in the upper half of the curve order")]
    MalleableSignature,
    #[error("public key recovery failed")]
    PublicKeyRecoveryFailed,
    #[error("invalid private key")]
    InvalidPrivateKey,
}

/// A secp256k1 private key used to sign digests
///
/// The inner key is wiped on drop. Raw key bytes are never exposed.
pub struct PrivateKeySigner {
    key: SigningKey,
    address: Address,
}

impl PrivateKeySigner {
    /// Parse a 32-byte hex private key, with or without `0x`
    pub fn from_hex(private_key: &str) -> Result<Self, SignatureError> {
        let raw = private_key.trim().trim_start_matches("0x");
        let bytes = Zeroizing::new(hex::decode(raw).map_err(|_| SignatureError::InvalidPrivateKey)?);
        if bytes.len() != 32 {
            return Err(SignatureError::InvalidPrivateKey);
        }
        let key = SigningKey::from_slice(&bytes).map_err(|_| SignatureError::InvalidPrivateKey)?;
        Ok(Self::from_signing_key(key))
    }

    /// Generate a fresh key from the thread CSPRNG
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    fn from_signing_key(key: SigningKey) -> Self {
        let address = public_key_to_address(key.verifying_key());
        Self { key, address }
    }

    /// Ethereum address derived from the public key
    pub fn address(&self) -> Address {
        self.address
    }

    /// The public key
    pub fn public_key(&self) -> VerifyingKey {
        *self.key.verifying_key()
    }

    /// Sign a 32-byte digest, returning `R || S || V` with `V` in {0, 1}
    ///
    /// RFC 6979 deterministic nonce; `S` is always in the lower half of the order.
    pub fn sign_digest(&self, digest: &H256) -> Result<[u8; 65], SignatureError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| SignatureError::InvalidPrivateKey)?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(out)
    }
}

impl fmt::Debug for PrivateKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Map `V` of 0/1 or 27/28 to a recovery id of 0/1
pub fn normalize_recovery_id(v: u8) -> Result<u8, SignatureError> {
    match v {
        0 | 1 => Ok(v),
        27 | 28 => Ok(v - 27),
        other => Err(SignatureError::InvalidRecoveryId(other)),
    }
}

/// Recover the signer's public key from a 65-byte `R || S || V` signature
pub fn recover_public_key(digest: &H256, signature: &[u8]) -> Result<VerifyingKey, SignatureError> {
    if signature.len() != 65 {
        return Err(SignatureError::InvalidSignatureLength {
            expected: 65,
            actual: signature.len(),
        });
    }
    let recovery_id = normalize_recovery_id(signature[64])?;
    let signature = parse_low_s(&signature[..64])?;
    let recovery_id =
        RecoveryId::from_byte(recovery_id).ok_or(SignatureError::InvalidRecoveryId(recovery_id))?;

    VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
        .map_err(|_| SignatureError::PublicKeyRecoveryFailed)
}

/// Verify a 64-byte `R || S` signature against a public key
///
/// Returns false for anything that does not check out, including high-S signatures.
pub fn verify(public_key: &VerifyingKey, digest: &H256, signature: &[u8]) -> bool {
    if signature.len() != 64 {
        return false;
    }
    match parse_low_s(signature) {
        Ok(signature) => public_key
            .verify_prehash(digest.as_bytes(), &signature)
            .is_ok(),
        Err(_) => false,
    }
}

/// Ethereum address of a public key: last 20 bytes of `keccak256(X || Y)`
pub fn public_key_to_address(public_key: &VerifyingKey) -> Address {
    let point = public_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Generate a random nonce for EIP-3009 authorization
pub fn generate_nonce() -> H256 {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    H256::from_slice(&bytes)
}

fn parse_low_s(rs: &[u8]) -> Result<Signature, SignatureError> {
    let r = U256::from_big_endian(&rs[..32]);
    let s = U256::from_big_endian(&rs[32..64]);
    if r.is_zero() || s.is_zero() || r >= *CURVE_ORDER || s >= *CURVE_ORDER {
        return Err(SignatureError::ScalarOverflow);
    }
    if s > *HALF_CURVE_ORDER {
        return Err(SignatureError::MalleableSignature);
    }
    Signature::from_slice(&rs[..64]).map_err(|_| SignatureError::ScalarOverflow)
}
