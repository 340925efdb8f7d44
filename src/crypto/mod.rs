//! Cryptographic primitives for the facilitator
//!
//! - [`eip712`] - EIP-712 domain, message and signing hashes for `TransferWithAuthorization`
//! - [`signature`] - secp256k1 sign / recover / verify, address derivation, nonces
//!
//! # Examples
//!
//! ```
//! use x402_facilitator::crypto::{eip712, signature};
//! use x402_facilitator::types::{Authorization, ChainRegistry};
//!
//! # fn example() -> x402_facilitator::Result<()> {
//! let domain = ChainRegistry::builtin().lookup_domain("base-sepolia", "USDC")?;
//! let signer = signature::PrivateKeySigner::random();
//!
//! let auth = Authorization {
//!     from: signer.address(),
//!     to: signer.address(),
//!     value: 10_000u64.into(),
//!     valid_after: 0u64.into(),
//!     valid_before: u64::MAX.into(),
//!     nonce: signature::generate_nonce(),
//! };
//!
//! let digest = eip712::signing_hash(&auth, &domain);
//! let sig = signer.sign_digest(&digest)?;
//! let recovered = signature::recover_public_key(&digest, &sig)?;
//! assert_eq!(signature::public_key_to_address(&recovered), signer.address());
//! # Ok(())
//! # }
//! ```

pub mod eip712;
pub mod signature;


pub use eip712::{domain_hash, keccak256, message_hash, signing_hash};
pub use signature::{
    generate_nonce, normalize_recovery_id, public_key_to_address, recover_public_key, verify,
    PrivateKeySigner, SignatureError,
};
