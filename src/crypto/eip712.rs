//! EIP-712 typed data hashing for `TransferWithAuthorization`

use crate::types::{Authorization, DomainConfig};
use ethereum_types::{Address, H256, U256};
use once_cell::sync::Lazy;

/// `keccak256` of the `EIP712Domain` type string
pub static DOMAIN_TYPE_HASH: Lazy<H256> = Lazy::new(|| {
    H256(keccak256(
        b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
    ))
});

/// `keccak256` of the `TransferWithAuthorization` type string
pub static TRANSFER_WITH_AUTHORIZATION_TYPE_HASH: Lazy<H256> = Lazy::new(|| {
    H256(keccak256(
        b"TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)",
    ))
});

/// Hash the domain separator
pub fn domain_hash(domain: &DomainConfig) -> H256 {
    let mut data = Vec::with_capacity(5 * 32);
    data.extend_from_slice(DOMAIN_TYPE_HASH.as_bytes());
    data.extend_from_slice(&keccak256(domain.name.as_bytes()));
    data.extend_from_slice(&keccak256(domain.version.as_bytes()));
    data.extend_from_slice(&pad_u256(U256::from(domain.chain_id)));
    data.extend_from_slice(&pad_address(domain.verifying_contract));

    H256(keccak256(&data))
}

/// Hash the `TransferWithAuthorization` struct
pub fn message_hash(auth: &Authorization) -> H256 {
    let mut data = Vec::with_capacity(7 * 32);
    data.extend_from_slice(TRANSFER_WITH_AUTHORIZATION_TYPE_HASH.as_bytes());
    data.extend_from_slice(&pad_address(auth.from));
    data.extend_from_slice(&pad_address(auth.to));
    data.extend_from_slice(&pad_u256(auth.value));
    data.extend_from_slice(&pad_u256(auth.valid_after));
    data.extend_from_slice(&pad_u256(auth.valid_before));
    data.extend_from_slice(auth.nonce.as_bytes());

    H256(keccak256(&data))
}

/// The digest the payer signs: `keccak256(0x19 || 0x01 || domain || message)`
pub fn signing_hash(auth: &Authorization, domain: &DomainConfig) -> H256 {
    let mut data = Vec::with_capacity(2 + 2 * 32);
    data.extend_from_slice(&[0x19, 0x01]);
    data.extend_from_slice(domain_hash(domain).as_bytes());
    data.extend_from_slice(message_hash(auth).as_bytes());

    H256(keccak256(&data))
}

/// Left-pad an address to a 32-byte ABI word
pub fn pad_address(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Big-endian 32-byte ABI word
pub fn pad_u256(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Keccak-256 hash function (pre-standard Keccak, not SHA3-256)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    Keccak256::digest(data).into()
}
