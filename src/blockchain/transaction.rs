//! Calldata encoding and EIP-155 legacy transaction signing

use super::AuthorizedTransfer;
use crate::crypto::eip712::{keccak256, pad_address, pad_u256};
use crate::crypto::signature::{PrivateKeySigner, SignatureError};
use ethereum_types::{Address, H256, U256};
use once_cell::sync::Lazy;
use rlp::RlpStream;

static TRANSFER_WITH_AUTHORIZATION_SELECTOR: Lazy<[u8; 4]> = Lazy::new(|| {
    selector("transferWithAuthorization(address,address,uint256,uint256,uint256,bytes32,uint8,bytes32,bytes32)")
});

static BALANCE_OF_SELECTOR: Lazy<[u8; 4]> = Lazy::new(|| selector("balanceOf(address)"));

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `balanceOf(owner)` calldata
pub fn encode_balance_of(owner: Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&*BALANCE_OF_SELECTOR);
    data.extend_from_slice(&pad_address(owner));
    data
}

/// `transferWithAuthorization(from, to, value, validAfter, validBefore, nonce, v, r, s)` calldata
pub fn encode_transfer_with_authorization(transfer: &AuthorizedTransfer) -> Vec<u8> {
    let auth = &transfer.authorization;
    let mut data = Vec::with_capacity(4 + 9 * 32);
    data.extend_from_slice(&*TRANSFER_WITH_AUTHORIZATION_SELECTOR);
    data.extend_from_slice(&pad_address(auth.from));
    data.extend_from_slice(&pad_address(auth.to));
    data.extend_from_slice(&pad_u256(auth.value));
    data.extend_from_slice(&pad_u256(auth.valid_after));
    data.extend_from_slice(&pad_u256(auth.valid_before));
    data.extend_from_slice(auth.nonce.as_bytes());
    data.extend_from_slice(&pad_u256(U256::from(transfer.v)));
    data.extend_from_slice(transfer.r.as_bytes());
    data.extend_from_slice(transfer.s.as_bytes());
    data
}

/// A pre-EIP-1559 transaction with EIP-155 replay protection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas: U256,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// RLP bytes ready for `eth_sendRawTransaction`
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: H256,
}

impl LegacyTransaction {
    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas);
        stream.append(&self.to);
        stream.append(&self.value);
        stream.append(&self.data);
    }

    /// RLP of `[nonce, gasPrice, gas, to, value, data, chainId, 0, 0]`
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        stream.out().to_vec()
    }

    pub fn signing_hash(&self) -> H256 {
        H256(keccak256(&self.signing_payload()))
    }

    /// Sign with `v = recovery_id + chain_id * 2 + 35`
    pub fn sign(&self, signer: &PrivateKeySigner) -> Result<SignedTransaction, SignatureError> {
        let signature = signer.sign_digest(&self.signing_hash())?;
        let v = u64::from(signature[64]) + self.chain_id * 2 + 35;
        let r = U256::from_big_endian(&signature[..32]);
        let s = U256::from_big_endian(&signature[32..64]);

        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&v);
        stream.append(&r);
        stream.append(&s);
        let raw = stream.out().to_vec();
        let hash = H256(keccak256(&raw));
        Ok(SignedTransaction { raw, hash })
    }
}
