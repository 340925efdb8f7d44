//! Chain access for the EVM facilitator
//!
//! [`ChainClient`] is the narrow seam the verification pipeline and settlement
//! executor talk to. [`RpcChainClient`] implements it over JSON-RPC; tests
//! substitute an in-memory client.

pub mod nonce;
pub mod rpc;
pub mod transaction;

use crate::crypto::signature::{normalize_recovery_id, PrivateKeySigner, SignatureError};
use crate::types::Authorization;
use crate::Result;
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};

pub use nonce::PendingNonceManager;
pub use rpc::RpcChainClient;
pub use transaction::{LegacyTransaction, SignedTransaction};

/// A payer authorization with its signature split for `transferWithAuthorization`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizedTransfer {
    pub authorization: Authorization,
    /// 27 or 28
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl AuthorizedTransfer {
    /// Split a 65-byte `R || S || V` signature, normalizing `V` to 27/28
    pub fn new(authorization: Authorization, signature: &[u8]) -> std::result::Result<Self, SignatureError> {
        if signature.len() != 65 {
            return Err(SignatureError::InvalidSignatureLength {
                expected: 65,
                actual: signature.len(),
            });
        }
        let v = normalize_recovery_id(signature[64])? + 27;
        Ok(Self {
            authorization,
            v,
            r: H256::from_slice(&signature[..32]),
            s: H256::from_slice(&signature[32..64]),
        })
    }
}

/// Operations the facilitator needs from an EVM node
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id reported by the node
    async fn chain_id(&self) -> Result<u64>;

    /// ERC-20 `balanceOf(owner)` on `token`
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    /// Submit `transferWithAuthorization` on `token`, paying gas from `signer`, and wait
    /// for a successful receipt
    async fn submit_authorized_transfer(
        &self,
        token: Address,
        transfer: &AuthorizedTransfer,
        signer: &PrivateKeySigner,
    ) -> Result<H256>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorization() -> Authorization {
        Authorization {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            value: U256::from(1),
            valid_after: U256::zero(),
            valid_before: U256::from(10),
            nonce: H256::zero(),
        }
    }

    #[test]
    fn test_v_normalized_to_27_28() {
        let mut sig = [7u8; 65];
        sig[64] = 1;
        let transfer = AuthorizedTransfer::new(authorization(), &sig).unwrap();
        assert_eq!(transfer.v, 28);
        assert_eq!(transfer.r, H256::repeat_byte(7));

        sig[64] = 27;
        assert_eq!(AuthorizedTransfer::new(authorization(), &sig).unwrap().v, 27);

        sig[64] = 4;
        assert_eq!(
            AuthorizedTransfer::new(authorization(), &sig).unwrap_err(),
            SignatureError::InvalidRecoveryId(4)
        );
        assert!(AuthorizedTransfer::new(authorization(), &sig[..64]).is_err());
    }
}
