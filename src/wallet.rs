//! Payer-side wallet: builds and signs EIP-3009 authorizations
//!
//! The facilitator never signs on behalf of payers; this module exists for
//! clients, integration tests and tooling that need a well-formed payload.

use crate::crypto::{eip712, signature};
use crate::crypto::signature::PrivateKeySigner;
use crate::types::{
    Authorization, ChainRegistry, ExactEvmPayload, PaymentPayload, PaymentRequirements,
};
use crate::Result;
use ethereum_types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a freshly built authorization
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(3600);

/// Signs transfer authorizations with a payer key
#[derive(Debug)]
pub struct Wallet {
    signer: PrivateKeySigner,
    registry: Arc<ChainRegistry>,
}

impl Wallet {
    /// Create a wallet over a payer key and registry
    pub fn new(signer: PrivateKeySigner, registry: Arc<ChainRegistry>) -> Self {
        Self { signer, registry }
    }

    /// Create a wallet from a hex private key
    pub fn from_private_key(private_key: &str, registry: Arc<ChainRegistry>) -> Result<Self> {
        Ok(Self::new(PrivateKeySigner::from_hex(private_key)?, registry))
    }

    /// Payer address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// New authorization from this wallet: valid from 0 until now + 1h, random nonce
    pub fn authorization(&self, to: Address, value: U256) -> Authorization {
        let valid_before = chrono::Utc::now().timestamp().max(0) as u64 + DEFAULT_VALIDITY.as_secs();
        Authorization {
            from: self.signer.address(),
            to,
            value,
            valid_after: U256::zero(),
            valid_before: U256::from(valid_before),
            nonce: signature::generate_nonce(),
        }
    }

    /// Sign an authorization against the (network, token) domain
    pub fn sign_authorization(
        &self,
        authorization: &Authorization,
        network: &str,
        token: &str,
    ) -> Result<ExactEvmPayload> {
        authorization.validate()?;
        let domain = self.registry.lookup_domain(network, token)?;
        let digest = eip712::signing_hash(authorization, &domain);
        let signature = self.signer.sign_digest(&digest)?;
        Ok(ExactEvmPayload::new(authorization, &signature))
    }

    /// Build a signed payment paying exactly what the requirements ask for
    pub fn create_payment_payload(&self, requirements: &PaymentRequirements) -> Result<PaymentPayload> {
        let authorization = self.authorization(
            requirements.pay_to_address()?,
            requirements.max_amount()?,
        );
        let payload =
            self.sign_authorization(&authorization, &requirements.network, &requirements.asset)?;
        PaymentPayload::from_evm(&requirements.scheme, &requirements.network, &payload)
    }
}
