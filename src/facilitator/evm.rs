//! EVM facilitator: EIP-3009 `transferWithAuthorization`
//!
//! Verification runs a fixed sequence of checks and stops at the first failure:
//!
//! 1. decode the payload
//! 2. scheme match
//! 3. network match
//! 4. chain id match
//! 5. token domain resolution
//! 6. signature recovery against `authorization.from`
//! 7. on-chain balance
//! 8. optional policy checks ([`VerificationPolicy`], replay guard)
//!
//! Each failure is reported as an [`InvalidReason`]; only infrastructure problems
//! (RPC failures, cancellation) surface as errors.

use super::{Facilitator, Scheme};
use crate::blockchain::{AuthorizedTransfer, ChainClient};
use crate::context::RequestContext;
use crate::crypto::eip712;
use crate::crypto::signature::{self, PrivateKeySigner};
use crate::facilitator_storage::{NonceStorage, SettledNonce};
use crate::types::{
    Authorization, ChainRegistry, DomainConfig, InvalidReason, PaymentPayload,
    PaymentRequirements, SettleResponse, SupportedKind, SupportedKinds, VerifyResponse,
    X402_VERSION,
};
use crate::Result;
use async_trait::async_trait;
use ethereum_types::U256;
use std::fmt;
use std::sync::Arc;

/// Optional verification steps, all off by default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Reject authorizations outside `[valid_after, valid_before]`
    pub enforce_validity_window: bool,
    /// Require `authorization.to == payTo`
    pub enforce_recipient: bool,
    /// Require `authorization.value == maxAmountRequired`
    pub enforce_exact_amount: bool,
    /// Reject payments too small to be worth the settlement gas
    pub min_amount: Option<U256>,
}

/// A decoded payload that passed verification
struct VerifiedPayment {
    authorization: Authorization,
    domain: DomainConfig,
}

struct Rejection {
    reason: InvalidReason,
    payer: Option<String>,
}

impl Rejection {
    fn new(reason: InvalidReason, payer: Option<&str>) -> Self {
        Self {
            reason,
            payer: payer.map(str::to_string),
        }
    }
}

/// Facilitator bound to one EVM network
///
/// Owns the gas-paying key used for settlement.
pub struct EvmFacilitator<C> {
    client: C,
    signer: PrivateKeySigner,
    network: String,
    chain_id: u64,
    registry: Arc<ChainRegistry>,
    policy: VerificationPolicy,
    nonce_storage: Option<Arc<dyn NonceStorage>>,
}

impl<C> fmt::Debug for EvmFacilitator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmFacilitator")
            .field("network", &self.network)
            .field("chain_id", &self.chain_id)
            .field("signer", &self.signer)
            .field("policy", &self.policy)
            .field("replay_guard", &self.nonce_storage.is_some())
            .finish()
    }
}

impl<C: ChainClient> EvmFacilitator<C> {
    /// Connect to the node behind `client` and bind to `network`
    ///
    /// Fails if the network is not in the registry. A node reporting a different chain
    /// id is only logged here; every payment against it will fail with
    /// `network_id_mismatch`.
    pub async fn connect(
        client: C,
        signer: PrivateKeySigner,
        network: &str,
        registry: Arc<ChainRegistry>,
    ) -> Result<Self> {
        let expected = registry.lookup_chain(network)?;
        let chain_id = client.chain_id().await?;
        if chain_id != expected {
            tracing::warn!(
                network,
                expected_chain_id = expected,
                chain_id,
                connected_to = registry.network_for_chain_id(chain_id).unwrap_or("unknown"),
                "RPC node serves a different chain than the configured network"
            );
        }
        tracing::info!(
            network,
            chain_id,
            facilitator = ?signer.address(),
            "EVM facilitator ready"
        );
        Ok(Self::with_chain_id(client, signer, network, chain_id, registry))
    }

    /// Bind to `network` with a chain id already known
    pub fn with_chain_id(
        client: C,
        signer: PrivateKeySigner,
        network: impl Into<String>,
        chain_id: u64,
        registry: Arc<ChainRegistry>,
    ) -> Self {
        Self {
            client,
            signer,
            network: network.into(),
            chain_id,
            registry,
            policy: VerificationPolicy::default(),
            nonce_storage: None,
        }
    }

    /// Set the optional verification steps
    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Track settled nonces locally and reject replays before submitting them
    pub fn with_nonce_storage(mut self, storage: Arc<dyn NonceStorage>) -> Self {
        self.nonce_storage = Some(storage);
        self
    }

    /// Network this facilitator is bound to
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Chain id the node reported
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address that pays settlement gas
    pub fn facilitator_address(&self) -> ethereum_types::Address {
        self.signer.address()
    }

    async fn run_pipeline(
        &self,
        ctx: &RequestContext,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<std::result::Result<VerifiedPayment, Rejection>> {
        // 1. decode
        let (authorization, sig) = match payload.evm_payload().and_then(|p| p.decode()) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(error = %e, "payload did not decode");
                return Ok(Err(Rejection::new(InvalidReason::InvalidPayloadFormat, None)));
            }
        };
        let payer = format!("{:#x}", authorization.from);
        tracing::Span::current().record("payer", payer.as_str());
        let reject = |reason: InvalidReason| Ok(Err(Rejection::new(reason, Some(payer.as_str()))));

        // 2. scheme
        let scheme = Scheme::Evm.as_str();
        if payload.scheme != scheme || requirements.scheme != scheme {
            return reject(InvalidReason::IncompatiblePayloadScheme);
        }

        // 3. network
        if payload.network != self.network {
            return reject(InvalidReason::NetworkMismatch);
        }

        // 4. chain id
        match self.registry.lookup_chain(&payload.network) {
            Ok(chain_id) if chain_id == self.chain_id => {}
            Ok(_) => return reject(InvalidReason::NetworkIdMismatch),
            Err(_) => return reject(InvalidReason::InvalidNetwork),
        }

        // 5. token domain
        let domain = match self
            .registry
            .lookup_domain(&payload.network, &requirements.asset)
        {
            Ok(domain) => domain,
            Err(e) => {
                tracing::debug!(error = %e, "token is not accepted");
                return reject(InvalidReason::TokenMismatch);
            }
        };

        // 6. signature
        let digest = eip712::signing_hash(&authorization, &domain);
        let public_key = match signature::recover_public_key(&digest, &sig) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(error = %e, "signature rejected");
                return reject(InvalidReason::InvalidSignature);
            }
        };
        if !signature::verify(&public_key, &digest, &sig[..64]) {
            tracing::debug!("signature failed verification against recovered key");
            return reject(InvalidReason::InvalidSignature);
        }
        let signer = signature::public_key_to_address(&public_key);
        if signer != authorization.from {
            tracing::debug!(recovered = ?signer, "signature is not from the payer");
            return reject(InvalidReason::InvalidSignature);
        }

        // 7. balance
        let balance = ctx
            .run(
                self.client
                    .token_balance(domain.verifying_contract, authorization.from),
            )
            .await?;
        if balance < authorization.value {
            tracing::debug!(%balance, value = %authorization.value, "insufficient balance");
            return reject(InvalidReason::InsufficientBalance);
        }

        // 8. policy
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let policy_checks = [
            self.check_validity_window(&authorization, now),
            self.check_recipient(&authorization, requirements),
            self.check_exact_amount(&authorization, requirements),
            self.check_gas_threshold(&authorization),
        ];
        if let Some(reason) = policy_checks.into_iter().flatten().next() {
            return reject(reason);
        }
        if let Some(reason) = self
            .check_not_already_settled(&authorization, &domain)
            .await?
        {
            return reject(reason);
        }

        Ok(Ok(VerifiedPayment {
            authorization,
            domain,
        }))
    }

    fn check_validity_window(&self, auth: &Authorization, now: u64) -> Option<InvalidReason> {
        if !self.policy.enforce_validity_window {
            return None;
        }
        if U256::from(now) < auth.valid_after {
            Some(InvalidReason::AuthorizationNotYetValid)
        } else if U256::from(now) > auth.valid_before {
            Some(InvalidReason::AuthorizationExpired)
        } else {
            None
        }
    }

    fn check_recipient(
        &self,
        auth: &Authorization,
        requirements: &PaymentRequirements,
    ) -> Option<InvalidReason> {
        if !self.policy.enforce_recipient {
            return None;
        }
        match requirements.pay_to_address() {
            Ok(pay_to) if pay_to == auth.to => None,
            _ => Some(InvalidReason::RecipientMismatch),
        }
    }

    fn check_exact_amount(
        &self,
        auth: &Authorization,
        requirements: &PaymentRequirements,
    ) -> Option<InvalidReason> {
        if !self.policy.enforce_exact_amount {
            return None;
        }
        match requirements.max_amount() {
            Ok(amount) if amount == auth.value => None,
            _ => Some(InvalidReason::AmountMismatch),
        }
    }

    fn check_gas_threshold(&self, auth: &Authorization) -> Option<InvalidReason> {
        match self.policy.min_amount {
            Some(min) if auth.value < min => Some(InvalidReason::AmountBelowGasThreshold),
            _ => None,
        }
    }

    async fn check_not_already_settled(
        &self,
        auth: &Authorization,
        domain: &DomainConfig,
    ) -> Result<Option<InvalidReason>> {
        let Some(storage) = &self.nonce_storage else {
            return Ok(None);
        };
        let used = storage.has_nonce(&settled_nonce(auth, domain)).await?;
        Ok(used.then_some(InvalidReason::NonceAlreadyUsed))
    }

    async fn execute_settlement(
        &self,
        ctx: &RequestContext,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        let (authorization, sig) = match payload.evm_payload().and_then(|p| p.decode()) {
            Ok(decoded) => decoded,
            Err(e) => {
                return Ok(SettleResponse::failure(format!(
                    "invalid payload format: {}",
                    e
                )))
            }
        };
        tracing::Span::current().record("payer", format!("{:#x}", authorization.from).as_str());

        if requirements.network != self.network {
            return Ok(SettleResponse::failure(format!(
                "network mismatch: requirements name '{}', facilitator serves '{}'",
                requirements.network, self.network
            )));
        }
        if payload.network != requirements.network {
            return Ok(SettleResponse::failure(format!(
                "network mismatch: payment is for '{}', requirements name '{}'",
                payload.network, requirements.network
            )));
        }
        if let Err(e) = self.registry.lookup_chain(&requirements.network) {
            return Ok(SettleResponse::failure(e.to_string()));
        }
        let domain = match self
            .registry
            .lookup_domain(&requirements.network, &requirements.asset)
        {
            Ok(domain) => domain,
            Err(e) => return Ok(SettleResponse::failure(e.to_string())),
        };
        if let Some(reason) = self
            .check_not_already_settled(&authorization, &domain)
            .await?
        {
            return Ok(SettleResponse::failure(reason.to_string()));
        }
        let transfer = match AuthorizedTransfer::new(authorization, &sig) {
            Ok(transfer) => transfer,
            Err(e) => return Ok(SettleResponse::failure(format!("invalid signature: {}", e))),
        };

        let submitted = ctx
            .run(self.client.submit_authorized_transfer(
                domain.verifying_contract,
                &transfer,
                &self.signer,
            ))
            .await;
        match submitted {
            Ok(tx_hash) => {
                let tx_hash = format!("{:#x}", tx_hash);
                tracing::info!(tx_hash = %tx_hash, chain_id = self.chain_id, "payment settled");
                if let Some(storage) = &self.nonce_storage {
                    if let Err(e) = storage
                        .mark_nonce(
                            &settled_nonce(&authorization, &domain),
                            saturating_secs(authorization.valid_before),
                        )
                        .await
                    {
                        tracing::warn!(error = %e, "failed to record settled nonce");
                    }
                }
                Ok(SettleResponse::success(tx_hash, self.chain_id.to_string()))
            }
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "settlement failed");
                Ok(SettleResponse::failure(e.to_string()))
            }
        }
    }
}

fn saturating_secs(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

fn settled_nonce(auth: &Authorization, domain: &DomainConfig) -> SettledNonce {
    SettledNonce {
        contract: domain.verifying_contract,
        payer: auth.from,
        nonce: auth.nonce,
    }
}

#[async_trait]
impl<C: ChainClient> Facilitator for EvmFacilitator<C> {
    #[tracing::instrument(
        name = "verify",
        skip_all,
        fields(network = %payload.network, payer = tracing::field::Empty)
    )]
    async fn verify(
        &self,
        ctx: &RequestContext,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse> {
        match self.run_pipeline(ctx, payload, requirements).await? {
            Ok(verified) => {
                tracing::debug!(
                    value = %verified.authorization.value,
                    token = ?verified.domain.verifying_contract,
                    "payment verified"
                );
                Ok(VerifyResponse::valid(format!(
                    "{:#x}",
                    verified.authorization.from
                )))
            }
            Err(rejection) => {
                tracing::info!(reason = %rejection.reason, "payment rejected");
                Ok(VerifyResponse::invalid(rejection.reason, rejection.payer))
            }
        }
    }

    #[tracing::instrument(
        name = "settle",
        skip_all,
        fields(network = %requirements.network, payer = tracing::field::Empty)
    )]
    async fn settle(
        &self,
        ctx: &RequestContext,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        self.execute_settlement(ctx, payload, requirements).await
    }

    fn supported(&self) -> SupportedKinds {
        SupportedKinds {
            kinds: vec![SupportedKind {
                x402_version: X402_VERSION,
                scheme: Scheme::Evm.to_string(),
                network: self.network.clone(),
            }],
        }
    }
}
