//! Payment facilitators: verify and settle payments for one scheme on one network
//!
//! - [`Facilitator`] - the operations the HTTP layer calls
//! - [`evm`] - EIP-3009 `transferWithAuthorization` on EVM chains
//! - [`unsupported`] - placeholder for chain families without a backend yet
//!
//! [`build_facilitator`] picks the implementation from [`Scheme`] once, at startup.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use x402_facilitator::config::FacilitatorSettings;
//! use x402_facilitator::context::RequestContext;
//! use x402_facilitator::facilitator::build_facilitator;
//! use x402_facilitator::types::ChainRegistry;
//!
//! # async fn example() -> x402_facilitator::Result<()> {
//! let settings = FacilitatorSettings::from_env()?;
//! let facilitator = build_facilitator(&settings, Arc::new(ChainRegistry::builtin())).await?;
//!
//! # let payload = todo!();
//! # let requirements = todo!();
//! let ctx = RequestContext::with_timeout(settings.request_timeout);
//! let verification = facilitator.verify(&ctx, &payload, &requirements).await?;
//! if verification.is_valid {
//!     let settlement = facilitator.settle(&ctx, &payload, &requirements).await?;
//!     println!("settled: {:?}", settlement.tx_hash);
//! }
//! # Ok(())
//! # }
//! ```

use crate::blockchain::RpcChainClient;
use crate::config::FacilitatorSettings;
use crate::context::RequestContext;
use crate::crypto::signature::PrivateKeySigner;
use crate::facilitator_storage::InMemoryStorage;
use crate::types::{
    schemes, ChainRegistry, PaymentPayload, PaymentRequirements, SettleResponse, SupportedKinds,
    VerifyResponse,
};
use crate::{Result, X402Error};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod evm;
pub mod unsupported;

#[cfg(test)]
mod tests;

pub use evm::{EvmFacilitator, VerificationPolicy};
pub use unsupported::UnsupportedFacilitator;

/// Chain family a facilitator instance serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Evm,
    Solana,
    Sui,
    Tron,
}

impl Scheme {
    /// Wire name of the scheme
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Evm => schemes::EVM,
            Scheme::Solana => schemes::SOLANA,
            Scheme::Sui => schemes::SUI,
            Scheme::Tron => schemes::TRON,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = X402Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            schemes::EVM => Ok(Scheme::Evm),
            schemes::SOLANA => Ok(Scheme::Solana),
            schemes::SUI => Ok(Scheme::Sui),
            schemes::TRON => Ok(Scheme::Tron),
            other => Err(X402Error::config(format!(
                "unsupported scheme '{}', expected one of evm, solana, sui, tron",
                other
            ))),
        }
    }
}

/// Verify and settle payments for one scheme bound to one network
#[async_trait]
pub trait Facilitator: Send + Sync {
    /// Decide whether a payment satisfies the requirements, without moving funds
    async fn verify(
        &self,
        ctx: &RequestContext,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse>;

    /// Submit the payment on-chain
    async fn settle(
        &self,
        ctx: &RequestContext,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse>;

    /// The (scheme, network) pairs this instance serves
    fn supported(&self) -> SupportedKinds;
}

/// Build the facilitator selected by `settings.scheme`
///
/// For `evm` this parses the gas-paying key and connects to the node to learn its chain id.
pub async fn build_facilitator(
    settings: &FacilitatorSettings,
    registry: Arc<ChainRegistry>,
) -> Result<Arc<dyn Facilitator>> {
    match settings.scheme {
        Scheme::Evm => {
            settings.validate()?;
            let signer = PrivateKeySigner::from_hex(&settings.private_key)?;
            let rpc_url = settings.resolve_rpc_url(&registry)?;
            let client = RpcChainClient::new(rpc_url.as_str())?
                .with_gas_limit(settings.gas_limit)
                .with_receipt_timeout(settings.receipt_timeout);

            let mut facilitator =
                EvmFacilitator::connect(client, signer, &settings.network, registry)
                    .await?
                    .with_policy(settings.policy.clone());
            if settings.replay_guard {
                facilitator = facilitator.with_nonce_storage(Arc::new(InMemoryStorage::new()));
            }
            Ok(Arc::new(facilitator))
        }
        scheme => {
            tracing::warn!(%scheme, network = %settings.network, "scheme has no backend; verify and settle will fail");
            Ok(Arc::new(UnsupportedFacilitator::new(
                scheme,
                settings.network.clone(),
            )))
        }
    }
}
