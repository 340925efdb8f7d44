use super::{Facilitator, Scheme};
use crate::context::RequestContext;
use crate::types::{
    PaymentPayload, PaymentRequirements, SettleResponse, SupportedKind, SupportedKinds,
    VerifyResponse, X402_VERSION,
};
use crate::{Result, X402Error};
use async_trait::async_trait;

/// Facilitator for a chain family with no backend
///
/// Advertises its (scheme, network) pair but refuses every operation with
/// [`X402Error::NotImplemented`], so callers never mistake it for a rejected payment.
#[derive(Debug, Clone)]
pub struct UnsupportedFacilitator {
    scheme: Scheme,
    network: String,
}

impl UnsupportedFacilitator {
    pub fn new(scheme: Scheme, network: impl Into<String>) -> Self {
        Self {
            scheme,
            network: network.into(),
        }
    }
}

#[async_trait]
impl Facilitator for UnsupportedFacilitator {
    async fn verify(
        &self,
        _ctx: &RequestContext,
        _payload: &PaymentPayload,
        _requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse> {
        Err(X402Error::not_implemented(self.scheme.as_str(), "verify"))
    }

    async fn settle(
        &self,
        _ctx: &RequestContext,
        _payload: &PaymentPayload,
        _requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        Err(X402Error::not_implemented(self.scheme.as_str(), "settle"))
    }

    fn supported(&self) -> SupportedKinds {
        SupportedKinds {
            kinds: vec![SupportedKind {
                x402_version: X402_VERSION,
                scheme: self.scheme.to_string(),
                network: self.network.clone(),
            }],
        }
    }
}
