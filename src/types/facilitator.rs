//! Facilitator response types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a payment failed verification
///
/// Closed set; serialized in snake_case as the `invalidReason` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    InvalidPayloadFormat,
    IncompatiblePayloadScheme,
    NetworkMismatch,
    NetworkIdMismatch,
    InvalidNetwork,
    TokenMismatch,
    InvalidSignature,
    InsufficientBalance,
    AuthorizationExpired,
    AuthorizationNotYetValid,
    RecipientMismatch,
    AmountMismatch,
    AmountBelowGasThreshold,
    NonceAlreadyUsed,
}

impl InvalidReason {
    /// Wire name of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPayloadFormat => "invalid_payload_format",
            Self::IncompatiblePayloadScheme => "incompatible_payload_scheme",
            Self::NetworkMismatch => "network_mismatch",
            Self::NetworkIdMismatch => "network_id_mismatch",
            Self::InvalidNetwork => "invalid_network",
            Self::TokenMismatch => "token_mismatch",
            Self::InvalidSignature => "invalid_signature",
            Self::InsufficientBalance => "insufficient_balance",
            Self::AuthorizationExpired => "authorization_expired",
            Self::AuthorizationNotYetValid => "authorization_not_yet_valid",
            Self::RecipientMismatch => "recipient_mismatch",
            Self::AmountMismatch => "amount_mismatch",
            Self::AmountBelowGasThreshold => "amount_below_gas_threshold",
            Self::NonceAlreadyUsed => "nonce_already_used",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment verification response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the payment is valid
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    /// Reason for invalidity (if applicable)
    #[serde(rename = "invalidReason", skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<InvalidReason>,
    /// Payer's address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResponse {
    /// A passing verification
    pub fn valid(payer: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            payer: Some(payer.into()),
        }
    }

    /// A failed verification
    pub fn invalid(reason: InvalidReason, payer: Option<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason),
            payer,
        }
    }
}

/// Payment settlement response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleResponse {
    /// Whether the settlement was successful
    pub success: bool,
    /// Error description if settlement failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transaction hash
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Decimal chain id the transaction was submitted to
    #[serde(rename = "networkId", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
}

impl SettleResponse {
    /// A completed settlement
    pub fn success(tx_hash: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            tx_hash: Some(tx_hash.into()),
            network_id: Some(network_id.into()),
        }
    }

    /// A failed settlement
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            tx_hash: None,
            network_id: None,
        }
    }

    /// Encode the settle response to base64
    pub fn to_base64(&self) -> crate::Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        let json = serde_json::to_string(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}

/// Supported payment schemes and networks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedKinds {
    /// List of supported payment schemes and networks
    pub kinds: Vec<SupportedKind>,
}

/// Individual supported payment scheme and network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedKind {
    /// Protocol version
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    /// Payment scheme identifier
    pub scheme: String,
    /// Blockchain network identifier
    pub network: String,
}
