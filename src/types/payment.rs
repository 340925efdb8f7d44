//! Payment-related types

use super::network::parse_address;
use crate::{Result, X402Error};
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// x402 protocol version
pub const X402_VERSION: u32 = 1;

/// Payment requirements stated by a resource server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequirements {
    /// Payment scheme identifier (e.g., "evm")
    pub scheme: String,
    /// Blockchain network identifier (e.g., "base-sepolia")
    pub network: String,
    /// Required payment amount in atomic token units
    #[serde(rename = "maxAmountRequired")]
    pub max_amount_required: String,
    /// URL of the protected resource
    #[serde(default)]
    pub resource: String,
    /// Human-readable description of the resource
    #[serde(default)]
    pub description: String,
    /// MIME type of the expected response
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// JSON schema describing the response format
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Recipient wallet address for the payment
    #[serde(rename = "payTo")]
    pub pay_to: String,
    /// Maximum time allowed for payment completion in seconds
    #[serde(rename = "maxTimeoutSeconds", default)]
    pub max_timeout_seconds: u32,
    /// Token contract address or symbol
    pub asset: String,
    /// Scheme-specific additional information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl PaymentRequirements {
    /// Create a new payment requirements instance
    pub fn new(
        scheme: impl Into<String>,
        network: impl Into<String>,
        max_amount_required: impl Into<String>,
        asset: impl Into<String>,
        pay_to: impl Into<String>,
        resource: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            network: network.into(),
            max_amount_required: max_amount_required.into(),
            resource: resource.into(),
            description: description.into(),
            mime_type: None,
            output_schema: None,
            pay_to: pay_to.into(),
            max_timeout_seconds: 60,
            asset: asset.into(),
            extra: None,
        }
    }

    /// Parse `maxAmountRequired` as atomic units
    pub fn max_amount(&self) -> Result<U256> {
        U256::from_dec_str(&self.max_amount_required).map_err(|_| {
            X402Error::invalid_authorization(format!(
                "maxAmountRequired '{}' is not a decimal integer",
                self.max_amount_required
            ))
        })
    }

    /// Parse `payTo` as an address
    pub fn pay_to_address(&self) -> Result<Address> {
        parse_address(&self.pay_to).map_err(|_| {
            X402Error::invalid_authorization(format!("payTo '{}' is not an address", self.pay_to))
        })
    }
}

/// Payment payload sent by the client, base64-encoded in the payment header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Protocol version identifier
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    /// Payment scheme identifier
    pub scheme: String,
    /// Blockchain network identifier
    pub network: String,
    /// Scheme-specific payload, decoded by the facilitator bound to the scheme
    pub payload: Value,
}

impl PaymentPayload {
    /// Create a new payment payload
    pub fn new(scheme: impl Into<String>, network: impl Into<String>, payload: Value) -> Self {
        Self {
            x402_version: X402_VERSION,
            scheme: scheme.into(),
            network: network.into(),
            payload,
        }
    }

    /// Wrap an EVM payload
    pub fn from_evm(
        scheme: impl Into<String>,
        network: impl Into<String>,
        payload: &ExactEvmPayload,
    ) -> Result<Self> {
        Ok(Self::new(scheme, network, serde_json::to_value(payload)?))
    }

    /// Interpret the opaque payload as an EVM payload
    pub fn evm_payload(&self) -> Result<ExactEvmPayload> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Decode a base64-encoded payment payload
    pub fn from_base64(encoded: &str) -> Result<Self> {
        use base64::{engine::general_purpose, Engine as _};
        let decoded = general_purpose::STANDARD.decode(encoded)?;
        let payload: PaymentPayload = serde_json::from_slice(&decoded)?;
        Ok(payload)
    }

    /// Encode the payment payload to base64
    pub fn to_base64(&self) -> Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        let json = serde_json::to_string(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}

/// Exact EVM payment payload (EIP-3009), wire form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactEvmPayload {
    /// 65-byte `R || S || V` signature, hex
    pub signature: String,
    /// EIP-3009 authorization parameters
    pub authorization: ExactEvmPayloadAuthorization,
}

impl ExactEvmPayload {
    /// Build the wire payload from a typed authorization and its signature
    pub fn new(authorization: &Authorization, signature: &[u8]) -> Self {
        Self {
            signature: hex::encode(signature),
            authorization: authorization.into(),
        }
    }

    /// Parse into a typed authorization and raw signature bytes
    ///
    /// The signature length is left to the signature engine to judge.
    pub fn decode(&self) -> Result<(Authorization, Vec<u8>)> {
        let authorization = Authorization::try_from(&self.authorization)?;
        let signature = decode_hex(&self.signature)?;
        Ok((authorization, signature))
    }
}

/// EIP-3009 authorization parameters, wire form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactEvmPayloadAuthorization {
    /// Payer's wallet address
    pub from: String,
    /// Recipient's wallet address
    pub to: String,
    /// Payment amount in atomic units
    pub value: String,
    /// Unix timestamp when authorization becomes valid
    #[serde(rename = "validAfter")]
    pub valid_after: String,
    /// Unix timestamp when authorization expires
    #[serde(rename = "validBefore")]
    pub valid_before: String,
    /// 32-byte random nonce, hex
    pub nonce: String,
}

/// A transfer authorization signed by the payer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorization {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub valid_after: U256,
    pub valid_before: U256,
    pub nonce: H256,
}

impl Authorization {
    /// Check `valid_after < valid_before`
    pub fn validate(&self) -> Result<()> {
        if self.valid_after >= self.valid_before {
            return Err(X402Error::invalid_authorization(format!(
                "validAfter {} is not before validBefore {}",
                self.valid_after, self.valid_before
            )));
        }
        Ok(())
    }

    /// Whether `now` (Unix seconds) falls inside the inclusive validity window
    pub fn is_valid_at(&self, now: u64) -> bool {
        let now = U256::from(now);
        self.valid_after <= now && now <= self.valid_before
    }
}

impl From<&Authorization> for ExactEvmPayloadAuthorization {
    fn from(auth: &Authorization) -> Self {
        Self {
            from: format!("{:#x}", auth.from),
            to: format!("{:#x}", auth.to),
            value: auth.value.to_string(),
            valid_after: auth.valid_after.to_string(),
            valid_before: auth.valid_before.to_string(),
            nonce: hex::encode(auth.nonce.as_bytes()),
        }
    }
}

impl TryFrom<&ExactEvmPayloadAuthorization> for Authorization {
    type Error = X402Error;

    fn try_from(wire: &ExactEvmPayloadAuthorization) -> Result<Self> {
        let address = |field: &str, value: &str| {
            parse_address(value).map_err(|_| {
                X402Error::invalid_authorization(format!("{field} is not a 20-byte hex address"))
            })
        };
        let uint = |field: &str, value: &str| {
            U256::from_dec_str(value).map_err(|_| {
                X402Error::invalid_authorization(format!("{field} is not a decimal uint256"))
            })
        };

        let nonce = decode_hex(&wire.nonce)?;
        if nonce.len() != 32 {
            return Err(X402Error::invalid_authorization(format!(
                "nonce must be 32 bytes, got {}",
                nonce.len()
            )));
        }

        let authorization = Self {
            from: address("from", &wire.from)?,
            to: address("to", &wire.to)?,
            value: uint("value", &wire.value)?,
            valid_after: uint("validAfter", &wire.valid_after)?,
            valid_before: uint("validBefore", &wire.valid_before)?,
            nonce: H256::from_slice(&nonce),
        };
        authorization.validate()?;
        Ok(authorization)
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}
