//! Error types for the facilitator
//!
//! Verification failures are never errors: they come back as a [`VerifyResponse`]
//! with an [`InvalidReason`]. [`X402Error`] covers everything else: configuration
//! mistakes detected at construction, infrastructure failures (RPC, HTTP, cancellation)
//! and operations a backend does not implement yet.
//!
//! [`VerifyResponse`]: crate::types::VerifyResponse
//! [`InvalidReason`]: crate::types::InvalidReason

use crate::crypto::signature::SignatureError;
use crate::types::network::RegistryError;
use thiserror::Error;

/// Result type alias for x402 operations
pub type Result<T> = std::result::Result<T, X402Error>;

/// Errors produced by the facilitator
#[derive(Debug, Error)]
pub enum X402Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The chain registry has no entry for the requested network or token
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Signature creation or recovery failed
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The authorization could not be built or parsed
    #[error("Invalid authorization: {message}")]
    InvalidAuthorization { message: String },

    /// The chain node returned an error or an unexpected response
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// The JSON-RPC transport failed (connection refused, TLS, decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The settlement transaction was mined but reverted
    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// The request deadline expired before the operation completed
    #[error("Request timed out")]
    Timeout,

    /// The scheme is wired into the dispatcher but its backend is not implemented
    #[error("{operation} is not implemented for scheme '{scheme}'")]
    NotImplemented {
        scheme: String,
        operation: &'static str,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// IO error (binding the HTTP listener)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl X402Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid authorization error
    pub fn invalid_authorization(message: impl Into<String>) -> Self {
        Self::InvalidAuthorization {
            message: message.into(),
        }
    }

    /// Create an RPC error
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
        }
    }

    /// Create a not-implemented error for a scheme operation
    pub fn not_implemented(scheme: impl Into<String>, operation: &'static str) -> Self {
        Self::NotImplemented {
            scheme: scheme.into(),
            operation,
        }
    }

    /// Whether the error came from the caller's cancellation signal or deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout)
    }

    /// Short, stable error code used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config_error",
            Self::Registry(_) => "registry_error",
            Self::Signature(_) => "signature_error",
            Self::InvalidAuthorization { .. } => "invalid_authorization",
            Self::Rpc { .. } | Self::Http(_) => "rpc_error",
            Self::TransactionReverted { .. } => "transaction_reverted",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
            Self::NotImplemented { .. } => "not_implemented",
            Self::Json(_) | Self::Base64(_) | Self::Hex(_) => "decode_error",
            Self::Io(_) => "io_error",
        }
    }
}
