//! # x402 Facilitator
//!
//! A payment facilitator for the x402 HTTP-native micropayment protocol. Resource
//! servers hand it a client's signed payment and the payment requirements; the
//! facilitator answers whether the payment is acceptable (`verify`) and, when asked,
//! executes it on-chain (`settle`) while paying the gas itself.
//!
//! ## Features
//!
//! - **EIP-3009 verification**: EIP-712 typed-data hashing, secp256k1 recovery with
//!   low-S enforcement, on-chain balance checks
//! - **Settlement**: `transferWithAuthorization` submitted as an EIP-155 transaction
//!   over JSON-RPC, with per-address transaction nonce tracking
//! - **Chain registry**: network names, chain ids and token signing domains for the
//!   supported EVM networks
//! - **Cancellation**: every chain call runs under a [`RequestContext`] deadline
//! - **HTTP server**: Axum routes for `/verify`, `/settle`, `/supported`, `/health`
//!   (`axum` feature, on by default)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use x402_facilitator::{
//!     blockchain::RpcChainClient,
//!     crypto::signature::PrivateKeySigner,
//!     facilitator::{EvmFacilitator, Facilitator},
//!     types::ChainRegistry,
//!     RequestContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(ChainRegistry::builtin());
//!     let client = RpcChainClient::new("https://sepolia.base.org")?;
//!     let signer = PrivateKeySigner::from_hex(&std::env::var("X402_PRIVATE_KEY")?)?;
//!
//!     let facilitator = EvmFacilitator::connect(client, signer, "base-sepolia", registry).await?;
//!     let ctx = RequestContext::with_timeout(Duration::from_secs(30));
//!
//!     # let (payload, requirements) = todo!();
//!     let verification = facilitator.verify(&ctx, &payload, &requirements).await?;
//!     println!("valid: {}", verification.is_valid);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`types`**: Wire types, reason codes and the chain registry
//! - **`crypto`**: EIP-712 hashing and the secp256k1 signature engine
//! - **`blockchain`**: The `ChainClient` seam and its JSON-RPC implementation
//! - **`facilitator`**: The `Facilitator` trait, the EVM pipeline and the scheme dispatcher
//! - **`facilitator_storage`**: Settled-nonce storage for the optional replay guard
//! - **`wallet`**: Payer-side signing, used by clients and tests
//! - **`context`**: Per-request cancellation and deadlines
//! - **`config`**: Settings loaded from the environment
//! - **`server`**: HTTP routes (feature-gated)

pub mod blockchain;
pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod facilitator;
pub mod facilitator_storage;
pub mod types;
pub mod wallet;

#[cfg(feature = "axum")]
pub mod server;

// Re-exports for convenience
pub use context::RequestContext;
pub use error::{Result, X402Error};
pub use facilitator::{build_facilitator, Facilitator, Scheme};
pub use types::*;
pub use wallet::Wallet;

/// Current version of the facilitator crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
