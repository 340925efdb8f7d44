//! Core types for the x402 facilitator
//!
//! - [`network`] - Chain registry: network names, chain ids, token signing domains
//! - [`payment`] - Payment requirements and payload structures
//! - [`facilitator`] - Verification and settlement responses
//! - [`constants`] - Network, scheme and token names
//!
//! # Examples
//!
//! ```
//! use x402_facilitator::types::{ChainRegistry, PaymentRequirements};
//!
//! # fn example() -> x402_facilitator::Result<()> {
//! let registry = ChainRegistry::builtin();
//! let domain = registry.lookup_domain("base-sepolia", "USDC")?;
//! assert_eq!(domain.chain_id, 84532);
//!
//! let requirements = PaymentRequirements::new(
//!     "evm",
//!     "base-sepolia",
//!     "10000",
//!     "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
//!     "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
//!     "https://api.example.com/resource",
//!     "API access payment",
//! );
//! assert_eq!(requirements.max_amount()?, 10000u64.into());
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod facilitator;
pub mod network;
pub mod payment;

pub use constants::{networks, schemes, tokens};
pub use facilitator::{InvalidReason, SettleResponse, SupportedKind, SupportedKinds, VerifyResponse};
pub use network::{parse_address, ChainInfo, ChainRegistry, DomainConfig, RegistryError, TokenInfo};
pub use payment::{
    Authorization, ExactEvmPayload, ExactEvmPayloadAuthorization, PaymentPayload,
    PaymentRequirements, X402_VERSION,
};
