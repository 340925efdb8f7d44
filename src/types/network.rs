//! Chain registry: network names, chain ids and token signing domains

use super::constants::{networks, tokens};
use ethereum_types::Address;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// EIP-712 signing domain of a token contract
///
/// Must match the contract's own `DOMAIN_SEPARATOR` inputs exactly, otherwise
/// signatures produced against it will not verify on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    /// Contract name as used in the domain (e.g., "USD Coin")
    pub name: String,
    /// Domain version (e.g., "2")
    pub version: String,
    /// Numeric chain id
    pub chain_id: u64,
    /// Token contract address
    pub verifying_contract: Address,
}

/// A token accepted on a network
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// Token symbol (e.g., "USDC")
    pub symbol: String,
    /// Signing domain of the token contract
    pub domain: DomainConfig,
}

/// Per-network registry entry
#[derive(Debug, Clone)]
pub struct ChainInfo {
    /// Chain ID for the network
    pub chain_id: u64,
    /// Public RPC endpoint used when none is configured
    pub default_rpc_url: Option<String>,
    /// Tokens accepted on this network
    pub tokens: Vec<TokenInfo>,
}

impl ChainInfo {
    /// Create an entry with no tokens
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            default_rpc_url: None,
            tokens: Vec::new(),
        }
    }

    /// Set the default RPC URL
    pub fn with_default_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.default_rpc_url = Some(url.into());
        self
    }

    /// Add a token whose domain lives on this chain
    pub fn with_token(
        mut self,
        symbol: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        verifying_contract: Address,
    ) -> Self {
        self.tokens.push(TokenInfo {
            symbol: symbol.into(),
            domain: DomainConfig {
                name: name.into(),
                version: version.into(),
                chain_id: self.chain_id,
                verifying_contract,
            },
        });
        self
    }

    fn find_token(&self, token: &str) -> Option<&TokenInfo> {
        // Accept either a symbol or the contract address; addresses compare case-insensitively.
        if let Ok(address) = parse_address(token) {
            return self
                .tokens
                .iter()
                .find(|t| t.domain.verifying_contract == address);
        }
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(token))
    }
}

/// Registry lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No entry for the network name
    #[error("unknown network '{0}'")]
    UnknownNetwork(String),
    /// The network exists but does not accept the token
    #[error("token '{token}' is not registered on network '{network}'")]
    UnknownToken { network: String, token: String },
}

/// Mapping from network name to chain id and accepted token domains
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<String, ChainInfo>,
}

impl ChainRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with USDC on the supported EVM networks
    pub fn builtin() -> Self {
        Self::new()
            .with_chain(
                networks::ETHEREUM,
                ChainInfo::new(1).with_token(
                    tokens::USDC,
                    "USD Coin",
                    "2",
                    known_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
                ),
            )
            .with_chain(
                networks::SEPOLIA,
                ChainInfo::new(11155111)
                    .with_default_rpc_url("https://ethereum-sepolia-rpc.publicnode.com")
                    .with_token(
                        tokens::USDC,
                        "USDC",
                        "2",
                        known_address("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
                    ),
            )
            .with_chain(
                networks::BASE_MAINNET,
                ChainInfo::new(8453)
                    .with_default_rpc_url("https://mainnet.base.org")
                    .with_token(
                        tokens::USDC,
                        "USD Coin",
                        "2",
                        known_address("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
                    ),
            )
            .with_chain(
                networks::BASE_SEPOLIA,
                ChainInfo::new(84532)
                    .with_default_rpc_url("https://sepolia.base.org")
                    .with_token(
                        tokens::USDC,
                        "USDC",
                        "2",
                        known_address("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
                    ),
            )
            .with_chain(
                networks::OPTIMISM,
                ChainInfo::new(10)
                    .with_default_rpc_url("https://mainnet.optimism.io")
                    .with_token(
                        tokens::USDC,
                        "USD Coin",
                        "2",
                        known_address("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
                    ),
            )
            .with_chain(
                networks::OPTIMISM_SEPOLIA,
                ChainInfo::new(11155420)
                    .with_default_rpc_url("https://sepolia.optimism.io")
                    .with_token(
                        tokens::USDC,
                        "USDC",
                        "2",
                        known_address("0x5fd84259d66Cd46123540766Be93DFE6D43130D7"),
                    ),
            )
            .with_chain(
                networks::ARBITRUM,
                ChainInfo::new(42161)
                    .with_default_rpc_url("https://arb1.arbitrum.io/rpc")
                    .with_token(
                        tokens::USDC,
                        "USD Coin",
                        "2",
                        known_address("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
                    ),
            )
            .with_chain(
                networks::ARBITRUM_SEPOLIA,
                ChainInfo::new(421614)
                    .with_default_rpc_url("https://sepolia-rollup.arbitrum.io/rpc")
                    .with_token(
                        tokens::USDC,
                        "USDC",
                        "2",
                        known_address("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                    ),
            )
            .with_chain(
                networks::AVALANCHE_MAINNET,
                ChainInfo::new(43114)
                    .with_default_rpc_url("https://api.avax.network/ext/bc/C/rpc")
                    .with_token(
                        tokens::USDC,
                        "USD Coin",
                        "2",
                        known_address("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
                    ),
            )
            .with_chain(
                networks::AVALANCHE_FUJI,
                ChainInfo::new(43113)
                    .with_default_rpc_url("https://api.avax-test.network/ext/bc/C/rpc")
                    .with_token(
                        tokens::USDC,
                        "USD Coin",
                        "2",
                        known_address("0x5425890298aed601595a70AB815c96711a31Bc65"),
                    ),
            )
    }

    /// Add or replace a network entry
    pub fn with_chain(mut self, network: impl Into<String>, info: ChainInfo) -> Self {
        self.chains.insert(network.into(), info);
        self
    }

    /// Get the full entry for a network
    pub fn chain(&self, network: &str) -> Result<&ChainInfo, RegistryError> {
        self.chains
            .get(network)
            .ok_or_else(|| RegistryError::UnknownNetwork(network.to_string()))
    }

    /// Resolve a network name to its chain id
    pub fn lookup_chain(&self, network: &str) -> Result<u64, RegistryError> {
        self.chain(network).map(|info| info.chain_id)
    }

    /// Resolve (network, token) to the token's signing domain
    ///
    /// `token` may be a symbol such as `"USDC"` or the contract address.
    pub fn lookup_domain(&self, network: &str, token: &str) -> Result<DomainConfig, RegistryError> {
        let info = self.chain(network)?;
        info.find_token(token)
            .map(|t| t.domain.clone())
            .ok_or_else(|| RegistryError::UnknownToken {
                network: network.to_string(),
                token: token.to_string(),
            })
    }

    /// Reverse lookup: which network name a chain id belongs to
    pub fn network_for_chain_id(&self, chain_id: u64) -> Option<&str> {
        self.chains
            .iter()
            .find(|(_, info)| info.chain_id == chain_id)
            .map(|(name, _)| name.as_str())
    }

    /// Check if a network is registered
    pub fn is_supported(&self, network: &str) -> bool {
        self.chains.contains_key(network)
    }
}

/// Parse a `0x`-prefixed (or bare) 20-byte hex address
pub fn parse_address(s: &str) -> Result<Address, hex::FromHexError> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(raw)?;
    if bytes.len() != 20 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    Ok(Address::from_slice(&bytes))
}

fn known_address(s: &str) -> Address {
    // Only called with the literals in `builtin`.
    Address::from_str(s.trim_start_matches("0x")).unwrap_or_default()
}
