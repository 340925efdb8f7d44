//! Common constants for networks, schemes and tokens

/// Network names understood by the built-in chain registry
pub mod networks {
    /// Ethereum mainnet
    pub const ETHEREUM: &str = "ethereum";
    /// Ethereum Sepolia testnet
    pub const SEPOLIA: &str = "sepolia";
    /// Base mainnet
    pub const BASE_MAINNET: &str = "base";
    /// Base Sepolia testnet
    pub const BASE_SEPOLIA: &str = "base-sepolia";
    /// Optimism mainnet
    pub const OPTIMISM: &str = "optimism";
    /// Optimism Sepolia testnet
    pub const OPTIMISM_SEPOLIA: &str = "optimism-sepolia";
    /// Arbitrum One
    pub const ARBITRUM: &str = "arbitrum";
    /// Arbitrum Sepolia testnet
    pub const ARBITRUM_SEPOLIA: &str = "arbitrum-sepolia";
    /// Avalanche C-Chain mainnet
    pub const AVALANCHE_MAINNET: &str = "avalanche";
    /// Avalanche Fuji testnet
    pub const AVALANCHE_FUJI: &str = "avalanche-fuji";

    /// Get all networks known to the built-in registry
    pub fn all_supported() -> Vec<&'static str> {
        vec![
            ETHEREUM,
            SEPOLIA,
            BASE_MAINNET,
            BASE_SEPOLIA,
            OPTIMISM,
            OPTIMISM_SEPOLIA,
            ARBITRUM,
            ARBITRUM_SEPOLIA,
            AVALANCHE_MAINNET,
            AVALANCHE_FUJI,
        ]
    }
}

/// Payment scheme names, one per chain family
pub mod schemes {
    /// EIP-3009 transfer authorization on EVM chains
    pub const EVM: &str = "evm";
    /// Solana (not implemented)
    pub const SOLANA: &str = "solana";
    /// Sui (not implemented)
    pub const SUI: &str = "sui";
    /// Tron (not implemented)
    pub const TRON: &str = "tron";
}

/// Token symbols
pub mod tokens {
    /// Circle USD Coin
    pub const USDC: &str = "USDC";
}
