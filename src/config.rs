//! Facilitator settings loaded from environment variables
//!
//! | variable                       | default          |
//! |--------------------------------|------------------|
//! | `X402_SCHEME`                  | `evm`            |
//! | `X402_NETWORK`                 | `base-sepolia`   |
//! | `X402_RPC_URL`                 | registry default |
//! | `X402_PRIVATE_KEY`             | required         |
//! | `BIND_ADDRESS`                 | `0.0.0.0:3000`   |
//! | `X402_REQUEST_TIMEOUT_SECS`    | `90`             |
//! | `X402_GAS_LIMIT`               | `150000`         |
//! | `X402_RECEIPT_TIMEOUT_SECS`    | `60`             |
//! | `X402_ENFORCE_VALIDITY_WINDOW` | `false`          |
//! | `X402_ENFORCE_RECIPIENT`       | `false`          |
//! | `X402_ENFORCE_EXACT_AMOUNT`    | `false`          |
//! | `X402_MIN_AMOUNT`              | unset            |
//! | `X402_REPLAY_GUARD`            | `false`          |
//!
//! The receipt timeout must be shorter than the request timeout.

use crate::blockchain::rpc::{DEFAULT_GAS_LIMIT, DEFAULT_RECEIPT_TIMEOUT};
use crate::facilitator::evm::VerificationPolicy;
use crate::facilitator::Scheme;
use crate::types::{networks, ChainRegistry};
use crate::{Result, X402Error};
use ethereum_types::U256;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

/// Default HTTP listen address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default per-request deadline, longer than [`DEFAULT_RECEIPT_TIMEOUT`]
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Everything needed to build and serve one facilitator instance
#[derive(Clone)]
pub struct FacilitatorSettings {
    pub scheme: Scheme,
    pub network: String,
    /// Explicit RPC endpoint; falls back to the registry's default for `network`
    pub rpc_url: Option<Url>,
    /// Gas-paying key, hex
    pub private_key: Zeroizing<String>,
    pub bind_address: SocketAddr,
    pub request_timeout: Duration,
    pub gas_limit: u64,
    pub receipt_timeout: Duration,
    pub policy: VerificationPolicy,
    pub replay_guard: bool,
}

impl fmt::Debug for FacilitatorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacilitatorSettings")
            .field("scheme", &self.scheme)
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url.as_ref().map(Url::as_str))
            .field("private_key", &"<redacted>")
            .field("bind_address", &self.bind_address)
            .field("request_timeout", &self.request_timeout)
            .field("gas_limit", &self.gas_limit)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("policy", &self.policy)
            .field("replay_guard", &self.replay_guard)
            .finish()
    }
}

impl FacilitatorSettings {
    /// Settings with defaults for everything but the key
    pub fn new(scheme: Scheme, network: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            scheme,
            network: network.into(),
            rpc_url: None,
            private_key: Zeroizing::new(private_key.into()),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            gas_limit: DEFAULT_GAS_LIMIT,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            policy: VerificationPolicy::default(),
            replay_guard: false,
        }
    }

    /// Set an explicit RPC endpoint
    pub fn with_rpc_url(mut self, url: &str) -> Result<Self> {
        self.rpc_url = Some(parse_rpc_url(url)?);
        Ok(self)
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scheme = match get("X402_SCHEME") {
            Some(s) => Scheme::from_str(s.trim())?,
            None => Scheme::Evm,
        };
        let network = get("X402_NETWORK").unwrap_or_else(|| networks::BASE_SEPOLIA.to_string());
        let private_key = get("X402_PRIVATE_KEY")
            .map(Zeroizing::new)
            .ok_or_else(|| X402Error::config("X402_PRIVATE_KEY is required"))?;

        let mut settings = Self {
            private_key,
            ..Self::new(scheme, network, String::new())
        };

        if let Some(url) = get("X402_RPC_URL") {
            settings.rpc_url = Some(parse_rpc_url(url.trim())?);
        }
        if let Some(addr) = get("BIND_ADDRESS") {
            settings.bind_address = addr.trim().parse().map_err(|_| {
                X402Error::config(format!("BIND_ADDRESS '{}' is not a socket address", addr))
            })?;
        }
        if let Some(secs) = get("X402_REQUEST_TIMEOUT_SECS") {
            settings.request_timeout = Duration::from_secs(parse_number("X402_REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(gas) = get("X402_GAS_LIMIT") {
            settings.gas_limit = parse_number("X402_GAS_LIMIT", &gas)?;
        }
        if let Some(secs) = get("X402_RECEIPT_TIMEOUT_SECS") {
            settings.receipt_timeout = Duration::from_secs(parse_number("X402_RECEIPT_TIMEOUT_SECS", &secs)?);
        }

        let flag = |key: &str| get(key).map(|v| parse_bool(key, &v)).transpose();
        settings.policy.enforce_validity_window = flag("X402_ENFORCE_VALIDITY_WINDOW")?.unwrap_or(false);
        settings.policy.enforce_recipient = flag("X402_ENFORCE_RECIPIENT")?.unwrap_or(false);
        settings.policy.enforce_exact_amount = flag("X402_ENFORCE_EXACT_AMOUNT")?.unwrap_or(false);
        settings.replay_guard = flag("X402_REPLAY_GUARD")?.unwrap_or(false);
        if let Some(min) = get("X402_MIN_AMOUNT") {
            let min = U256::from_dec_str(min.trim()).map_err(|_| {
                X402Error::config(format!("X402_MIN_AMOUNT '{}' is not a decimal integer", min))
            })?;
            settings.policy.min_amount = Some(min);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check the timeouts: the receipt wait must give up before the request deadline fires
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(X402Error::config("X402_REQUEST_TIMEOUT_SECS must be positive"));
        }
        if self.receipt_timeout >= self.request_timeout {
            return Err(X402Error::config(format!(
                "X402_RECEIPT_TIMEOUT_SECS ({}s) must be shorter than X402_REQUEST_TIMEOUT_SECS ({}s)",
                self.receipt_timeout.as_secs(),
                self.request_timeout.as_secs()
            )));
        }
        Ok(())
    }

    /// The RPC endpoint to use: explicit setting, else the registry default for the network
    pub fn resolve_rpc_url(&self, registry: &ChainRegistry) -> Result<Url> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        let chain = registry.chain(&self.network)?;
        let default = chain.default_rpc_url.as_deref().ok_or_else(|| {
            X402Error::config(format!(
                "no default RPC URL for network '{}'; set X402_RPC_URL",
                self.network
            ))
        })?;
        parse_rpc_url(default)
    }
}

fn parse_rpc_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| X402Error::config(format!("Invalid RPC URL '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(X402Error::config(format!(
            "RPC URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| X402Error::config(format!("{} '{}' is not a non-negative integer", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(X402Error::config(format!("{} '{}' is not a boolean", key, value))),
    }
}
