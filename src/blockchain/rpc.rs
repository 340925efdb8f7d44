//! JSON-RPC chain client

use super::nonce::PendingNonceManager;
use super::transaction::{encode_balance_of, encode_transfer_with_authorization, LegacyTransaction};
use super::{AuthorizedTransfer, ChainClient};
use crate::crypto::signature::PrivateKeySigner;
use crate::{Result, X402Error};
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Default gas limit for `transferWithAuthorization`
pub const DEFAULT_GAS_LIMIT: u64 = 150_000;

/// Default time to wait for a settlement receipt
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct TransactionReceipt {
    status: Option<String>,
}

/// [`ChainClient`] over an EVM node's JSON-RPC endpoint
#[derive(Debug)]
pub struct RpcChainClient {
    url: Url,
    client: Client,
    gas_limit: u64,
    receipt_timeout: Duration,
    poll_interval: Duration,
    nonces: PendingNonceManager,
    chain_id: OnceCell<u64>,
    next_id: AtomicU64,
}

impl RpcChainClient {
    /// Create a client for `url`
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| X402Error::config(format!("Invalid RPC URL '{}': {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(X402Error::config(format!(
                "RPC URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| X402Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url,
            client,
            gas_limit: DEFAULT_GAS_LIMIT,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            nonces: PendingNonceManager::new(),
            chain_id: OnceCell::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Set the gas limit used for settlement transactions
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set how long to wait for a receipt
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Set the receipt polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Endpoint this client talks to
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        tracing::trace!(method, "JSON-RPC request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(X402Error::rpc(format!(
                "{} failed with HTTP {}: {}",
                method, status, body
            )));
        }

        let response: JsonRpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(X402Error::rpc(format!(
                "{} failed: {} (code {})",
                method, error.message, error.code
            )));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn request_quantity(&self, method: &str, params: Value) -> Result<U256> {
        let result = self.request(method, params).await?;
        parse_quantity(method, &result)
    }

    async fn gas_price(&self) -> Result<U256> {
        self.request_quantity("eth_gasPrice", json!([])).await
    }

    async fn pending_transaction_count(&self, address: Address) -> Result<u64> {
        let count = self
            .request_quantity(
                "eth_getTransactionCount",
                json!([format!("{:#x}", address), "pending"]),
            )
            .await?;
        u64_quantity("eth_getTransactionCount", count)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256> {
        let result = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        let hash = result
            .as_str()
            .ok_or_else(|| X402Error::rpc("eth_sendRawTransaction returned no hash"))?;
        let bytes = hex::decode(hash.trim_start_matches("0x"))
            .map_err(|_| X402Error::rpc(format!("malformed transaction hash '{}'", hash)))?;
        if bytes.len() != 32 {
            return Err(X402Error::rpc(format!("malformed transaction hash '{}'", hash)));
        }
        Ok(H256::from_slice(&bytes))
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<()> {
        let tx_hash_hex = format!("{:#x}", tx_hash);
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;

        loop {
            let result = self
                .request("eth_getTransactionReceipt", json!([tx_hash_hex]))
                .await?;
            if !result.is_null() {
                let receipt: TransactionReceipt = serde_json::from_value(result)?;
                return match receipt.status.as_deref() {
                    Some("0x1") => Ok(()),
                    // Pre-Byzantium receipts have no status field
                    None => Ok(()),
                    Some(_) => Err(X402Error::TransactionReverted {
                        tx_hash: tx_hash_hex,
                    }),
                };
            }
            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(X402Error::rpc(format!(
                    "no receipt for {} within {}s",
                    tx_hash_hex,
                    self.receipt_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = self.request_quantity("eth_chainId", json!([])).await?;
                u64_quantity("eth_chainId", chain_id)
            })
            .await
            .copied()
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let call = json!({
            "to": format!("{:#x}", token),
            "data": format!("0x{}", hex::encode(encode_balance_of(owner))),
        });
        let result = self.request("eth_call", json!([call, "latest"])).await?;
        let data = result
            .as_str()
            .ok_or_else(|| X402Error::rpc("eth_call returned a non-string result"))?;
        let bytes = hex::decode(data.trim_start_matches("0x"))
            .map_err(|_| X402Error::rpc("eth_call returned malformed data"))?;
        if bytes.len() < 32 {
            return Err(X402Error::rpc(format!(
                "balanceOf returned {} bytes, expected 32",
                bytes.len()
            )));
        }
        Ok(U256::from_big_endian(&bytes[..32]))
    }

    async fn submit_authorized_transfer(
        &self,
        token: Address,
        transfer: &AuthorizedTransfer,
        signer: &PrivateKeySigner,
    ) -> Result<H256> {
        let chain_id = self.chain_id().await?;
        let gas_price = self.gas_price().await?;
        let payer = signer.address();
        // Released back to the manager on every exit before the node accepts the transaction
        let reservation = self
            .nonces
            .reserve_nonce(payer, || self.pending_transaction_count(payer))
            .await?;
        let nonce = reservation.nonce();

        let tx = LegacyTransaction {
            nonce: U256::from(nonce),
            gas_price,
            gas: U256::from(self.gas_limit),
            to: token,
            value: U256::zero(),
            data: encode_transfer_with_authorization(transfer),
            chain_id,
        };
        let signed = tx.sign(signer)?;

        let tx_hash = self.send_raw_transaction(&signed.raw).await?;
        reservation.commit();
        tracing::info!(
            tx_hash = ?tx_hash,
            nonce,
            chain_id,
            "settlement transaction broadcast"
        );

        let watch = ReceiptWatch::new(tx_hash);
        let receipt = self.wait_for_receipt(tx_hash).await;
        watch.finish();
        receipt?;
        Ok(tx_hash)
    }
}

/// Logs a broadcast transaction whose receipt wait was dropped before it finished
///
/// The transaction is already in the mempool and may still be mined.
struct ReceiptWatch {
    tx_hash: H256,
    finished: bool,
}

impl ReceiptWatch {
    fn new(tx_hash: H256) -> Self {
        Self {
            tx_hash,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for ReceiptWatch {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                tx_hash = ?self.tx_hash,
                "request ended before the settlement receipt arrived, transaction may still be mined"
            );
        }
    }
}

fn parse_quantity(method: &str, value: &Value) -> Result<U256> {
    let s = value
        .as_str()
        .ok_or_else(|| X402Error::rpc(format!("{} returned a non-string quantity", method)))?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|_| X402Error::rpc(format!("{} returned malformed quantity '{}'", method, s)))
}

fn u64_quantity(method: &str, value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(X402Error::rpc(format!("{} returned {} which overflows u64", method, value)));
    }
    Ok(value.as_u64())
}
