//! Storage for settled authorization nonces
//!
//! The token contract is the authority on nonce reuse; this store lets the
//! facilitator reject a replay before spending gas on a transaction that will revert.
//! Entries are kept until the authorization's `validBefore` has passed; after that the
//! contract rejects the authorization on its own.

use crate::Result;
use async_trait::async_trait;
use ethereum_types::{Address, H256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Identity of a settled authorization: EIP-3009 nonces are scoped per (contract, payer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettledNonce {
    pub contract: Address,
    pub payer: Address,
    pub nonce: H256,
}

/// Trait for storing and retrieving settled nonces
#[async_trait]
pub trait NonceStorage: Send + Sync {
    /// Check if a nonce has been settled
    async fn has_nonce(&self, key: &SettledNonce) -> Result<bool>;

    /// Mark a nonce as settled; `valid_before` is the authorization's expiry in unix seconds
    async fn mark_nonce(&self, key: &SettledNonce, valid_before: u64) -> Result<()>;

    /// Remove a nonce (optional cleanup)
    async fn remove_nonce(&self, key: &SettledNonce) -> Result<()>;
}

/// In-memory storage implementation
///
/// Data is lost when the process restarts. Expired entries are dropped on each insert, so
/// the store holds at most the authorizations that could still be submitted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    nonces: Arc<RwLock<HashMap<SettledNonce, u64>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of settled nonces tracked
    pub async fn len(&self) -> usize {
        self.nonces.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nonces.read().await.is_empty()
    }

    /// Drop entries whose `valid_before` is at or before `now`; returns how many went
    pub async fn prune_expired(&self, now: u64) -> usize {
        let mut nonces = self.nonces.write().await;
        let before = nonces.len();
        nonces.retain(|_, valid_before| *valid_before > now);
        before - nonces.len()
    }
}

#[async_trait]
impl NonceStorage for InMemoryStorage {
    async fn has_nonce(&self, key: &SettledNonce) -> Result<bool> {
        let nonces = self.nonces.read().await;
        Ok(nonces.contains_key(key))
    }

    async fn mark_nonce(&self, key: &SettledNonce, valid_before: u64) -> Result<()> {
        let pruned = self.prune_expired(unix_now()).await;
        if pruned > 0 {
            tracing::debug!(pruned, "dropped expired settled nonces");
        }
        let mut nonces = self.nonces.write().await;
        nonces.insert(*key, valid_before);
        Ok(())
    }

    async fn remove_nonce(&self, key: &SettledNonce) -> Result<()> {
        let mut nonces = self.nonces.write().await;
        nonces.remove(key);
        Ok(())
    }
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
