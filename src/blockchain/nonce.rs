use crate::Result;
use dashmap::DashMap;
use ethereum_types::Address;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Sentinel meaning "not fetched yet"
const NONE: u64 = u64::MAX;

#[derive(Debug)]
struct NonceSlot {
    current: Mutex<u64>,
    /// Set by `reset_nonce`; the next allocation discards `current` and re-queries
    stale: AtomicBool,
}

impl NonceSlot {
    fn new() -> Self {
        Self {
            current: Mutex::new(NONE),
            stale: AtomicBool::new(false),
        }
    }
}

/// Allocates transaction nonces for gas-payer addresses
///
/// The first allocation for an address queries the node for its *pending* transaction
/// count, so transactions still in the mempool after a restart are accounted for. Later
/// allocations increment locally. Each address has its own mutex, so concurrent
/// settlements from one key serialize on allocation only.
#[derive(Clone, Debug, Default)]
pub struct PendingNonceManager {
    nonces: Arc<DashMap<Address, Arc<NonceSlot>>>,
}

impl PendingNonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next nonce for `address`, calling `fetch_pending` on first use or after a reset
    pub async fn next_nonce<F, Fut>(&self, address: Address, fetch_pending: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        // Clone the Arc out so the dashmap shard lock is not held across the await.
        let slot = {
            let entry = self
                .nonces
                .entry(address)
                .or_insert_with(|| Arc::new(NonceSlot::new()));
            Arc::clone(entry.value())
        };

        let mut nonce = slot.current.lock().await;
        if slot.stale.swap(false, Ordering::SeqCst) {
            *nonce = NONE;
        }
        let next = if *nonce == NONE {
            tracing::trace!(address = ?address, "fetching pending nonce");
            fetch_pending().await?
        } else {
            tracing::trace!(address = ?address, current_nonce = *nonce, "incrementing nonce");
            *nonce + 1
        };
        *nonce = next;
        Ok(next)
    }

    /// Allocate a nonce that is handed back unless the caller commits it
    ///
    /// Dropping the reservation without [`NonceReservation::commit`] resets the address,
    /// which covers early returns and futures cancelled between allocation and broadcast.
    pub async fn reserve_nonce<F, Fut>(
        &self,
        address: Address,
        fetch_pending: F,
    ) -> Result<NonceReservation<'_>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        let nonce = self.next_nonce(address, fetch_pending).await?;
        Ok(NonceReservation {
            manager: self,
            address,
            nonce,
            committed: false,
        })
    }

    /// Forget the cached nonce so the next allocation re-queries the node
    ///
    /// Call after a failed broadcast: the transaction may or may not have reached the mempool.
    /// Does not wait for an allocation in progress; that allocation completes and the one
    /// after it re-queries.
    pub fn reset_nonce(&self, address: Address) {
        if let Some(slot) = self.nonces.get(&address) {
            slot.stale.store(true, Ordering::SeqCst);
            tracing::debug!(address = ?address, "reset nonce cache, will requery on next use");
        }
    }
}

/// A nonce allocated by [`PendingNonceManager::reserve_nonce`]
#[derive(Debug)]
pub struct NonceReservation<'a> {
    manager: &'a PendingNonceManager,
    address: Address,
    nonce: u64,
    committed: bool,
}

impl NonceReservation<'_> {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Keep the nonce; call once the transaction using it has been accepted by the node
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for NonceReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!(address = ?self.address, nonce = self.nonce, "nonce released unused");
            self.manager.reset_nonce(self.address);
        }
    }
}
