//! A fixed set of independent connections for concurrent searches.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{info, warn};

use crate::client::{AnnClient, CycleState};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::types::{IndexSpec, VectorId};

/// Pool of clients, each used by one caller at a time.
///
/// The protocol has no request ids, so concurrency comes from separate
/// connections rather than sharing one. A client that is released while
/// not `Idle` is closed and the pool shrinks; nothing is reconnected.
pub struct ClientPool {
    idle: Mutex<Vec<AnnClient>>,
    permits: Semaphore,
    /// Clients not yet discarded, idle or checked out.
    live: AtomicUsize,
}

impl ClientPool {
    /// Open `size` connections that search the existing index `spec`.
    pub async fn connect(config: &Config, spec: IndexSpec, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ClientError::Validation("pool size must be > 0".into()));
        }
        let mut clients = Vec::with_capacity(size);
        for _ in 0..size {
            let mut client = AnnClient::connect(config).await?;
            client.attach_index(spec)?;
            clients.push(client);
        }
        info!(size, "connection pool ready");
        Ok(Self::from_clients(clients))
    }

    /// Build a pool from already-connected clients.
    pub fn from_clients(clients: Vec<AnnClient>) -> Self {
        let permits = Semaphore::new(clients.len());
        Self {
            live: AtomicUsize::new(clients.len()),
            idle: Mutex::new(clients),
            permits,
        }
    }

    /// Number of clients not currently checked out.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Number of connections still in the pool, checked out or not.
    pub fn size(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Wait for a free client. Fails with `Desynchronized` once every
    /// connection of the pool has been discarded.
    pub async fn acquire(&self) -> Result<PooledClient<'_>> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ClientError::Desynchronized)?;
        let client = self
            .idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .ok_or_else(|| ClientError::Validation("pool is empty".into()))?;
        Ok(PooledClient {
            pool: self,
            client: Some(client),
            permit: Some(permit),
        })
    }

    /// Run one search on any free connection.
    pub async fn search(
        &self,
        ef_search: usize,
        k: usize,
        query: &[f32],
    ) -> Result<Vec<VectorId>> {
        let mut client = self.acquire().await?;
        client.search(ef_search, k, query).await
    }

    /// Run one batch search on any free connection.
    pub async fn batch_search(
        &self,
        ef_search: usize,
        k: usize,
        queries: &[Vec<f32>],
    ) -> Result<Vec<Vec<VectorId>>> {
        let mut client = self.acquire().await?;
        client.batch_search(ef_search, k, queries).await
    }

    fn release(&self, client: AnnClient, permit: SemaphorePermit<'_>) {
        if client.state() != CycleState::Idle {
            warn!(state = ?client.state(), "discarding desynchronized connection");
            permit.forget();
            if self.live.fetch_sub(1, Ordering::AcqRel) == 1 {
                warn!("all pooled connections discarded");
                self.permits.close();
            }
            return;
        }
        self.idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(client);
        drop(permit);
    }
}

/// A client checked out of a [`ClientPool`]; returned on drop.
pub struct PooledClient<'a> {
    pool: &'a ClientPool,
    client: Option<AnnClient>,
    permit: Option<SemaphorePermit<'a>>,
}

impl Deref for PooledClient<'_> {
    type Target = AnnClient;

    fn deref(&self) -> &AnnClient {
        // Only taken in Drop.
        self.client.as_ref().expect("pooled client present")
    }
}

impl DerefMut for PooledClient<'_> {
    fn deref_mut(&mut self) -> &mut AnnClient {
        self.client.as_mut().expect("pooled client present")
    }
}

impl Drop for PooledClient<'_> {
    fn drop(&mut self) {
        if let (Some(client), Some(permit)) = (self.client.take(), self.permit.take()) {
            self.pool.release(client, permit);
        }
    }
}
