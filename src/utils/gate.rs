// src/utils/gate.rs

//! Bounded concurrency gate for outbound fetches.
//!
//! One gate is shared by every source, so on-demand resolve batches and
//! scheduled poll cycles draw from the same pool of permits. Waiters are
//! served in arrival order.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{AppError, Result};

/// Caps the number of simultaneously outstanding operations.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `limit` operations (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AppError::config(format!("concurrency gate closed: {e}")))
    }
}
