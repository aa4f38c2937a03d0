//! Request supersession for search-as-you-type lookups
//!
//! Starting a new lookup aborts the one still in flight, and a lookup that
//! finishes after a newer one was started reports nothing. Stale results can
//! never overwrite fresher ones.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::task::AbortHandle;

use crate::error::{ClientError, Result};

/// Runs lookups so that only the most recent one produces a result
#[derive(Debug, Default)]
pub struct Superseding {
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl Superseding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `lookup`, aborting any lookup previously started through `self`
    ///
    /// Returns `Ok(None)` when this lookup was superseded before it finished.
    pub async fn run<F, T>(&self, lookup: F) -> Result<Option<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        // Numbered and registered under one lock: the newest generation is
        // always the one held in `in_flight`.
        let (generation, handle) = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let handle = tokio::spawn(lookup);
            if let Some(previous) = in_flight.replace(handle.abort_handle()) {
                previous.abort();
            }
            (generation, handle)
        };

        let outcome = handle.await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding superseded lookup #{}", generation);
            return Ok(None);
        }

        match outcome {
            Ok(result) => result.map(Some),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => Err(ClientError::InternalError(format!("lookup task failed: {}", e))),
        }
    }
}
