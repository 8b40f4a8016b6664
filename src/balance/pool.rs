//! Server pool: the ordered backend sequence plus selection state.
//!
//! # Responsibilities
//! - Hold the backend sequence (order matters only for round-robin fairness)
//! - Apply the active strategy and hand out connection guards
//! - Keep the rotation cursor valid across removals

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::balance::{Algorithm, Backend, ConnectionGuard, Strategy};

/// Ordered backend collection with a shared rotation cursor and the active
/// selection strategy. Structural mutation happens only through the
/// registry's critical section; selection itself only touches atomics.
#[derive(Debug)]
pub struct ServerPool {
    backends: Vec<Arc<Backend>>,
    cursor: AtomicUsize,
    algorithm: Algorithm,
    strategy: Box<dyn Strategy>,
}

impl ServerPool {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            backends: Vec::new(),
            cursor: AtomicUsize::new(0),
            algorithm,
            strategy: algorithm.strategy(),
        }
    }

    /// Append a backend. Duplicate prevention is the registry's job.
    pub fn add(&mut self, backend: Arc<Backend>) {
        self.backends.push(backend);
    }

    /// Remove the first backend with the given URL. Returns whether a
    /// removal occurred. The cursor is reset to 0 when it would otherwise
    /// point past the end of the remaining sequence.
    pub fn remove(&mut self, url: &Url) -> bool {
        let Some(pos) = self.backends.iter().position(|b| b.url() == url) else {
            return false;
        };
        self.backends.remove(pos);

        if !self.backends.is_empty() && self.cursor.load(Ordering::Relaxed) >= self.backends.len()
        {
            self.cursor.store(0, Ordering::Relaxed);
        }
        true
    }

    /// Swap the selection strategy; effective on the next selection.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
        self.strategy = algorithm.strategy();
    }

    /// The currently active algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Select a peer under the active strategy.
    ///
    /// Returns `None` when the pool is empty or no backend is alive. On
    /// success the winner's connection count has already been incremented;
    /// dropping the guard releases it.
    pub fn select_peer(&self) -> Option<ConnectionGuard> {
        let idx = self.strategy.select(&self.backends, &self.cursor)?;
        let backend = self.backends.get(idx)?.clone();
        Some(ConnectionGuard::acquire(backend))
    }

    /// Snapshot of the current backend sequence.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}
