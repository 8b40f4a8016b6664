//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track liveness (written by the prober and the failover path)
//! - Track active connections (for Least Connections selection)
//! - Own the forwarding transport for this upstream

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

use crate::upstream::Transport;

/// A single upstream server.
///
/// The URL is the backend's identity and never changes after creation.
/// Liveness and the in-flight counter are plain atomics so the selection
/// hot path never contends with the registry's structural lock.
#[derive(Debug)]
pub struct Backend {
    url: Url,
    alive: AtomicBool,
    active_connections: AtomicU64,
    transport: Box<dyn Transport>,
}

impl Backend {
    /// Create a new backend. Backends start out alive; the prober and the
    /// failover path correct that belief.
    pub fn new(url: Url, transport: Box<dyn Transport>) -> Self {
        Self {
            url,
            alive: AtomicBool::new(true),
            active_connections: AtomicU64::new(0),
            transport,
        }
    }

    /// The backend's identity URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The forwarding transport owned by this backend.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Update the liveness flag.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Relaxed);
    }

    /// Current liveness belief.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Increment the in-flight connection count.
    pub fn inc_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the in-flight connection count.
    ///
    /// Must be paired with a prior [`inc_connections`](Self::inc_connections);
    /// the RAII [`ConnectionGuard`] enforces the pairing.
    pub fn dec_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Current in-flight connection count.
    pub fn connection_count(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }
}

/// RAII guard pairing a selection with the eventual connection release.
///
/// Created by the pool when a peer is selected (incrementing the counter)
/// and dropped when the request completes on any path, including
/// cancellation.
#[derive(Debug)]
pub struct ConnectionGuard {
    backend: Arc<Backend>,
}

impl ConnectionGuard {
    /// Take one connection slot on `backend`.
    pub fn acquire(backend: Arc<Backend>) -> Self {
        backend.inc_connections();
        Self { backend }
    }

    /// The guarded backend.
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }
}

impl Deref for ConnectionGuard {
    type Target = Backend;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.backend.dec_connections();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::testing::MockTransport;

    fn backend(addr: &str) -> Arc<Backend> {
        Arc::new(Backend::new(
            Url::parse(addr).unwrap(),
            Box::new(MockTransport::ok()),
        ))
    }

    #[test]
    fn starts_alive_with_zero_connections() {
        let b = backend("http://127.0.0.1:8081");
        assert!(b.is_alive());
        assert_eq!(b.connection_count(), 0);
    }

    #[test]
    fn liveness_round_trip() {
        let b = backend("http://127.0.0.1:8081");
        b.set_alive(false);
        assert!(!b.is_alive());
        b.set_alive(true);
        assert!(b.is_alive());
    }

    #[test]
    fn guard_releases_connection_on_drop() {
        let b = backend("http://127.0.0.1:8081");
        {
            let _g1 = ConnectionGuard::acquire(b.clone());
            let _g2 = ConnectionGuard::acquire(b.clone());
            assert_eq!(b.connection_count(), 2);
        }
        assert_eq!(b.connection_count(), 0);
    }
}
