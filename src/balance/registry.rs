//! Backend registry: the pool plus a URL-keyed lookup index.
//!
//! # Responsibilities
//! - Add/remove backends with duplicate and not-found semantics
//! - Keep pool and index in lockstep inside one critical section
//! - Serve peer selection and snapshots without blocking on admin traffic
//!
//! # Design Decisions
//! - One `RwLock` over pool + index: add/delete are all-or-nothing
//! - Selection takes only the read lock; liveness, connection counts and
//!   the rotation cursor are atomics, so concurrent requests never
//!   serialize behind each other
//! - `mark_backend_status` is deliberately lenient: it is called from the
//!   failure path of in-flight requests, which can race with a concurrent
//!   admin delete of the same backend

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use url::Url;

use crate::balance::{Algorithm, Backend, ConnectionGuard, ServerPool};
use crate::error::BalancerError;
use crate::upstream::Transport;

#[derive(Debug)]
struct Inner {
    pool: ServerPool,
    by_url: HashMap<String, Arc<Backend>>,
}

/// Owner of the backend set shared by the forwarding path, the admin
/// surface and the prober.
#[derive(Debug)]
pub struct BackendRegistry {
    inner: RwLock<Inner>,
}

impl BackendRegistry {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            inner: RwLock::new(Inner {
                pool: ServerPool::new(algorithm),
                by_url: HashMap::new(),
            }),
        }
    }

    /// Register a backend. Fails with `AlreadyExists` when the normalized
    /// URL is already present; the pool is untouched in that case.
    pub fn add_backend(
        &self,
        url: Url,
        transport: Box<dyn Transport>,
    ) -> Result<(), BalancerError> {
        let mut inner = self.inner.write().expect("registry lock poisoned");

        let key = url.to_string();
        if inner.by_url.contains_key(&key) {
            return Err(BalancerError::AlreadyExists(key));
        }

        let backend = Arc::new(Backend::new(url, transport));
        inner.pool.add(backend.clone());
        inner.by_url.insert(key, backend);
        Ok(())
    }

    /// Remove a backend by raw address. Parsing happens first so a
    /// malformed address never reaches the pool.
    pub fn delete_backend(&self, raw_url: &str) -> Result<(), BalancerError> {
        let url = parse_backend_url(raw_url)?;
        let mut inner = self.inner.write().expect("registry lock poisoned");

        let key = url.to_string();
        if inner.by_url.remove(&key).is_none() {
            return Err(BalancerError::NotFound(key));
        }
        inner.pool.remove(&url);
        Ok(())
    }

    /// Best-effort liveness update; unknown URLs are silently ignored.
    pub fn mark_backend_status(&self, url: &Url, alive: bool) {
        let inner = self.inner.read().expect("registry lock poisoned");
        if let Some(backend) = inner.by_url.get(&url.to_string()) {
            backend.set_alive(alive);
        }
    }

    /// Swap the selection algorithm; effective on the next selection.
    pub fn set_algorithm(&self, algorithm: Algorithm) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner.pool.set_algorithm(algorithm);
    }

    /// The currently active algorithm.
    pub fn algorithm(&self) -> Algorithm {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.pool.algorithm()
    }

    /// Select a peer for one request. Holds the read lock only for the
    /// duration of the scan; the returned guard is lock-free.
    pub fn select_peer(&self) -> Option<ConnectionGuard> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.pool.select_peer()
    }

    /// Point-in-time snapshot of the backend sequence, for the prober and
    /// the admin listing.
    pub fn backends(&self) -> Vec<Arc<Backend>> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.pool.backends().to_vec()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse and normalize a backend address. Only absolute http(s) URLs with
/// a host are accepted.
pub fn parse_backend_url(raw: &str) -> Result<Url, BalancerError> {
    let url =
        Url::parse(raw).map_err(|_| BalancerError::InvalidAddress(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(BalancerError::InvalidAddress(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::testing::MockTransport;

    fn add(registry: &BackendRegistry, raw: &str) -> Result<(), BalancerError> {
        registry.add_backend(Url::parse(raw).unwrap(), Box::new(MockTransport::ok()))
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        add(&registry, "http://127.0.0.1:8081").unwrap();
        let err = add(&registry, "http://127.0.0.1:8081").unwrap_err();
        assert!(matches!(err, BalancerError::AlreadyExists(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_removes_from_pool_and_index() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        add(&registry, "http://127.0.0.1:8081").unwrap();
        registry.delete_backend("http://127.0.0.1:8081").unwrap();
        assert!(registry.is_empty());

        // Once deleted, the same address can be added again.
        add(&registry, "http://127.0.0.1:8081").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        let err = registry.delete_backend("http://nope:1").unwrap_err();
        assert!(matches!(err, BalancerError::NotFound(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn delete_malformed_is_invalid_address() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        let err = registry.delete_backend("not a url").unwrap_err();
        assert!(matches!(err, BalancerError::InvalidAddress(_)));
    }

    #[test]
    fn mark_status_flips_known_backend() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        add(&registry, "http://127.0.0.1:8081").unwrap();

        let url = Url::parse("http://127.0.0.1:8081").unwrap();
        registry.mark_backend_status(&url, false);
        assert!(!registry.backends()[0].is_alive());
    }

    #[test]
    fn mark_status_ignores_unknown_backend() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        add(&registry, "http://127.0.0.1:8081").unwrap();

        let unknown = Url::parse("http://127.0.0.1:9999").unwrap();
        registry.mark_backend_status(&unknown, false);
        assert!(registry.backends()[0].is_alive());
    }

    #[test]
    fn dead_backend_is_skipped_until_revived() {
        let registry = BackendRegistry::new(Algorithm::RoundRobin);
        add(&registry, "http://127.0.0.1:8081").unwrap();
        add(&registry, "http://127.0.0.1:8082").unwrap();

        let dead = Url::parse("http://127.0.0.1:8082").unwrap();
        registry.mark_backend_status(&dead, false);
        for _ in 0..4 {
            let peer = registry.select_peer().unwrap();
            assert_ne!(peer.url(), &dead);
        }

        registry.mark_backend_status(&dead, true);
        let revived = (0..4).any(|_| {
            registry
                .select_peer()
                .is_some_and(|peer| peer.url() == &dead)
        });
        assert!(revived);
    }

    #[test]
    fn parse_rejects_non_http_schemes() {
        assert!(parse_backend_url("ftp://127.0.0.1:8081").is_err());
        assert!(parse_backend_url("http://127.0.0.1:8081").is_ok());
        assert!(parse_backend_url("https://backend.internal").is_ok());
    }
}
