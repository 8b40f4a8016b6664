//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request → http::forward
//!     → registry.rs (select_peer under the read lock)
//!     → pool.rs (apply the active strategy)
//!         - round_robin.rs (rotate, skip dead backends)
//!         - least_conn.rs (fewest in-flight connections wins)
//!     → backend.rs (connection guard + owned transport)
//! Admin call → registry.rs (add/remove/algorithm under the write lock)
//! ```
//!
//! # Design Decisions
//! - Strategies are trait objects, so a new policy touches neither the
//!   registry nor the gateway
//! - The pool's rotation cursor and all per-backend fields are atomics;
//!   only structural changes take the registry's write lock
//! - Dead backends are excluded from selection by every strategy

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod registry;
pub mod round_robin;

pub use backend::{Backend, ConnectionGuard};
pub use pool::ServerPool;
pub use registry::BackendRegistry;

use crate::error::BalancerError;
use least_conn::LeastConnections;
use round_robin::RoundRobin;

/// A backend selection policy.
///
/// `select` returns the index of the chosen backend, or `None` when the
/// slice is empty or no backend is alive. Implementations own their
/// interaction with the shared rotation cursor, and must treat the slice
/// as a point-in-time snapshot: liveness and counts may change mid-scan.
pub trait Strategy: Send + Sync + fmt::Debug {
    fn select(&self, backends: &[Arc<Backend>], cursor: &AtomicUsize) -> Option<usize>;
}

/// The named balancing algorithms exposed on the admin surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    RoundRobin,
    LeastConnections,
}

impl Algorithm {
    /// Wire/config name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "round_robin",
            Algorithm::LeastConnections => "least_connections",
        }
    }

    /// Instantiate the strategy implementing this algorithm.
    pub fn strategy(&self) -> Box<dyn Strategy> {
        match self {
            Algorithm::RoundRobin => Box::new(RoundRobin::new()),
            Algorithm::LeastConnections => Box::new(LeastConnections::new()),
        }
    }
}

impl FromStr for Algorithm {
    type Err = BalancerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(Algorithm::RoundRobin),
            "least_connections" => Ok(Algorithm::LeastConnections),
            other => Err(BalancerError::InvalidAlgorithm(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip() {
        for algo in [Algorithm::RoundRobin, Algorithm::LeastConnections] {
            assert_eq!(algo.name().parse::<Algorithm>().unwrap(), algo);
        }
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let err = "weighted".parse::<Algorithm>().unwrap_err();
        assert!(matches!(err, BalancerError::InvalidAlgorithm(_)));
    }
}
