//! Domain error taxonomy.
//!
//! # Design Decisions
//! - Administrative errors are returned synchronously with no partial
//!   mutation; none of them are fatal to the process
//! - Transport failures live at the upstream seam (`upstream::TransportError`)
//!   and are absorbed by the forwarding gateway up to its retry bounds

use thiserror::Error;

/// Errors produced by registry and admin-facing operations.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// A backend with the same normalized URL is already registered.
    #[error("backend {0} already exists")]
    AlreadyExists(String),

    /// The named backend is not registered.
    #[error("backend {0} not found")]
    NotFound(String),

    /// The supplied address could not be parsed into an http(s) URL.
    #[error("invalid backend address: {0}")]
    InvalidAddress(String),

    /// The supplied balancing algorithm name is not recognized.
    #[error("unknown balancing algorithm: {0}")]
    InvalidAlgorithm(String),
}
