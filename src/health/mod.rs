//! Liveness probing subsystem.
//!
//! # Data Flow
//! ```text
//! Interval tick
//!     → prober.rs sweeps the registry snapshot
//!     → TCP connect per backend, bounded by a short timeout
//!     → Backend liveness flag updated in place
//! ```
//!
//! # Design Decisions
//! - The prober only writes liveness; pool membership belongs to the
//!   admin path
//! - Per-backend timeouts keep one unreachable upstream from stalling
//!   the rest of the sweep

pub mod prober;

pub use prober::Prober;
