//! Lifecycle management.
//!
//! # Design Decisions
//! - One broadcast channel fans the stop signal out to every long-running
//!   task (server, prober)
//! - Shutdown is cooperative: tasks observe the signal at their next
//!   suspension point

pub mod shutdown;

pub use shutdown::Shutdown;
