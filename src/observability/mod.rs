//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logs via `tracing`; the request ID flows through every
//!   forwarding log line
//! - Metrics are cheap (atomic increments behind the `metrics` facade) and
//!   exposed on a separate Prometheus scrape address
//! - The exporter is optional; nothing else changes when it is disabled

pub mod metrics;
