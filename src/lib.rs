//! Layer-7 reverse-proxy load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                LOAD BALANCER                   │
//!                         │                                                │
//!   Client Request        │  ┌─────────┐      ┌──────────────────────┐    │
//!   ──────────────────────┼─▶│  http   │─────▶│  balance             │    │
//!                         │  │ server  │      │  registry → pool     │    │
//!                         │  └────┬────┘      │  round-robin /       │    │
//!                         │       │           │  least-connections   │    │
//!                         │       │           └──────────┬───────────┘    │
//!                         │       │                      │                │
//!   Client Response       │  ┌────▼────┐      ┌──────────▼───────────┐    │
//!   ◀─────────────────────┼──│ forward │◀─────│  upstream transport  │◀───┼── Backends
//!                         │  │ + retry │      │  (hyper client)      │    │
//!                         │  └─────────┘      └──────────────────────┘    │
//!                         │                                                │
//!                         │  ┌──────────────────────────────────────────┐ │
//!                         │  │ config │ health prober │ observability   │ │
//!                         │  │        │ lifecycle                       │ │
//!                         │  └──────────────────────────────────────────┘ │
//!                         └───────────────────────────────────────────────┘
//! ```
//!
//! Admin calls under `/loadbalancer/*` add and remove backends and swap
//! the balancing algorithm while traffic is flowing; every other route is
//! forwarded to a selected backend with bounded retry/failover.

// Core subsystems
pub mod balance;
pub mod config;
pub mod error;
pub mod http;
pub mod upstream;

// Traffic management
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
