//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → CLI flags override listener port / seeded backends
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a minimal (or absent) config works
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every violation, not just the first
//! - Runtime changes to the backend set go through the admin API, not
//!   through config reloads

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BalancerConfig, HealthCheckConfig, ListenerConfig, ObservabilityConfig};
