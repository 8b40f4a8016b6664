//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router + middleware)
//!     → request.rs (request ID)
//!     → admin.rs   (/loadbalancer/* control operations)
//!     → forward.rs (every other route: select peer, forward, retry)
//!     → error.rs   (JSON error envelope)
//! ```

pub mod admin;
pub mod error;
pub mod forward;
pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
