//! Host HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, trace layer)
//!     → GET /        liveness for sibling reachability sweeps
//!     → GET /health  status document
//! ```

pub mod server;

pub use server::HttpServer;
