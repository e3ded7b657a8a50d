//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle + health produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every registry call and probe result is one structured event
//! - Metrics are recorded through the `metrics` facade; without an
//!   installed exporter they are no-ops

pub mod logging;
pub mod metrics;
