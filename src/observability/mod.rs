//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine components produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (workflow / stage spans with run ids)
//!
//! Consumers:
//!     → Log aggregation of the surrounding process
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;
