//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (connection counters and gauges)
//!
//! Consumers:
//!     → Log output (stdout)
//!     → Whatever `metrics` recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (connection_id, location, address) over formatted strings
//! - The library never installs a recorder or subscriber; binaries do
//! - Metrics are cheap (no-ops without a recorder)

pub mod logging;
pub mod metrics;

pub use logging::{env_filter, init_logging};
