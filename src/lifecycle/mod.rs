//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Pick adapter → Resolve port → Configure mount → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Server future completes → Port released
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then mount, then listener
//! - The server future owns the listener, so dropping it also releases the port

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{shutdown_signal, spawn_signal_handler};
pub use startup::{run, StartupError};
