//! Routing subsystem for adapters without a router of their own.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered lookup per mount)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: RouteMatch or no-match
//!
//! Route Compilation (at configure time):
//!     MountPaths
//!     → Compile matchers (exact, segment-aware prefix)
//!     → Freeze as immutable MountRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{MountRouter, RouteMatch};
