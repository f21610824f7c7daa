//! Connection metrics.
//!
//! # Metrics
//! - `render_backend_connections_total` (counter): connection contexts handed out
//! - `render_backend_connections_rejected_total` (counter): malformed connections
//! - `render_backend_active_connections` (gauge): live connections

use metrics::{counter, gauge};

pub const CONNECTIONS_TOTAL: &str = "render_backend_connections_total";
pub const CONNECTIONS_REJECTED_TOTAL: &str = "render_backend_connections_rejected_total";
pub const ACTIVE_CONNECTIONS: &str = "render_backend_active_connections";

/// Record a connection opening; `active` is the count including it.
pub fn connection_opened(active: u64) {
    counter!(CONNECTIONS_TOTAL).increment(1);
    gauge!(ACTIVE_CONNECTIONS).set(active as f64);
}

/// Record a connection closing; `active` is the count without it.
pub fn connection_closed(active: u64) {
    gauge!(ACTIVE_CONNECTIONS).set(active as f64);
}

/// Record a connection rejected for a malformed URL.
pub fn connection_rejected() {
    counter!(CONNECTIONS_REJECTED_TOTAL).increment(1);
}
