//! Development server lifecycle.
//!
//! # State Machine
//! ```text
//! Unbound → Binding → Accepting → Stopped
//!              │          │
//!              └──────────┴────→ Failed
//! ```
//!
//! # Design Decisions
//! - `started` fires on entry to Accepting, before the first accept
//! - Stopped is reached only through the shutdown future
//! - The listener is owned by the serving future, so dropping it unbinds

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::started::Started;

/// Where a dev server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Unbound,
    Binding,
    Accepting,
    Stopped,
    Failed,
}

impl ServerState {
    fn can_transition_to(self, next: ServerState) -> bool {
        use ServerState::*;
        matches!(
            (self, next),
            (Unbound, Binding)
                | (Binding, Accepting)
                | (Binding, Failed)
                | (Accepting, Stopped)
                | (Accepting, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ServerState::Stopped | ServerState::Failed)
    }
}

/// Tracks one serving call through the state machine.
#[derive(Debug)]
pub struct ServerLifecycle {
    state: watch::Sender<ServerState>,
    started: Option<Started>,
}

impl ServerLifecycle {
    pub fn new(started: Option<Started>) -> Self {
        let (state, _) = watch::channel(ServerState::Unbound);
        Self { state, started }
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Observe state changes from another task.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    fn transition(&self, next: ServerState) {
        let current = self.state();
        debug_assert!(
            current.can_transition_to(next),
            "illegal server transition {:?} -> {:?}",
            current,
            next
        );
        tracing::debug!(from = ?current, to = ?next, "Dev server state change");
        self.state.send_replace(next);
    }

    /// Bind `host:port`. Moves to Accepting and fires `started` on success.
    pub async fn bind(&mut self, host: &str, port: u16) -> BackendResult<TcpListener> {
        self.transition(ServerState::Binding);
        let addr = format!("{}:{}", host, port);

        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                self.transition(ServerState::Failed);
                tracing::error!(address = %addr, error = %source, "Dev server bind failed");
                return Err(BackendError::Bind { addr, source });
            }
        };

        let local_addr = match listener.local_addr() {
            Ok(local_addr) => local_addr,
            Err(source) => {
                self.transition(ServerState::Failed);
                return Err(BackendError::Bind { addr, source });
            }
        };

        self.accepting(local_addr);
        Ok(listener)
    }

    fn accepting(&mut self, local_addr: SocketAddr) {
        self.transition(ServerState::Accepting);
        tracing::info!(address = %local_addr, "Dev server listening");
        if let Some(started) = self.started.take() {
            started.fire(local_addr);
        }
    }

    /// Record how the serving loop ended and pass the result through.
    pub fn finish(self, result: BackendResult<()>) -> BackendResult<()> {
        if self.state().is_terminal() {
            return result;
        }
        match &result {
            Ok(()) => {
                self.transition(ServerState::Stopped);
                tracing::info!("Dev server stopped");
            }
            Err(e) => {
                self.transition(ServerState::Failed);
                tracing::error!(error = %e, "Dev server failed");
            }
        }
        result
    }
}

/// Fail with an environment error when dev-server support is compiled out.
pub fn ensure_dev_feature() -> BackendResult<()> {
    if !cfg!(feature = "dev-server") {
        return Err(BackendError::Environment(
            "built without the `dev-server` feature".to_string(),
        ));
    }
    Ok(())
}

/// Fail with an environment error unless a dev server can run here.
pub fn ensure_dev_environment() -> BackendResult<()> {
    ensure_dev_feature()?;
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(BackendError::Environment(
            "development server requires a running Tokio runtime".to_string(),
        ));
    }
    Ok(())
}

/// Find a free port on `host` within `ports`, probing by binding.
pub fn find_available_port(
    host: &str,
    ports: std::ops::RangeInclusive<u16>,
) -> BackendResult<u16> {
    let (start, end) = (*ports.start(), *ports.end());
    for port in ports {
        match std::net::TcpListener::bind((host, port)) {
            Ok(_) => return Ok(port),
            Err(e) => tracing::debug!(port, error = %e, "Port busy"),
        }
    }
    Err(BackendError::Bind {
        addr: format!("{}:{}-{}", host, start, end),
        source: std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "no available port in range",
        ),
    })
}
