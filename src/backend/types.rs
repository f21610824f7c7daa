//! The backend adapter contract and the rendering-engine boundary.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::backend::error::BackendResult;
use crate::backend::started::Started;
use crate::connection::{Carrier, Connection};

/// Root of a component tree, as seen by an adapter.
///
/// Stands in for the rendering engine: the adapter only ever hands it a
/// borrowed connection for the duration of one render or event.
pub trait RootComponent: Send + Sync + 'static {
    /// Produce the view model for this connection.
    fn render(&self, connection: &Connection<dyn Carrier>) -> Value;

    /// React to a client event. The adapter re-renders afterwards.
    fn handle_event(&self, connection: &Connection<dyn Carrier>, event: &Value) {
        let _ = (connection, event);
    }
}

impl<F> RootComponent for F
where
    F: Fn(&Connection<dyn Carrier>) -> Value + Send + Sync + 'static,
{
    fn render(&self, connection: &Connection<dyn Carrier>) -> Value {
        self(connection)
    }
}

/// Shared handle to a root component.
pub type Component = Arc<dyn RootComponent>;

/// Which server framework an adapter integrates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    #[default]
    Axum,
    Hyper,
}

impl BackendKind {
    /// Every built-in adapter, in order of preference.
    pub const ALL: [BackendKind; 2] = [BackendKind::Axum, BackendKind::Hyper];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Axum => "axum",
            BackendKind::Hyper => "hyper",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "axum" => Ok(BackendKind::Axum),
            "hyper" => Ok(BackendKind::Hyper),
            other => Err(format!("unknown backend {:?} (expected axum or hyper)", other)),
        }
    }
}

/// Common interface for web server / framework integrations.
///
/// Each adapter has its own native application type, its own options
/// constructor, and its own carrier type for connections.
pub trait BackendType: Send + Sync + 'static {
    /// Native application type of the framework.
    type App: Send + 'static;
    /// Options accepted by [`BackendType::configure`].
    type Options: Send + 'static;
    /// What mediates a connection under this framework.
    type Carrier: Carrier;

    const KIND: BackendKind;

    /// Options constructor for [`BackendType::configure`].
    fn options(&self) -> Self::Options;

    /// Configure `app` to display `component`.
    ///
    /// Registers routes in place. On error `app` is left untouched.
    fn configure(
        &self,
        app: &mut Self::App,
        component: Component,
        options: Option<Self::Options>,
    ) -> BackendResult<()>;

    /// Create an application instance for development purposes.
    fn create_development_app(&self) -> BackendResult<Self::App>;

    /// Run `app` on a development server until `shutdown` resolves.
    fn serve_development_app_until<S>(
        &self,
        app: Self::App,
        host: &str,
        port: u16,
        started: Option<Started>,
        shutdown: S,
    ) -> impl Future<Output = BackendResult<()>> + Send
    where
        S: Future<Output = ()> + Send + 'static;

    /// Run `app` on a development server.
    ///
    /// Resolves only on failure; cancel by dropping the future, which
    /// releases the bound socket.
    fn serve_development_app(
        &self,
        app: Self::App,
        host: &str,
        port: u16,
        started: Option<Started>,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        self.serve_development_app_until(app, host, port, started, std::future::pending())
    }
}
