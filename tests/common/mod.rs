//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use render_backend::backend::{AnyBackend, BackendKind, BackendResult, CommonOptions};
use render_backend::{Carrier, Component, Connection, RootComponent, Shutdown, Started};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// Echoes its connection and keeps a click counter in session storage.
pub struct EchoComponent;

impl RootComponent for EchoComponent {
    fn render(&self, connection: &Connection<dyn Carrier>) -> Value {
        json!({
            "id": connection.id().to_string(),
            "path": connection.location().pathname(),
            "search": connection.location().search(),
            "clicks": connection.session_storage().get("clicks"),
            "theme": connection.local_storage().get("theme"),
        })
    }

    fn handle_event(&self, connection: &Connection<dyn Carrier>, event: &Value) {
        match event["type"].as_str() {
            Some("click") => {
                let session = connection.session_storage();
                let clicks = session
                    .get("clicks")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                session.set("clicks", (clicks + 1).to_string());
            }
            Some("theme") => {
                if let Some(theme) = event["value"].as_str() {
                    connection.local_storage().set("theme", theme);
                }
            }
            _ => {}
        }
    }
}

pub fn echo_component() -> Component {
    Arc::new(EchoComponent)
}

/// A development server running in the background.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<BackendResult<()>>,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server future to finish.
    pub async fn stop(self) -> BackendResult<()> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Configure the echo component with `options` and serve it on an
/// ephemeral port, returning once the started signal fired.
pub async fn start_server(kind: BackendKind, options: CommonOptions) -> TestServer {
    let backend = AnyBackend::new(kind);
    let mut app = backend.create_development_app().unwrap();
    backend
        .configure(&mut app, echo_component(), Some(backend.options(options)))
        .unwrap();

    let shutdown = Shutdown::new();
    let (started, listener) = Started::channel();
    let wait = shutdown.wait();
    let handle = tokio::spawn(async move {
        backend
            .serve_development_app_until(app, "127.0.0.1", 0, Some(started), wait)
            .await
    });

    let addr = tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("server did not start in time")
        .expect("server stopped before starting");

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
