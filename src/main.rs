//! Development server for a single root component.
//!
//! ```text
//! CLI args + optional TOML file
//!     → ServerConfig (validated)
//!     → init_logging
//!     → lifecycle::run (adapter picked by `backend`)
//!     → Ctrl+C / SIGTERM → graceful shutdown
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};

use render_backend::config::{load_config, ServerConfig};
use render_backend::lifecycle::{self, Shutdown};
use render_backend::observability::init_logging;
use render_backend::{Carrier, Component, Connection, RootComponent};

#[derive(Parser)]
#[command(name = "render-backend")]
#[command(about = "Serve a demo component on a development server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 picks a free one), overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Adapter to use (axum or hyper), overrides the config file
    #[arg(short, long)]
    backend: Option<String>,
}

/// Shows where the client is and counts its clicks per session.
struct LocationDemo;

impl RootComponent for LocationDemo {
    fn render(&self, connection: &Connection<dyn Carrier>) -> Value {
        let clicks = connection
            .session_storage()
            .get("clicks")
            .unwrap_or_else(|| "0".to_string());
        json!({
            "tagName": "div",
            "children": [
                { "tagName": "h1", "children": [format!("Connection {}", connection.id())] },
                { "tagName": "p", "children": [format!("pathname: {}", connection.location().pathname())] },
                { "tagName": "p", "children": [format!("search: {}", connection.location().search())] },
                { "tagName": "p", "children": [format!("clicks: {}", clicks)] },
            ]
        })
    }

    fn handle_event(&self, connection: &Connection<dyn Carrier>, event: &Value) {
        if event.get("type").and_then(Value::as_str) == Some("click") {
            let storage = connection.session_storage();
            let clicks = storage
                .get("clicks")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            storage.set("clicks", (clicks + 1).to_string());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(backend) = cli.backend {
        config.server.backend = backend;
    }

    init_logging(&config.observability.log_level)?;
    tracing::info!("render-backend v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    let _signals = lifecycle::spawn_signal_handler(shutdown.clone());

    let component: Component = Arc::new(LocationDemo);
    lifecycle::run(&config, component, None, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
