//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the development server host.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener and adapter selection.
    pub server: ListenerConfig,

    /// How the component is mounted.
    pub mount: MountConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "127.0.0.1").
    pub host: String,

    /// Port to bind. `0` means pick a free port from `port_range`.
    pub port: u16,

    /// Adapter to use: "axum" or "hyper".
    pub backend: String,

    /// Ports probed when `port` is 0, inclusive.
    pub port_range: [u16; 2],
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            backend: "axum".to_string(),
            port_range: [8000, 9000],
        }
    }
}

/// Mount options for the root component.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MountConfig {
    /// Prefix for all routes, "" or a path like "/app".
    pub url_prefix: String,

    /// Serve the client page at the prefix and below.
    pub serve_index_route: bool,

    /// Raw HTML for the page `<head>`.
    pub head: Option<String>,

    /// Directory served under `/_reactpy/modules`.
    pub web_modules_dir: Option<PathBuf>,

    /// Directory served under `/_reactpy/assets`.
    pub assets_dir: Option<PathBuf>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            url_prefix: String::new(),
            serve_index_route: true,
            head: None,
            web_modules_dir: None,
            assets_dir: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.backend, "axum");
        assert!(config.mount.serve_index_route);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 9001
            backend = "hyper"

            [mount]
            url_prefix = "/app"
            head = "<title>Demo</title>"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.backend, "hyper");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.mount.url_prefix, "/app");
        assert_eq!(config.mount.head.as_deref(), Some("<title>Demo</title>"));
        assert!(config.mount.serve_index_route);
    }
}
