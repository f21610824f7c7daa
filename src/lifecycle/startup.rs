//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Pick the adapter named in config
//! - Resolve the port (fixed, or first free one in the configured range)
//! - Create, configure and serve the development app
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when the mount is registered)

use thiserror::Error;

use crate::backend::{
    find_available_port, AnyBackend, BackendError, BackendKind, CommonOptions, Component, Started,
};
use crate::config::{validate_config, ConfigError, ServerConfig, ValidationError};

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Resolve the adapter named in `config`.
pub fn select_backend(config: &ServerConfig) -> Result<AnyBackend, ConfigError> {
    config
        .server
        .backend
        .parse::<BackendKind>()
        .map(AnyBackend::new)
        .map_err(|e| ConfigError::Validation(vec![ValidationError::new("server.backend", e)]))
}

/// Resolve the port to listen on; `0` probes the configured range.
pub fn select_port(config: &ServerConfig) -> Result<u16, BackendError> {
    if config.server.port != 0 {
        return Ok(config.server.port);
    }
    let [low, high] = config.server.port_range;
    find_available_port(&config.server.host, low..=high)
}

/// Serve `component` with the settings in `config` until `shutdown` resolves.
///
/// `started`, when given, fires with the bound address once the server
/// accepts connections.
pub async fn run<S>(
    config: &ServerConfig,
    component: Component,
    started: Option<Started>,
    shutdown: S,
) -> Result<(), StartupError>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    validate_config(config).map_err(ConfigError::Validation)?;

    let backend = select_backend(config)?;
    let port = select_port(config)?;
    let options = backend.options(CommonOptions::from_config(&config.mount));

    let mut app = backend.create_development_app()?;
    backend.configure(&mut app, component, Some(options))?;

    tracing::info!(
        backend = %backend.kind(),
        host = %config.server.host,
        port,
        url_prefix = %config.mount.url_prefix,
        "Starting development server"
    );

    backend
        .serve_development_app_until(app, &config.server.host, port, started, shutdown)
        .await?;

    tracing::info!("Development server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Carrier, Connection};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_select_backend() {
        let mut config = ServerConfig::default();
        assert_eq!(select_backend(&config).unwrap().kind(), BackendKind::Axum);

        config.server.backend = "Hyper".into();
        assert_eq!(select_backend(&config).unwrap().kind(), BackendKind::Hyper);

        config.server.backend = "flask".into();
        assert!(matches!(
            select_backend(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_select_port_fixed_or_from_range() {
        let mut config = ServerConfig::default();
        config.server.port = 8123;
        assert_eq!(select_port(&config).unwrap(), 8123);

        config.server.port = 0;
        config.server.port_range = [20000, 20100];
        let port = select_port(&config).unwrap();
        assert!((20000..=20100).contains(&port));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let mut config = ServerConfig::default();
        config.mount.url_prefix = "no-slash".into();
        let component: Component = Arc::new(|_: &Connection<dyn Carrier>| json!(null));

        let err = run(&config, component, None, async {}).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(ConfigError::Validation(_))));
    }
}
