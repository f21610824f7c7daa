//! Tagged dispatch over the built-in adapters.
//!
//! Host code that picks an adapter at runtime (from config or a CLI flag)
//! works with these enums. Each value carries its adapter tag, so handing an
//! app or options from one adapter to another is caught in `configure`
//! before anything is registered.

use std::future::Future;

use crate::backend::axum::{AxumApp, AxumBackend, AxumOptions};
use crate::backend::error::{BackendResult, ConfigurationError};
use crate::backend::hyper::{HyperApp, HyperBackend, HyperOptions};
use crate::backend::options::CommonOptions;
use crate::backend::started::Started;
use crate::backend::types::{BackendKind, BackendType, Component};

/// One of the built-in adapters.
#[derive(Debug, Clone, Copy)]
pub enum AnyBackend {
    Axum(AxumBackend),
    Hyper(HyperBackend),
}

/// A native application of one of the built-in adapters.
#[derive(Debug)]
pub enum AnyApp {
    Axum(AxumApp),
    Hyper(HyperApp),
}

/// Options built by one of the built-in adapters' constructors.
#[derive(Debug, Clone)]
pub enum AnyOptions {
    Axum(AxumOptions),
    Hyper(HyperOptions),
}

impl AnyApp {
    pub fn kind(&self) -> BackendKind {
        match self {
            AnyApp::Axum(_) => BackendKind::Axum,
            AnyApp::Hyper(_) => BackendKind::Hyper,
        }
    }
}

impl From<AxumApp> for AnyApp {
    fn from(app: AxumApp) -> Self {
        AnyApp::Axum(app)
    }
}

impl From<HyperApp> for AnyApp {
    fn from(app: HyperApp) -> Self {
        AnyApp::Hyper(app)
    }
}

impl AnyOptions {
    pub fn kind(&self) -> BackendKind {
        match self {
            AnyOptions::Axum(_) => BackendKind::Axum,
            AnyOptions::Hyper(_) => BackendKind::Hyper,
        }
    }

    pub fn common(&self) -> &CommonOptions {
        match self {
            AnyOptions::Axum(options) => options.common(),
            AnyOptions::Hyper(options) => options.common(),
        }
    }
}

impl AnyBackend {
    pub fn new(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Axum => AnyBackend::Axum(AxumBackend),
            BackendKind::Hyper => AnyBackend::Hyper(HyperBackend),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            AnyBackend::Axum(_) => AxumBackend::KIND,
            AnyBackend::Hyper(_) => HyperBackend::KIND,
        }
    }

    /// This adapter's options constructor.
    pub fn options(&self, common: CommonOptions) -> AnyOptions {
        match self {
            AnyBackend::Axum(_) => AnyOptions::Axum(AxumOptions::new(common)),
            AnyBackend::Hyper(_) => AnyOptions::Hyper(HyperOptions::new(common)),
        }
    }

    /// Configure `app` to display `component`.
    ///
    /// Fails with a configuration error, leaving `app` untouched, when `app`
    /// or `options` belong to a different adapter.
    pub fn configure(
        &self,
        app: &mut AnyApp,
        component: Component,
        options: Option<AnyOptions>,
    ) -> BackendResult<()> {
        let expected = self.kind();
        if app.kind() != expected {
            return Err(ConfigurationError::AppMismatch {
                expected,
                actual: app.kind(),
            }
            .into());
        }

        match (self, app, options) {
            (AnyBackend::Axum(backend), AnyApp::Axum(app), None) => {
                backend.configure(app, component, None)
            }
            (AnyBackend::Axum(backend), AnyApp::Axum(app), Some(AnyOptions::Axum(options))) => {
                backend.configure(app, component, Some(options))
            }
            (AnyBackend::Hyper(backend), AnyApp::Hyper(app), None) => {
                backend.configure(app, component, None)
            }
            (AnyBackend::Hyper(backend), AnyApp::Hyper(app), Some(AnyOptions::Hyper(options))) => {
                backend.configure(app, component, Some(options))
            }
            (_, _, Some(options)) => Err(ConfigurationError::OptionsMismatch {
                expected,
                actual: options.kind(),
            }
            .into()),
            (_, app, None) => Err(ConfigurationError::AppMismatch {
                expected,
                actual: app.kind(),
            }
            .into()),
        }
    }

    /// Create an application instance for development purposes.
    pub fn create_development_app(&self) -> BackendResult<AnyApp> {
        match self {
            AnyBackend::Axum(backend) => backend.create_development_app().map(AnyApp::Axum),
            AnyBackend::Hyper(backend) => backend.create_development_app().map(AnyApp::Hyper),
        }
    }

    /// Run `app` on a development server until `shutdown` resolves.
    pub async fn serve_development_app_until<S>(
        &self,
        app: AnyApp,
        host: &str,
        port: u16,
        started: Option<Started>,
        shutdown: S,
    ) -> BackendResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        match (self, app) {
            (AnyBackend::Axum(backend), AnyApp::Axum(app)) => {
                backend
                    .serve_development_app_until(app, host, port, started, shutdown)
                    .await
            }
            (AnyBackend::Hyper(backend), AnyApp::Hyper(app)) => {
                backend
                    .serve_development_app_until(app, host, port, started, shutdown)
                    .await
            }
            (backend, app) => Err(ConfigurationError::AppMismatch {
                expected: backend.kind(),
                actual: app.kind(),
            }
            .into()),
        }
    }

    /// Run `app` on a development server; cancel by dropping the future.
    pub async fn serve_development_app(
        &self,
        app: AnyApp,
        host: &str,
        port: u16,
        started: Option<Started>,
    ) -> BackendResult<()> {
        self.serve_development_app_until(app, host, port, started, std::future::pending())
            .await
    }
}

impl Default for AnyBackend {
    fn default() -> Self {
        Self::new(BackendKind::default())
    }
}

impl From<BackendKind> for AnyBackend {
    fn from(kind: BackendKind) -> Self {
        Self::new(kind)
    }
}
