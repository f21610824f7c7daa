//! axum integration.
//!
//! # Routes (under the options' url prefix)
//! - `/_reactpy/stream[/{*path}]`: WebSocket stream; the rest of the path
//!   becomes the connection's location
//! - `/_reactpy/modules/*`, `/_reactpy/assets/*`: static files, when configured
//! - `/` and `/{*path}`: client page, when `serve_index_route` is set
//!
//! # Design Decisions
//! - The native app wraps a `Router` and remembers which prefixes it mounted,
//!   because axum panics on duplicate routes
//! - Malformed stream requests get a 400 before the upgrade; the server keeps going
//! - Routes overlapping the host app's own routes are a `RouteConflict`, not a panic

use std::collections::BTreeSet;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::backend::error::{BackendError, BackendResult, ConfigurationError};
use crate::backend::mount::MountState;
use crate::backend::options::CommonOptions;
use crate::backend::serve::{ensure_dev_environment, ensure_dev_feature, ServerLifecycle};
use crate::backend::started::Started;
use crate::backend::types::{BackendKind, BackendType, Component};
use crate::connection::{Connection, Scope, ScopeType, WebSocketCarrier};

/// Options produced by [`AxumBackend::options`].
#[derive(Debug, Clone, Default)]
pub struct AxumOptions {
    common: CommonOptions,
}

impl AxumOptions {
    pub fn new(common: CommonOptions) -> Self {
        Self { common }
    }

    pub fn common(&self) -> &CommonOptions {
        &self.common
    }
}

/// Native application for the axum adapter.
#[derive(Debug, Default)]
pub struct AxumApp {
    router: Router,
    mounted: BTreeSet<String>,
}

impl AxumApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes that already have a component mounted.
    pub fn mounted_prefixes(&self) -> impl Iterator<Item = &str> {
        self.mounted.iter().map(String::as_str)
    }

    pub fn is_mounted(&self, prefix: &str) -> bool {
        self.mounted.contains(prefix)
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl From<Router> for AxumApp {
    fn from(router: Router) -> Self {
        Self {
            router,
            mounted: BTreeSet::new(),
        }
    }
}

/// Connection context handed to axum stream handlers.
type AxumConnection = Connection<<AxumBackend as BackendType>::Carrier>;

/// Backend adapter for axum.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxumBackend;

impl BackendType for AxumBackend {
    type App = AxumApp;
    type Options = AxumOptions;
    type Carrier = WebSocketCarrier;

    const KIND: BackendKind = BackendKind::Axum;

    fn options(&self) -> AxumOptions {
        AxumOptions::default()
    }

    fn configure(
        &self,
        app: &mut AxumApp,
        component: Component,
        options: Option<AxumOptions>,
    ) -> BackendResult<()> {
        let common = options.unwrap_or_default().common;
        common.validate()?;

        let prefix = common.get_url_prefix().to_string();
        if app.is_mounted(&prefix) {
            return Err(ConfigurationError::AlreadyMounted(prefix).into());
        }

        let mount = Arc::new(MountState::new(component, common));
        let routes = mount_routes(mount);
        app.router = merge_routes(&app.router, routes, &prefix)?;
        app.mounted.insert(prefix.clone());

        tracing::info!(backend = %Self::KIND, url_prefix = %prefix, "Component mounted");
        Ok(())
    }

    fn create_development_app(&self) -> BackendResult<AxumApp> {
        ensure_dev_feature()?;
        Ok(AxumApp::new())
    }

    fn serve_development_app_until<S>(
        &self,
        app: AxumApp,
        host: &str,
        port: u16,
        started: Option<Started>,
        shutdown: S,
    ) -> impl Future<Output = BackendResult<()>> + Send
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let host = host.to_string();
        async move {
            ensure_dev_environment()?;
            let mut lifecycle = ServerLifecycle::new(started);
            let listener = lifecycle.bind(&host, port).await?;

            let service = app
                .into_router()
                .layer(TraceLayer::new_for_http())
                .into_make_service_with_connect_info::<SocketAddr>();

            let result = axum::serve(listener, service)
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(BackendError::Serve);
            lifecycle.finish(result)
        }
    }
}

/// Merge `routes` into a copy of `existing`.
///
/// axum panics when two routers claim the same path; that panic is turned
/// into a configuration error and `existing` is left as it was.
fn merge_routes(existing: &Router, routes: Router, prefix: &str) -> BackendResult<Router> {
    let base = existing.clone();
    panic::catch_unwind(AssertUnwindSafe(move || base.merge(routes))).map_err(|payload| {
        let reason = payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "overlapping routes".to_string());
        tracing::warn!(url_prefix = %prefix, reason = %reason, "Mount conflicts with existing routes");
        BackendError::from(ConfigurationError::RouteConflict {
            prefix: prefix.to_string(),
            reason,
        })
    })
}

fn mount_routes(mount: Arc<MountState>) -> Router {
    let paths = mount.paths.clone();
    let options = mount.options.clone();

    let mut router = Router::new()
        .route(&paths.stream, get(stream_handler))
        .route(&format!("{}/{{*path}}", paths.stream), get(stream_handler));

    if let Some(dir) = options.get_web_modules_dir() {
        router = router.nest_service(&paths.modules, ServeDir::new(dir));
    }
    if let Some(dir) = options.get_assets_dir() {
        router = router.nest_service(&paths.assets, ServeDir::new(dir));
    }

    if options.get_serve_index_route() {
        router = router
            .route(&paths.index(), get(index_handler))
            .route(&format!("{}/{{*path}}", paths.prefix), get(index_handler));
        if !paths.prefix.is_empty() {
            router = router.route(&paths.prefix, get(index_handler));
        }
    }

    router.with_state(mount)
}

async fn index_handler(State(mount): State<Arc<MountState>>) -> Html<String> {
    Html(mount.index_html().to_string())
}

async fn stream_handler(State(mount): State<Arc<MountState>>, request: Request) -> Response {
    let (mut parts, _body) = request.into_parts();
    let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &mount).await {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let scope = Scope::from_parts(ScopeType::WebSocket, &parts, peer);
    let carrier = WebSocketCarrier {
        method: parts.method,
        uri: parts.uri,
        version: parts.version,
        headers: parts.headers,
        peer,
    };

    let connection: AxumConnection = match mount.connect(carrier, scope) {
        Ok(connection) => connection,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    ws.on_upgrade(move |socket| run_stream(socket, mount, connection))
}

async fn run_stream(
    mut socket: WebSocket,
    mount: Arc<MountState>,
    connection: AxumConnection,
) {
    let _guard = mount.tracker.track(connection.id());
    tracing::info!(
        connection_id = %connection.id(),
        location = %connection.location(),
        "Client connected"
    );

    if send_update(&mut socket, &mount, &connection).await.is_err() {
        return;
    }

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<Value>(text.as_str()) {
                Ok(event) => {
                    mount.component.handle_event(&connection, &event);
                    if send_update(&mut socket, &mount, &connection).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection.id(), error = %e, "Ignoring malformed event");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection.id(), error = %e, "Stream receive failed");
                break;
            }
        }
    }

    tracing::info!(connection_id = %connection.id(), "Client disconnected");
}

async fn send_update(
    socket: &mut WebSocket,
    mount: &MountState,
    connection: &AxumConnection,
) -> Result<(), axum::Error> {
    let update = mount.layout_update(connection);
    socket.send(Message::Text(update.to_string().into())).await
}
