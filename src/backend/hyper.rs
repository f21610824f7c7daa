//! Raw hyper integration.
//!
//! # Routes (under the options' url prefix)
//! - `GET /_reactpy/stream[/...]`: one layout-update snapshot
//! - `POST /_reactpy/stream[/...]`: dispatch a JSON event, then snapshot
//! - `/_reactpy/modules/*`, `/_reactpy/assets/*`: static files, when configured
//! - `/` and everything below it: client page, when `serve_index_route` is set
//!
//! # Design Decisions
//! - Every HTTP request is its own connection context
//! - Mounts are checked longest prefix first
//! - File lookups go through `traversal_safe_path`
//! - Event bodies are read through a length limit, never fully buffered first
//! - Stopping drains open connections after the listener is released

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{self, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::backend::error::{BackendError, BackendResult, ConfigurationError};
use crate::backend::mount::MountState;
use crate::backend::options::CommonOptions;
use crate::backend::paths::traversal_safe_path;
use crate::backend::serve::{ensure_dev_environment, ensure_dev_feature, ServerLifecycle};
use crate::backend::started::Started;
use crate::backend::types::{BackendKind, BackendType, Component};
use crate::connection::{Connection, Scope, ScopeType};
use crate::routing::{MountRouter, RouteMatch};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How long a stopping server waits for open connections.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest event body accepted on the stream route.
const MAX_EVENT_BYTES: usize = 64 * 1024;

/// Options produced by [`HyperBackend::options`].
#[derive(Debug, Clone, Default)]
pub struct HyperOptions {
    common: CommonOptions,
}

impl HyperOptions {
    pub fn new(common: CommonOptions) -> Self {
        Self { common }
    }

    pub fn common(&self) -> &CommonOptions {
        &self.common
    }
}

#[derive(Debug)]
struct HyperMount {
    state: MountState,
    router: MountRouter,
}

/// Native application for the hyper adapter: a list of mounted components.
#[derive(Debug, Clone, Default)]
pub struct HyperApp {
    mounts: Vec<Arc<HyperMount>>,
}

impl HyperApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted_prefixes(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|m| m.router.prefix())
    }

    pub fn is_mounted(&self, prefix: &str) -> bool {
        self.mounted_prefixes().any(|p| p == prefix)
    }

    /// Answer one request.
    pub async fn handle<B>(&self, request: Request<B>, peer: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let path = request.uri().path().to_string();
        let routed = self
            .mounts
            .iter()
            .find_map(|mount| mount.router.match_path(&path).map(|route| (mount, route)));

        let Some((mount, route)) = routed else {
            return text_response(StatusCode::NOT_FOUND, "Not Found");
        };

        match route {
            RouteMatch::Stream => handle_stream(&mount.state, request, peer).await,
            RouteMatch::Index => html_response(mount.state.index_html()),
            RouteMatch::Module(rest) => match mount.state.options.get_web_modules_dir() {
                Some(root) => serve_file(root, &rest).await,
                None => text_response(StatusCode::NOT_FOUND, "Not Found"),
            },
            RouteMatch::Asset(rest) => match mount.state.options.get_assets_dir() {
                Some(root) => serve_file(root, &rest).await,
                None => text_response(StatusCode::NOT_FOUND, "Not Found"),
            },
        }
    }
}

/// Connection context for one hyper request.
type HyperConnection = Connection<<HyperBackend as BackendType>::Carrier>;

/// Backend adapter for a bare hyper server.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperBackend;

impl BackendType for HyperBackend {
    type App = HyperApp;
    type Options = HyperOptions;
    type Carrier = Parts;

    const KIND: BackendKind = BackendKind::Hyper;

    fn options(&self) -> HyperOptions {
        HyperOptions::default()
    }

    fn configure(
        &self,
        app: &mut HyperApp,
        component: Component,
        options: Option<HyperOptions>,
    ) -> BackendResult<()> {
        let common = options.unwrap_or_default().common;
        common.validate()?;

        let prefix = common.get_url_prefix().to_string();
        if app.is_mounted(&prefix) {
            return Err(ConfigurationError::AlreadyMounted(prefix).into());
        }

        let router = MountRouter::new(&common.paths(), common.get_serve_index_route());
        let mount = HyperMount {
            state: MountState::new(component, common),
            router,
        };
        app.mounts.push(Arc::new(mount));
        app.mounts
            .sort_by(|a, b| b.router.prefix().len().cmp(&a.router.prefix().len()));

        tracing::info!(backend = %Self::KIND, url_prefix = %prefix, "Component mounted");
        Ok(())
    }

    fn create_development_app(&self) -> BackendResult<HyperApp> {
        ensure_dev_feature()?;
        Ok(HyperApp::new())
    }

    fn serve_development_app_until<S>(
        &self,
        app: HyperApp,
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

            let result = accept_loop(listener, Arc::new(app), shutdown).await;
            lifecycle.finish(result)
        }
    }
}

/// Accept until `shutdown` resolves, then drain open connections.
///
/// The listener is dropped before draining, so the port is free while
/// in-flight requests finish.
async fn accept_loop<S>(listener: TcpListener, app: Arc<HyperApp>, shutdown: S) -> BackendResult<()>
where
    S: Future<Output = ()> + Send,
{
    tokio::pin!(shutdown);
    let builder = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) if is_transient(&e) => {
                    tracing::debug!(error = %e, "Transient accept error");
                    continue;
                }
                Err(e) => return Err(BackendError::Serve(e)),
            }
        };

        let app = Arc::clone(&app);
        let service = service_fn(move |request| {
            let app = Arc::clone(&app);
            async move { Ok::<_, Infallible>(app.handle(request, Some(peer)).await) }
        });

        let connection = builder
            .serve_connection(TokioIo::new(stream), service)
            .into_owned();
        let connection = graceful.watch(connection);
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(peer_addr = %peer, error = %e, "Connection ended with error");
            }
        });
    }

    drop(listener);
    if tokio::time::timeout(DRAIN_TIMEOUT, graceful.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(timeout = ?DRAIN_TIMEOUT, "Connections still open after drain timeout");
    }
    Ok(())
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset | io::ErrorKind::Interrupted
    )
}

async fn handle_stream<B>(mount: &MountState, request: Request<B>, peer: Option<SocketAddr>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = request.into_parts();

    let event = match &parts.method {
        &Method::GET => None,
        &Method::POST => match read_event(body).await {
            Ok(event) => Some(event),
            Err((status, message)) => return text_response(status, &message),
        },
        _ => return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    };

    let scope = Scope::from_parts(ScopeType::Http, &parts, peer);
    let connection: HyperConnection = match mount.connect(parts, scope) {
        Ok(connection) => connection,
        Err(e) => return text_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    let _guard = mount.tracker.track(connection.id());

    if let Some(event) = event {
        mount.component.handle_event(&connection, &event);
    }
    json_response(&mount.layout_update(&connection))
}

async fn read_event<B>(body: B) -> Result<Value, (StatusCode, String)>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let bytes = match Limited::new(body, MAX_EVENT_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return Err((StatusCode::PAYLOAD_TOO_LARGE, "event body too large".to_string()));
        }
        Err(e) => {
            return Err((StatusCode::BAD_REQUEST, format!("failed to read body: {}", e)));
        }
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid event: {}", e)))
}

async fn serve_file(root: &Path, relative: &str) -> Response<Full<Bytes>> {
    let path = match traversal_safe_path(root, relative) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected file request");
            return text_response(StatusCode::NOT_FOUND, "Not Found");
        }
    };

    match tokio::fs::read(&path).await {
        Ok(contents) => {
            let mut response = Response::new(Full::new(Bytes::from(contents)));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&path)),
            );
            response
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "File not served");
            text_response(StatusCode::NOT_FOUND, "Not Found")
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") | Some("mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn html_response(body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn json_response(value: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(value.to_string())));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Carrier, Connection};
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Counter {
        clicks: AtomicU64,
    }

    impl crate::backend::RootComponent for Counter {
        fn render(&self, connection: &Connection<dyn Carrier>) -> Value {
            json!({
                "path": connection.location().pathname(),
                "search": connection.location().search(),
                "clicks": self.clicks.load(Ordering::SeqCst),
                "method": connection.carrier().downcast_ref::<Parts>().map(|p| p.method.as_str()),
            })
        }

        fn handle_event(&self, _connection: &Connection<dyn Carrier>, event: &Value) {
            if event["type"] == "click" {
                self.clicks.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn app_with(options: CommonOptions) -> HyperApp {
        let backend = HyperBackend;
        let mut app = backend.create_development_app().unwrap();
        let component = Arc::new(Counter {
            clicks: AtomicU64::new(0),
        });
        backend
            .configure(&mut app, component, Some(HyperOptions::new(options)))
            .unwrap();
        app
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::get(uri).body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_stream_snapshot_location() {
        let app = app_with(CommonOptions::new().url_prefix("/app"));

        let response = app.handle(get("/app/_reactpy/stream/users?id=42"), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let update = body_json(response).await;
        assert_eq!(update["type"], "layout-update");
        assert_eq!(update["model"]["path"], "/users");
        assert_eq!(update["model"]["search"], "?id=42");
        assert_eq!(update["model"]["method"], "GET");
    }

    #[tokio::test]
    async fn test_stream_event_then_render() {
        let app = app_with(CommonOptions::new());

        let request = Request::post("/_reactpy/stream")
            .body(Full::new(Bytes::from(r#"{"type":"click"}"#)))
            .unwrap();
        let update = body_json(app.handle(request, None).await).await;
        assert_eq!(update["model"]["clicks"], 1);
        assert_eq!(update["model"]["path"], "/");
    }

    #[tokio::test]
    async fn test_stream_bad_event_rejected() {
        let app = app_with(CommonOptions::new());
        let request = Request::post("/_reactpy/stream")
            .body(Full::new(Bytes::from("not json")))
            .unwrap();
        let response = app.handle(request, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::delete("/_reactpy/stream")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = app.handle(request, None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_stream_oversized_event_rejected() {
        let app = app_with(CommonOptions::new());

        let request = Request::post("/_reactpy/stream")
            .body(Full::new(Bytes::from(vec![b' '; MAX_EVENT_BYTES + 1])))
            .unwrap();
        let response = app.handle(request, None).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        // Chunked body without a length hint is cut off at the limit too.
        let chunks = futures_util::stream::iter((0..100).map(|_| {
            Ok::<_, Infallible>(hyper::body::Frame::data(Bytes::from(vec![b' '; 1024])))
        }));
        let request = Request::post("/_reactpy/stream")
            .body(http_body_util::StreamBody::new(chunks))
            .unwrap();
        let response = app.handle(request, None).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let request = Request::post("/_reactpy/stream")
            .body(Full::new(Bytes::from(r#"{"type":"click"}"#)))
            .unwrap();
        assert_eq!(app.handle(request, None).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_and_not_found() {
        let app = app_with(CommonOptions::new().url_prefix("/ui").head("<title>Hyper</title>"));

        let response = app.handle(get("/ui/some/page"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("<title>Hyper</title>"));

        let response = app.handle(get("/elsewhere"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let backend = HyperBackend;
        let mut app = app_with(CommonOptions::new());
        let nested: Component = Arc::new(|_: &Connection<dyn Carrier>| json!("nested"));
        backend
            .configure(
                &mut app,
                nested,
                Some(HyperOptions::new(CommonOptions::new().url_prefix("/nested"))),
            )
            .unwrap();

        let update = body_json(app.handle(get("/nested/_reactpy/stream"), None).await).await;
        assert_eq!(update["model"], "nested");

        let update = body_json(app.handle(get("/_reactpy/stream/nested"), None).await).await;
        assert_eq!(update["model"]["path"], "/nested");
    }

    #[tokio::test]
    async fn test_module_files_served_safely() {
        let dir = std::env::temp_dir().join(format!("render-backend-modules-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("widget.js"), "export default 1;").await.unwrap();

        let app = app_with(CommonOptions::new().web_modules_dir(&dir));

        let response = app.handle(get("/_reactpy/modules/widget.js"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/javascript");

        let response = app.handle(get("/_reactpy/modules/../secret"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.handle(get("/_reactpy/assets/widget.js"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_configure_twice_same_prefix_errors() {
        let backend = HyperBackend;
        let mut app = app_with(CommonOptions::new());
        let component: Component = Arc::new(|_: &Connection<dyn Carrier>| json!(null));

        let err = backend.configure(&mut app, component, None).unwrap_err();
        assert!(matches!(
            err,
            BackendError::Configuration(ConfigurationError::AlreadyMounted(_))
        ));
        assert_eq!(app.mounted_prefixes().count(), 1);
    }
}
