//! Framework-native objects that mediate a connection.
//!
//! A carrier is whatever the server framework hands the adapter for one
//! client: a request, the head of a WebSocket upgrade, a bare URI. The
//! rendering engine sees it only as `dyn Carrier` and may downcast when it
//! knows which adapter it runs under.

use std::any::Any;
use std::borrow::Cow;
use std::fmt::Debug;
use std::net::SocketAddr;

use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request, Uri, Version};

/// Opaque, framework-native request or socket object.
pub trait Carrier: Debug + Send + Sync + 'static {
    /// The request target as received, if the carrier has one.
    fn target(&self) -> Option<Cow<'_, str>>;

    /// Provides downcasting support for trait objects.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Carrier {
    /// Downcast to the concrete carrier type.
    pub fn downcast_ref<T: Carrier>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Request target of a URI: the full URI when absolute, otherwise path and query.
fn uri_target(uri: &Uri) -> Option<Cow<'_, str>> {
    if uri.scheme().is_some() {
        return Some(Cow::Owned(uri.to_string()));
    }
    uri.path_and_query()
        .map(|pq| Cow::Borrowed(pq.as_str()))
        .filter(|t| !t.is_empty())
}

impl Carrier for Uri {
    fn target(&self) -> Option<Cow<'_, str>> {
        uri_target(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Carrier for Parts {
    fn target(&self) -> Option<Cow<'_, str>> {
        uri_target(&self.uri)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<B> Carrier for Request<B>
where
    B: Debug + Send + Sync + 'static,
{
    fn target(&self) -> Option<Cow<'_, str>> {
        uri_target(self.uri())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The head of a WebSocket upgrade request, kept for the socket's lifetime.
#[derive(Debug, Clone)]
pub struct WebSocketCarrier {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub peer: Option<SocketAddr>,
}

impl Carrier for WebSocketCarrier {
    fn target(&self) -> Option<Cow<'_, str>> {
        uri_target(&self.uri)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
