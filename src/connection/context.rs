//! Per-connection context handed to the rendering engine.
//!
//! # Responsibilities
//! - Bundle location, scope, storage handles and the native carrier
//! - Parse the carrier's URL exactly once, at construction
//! - Reject connections without a usable URL instead of defaulting to `/`
//!
//! # Design Decisions
//! - Fields are private with getters only; a context never changes after `build()`
//! - The carrier is the last field so `&Connection<T>` coerces to
//!   `&Connection<dyn Carrier>`
//! - Storage is the only mutable-by-reference part, through its own handles

use thiserror::Error;

use crate::connection::carrier::Carrier;
use crate::connection::location::Location;
use crate::connection::scope::Scope;
use crate::connection::storage::{LocalStorage, SessionStorage};
use crate::connection::tracker::ConnectionId;

/// A connection whose carrier exposes no usable URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedConnectionError {
    /// The carrier has no request target at all.
    #[error("connection has no request target")]
    MissingTarget,

    /// The request target could not be parsed into a location.
    #[error("unparseable request target {target:?}: {reason}")]
    Unparseable { target: String, reason: String },

    /// The target is not under the route the connection was mounted on.
    #[error("request path {path:?} is outside mount prefix {prefix:?}")]
    OutsideMount { path: String, prefix: String },
}

/// A connection with a client.
#[derive(Debug)]
pub struct Connection<C: ?Sized> {
    id: ConnectionId,
    scope: Scope,
    location: Location,
    local_storage: LocalStorage,
    session_storage: SessionStorage,
    carrier: C,
}

impl<C: Carrier> Connection<C> {
    /// Start building a context around a native carrier.
    pub fn builder(carrier: C) -> ConnectionBuilder<C> {
        ConnectionBuilder {
            carrier,
            id: None,
            scope: Scope::new(),
            local_storage: None,
            session_storage: None,
            mount_prefix: String::new(),
        }
    }
}

impl<C: ?Sized> Connection<C> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Raw connection metadata (headers, protocol info).
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The current location (URL).
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn local_storage(&self) -> &LocalStorage {
        &self.local_storage
    }

    pub fn session_storage(&self) -> &SessionStorage {
        &self.session_storage
    }

    /// How the connection is mediated, e.g. a request or a WebSocket.
    pub fn carrier(&self) -> &C {
        &self.carrier
    }
}

/// Builder for [`Connection`].
#[derive(Debug)]
pub struct ConnectionBuilder<C> {
    carrier: C,
    id: Option<ConnectionId>,
    scope: Scope,
    local_storage: Option<LocalStorage>,
    session_storage: Option<SessionStorage>,
    mount_prefix: String,
}

impl<C: Carrier> ConnectionBuilder<C> {
    /// Use an id allocated earlier, e.g. to look up storage for it.
    pub fn id(mut self, id: ConnectionId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Bind the connection's storage collaborators.
    ///
    /// Without this call each store is a fresh in-memory one.
    pub fn storage(mut self, local: LocalStorage, session: SessionStorage) -> Self {
        self.local_storage = Some(local);
        self.session_storage = Some(session);
        self
    }

    /// Route the connection was mounted on; the location is re-rooted under it.
    pub fn mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    /// Parse the carrier's URL and freeze the context.
    pub fn build(self) -> Result<Connection<C>, MalformedConnectionError> {
        let parsed = {
            let target = self
                .carrier
                .target()
                .ok_or(MalformedConnectionError::MissingTarget)?;
            Location::parse(&target)?
        };

        let location = parsed.strip_prefix(&self.mount_prefix).ok_or_else(|| {
            MalformedConnectionError::OutsideMount {
                path: parsed.pathname().to_string(),
                prefix: self.mount_prefix.clone(),
            }
        })?;

        Ok(Connection {
            id: self.id.unwrap_or_default(),
            scope: self.scope,
            location,
            local_storage: self.local_storage.unwrap_or_else(LocalStorage::in_memory),
            session_storage: self
                .session_storage
                .unwrap_or_else(SessionStorage::in_memory),
            carrier: self.carrier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::carrier::WebSocketCarrier;
    use crate::connection::scope::ScopeType;
    use axum::http::{HeaderMap, Method, Request, Uri, Version};
    use std::sync::Arc;

    #[test]
    fn test_build_from_request() {
        let request = Request::builder()
            .uri("/users?id=42")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        let scope = Scope::from_parts(ScopeType::Http, &parts, None);

        let conn = Connection::builder(parts).scope(scope).build().unwrap();
        assert_eq!(conn.location(), &Location::new("/users", "?id=42").unwrap());
        assert_eq!(conn.scope().get_str("path"), Some("/users"));
        assert_eq!(conn.carrier().uri.path(), "/users");
    }

    #[test]
    fn test_mount_prefix_is_stripped() {
        let uri: Uri = "/app/_reactpy/stream/users?id=42".parse().unwrap();
        let conn = Connection::builder(uri)
            .mount_prefix("/app/_reactpy/stream")
            .build()
            .unwrap();
        assert_eq!(conn.location().pathname(), "/users");
        assert_eq!(conn.location().search(), "?id=42");
    }

    #[test]
    fn test_outside_mount_rejected() {
        let uri: Uri = "/other".parse().unwrap();
        let err = Connection::builder(uri)
            .mount_prefix("/app")
            .build()
            .unwrap_err();
        assert!(matches!(err, MalformedConnectionError::OutsideMount { .. }));
    }

    #[test]
    fn test_missing_target_not_defaulted_to_root() {
        let uri: Uri = "example.com:443".parse().unwrap();
        let err = Connection::builder(uri).build().unwrap_err();
        assert_eq!(err, MalformedConnectionError::MissingTarget);

        let uri: Uri = "*".parse().unwrap();
        let err = Connection::builder(uri).build().unwrap_err();
        assert!(matches!(err, MalformedConnectionError::Unparseable { .. }));
    }

    #[test]
    fn test_storage_is_bound() {
        let local = LocalStorage::in_memory();
        let session = SessionStorage::in_memory();
        local.set("theme", "dark");

        let uri: Uri = "/".parse().unwrap();
        let conn = Connection::builder(uri)
            .storage(local.clone(), session)
            .build()
            .unwrap();

        assert_eq!(conn.local_storage().get("theme").as_deref(), Some("dark"));
        conn.session_storage().set("k", "v");
        assert!(conn.local_storage().same_store(&local));
    }

    #[test]
    fn test_unsizes_to_dyn_carrier() {
        let carrier = WebSocketCarrier {
            method: Method::GET,
            uri: "/chat?room=1".parse().unwrap(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            peer: None,
        };
        let conn = Connection::builder(carrier).build().unwrap();
        let erased: &Connection<dyn Carrier> = &conn;

        assert_eq!(erased.location().to_string(), "/chat?room=1");
        let native = erased.carrier().downcast_ref::<WebSocketCarrier>().unwrap();
        assert_eq!(native.uri.path(), "/chat");
    }

    #[tokio::test]
    async fn test_concurrent_contexts_isolated() {
        let shared_local = LocalStorage::in_memory();
        let mut handles = Vec::new();

        for i in 0..64 {
            let local = shared_local.clone();
            handles.push(tokio::spawn(async move {
                let uri: Uri = format!("/item/{}?n={}", i, i).parse().unwrap();
                let conn = Arc::new(
                    Connection::builder(uri)
                        .storage(local, SessionStorage::in_memory())
                        .build()
                        .unwrap(),
                );
                conn.session_storage().set("owner", i.to_string());
                tokio::task::yield_now().await;

                // nothing another task did may show through this context
                assert_eq!(conn.location().pathname(), format!("/item/{}", i));
                assert_eq!(conn.location().search(), format!("?n={}", i));
                assert_eq!(conn.session_storage().get("owner"), Some(i.to_string()));
                assert_eq!(conn.session_storage().keys().len(), 1);
                conn.id()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 64);
    }
}
