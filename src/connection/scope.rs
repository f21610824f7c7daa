//! Read-only metadata describing the raw connection.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri, Version};
use serde_json::{Map, Value};

/// The kind of transport a connection arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    Http,
    WebSocket,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Http => "http",
            ScopeType::WebSocket => "websocket",
        }
    }
}

/// Snapshot of connection metadata (headers, protocol info).
///
/// Built once by the adapter and only ever read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    entries: BTreeMap<String, Value>,
}

impl Scope {
    /// An empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope from the pieces of an HTTP request.
    pub fn from_request(
        kind: ScopeType,
        method: &Method,
        uri: &Uri,
        version: Version,
        headers: &HeaderMap,
        client: Option<SocketAddr>,
    ) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("type".to_string(), Value::from(kind.as_str()));
        entries.insert("method".to_string(), Value::from(method.as_str()));
        entries.insert("path".to_string(), Value::from(uri.path()));
        entries.insert(
            "query_string".to_string(),
            Value::from(uri.query().unwrap_or_default()),
        );
        entries.insert(
            "http_version".to_string(),
            Value::from(format!("{:?}", version)),
        );
        entries.insert("headers".to_string(), Value::Object(header_map(headers)));
        if let Some(addr) = client {
            entries.insert("client".to_string(), Value::from(addr.to_string()));
        }
        Self { entries }
    }

    /// Build a scope from request parts.
    pub fn from_parts(kind: ScopeType, parts: &Parts, client: Option<SocketAddr>) -> Self {
        Self::from_request(kind, &parts.method, &parts.uri, parts.version, &parts.headers, client)
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Look up a request header by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.get("headers")
            .and_then(|h| h.get(name.to_ascii_lowercase()))
            .and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Repeated headers are joined with ", ". Non-UTF-8 values are skipped.
fn header_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::from(joined));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_scope_from_parts() {
        let (parts, _) = Request::builder()
            .method("GET")
            .uri("/users?id=42")
            .header("Host", "example.com")
            .header("Accept", "text/html")
            .header("Accept", "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let scope = Scope::from_parts(ScopeType::WebSocket, &parts, Some(addr));

        assert_eq!(scope.get_str("type"), Some("websocket"));
        assert_eq!(scope.get_str("method"), Some("GET"));
        assert_eq!(scope.get_str("path"), Some("/users"));
        assert_eq!(scope.get_str("query_string"), Some("id=42"));
        assert_eq!(scope.get_str("http_version"), Some("HTTP/1.1"));
        assert_eq!(scope.get_str("client"), Some("127.0.0.1:5000"));
        assert_eq!(scope.header("HOST"), Some("example.com"));
        assert_eq!(scope.header("accept"), Some("text/html, application/json"));
    }

    #[test]
    fn test_scope_from_iter() {
        let scope: Scope = [("type".to_string(), Value::from("http"))]
            .into_iter()
            .collect();
        assert_eq!(scope.len(), 1);
        assert!(!scope.is_empty());
        assert!(scope.get("missing").is_none());
    }
}
