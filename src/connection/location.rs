//! Location value type.
//!
//! # Responsibilities
//! - Hold the normalized path and query string of a connection's URL
//! - Enforce the `search` prefix invariant at construction time
//! - Parse request targets (origin-form and absolute-form)
//!
//! # Design Decisions
//! - Immutable once built; equality is structural
//! - A bare `?` with no parameters is normalized to an empty search
//! - Targets without a path (`*`, `host:port`) are rejected, never defaulted to `/`

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::connection::MalformedConnectionError;

/// Precondition violations when building a [`Location`] by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// `search` was non-empty and did not begin with `?`.
    #[error("search {0:?} must be empty or start with '?'")]
    SearchPrefix(String),

    /// `pathname` was non-empty and did not begin with `/`.
    #[error("pathname {0:?} must be empty or start with '/'")]
    PathnamePrefix(String),
}

/// The current location (URL) of a client connection.
///
/// Analogous to, but not identical to, the browser's `document.location`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pathname: String,
    search: String,
}

impl Location {
    /// Build a location from an already split path and query string.
    pub fn new(
        pathname: impl Into<String>,
        search: impl Into<String>,
    ) -> Result<Self, LocationError> {
        let pathname = pathname.into();
        let search = search.into();

        if !pathname.is_empty() && !pathname.starts_with('/') {
            return Err(LocationError::PathnamePrefix(pathname));
        }
        if !search.is_empty() && !search.starts_with('?') {
            return Err(LocationError::SearchPrefix(search));
        }

        Ok(Self { pathname, search })
    }

    /// Parse a request target into a location.
    ///
    /// Accepts origin-form (`/users?id=42`) and absolute-form
    /// (`http://host/users?id=42`). Fragments are dropped.
    pub fn parse(target: &str) -> Result<Self, MalformedConnectionError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(MalformedConnectionError::MissingTarget);
        }

        if target.starts_with('/') {
            return Ok(Self::from_origin_form(target));
        }

        let url = Url::parse(target).map_err(|e| MalformedConnectionError::Unparseable {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(MalformedConnectionError::Unparseable {
                target: target.to_string(),
                reason: "URL has no hierarchical path".to_string(),
            });
        }

        // The url crate only validates; the path and query are taken
        // verbatim so both target forms yield the same location.
        let after_scheme = target
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        let rest = match after_scheme.strip_prefix("//") {
            Some(authority_and_rest) => {
                let end = authority_and_rest
                    .find(['/', '?', '#'])
                    .unwrap_or(authority_and_rest.len());
                &authority_and_rest[end..]
            }
            None => after_scheme,
        };

        if rest.starts_with('/') {
            Ok(Self::from_origin_form(rest))
        } else {
            Ok(Self::from_origin_form(&format!("/{}", rest)))
        }
    }

    fn from_origin_form(target: &str) -> Self {
        let without_fragment = target.split('#').next().unwrap_or_default();
        match without_fragment.split_once('?') {
            Some((path, query)) => Self {
                pathname: path.to_string(),
                search: normalize_search(Some(query)),
            },
            None => Self {
                pathname: without_fragment.to_string(),
                search: String::new(),
            },
        }
    }

    /// The path of the URL.
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// The query string, either empty or starting with `?`.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Re-root this location under a mount prefix.
    ///
    /// Returns `None` when the pathname is not under `prefix`. The remaining
    /// path always starts with `/`.
    pub fn strip_prefix(&self, prefix: &str) -> Option<Self> {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Some(self.clone());
        }

        let rest = self.pathname.strip_prefix(prefix)?;
        let pathname = if rest.is_empty() {
            "/".to_string()
        } else if rest.starts_with('/') {
            rest.to_string()
        } else {
            // "/appx" is not under "/app"
            return None;
        };

        Some(Self {
            pathname,
            search: self.search.clone(),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pathname, self.search)
    }
}

fn normalize_search(query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("?{}", q),
        _ => String::new(),
    }
}
