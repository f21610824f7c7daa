//! Error taxonomy for backend adapters.

use std::io;

use thiserror::Error;

use crate::backend::BackendKind;

/// Errors raised by the adapter operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// App or options did not fit the adapter. Not recoverable.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A development-only dependency is unavailable.
    #[error("environment error: {0}")]
    Environment(String),

    /// The dev server could not bind `host:port`.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The dev server failed after it started accepting.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

impl BackendError {
    /// True for a bind failure caused by the address already being in use.
    pub fn is_addr_in_use(&self) -> bool {
        matches!(self, BackendError::Bind { source, .. } if source.kind() == io::ErrorKind::AddrInUse)
    }
}

/// Mismatched or invalid inputs to `configure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The app is not the native application type of this adapter.
    #[error("expected a {expected} application, got a {actual} application")]
    AppMismatch {
        expected: BackendKind,
        actual: BackendKind,
    },

    /// The options were produced by another adapter's options constructor.
    #[error("expected {expected} options, got {actual} options")]
    OptionsMismatch {
        expected: BackendKind,
        actual: BackendKind,
    },

    /// `url_prefix` must be empty or start with '/' and not end with '/'.
    #[error("invalid url_prefix {0:?}: expected '' or a path like '/app'")]
    InvalidUrlPrefix(String),

    /// The mount's routes overlap routes the app already serves.
    #[error("routes under {prefix:?} conflict with the app: {reason}")]
    RouteConflict { prefix: String, reason: String },

    /// A component is already mounted at this prefix on the app.
    #[error("a component is already mounted at {0:?}")]
    AlreadyMounted(String),
}

/// Result type for adapter operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::from(ConfigurationError::AppMismatch {
            expected: BackendKind::Axum,
            actual: BackendKind::Hyper,
        });
        assert_eq!(
            err.to_string(),
            "configuration error: expected a axum application, got a hyper application"
        );

        let err = BackendError::Bind {
            addr: "127.0.0.1:80".into(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(err.is_addr_in_use());
        assert!(err.to_string().starts_with("failed to bind 127.0.0.1:80"));
    }
}
