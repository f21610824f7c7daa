//! Backend adapter layer for a server-rendered UI library.
//!
//! Mounts a root component into a host web framework, builds one immutable
//! [`Connection`](connection::Connection) per client (scope, location and
//! storage handles), and runs a development server with a one-shot
//! started signal.

pub mod backend;
pub mod config;
pub mod connection;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use backend::{
    AnyApp, AnyBackend, AnyOptions, BackendError, BackendKind, BackendType, CommonOptions,
    Component, ConfigurationError, NeverStarted, RootComponent, Started, StartedListener,
};
pub use config::ServerConfig;
pub use connection::{Carrier, Connection, Location, MalformedConnectionError};
pub use lifecycle::Shutdown;
