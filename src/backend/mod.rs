//! Backend adapter subsystem.
//!
//! # Data Flow
//! ```text
//! Host process
//!     → any.rs (pick adapter by BackendKind)
//!     → create_development_app / existing native app
//!     → configure (options.rs validated, routes registered under paths.rs layout)
//!     → serve_development_app (serve.rs: Unbound → Binding → Accepting → Stopped|Failed)
//!
//! Per client connection:
//!     axum.rs / hyper.rs route handler
//!     → mount.rs (storage lookup, Connection<C> built once)
//!     → RootComponent::render(&Connection<dyn Carrier>)
//!     → layout-update sent to the client
//! ```
//!
//! # Design Decisions
//! - One trait, one implementation per framework, one enum to pick at runtime
//! - Each adapter owns its options type; foreign options are rejected
//! - Configuring the same prefix twice is an error, different prefixes coexist
//! - The started signal fires after bind and before the first accept

pub mod any;
pub mod axum;
pub mod error;
pub mod hyper;
pub mod index;
pub mod mount;
pub mod options;
pub mod paths;
pub mod serve;
pub mod started;
pub mod types;

pub use self::any::{AnyApp, AnyBackend, AnyOptions};
pub use self::axum::{AxumApp, AxumBackend, AxumOptions};
pub use self::error::{BackendError, BackendResult, ConfigurationError};
pub use self::hyper::{HyperApp, HyperBackend, HyperOptions};
pub use self::options::CommonOptions;
pub use self::serve::{find_available_port, ServerLifecycle, ServerState};
pub use self::started::{NeverStarted, Started, StartedListener};
pub use self::types::{BackendKind, BackendType, Component, RootComponent};
