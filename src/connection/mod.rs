//! Connection value model.
//!
//! # Data Flow
//! ```text
//! Framework-native request / socket (carrier)
//!     → carrier.rs (expose the request target)
//!     → location.rs (parse target once into pathname + search)
//!     → scope.rs (snapshot headers and protocol info)
//!     → storage.rs (bind local/session storage for the client)
//!     → context.rs (freeze into Connection<C>)
//!     → Rendering engine borrows &Connection<dyn Carrier>
//! ```
//!
//! # Design Decisions
//! - One context per physical connection, never shared or mutated
//! - Malformed URLs reject the single connection, never the server
//! - Engine code is carrier-agnostic; adapters choose the carrier type

pub mod carrier;
pub mod context;
pub mod location;
pub mod scope;
pub mod storage;
pub mod tracker;

pub use carrier::{Carrier, WebSocketCarrier};
pub use context::{Connection, ConnectionBuilder, MalformedConnectionError};
pub use location::{Location, LocationError};
pub use scope::{Scope, ScopeType};
pub use storage::{
    ClientStorage, LocalStorage, MemoryStorage, MemoryStorageProvider, SessionStorage,
    StorageProvider,
};
pub use tracker::{ConnectionGuard, ConnectionId, ConnectionTracker};
