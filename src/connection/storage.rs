//! Client-scoped storage collaborators.
//!
//! # Responsibilities
//! - Define the key/value capability the rendering engine reads and writes
//! - Keep local and session storage as distinct handle types
//! - Provide an in-memory provider for development and tests
//!
//! # Design Decisions
//! - Handles are cheap to clone (`Arc` inside) and shared by reference
//! - Each operation is atomic on its own; multi-key updates are not
//! - Local storage outlives a connection, session storage does not

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::connection::tracker::ConnectionId;

/// Key/value capability scoped to one client.
pub trait ClientStorage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str) -> Option<String>;
    fn keys(&self) -> Vec<String>;
}

/// In-memory storage backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

macro_rules! storage_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<dyn ClientStorage>);

        impl $name {
            pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
                Self(storage)
            }

            /// A handle over a fresh, empty in-memory store.
            pub fn in_memory() -> Self {
                Self(Arc::new(MemoryStorage::new()))
            }

            pub fn get(&self, key: &str) -> Option<String> {
                self.0.get(key)
            }

            pub fn set(&self, key: &str, value: impl Into<String>) {
                self.0.set(key, value.into())
            }

            pub fn remove(&self, key: &str) -> Option<String> {
                self.0.remove(key)
            }

            pub fn keys(&self) -> Vec<String> {
                self.0.keys()
            }

            /// True when both handles point at the same underlying store.
            pub fn same_store(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("keys", &self.keys().len())
                    .finish()
            }
        }
    };
}

storage_handle!(
    /// Handle to the client's persistent storage (browser `localStorage`).
    LocalStorage
);

storage_handle!(
    /// Handle to the client's per-session storage (browser `sessionStorage`).
    SessionStorage
);

/// Hands out the storage pair bound to a new connection.
pub trait StorageProvider: Send + Sync + 'static {
    fn storage_for(&self, connection: ConnectionId) -> (LocalStorage, SessionStorage);
}

/// Development provider: one local store shared across the app, one fresh
/// session store per connection.
#[derive(Clone)]
pub struct MemoryStorageProvider {
    local: LocalStorage,
}

impl MemoryStorageProvider {
    pub fn new() -> Self {
        Self {
            local: LocalStorage::in_memory(),
        }
    }
}

impl Default for MemoryStorageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStorageProvider").finish_non_exhaustive()
    }
}

impl StorageProvider for MemoryStorageProvider {
    fn storage_for(&self, _connection: ConnectionId) -> (LocalStorage, SessionStorage) {
        (self.local.clone(), SessionStorage::in_memory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_ops() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set("theme", "dark".into());
        storage.set("lang", "en".into());
        assert_eq!(storage.get("theme").as_deref(), Some("dark"));
        assert_eq!(storage.keys(), vec!["lang", "theme"]);

        assert_eq!(storage.remove("theme").as_deref(), Some("dark"));
        assert_eq!(storage.get("theme"), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_provider_shares_local_not_session() {
        let provider = MemoryStorageProvider::new();
        let (local_a, session_a) = provider.storage_for(ConnectionId::new());
        let (local_b, session_b) = provider.storage_for(ConnectionId::new());

        assert!(local_a.same_store(&local_b));
        assert!(!session_a.same_store(&session_b));

        local_a.set("count", "1");
        assert_eq!(local_b.get("count").as_deref(), Some("1"));

        session_a.set("draft", "hello");
        assert_eq!(session_b.get("draft"), None);
    }
}
