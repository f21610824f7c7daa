//! State shared by every route of one mounted component.

use serde_json::{json, Value};

use crate::backend::index::render_index;
use crate::backend::options::CommonOptions;
use crate::backend::paths::MountPaths;
use crate::backend::types::Component;
use crate::connection::{
    Carrier, Connection, ConnectionId, ConnectionTracker, MalformedConnectionError, Scope,
};
use crate::observability::metrics;

/// One component mounted under one url prefix.
pub struct MountState {
    pub component: Component,
    pub paths: MountPaths,
    pub options: CommonOptions,
    pub tracker: ConnectionTracker,
    index_html: String,
}

impl MountState {
    pub fn new(component: Component, options: CommonOptions) -> Self {
        let paths = options.paths();
        let index_html = render_index(&paths, options.get_head());
        Self {
            component,
            paths,
            options,
            tracker: ConnectionTracker::new(),
            index_html,
        }
    }

    pub fn index_html(&self) -> &str {
        &self.index_html
    }

    /// Build the context for a new stream connection.
    pub fn connect<C: Carrier>(
        &self,
        carrier: C,
        scope: Scope,
    ) -> Result<Connection<C>, MalformedConnectionError> {
        let id = ConnectionId::new();
        let (local, session) = self.options.storage_provider().storage_for(id);

        let result = Connection::builder(carrier)
            .id(id)
            .scope(scope)
            .storage(local, session)
            .mount_prefix(self.paths.stream.clone())
            .build();

        match &result {
            Ok(connection) => tracing::debug!(
                connection_id = %id,
                location = %connection.location(),
                "Connection context built"
            ),
            Err(e) => {
                metrics::connection_rejected();
                tracing::warn!(connection_id = %id, error = %e, "Rejected malformed connection");
            }
        }
        result
    }

    /// Render the component into a layout-update message.
    pub fn layout_update(&self, connection: &Connection<dyn Carrier>) -> Value {
        json!({
            "type": "layout-update",
            "path": "",
            "model": self.component.render(connection),
        })
    }
}

impl std::fmt::Debug for MountState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountState")
            .field("paths", &self.paths)
            .field("active_connections", &self.tracker.active_count())
            .finish_non_exhaustive()
    }
}
