//! Options shared by every adapter's options constructor.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::error::ConfigurationError;
use crate::backend::paths::MountPaths;
use crate::config::MountConfig;
use crate::connection::{MemoryStorageProvider, StorageProvider};

/// Configuration accepted by all adapters.
///
/// Adapters wrap this in their own options type so `configure` can tell
/// whose constructor produced a value.
#[derive(Clone)]
pub struct CommonOptions {
    url_prefix: String,
    serve_index_route: bool,
    head: String,
    web_modules_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    storage: Arc<dyn StorageProvider>,
}

impl CommonOptions {
    pub fn new() -> Self {
        Self {
            url_prefix: String::new(),
            serve_index_route: true,
            head: default_head(),
            web_modules_dir: None,
            assets_dir: None,
            storage: Arc::new(MemoryStorageProvider::new()),
        }
    }

    /// Build options from the `[mount]` config section.
    pub fn from_config(config: &MountConfig) -> Self {
        let mut options = Self::new()
            .url_prefix(config.url_prefix.clone())
            .serve_index_route(config.serve_index_route);
        if let Some(head) = &config.head {
            options = options.head(head.clone());
        }
        options.web_modules_dir = config.web_modules_dir.clone();
        options.assets_dir = config.assets_dir.clone();
        options
    }

    /// Prefix all routes with this path, e.g. `/app`.
    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Serve the client page at the prefix and every path below it.
    pub fn serve_index_route(mut self, serve: bool) -> Self {
        self.serve_index_route = serve;
        self
    }

    /// Raw HTML placed in the index page's `<head>`.
    pub fn head(mut self, head: impl Into<String>) -> Self {
        self.head = head.into();
        self
    }

    pub fn web_modules_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.web_modules_dir = Some(dir.into());
        self
    }

    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    /// Where each connection's local/session storage comes from.
    pub fn storage(mut self, provider: Arc<dyn StorageProvider>) -> Self {
        self.storage = provider;
        self
    }

    pub fn get_url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn get_serve_index_route(&self) -> bool {
        self.serve_index_route
    }

    pub fn get_head(&self) -> &str {
        &self.head
    }

    pub fn get_web_modules_dir(&self) -> Option<&PathBuf> {
        self.web_modules_dir.as_ref()
    }

    pub fn get_assets_dir(&self) -> Option<&PathBuf> {
        self.assets_dir.as_ref()
    }

    pub fn storage_provider(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    pub fn paths(&self) -> MountPaths {
        MountPaths::new(&self.url_prefix)
    }

    /// Check option values before any route is registered.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_url_prefix(&self.url_prefix)
    }
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommonOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonOptions")
            .field("url_prefix", &self.url_prefix)
            .field("serve_index_route", &self.serve_index_route)
            .field("head", &self.head)
            .field("web_modules_dir", &self.web_modules_dir)
            .field("assets_dir", &self.assets_dir)
            .finish_non_exhaustive()
    }
}

pub fn validate_url_prefix(prefix: &str) -> Result<(), ConfigurationError> {
    if prefix.is_empty() {
        return Ok(());
    }
    if !prefix.starts_with('/') || prefix.ends_with('/') || prefix.contains(['?', '#']) {
        return Err(ConfigurationError::InvalidUrlPrefix(prefix.to_string()));
    }
    Ok(())
}

fn default_head() -> String {
    "<title>ReactPy</title>".to_string()
}
