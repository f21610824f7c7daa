//! Route layout under a mount prefix, and safe file lookup.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Client connection stream.
pub const STREAM_PATH: &str = "/_reactpy/stream";
/// Web modules served to the client.
pub const MODULES_PATH: &str = "/_reactpy/modules";
/// Static assets served to the client.
pub const ASSETS_PATH: &str = "/_reactpy/assets";

/// Route paths for one mounted component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPaths {
    pub prefix: String,
    pub stream: String,
    pub modules: String,
    pub assets: String,
}

impl MountPaths {
    pub fn new(url_prefix: &str) -> Self {
        Self {
            prefix: url_prefix.to_string(),
            stream: format!("{}{}", url_prefix, STREAM_PATH),
            modules: format!("{}{}", url_prefix, MODULES_PATH),
            assets: format!("{}{}", url_prefix, ASSETS_PATH),
        }
    }

    /// Index route: the prefix itself, or `/` at the root.
    pub fn index(&self) -> String {
        if self.prefix.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", self.prefix)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path {0:?} escapes its root directory")]
    Traversal(String),
}

/// Join `relative` onto `root`, refusing anything that could leave `root`.
///
/// Only plain path segments are accepted; `..`, absolute paths and drive
/// prefixes are rejected before touching the filesystem.
pub fn traversal_safe_path(root: &Path, relative: &str) -> Result<PathBuf, PathError> {
    let mut joined = root.to_path_buf();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => joined.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Traversal(relative.to_string()));
            }
        }
    }
    Ok(joined)
}
