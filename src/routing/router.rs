//! Route lookup for one mounted component.
//!
//! # Responsibilities
//! - Compile a mount's paths into ordered matchers
//! - Look up the route for a request path
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Checked in fixed order: stream, modules, assets, index
//! - Explicit `None` rather than a silent default

use crate::backend::paths::MountPaths;
use crate::routing::matcher::{AnyMatcher, ExactMatcher, Matcher, PathPrefixMatcher};

/// What a request path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// Client stream.
    Stream,
    /// A web module file, relative to the modules directory.
    Module(String),
    /// A static asset file, relative to the assets directory.
    Asset(String),
    /// The client page.
    Index,
}

/// Compiled routes for one mount.
#[derive(Debug)]
pub struct MountRouter {
    prefix: String,
    stream: PathPrefixMatcher,
    modules: PathPrefixMatcher,
    assets: PathPrefixMatcher,
    index: Option<AnyMatcher>,
}

impl MountRouter {
    pub fn new(paths: &MountPaths, serve_index_route: bool) -> Self {
        let index = serve_index_route.then(|| {
            let mut matchers: Vec<Box<dyn Matcher>> =
                vec![Box::new(PathPrefixMatcher::new(paths.index()))];
            if !paths.prefix.is_empty() {
                matchers.push(Box::new(ExactMatcher::new(paths.prefix.clone())));
            }
            AnyMatcher::new(matchers)
        });

        Self {
            prefix: paths.prefix.clone(),
            stream: PathPrefixMatcher::new(paths.stream.clone()),
            modules: PathPrefixMatcher::new(paths.modules.clone()),
            assets: PathPrefixMatcher::new(paths.assets.clone()),
            index,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Find the route for `path`.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        if self.stream.matches(path) {
            return Some(RouteMatch::Stream);
        }
        if let Some(rest) = self.modules.remainder(path) {
            return Some(RouteMatch::Module(rest.to_string()));
        }
        if let Some(rest) = self.assets.remainder(path) {
            return Some(RouteMatch::Asset(rest.to_string()));
        }
        match &self.index {
            Some(index) if index.matches(path) => Some(RouteMatch::Index),
            _ => None,
        }
    }
}
