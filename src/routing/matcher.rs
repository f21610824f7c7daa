//! Path matching logic.
//!
//! # Responsibilities
//! - Match exact paths
//! - Match path prefixes on segment boundaries
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/app` matches `/app` and `/app/x`, never `/apple`
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches one path exactly.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, path: &str) -> bool {
        path == self.path
    }
}

/// Matches a path prefix on segment boundaries.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. Trailing slashes are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// The part of `path` after the prefix, without its leading slash.
    pub fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        self.remainder(path).is_some()
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matcher() {
        let matcher = ExactMatcher::new("/app");
        assert!(matcher.matches("/app"));
        assert!(!matcher.matches("/app/"));
        assert!(!matcher.matches("/APP"));
    }

    #[test]
    fn test_path_prefix_matcher() {
        let matcher = PathPrefixMatcher::new("/app/_reactpy/stream");
        assert!(matcher.matches("/app/_reactpy/stream"));
        assert!(matcher.matches("/app/_reactpy/stream/users"));
        assert!(!matcher.matches("/app/_reactpy/streams"));
        assert!(!matcher.matches("/other"));

        assert_eq!(matcher.remainder("/app/_reactpy/stream/a/b"), Some("a/b"));
        assert_eq!(matcher.remainder("/app/_reactpy/stream"), Some(""));
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let matcher = PathPrefixMatcher::new("/");
        assert!(matcher.matches("/"));
        assert!(matcher.matches("/anything/here"));
        assert_eq!(matcher.remainder("/x/y"), Some("x/y"));
    }

    #[test]
    fn test_any_matcher() {
        let matcher = AnyMatcher::new(vec![
            Box::new(ExactMatcher::new("/app")),
            Box::new(PathPrefixMatcher::new("/app/")),
        ]);
        assert!(matcher.matches("/app"));
        assert!(matcher.matches("/app/page"));
        assert!(!matcher.matches("/apple"));
    }
}
