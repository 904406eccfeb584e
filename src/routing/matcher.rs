//! Route path matching.
//!
//! # Design Decisions
//! - Matching is exact on the normalized path: case-insensitive, trailing
//!   slash optional, query and fragment ignored
//! - The `PathMatcher` trait is the seam for pattern routes; only exact
//!   matching is provided
//! - No regex, so matching stays O(n) in the path length

use std::fmt;

/// Trait for matching a location against a route.
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// Returns true if `path` (relative to the base path) selects this route.
    fn matches(&self, path: &str) -> bool;

    /// The canonical key two routes collide on.
    fn key(&self) -> &str;
}

/// Matches one exact path.
#[derive(Debug, Clone)]
pub struct ExactPath {
    normalized: String,
}

impl ExactPath {
    pub fn new(path: &str) -> Self {
        Self {
            normalized: normalize(path),
        }
    }
}

impl PathMatcher for ExactPath {
    fn matches(&self, path: &str) -> bool {
        normalize(path) == self.normalized
    }

    fn key(&self) -> &str {
        &self.normalized
    }
}

/// Drop query/fragment, lowercase, and remove trailing slashes (root stays `/`).
pub fn normalize(path: &str) -> String {
    let end = path.find(&['?', '#'][..]).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');

    let mut out = String::with_capacity(trimmed.len() + 1);
    if !trimmed.starts_with('/') {
        out.push('/');
    }
    out.push_str(&trimmed.to_lowercase());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matcher() {
        let matcher = ExactPath::new("/viewer");

        assert!(matcher.matches("/viewer"));
        assert!(matcher.matches("/viewer/"));
        assert!(matcher.matches("/Viewer"));
        assert!(matcher.matches("/viewer?file=scan.las"));
        assert!(matcher.matches("/viewer#top"));

        assert!(!matcher.matches("/viewer/3"));
        assert!(!matcher.matches("/view"));
        assert!(!matcher.matches("/"));
    }

    #[test]
    fn test_root_matcher() {
        let matcher = ExactPath::new("/");

        assert!(matcher.matches("/"));
        assert!(matcher.matches(""));
        assert!(matcher.matches("/?tab=1"));
        assert!(!matcher.matches("/viewer"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize("viewer"), "/viewer");
        assert_eq!(normalize("/A/B/"), "/a/b");
        assert_eq!(normalize("/x?y=/z"), "/x");
    }
}
