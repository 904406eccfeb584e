//! History-mode navigation support.
//!
//! # Responsibilities
//! - Translate between full URLs and base-relative route paths
//! - Abstract the browser history stack behind the `History` trait
//! - Provide an in-memory stack with browser semantics
//!
//! # Design Decisions
//! - Entries store full URLs (base path included), like the browser does
//! - Pushing truncates any forward entries
//! - `go` never fabricates entries: out-of-range moves are refused

/// Path prefix the application is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePath {
    /// Normalized prefix without a trailing slash; empty for the root.
    prefix: String,
}

impl BasePath {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches('/');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Self { prefix }
    }

    pub fn root() -> Self {
        Self::new("/")
    }

    /// The prefix as it should appear in URLs (`/` for the root).
    pub fn as_str(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// Base-relative path of `url`, or `None` if the URL lies outside the base.
    pub fn strip<'a>(&self, url: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(url);
        }
        let rest = url.strip_prefix(&self.prefix)?;
        match rest.chars().next() {
            None => Some("/"),
            Some('/') => Some(rest),
            Some('?') | Some('#') => Some(rest),
            Some(_) => None,
        }
    }

    /// Full URL for a base-relative path.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.prefix, path)
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }
}

impl Default for BasePath {
    fn default() -> Self {
        Self::root()
    }
}

/// A session history stack.
pub trait History: Send {
    /// URL of the current entry.
    fn location(&self) -> &str;

    /// Add an entry after the current one, discarding forward entries.
    fn push(&mut self, url: String);

    /// Overwrite the current entry.
    fn replace(&mut self, url: String);

    /// Move the cursor by `delta`. Returns false if that entry does not exist.
    fn go(&mut self, delta: isize) -> bool;

    /// Index of the current entry.
    fn position(&self) -> usize;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process history stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl History for MemoryHistory {
    fn location(&self) -> &str {
        &self.entries[self.cursor]
    }

    fn push(&mut self, url: String) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(url);
        self.cursor += 1;
    }

    fn replace(&mut self, url: String) {
        self.entries[self.cursor] = url;
    }

    fn go(&mut self, delta: isize) -> bool {
        match self.cursor.checked_add_signed(delta) {
            Some(target) if target < self.entries.len() && delta != 0 => {
                self.cursor = target;
                true
            }
            _ => false,
        }
    }

    fn position(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
