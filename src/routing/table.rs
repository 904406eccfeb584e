//! Route table: registration and lookup.
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (shared via `Arc`)
//! - Registration is atomic: a colliding route leaves the table unchanged
//! - Lookup scans in registration order; first match wins
//! - Explicit `NotFound` rather than a silent default

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::RouteConfig;
use crate::error::DuplicateRouteError;
use crate::loader::{FileModule, ModuleSource};
use crate::routing::matcher::{ExactPath, PathMatcher};

/// A static binding from a URL path to a named, lazily loaded view module.
#[derive(Clone)]
pub struct Route {
    path: String,
    name: String,
    matcher: Arc<dyn PathMatcher>,
    source: Arc<dyn ModuleSource>,
}

impl Route {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        source: Arc<dyn ModuleSource>,
    ) -> Self {
        let path = path.into();
        Self {
            matcher: Arc::new(ExactPath::new(&path)),
            path,
            name: name.into(),
            source,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Arc<dyn ModuleSource> {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Result of a route lookup.
#[derive(Debug, Clone, Copy)]
pub enum RouteMatch<'a> {
    Found(&'a Route),
    NotFound,
}

impl<'a> RouteMatch<'a> {
    pub fn route(self) -> Option<&'a Route> {
        match self {
            RouteMatch::Found(route) => Some(route),
            RouteMatch::NotFound => None,
        }
    }
}

/// Serializable view of one table entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: String,
    pub name: String,
}

/// Ordered set of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configuration, with file-backed module sources
    /// resolved against `root_dir`.
    pub fn from_config(routes: &[RouteConfig], root_dir: &Path) -> Result<Self, DuplicateRouteError> {
        let mut table = Self::new();
        for entry in routes {
            let source = Arc::new(FileModule::new(root_dir.join(&entry.module)));
            table.register(Route::new(entry.path.clone(), entry.name.clone(), source))?;
        }
        Ok(table)
    }

    /// Add a route. Fails without modifying the table if its path or name is taken.
    pub fn register(&mut self, route: Route) -> Result<(), DuplicateRouteError> {
        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.matcher.key() == route.matcher.key())
        {
            return Err(DuplicateRouteError::Path(existing.path.clone()));
        }
        if self.routes.iter().any(|r| r.name == route.name) {
            return Err(DuplicateRouteError::Name(route.name));
        }

        tracing::debug!(path = %route.path, name = %route.name, "Route registered");
        self.routes.push(route);
        Ok(())
    }

    /// Find the first route matching `path`.
    pub fn resolve(&self, path: &str) -> RouteMatch<'_> {
        self.routes
            .iter()
            .find(|r| r.matches(path))
            .map_or(RouteMatch::NotFound, RouteMatch::Found)
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn describe(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|r| RouteInfo {
                path: r.path.clone(),
                name: r.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::from_fn;

    fn route(path: &str, name: &str) -> Route {
        Route::new(path, name, from_fn("static", || async { Ok(String::from("<div/>")) }))
    }

    fn app_table() -> RouteTable {
        let mut table = RouteTable::new();
        table.register(route("/", "home")).unwrap();
        table.register(route("/viewer", "viewer")).unwrap();
        table
    }

    #[test]
    fn test_every_route_resolves_to_itself() {
        let table = app_table();
        for r in table.iter() {
            let found = table.resolve(r.path()).route().unwrap();
            assert_eq!(found.name(), r.name());
        }
    }

    #[test]
    fn test_unknown_path_not_found() {
        let table = app_table();
        for path in ["/missing", "/viewer/1", "/api/users", "/homes"] {
            assert!(matches!(table.resolve(path), RouteMatch::NotFound), "{path}");
        }
    }

    #[test]
    fn test_duplicate_path_rejected_atomically() {
        let mut table = app_table();
        let err = table.register(route("/viewer/", "viewer2")).unwrap_err();
        assert_eq!(err, DuplicateRouteError::Path("/viewer".into()));
        assert_eq!(table.len(), 2);
        assert!(table.by_name("viewer2").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected_atomically() {
        let mut table = app_table();
        let err = table.register(route("/about", "home")).unwrap_err();
        assert_eq!(err, DuplicateRouteError::Name("home".into()));
        assert_eq!(table.len(), 2);
        assert!(matches!(table.resolve("/about"), RouteMatch::NotFound));
    }

    #[test]
    fn test_from_config_uses_registration_order() {
        let config = crate::config::DevServerConfig::default();
        let table = RouteTable::from_config(&config.routes, Path::new("/srv/app")).unwrap();

        assert_eq!(
            table.describe(),
            vec![
                RouteInfo { path: "/".into(), name: "home".into() },
                RouteInfo { path: "/viewer".into(), name: "viewer".into() },
            ]
        );
        let debug = format!("{:?}", table.by_name("viewer").unwrap());
        assert!(debug.contains("Viewer.vue"));
    }
}
