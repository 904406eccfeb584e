//! Error taxonomy shared across the dev server.
//!
//! # Propagation
//! - Configuration errors (duplicate routes, invalid config) abort startup
//! - Load failures are folded into `NavigationState`; only an unknown route
//!   name is returned to the caller, before any state changes
//! - Proxy errors are contained to the single failed request (502)
//!
//! "Not found" is absent here: it is a resolution outcome
//! (`RouteMatch::NotFound`), not a failure.

use std::sync::Arc;

/// A route could not be registered because it collides with an existing one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuplicateRouteError {
    #[error("route path `{0}` is already registered")]
    Path(String),
    #[error("route name `{0}` is already registered")]
    Name(String),
}

/// Underlying reason a view module could not be produced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadFailure {
    /// The module source could not be fetched (I/O, network).
    #[error("fetch failed: {0}")]
    Fetch(Arc<std::io::Error>),

    /// The module was fetched but its contents are unusable.
    #[error("malformed module: {0}")]
    Malformed(String),

    /// The source reported that no module exists.
    #[error("module not found")]
    Missing,
}

impl From<std::io::Error> for LoadFailure {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => LoadFailure::Missing,
            std::io::ErrorKind::InvalidData => LoadFailure::Malformed(err.to_string()),
            _ => LoadFailure::Fetch(Arc::new(err)),
        }
    }
}

/// A lazy module load failed.
///
/// Cloneable so one in-flight load can report the same failure to every waiter.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to load module for route `{route}`: {cause}")]
pub struct ModuleLoadError {
    pub route: String,
    #[source]
    pub cause: LoadFailure,
}

/// A proxied request could not be delivered to the backend.
#[derive(Debug, thiserror::Error)]
pub enum GatewayForwardError {
    #[error("could not build upstream uri `{uri}`")]
    InvalidTarget { uri: String },

    #[error("upstream `{target}` unreachable: {source}")]
    Upstream {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// A navigation request could not be turned into a location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no route is named `{0}`")]
    UnknownRouteName(String),
}

/// The dev server could not be assembled from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Routes(#[from] DuplicateRouteError),

    #[error("invalid proxy rules: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Proxy(Vec<crate::config::ValidationError>),
}
