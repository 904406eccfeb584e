//! Development server for the point-cloud viewer frontend.
//!
//! Routes URL paths to lazily loaded view modules with history-mode
//! navigation, and forwards `/api` requests to the backend during development.

pub mod build_flags;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod loader;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::DevServerConfig;
pub use http::DevServer;
pub use lifecycle::Shutdown;
