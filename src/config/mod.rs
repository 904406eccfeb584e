//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, BASE_URL / NODE_ENV overlay)
//!     → validation.rs (semantic checks)
//!     → DevServerConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the proxy rule set
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only proxy rules are hot-swappable
//! - All fields have defaults reproducing the shipped setup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_default, ConfigError};
pub use schema::{
    BuildConfig, BuildMode, DevServerConfig, ObservabilityConfig, PathRewrites, ProxyLogLevel,
    ProxyRuleConfig, RouteConfig, ServerConfig,
};
pub use validation::ValidationError;
