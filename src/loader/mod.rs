//! Lazy view-module loading.
//!
//! # Data Flow
//! ```text
//! Navigation activates route
//!     → cache.rs (resolved? pending? start fetch)
//!     → module.rs (ModuleSource::fetch: disk, closure, ...)
//!     → ViewModule cached forever, or slot cleared on failure
//! ```

pub mod cache;
pub mod module;

pub use cache::{ModuleLoad, ModuleLoader};
pub use module::{from_fn, FileModule, FnModule, ModuleSource, SourceFuture, ViewModule};
