//! Dev-time API proxy.
//!
//! # Data Flow
//! ```text
//! Request to dev server
//!     → rule.rs (first rule whose context prefixes the path)
//!     → forward.rs (rewrite path, override Host/Origin, send upstream)
//!     → backend response streamed back, or 502 on failure
//! ```
//!
//! # Design Decisions
//! - Installed only in development mode
//! - Failures are contained to the request; never retried

pub mod forward;
pub mod rule;

pub use forward::{DevProxy, HttpClient, Intercept};
pub use rule::{ProxyRule, ProxyTable};
