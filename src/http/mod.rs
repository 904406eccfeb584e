//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → proxy (path matches a rule → forwarded to backend)
//!     → views.rs (history-mode fallback → route table → module loader)
//!     → Send to client
//! ```

pub mod server;
pub mod views;

pub use server::{AppState, DevServer};
