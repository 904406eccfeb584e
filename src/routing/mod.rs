//! Client-side routing subsystem.
//!
//! # Data Flow
//! ```text
//! URL change (navigate / replace / back / forward)
//!     → navigation.rs (token, base path, target → location)
//!     → table.rs (route lookup, first match wins)
//!     → matcher.rs (exact, non-strict, case-insensitive)
//!     → loader (lazy module, shared in-flight load)
//!     → history.rs (push / replace / nothing on pop)
//!     → NavigationState
//! ```
//!
//! # Design Decisions
//! - Route table compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Unknown paths are a state (NotFound), not an error

pub mod history;
pub mod matcher;
pub mod navigation;
pub mod table;

pub use history::{BasePath, History, MemoryHistory};
pub use matcher::{ExactPath, PathMatcher};
pub use navigation::{
    NavigationOutcome, NavigationResolver, NavigationState, NavigationStatus, NavigationTarget,
};
pub use table::{Route, RouteInfo, RouteMatch, RouteTable};
