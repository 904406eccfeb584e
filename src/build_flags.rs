//! Flags handed to the frontend build tool.
//!
//! Nothing here changes dev-server behavior except that production mode
//! leaves the API proxy out.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{BuildConfig, BuildMode};

/// Compile-time define for the options-style component API.
pub const OPTIONS_API_DEFINE: &str = "__VUE_OPTIONS_API__";

/// Compile-time define for devtools support in production bundles.
pub const PROD_DEVTOOLS_DEFINE: &str = "__VUE_PROD_DEVTOOLS__";

/// Resolved build flags.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BuildFlags {
    pub mode: BuildMode,
    pub minimize: bool,
    pub defines: BTreeMap<&'static str, bool>,
}

impl BuildFlags {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            mode: config.mode,
            minimize: config.mode == BuildMode::Production,
            defines: BTreeMap::from([
                (OPTIONS_API_DEFINE, config.options_api),
                (PROD_DEVTOOLS_DEFINE, config.prod_devtools),
            ]),
        }
    }

    /// Whether dev-only services (the API proxy) should run.
    pub fn is_development(&self) -> bool {
        self.mode == BuildMode::Development
    }
}
