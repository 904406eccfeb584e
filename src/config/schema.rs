//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dev server.
//! All types derive Serde traits for deserialization from config files, and the
//! defaults reproduce the application's shipped configuration.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Root configuration for the development server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Path prefix the application is served under (overridden by `BASE_URL`).
    pub base_path: String,

    /// Project root; route module paths are relative to it.
    pub root_dir: String,

    /// Listener settings.
    pub server: ServerConfig,

    /// Proxy rules, evaluated in order.
    pub proxy: Vec<ProxyRuleConfig>,

    /// Route table entries, registered in order.
    pub routes: Vec<RouteConfig>,

    /// Flags handed to the build tool.
    pub build: BuildConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            root_dir: ".".to_string(),
            server: ServerConfig::default(),
            proxy: vec![ProxyRuleConfig::default()],
            routes: vec![
                RouteConfig {
                    path: "/".to_string(),
                    name: "home".to_string(),
                    module: "src/views/HomeView.vue".to_string(),
                },
                RouteConfig {
                    path: "/viewer".to_string(),
                    name: "viewer".to_string(),
                    module: "src/views/Viewer.vue".to_string(),
                },
            ],
            build: BuildConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl DevServerConfig {
    /// The `host:port` pair to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// One forwarding rule for the dev-time API proxy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyRuleConfig {
    /// Path pattern that triggers forwarding. A leading `^` anchors it,
    /// which is also the behavior without one: matching is by prefix.
    pub context: String,

    /// Backend origin, e.g. `http://localhost:8000`.
    pub target: String,

    /// Rewrite Host/Origin to the target's.
    #[serde(default = "default_change_origin")]
    pub change_origin: bool,

    /// Prefix rewrites applied before forwarding (`pattern -> replacement`),
    /// tried in the order written.
    #[serde(default)]
    pub path_rewrite: PathRewrites,

    /// Verbosity of forwarding decisions.
    #[serde(default)]
    pub log_level: ProxyLogLevel,
}

fn default_change_origin() -> bool {
    true
}

impl Default for ProxyRuleConfig {
    fn default() -> Self {
        Self {
            context: "^/api".to_string(),
            target: "http://localhost:8000".to_string(),
            change_origin: true,
            path_rewrite: PathRewrites::from([("^/api", "")]),
            log_level: ProxyLogLevel::Debug,
        }
    }
}

/// Ordered `pattern -> replacement` pairs.
///
/// Written as a TOML table; entries keep their declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRewrites(Vec<(String, String)>);

impl PathRewrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(from, _)| from.as_str())
    }

    /// Replacement for an exact pattern.
    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(from, _)| from == pattern)
            .map(|(_, to)| to.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathRewrites {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for PathRewrites {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl Serialize for PathRewrites {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (from, to) in &self.0 {
            map.serialize_entry(from, to)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PathRewrites {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RewritesVisitor;

        impl<'de> Visitor<'de> for RewritesVisitor {
            type Value = PathRewrites;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of path prefix rewrites")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((from, to)) = access.next_entry::<String, String>()? {
                    entries.push((from, to));
                }
                Ok(PathRewrites(entries))
            }
        }

        deserializer.deserialize_map(RewritesVisitor)
    }
}

/// Log verbosity for proxy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyLogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Silent,
}

/// Route table entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Exact path, e.g. `/viewer`.
    pub path: String,

    /// Symbolic name used for named navigation.
    pub name: String,

    /// View module file, relative to `root_dir`.
    pub module: String,
}

/// Build mode, normally taken from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

/// Flags passed through to the build tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildConfig {
    pub mode: BuildMode,

    /// Keep the legacy options-style component API compiled in.
    pub options_api: bool,

    /// Compile devtools support into production bundles.
    pub prod_devtools: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::Development,
            options_api: true,
            prod_devtools: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
