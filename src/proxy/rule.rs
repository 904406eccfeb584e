//! Compiled proxy rules.
//!
//! # Responsibilities
//! - Match request paths against a rule's context prefix
//! - Rewrite the matched prefix before forwarding
//! - Build the upstream URL on the rule's target origin
//!
//! # Design Decisions
//! - Contexts and rewrite patterns are anchored prefixes (`^/api` ≡ `/api`)
//! - Rewrites are tried in declaration order; the first matching one applies
//! - Rules are immutable; a config reload compiles a whole new table

use url::Url;

use crate::config::validation::{validate_proxy_rules, ValidationError};
use crate::config::{ProxyLogLevel, ProxyRuleConfig};

/// One compiled forwarding rule.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    context: String,
    origin: String,
    authority: String,
    rewrites: Vec<(String, String)>,
    change_origin: bool,
    log_level: ProxyLogLevel,
}

impl ProxyRule {
    /// Compile a rule from validated configuration.
    pub fn compile(index: usize, config: &ProxyRuleConfig) -> Result<Self, ValidationError> {
        let target_error = |reason: String| ValidationError::ProxyTarget {
            index,
            target: config.target.clone(),
            reason,
        };
        let url = Url::parse(&config.target).map_err(|e| target_error(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| target_error("missing host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            context: anchored(&config.context).to_string(),
            origin: format!("{}://{}", url.scheme(), authority),
            authority,
            rewrites: config
                .path_rewrite
                .iter()
                .map(|(from, to)| (anchored(from).to_string(), to.to_string()))
                .collect(),
            change_origin: config.change_origin,
            log_level: config.log_level,
        })
    }

    /// Whether a request path is intercepted by this rule.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.context)
    }

    /// Apply the first matching rewrite. The result always starts with `/`.
    pub fn rewrite_path(&self, path: &str) -> String {
        let rewritten = self
            .rewrites
            .iter()
            .find_map(|(from, to)| path.strip_prefix(from.as_str()).map(|rest| format!("{to}{rest}")))
            .unwrap_or_else(|| path.to_string());

        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{rewritten}")
        }
    }

    /// Upstream URL for a request's path and query.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let path = self.rewrite_path(path);
        match query {
            Some(q) => format!("{}{}?{}", self.origin, path, q),
            None => format!("{}{}", self.origin, path),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Target origin, e.g. `http://localhost:8000`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Target `host[:port]`, used as the Host header when origin override is on.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    /// Whether a message at `level` should be logged under this rule.
    pub fn permits(&self, level: ProxyLogLevel) -> bool {
        rank(level) >= rank(self.log_level) && self.log_level != ProxyLogLevel::Silent
    }
}

fn anchored(pattern: &str) -> &str {
    pattern.strip_prefix('^').unwrap_or(pattern)
}

fn rank(level: ProxyLogLevel) -> u8 {
    match level {
        ProxyLogLevel::Debug => 0,
        ProxyLogLevel::Info => 1,
        ProxyLogLevel::Warn => 2,
        ProxyLogLevel::Error => 3,
        ProxyLogLevel::Silent => 4,
    }
}

/// Ordered proxy rules; first match wins.
#[derive(Debug, Clone, Default)]
pub struct ProxyTable {
    rules: Vec<ProxyRule>,
}

impl ProxyTable {
    pub fn from_config(rules: &[ProxyRuleConfig]) -> Result<Self, Vec<ValidationError>> {
        validate_proxy_rules(rules)?;
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| ProxyRule::compile(index, rule))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| vec![e])?;
        Ok(Self { rules })
    }

    /// The first rule intercepting `path`, logging the decision.
    pub fn find(&self, path: &str) -> Option<&ProxyRule> {
        let found = self.rules.iter().find(|rule| rule.matches(path));
        match found {
            Some(rule) => {
                if rule.permits(ProxyLogLevel::Debug) {
                    tracing::debug!(path = %path, context = %rule.context, target = %rule.origin, "Proxy rule matched");
                }
            }
            None => {
                if self.rules.iter().any(|rule| rule.permits(ProxyLogLevel::Debug)) {
                    tracing::debug!(path = %path, "No proxy rule matched");
                }
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
