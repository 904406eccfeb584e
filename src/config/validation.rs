//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, base path shape)
//! - Check proxy targets are usable origins
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use url::Url;

use crate::config::schema::{DevServerConfig, ProxyRuleConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.port must not be 0")]
    ZeroPort,

    #[error("base_path `{0}` must start with `/`")]
    BasePath(String),

    #[error("proxy[{index}].context must not be empty")]
    EmptyContext { index: usize },

    #[error("proxy[{index}].target `{target}` is not a usable origin: {reason}")]
    ProxyTarget { index: usize, target: String, reason: String },

    #[error("proxy[{index}].path_rewrite has an empty pattern")]
    EmptyRewrite { index: usize },

    #[error("route `{name}` path `{path}` must start with `/`")]
    RoutePath { name: String, path: String },

    #[error("route `{0}` has no module")]
    RouteModule(String),

    #[error("route path `{0}` is declared more than once")]
    DuplicatePath(String),

    #[error("route name `{0}` is declared more than once")]
    DuplicateName(String),
}

/// Validate a full configuration.
pub fn validate_config(config: &DevServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !config.base_path.starts_with('/') {
        errors.push(ValidationError::BasePath(config.base_path.clone()));
    }

    if let Err(proxy_errors) = validate_proxy_rules(&config.proxy) {
        errors.extend(proxy_errors);
    }

    let mut paths = HashSet::new();
    let mut names = HashSet::new();
    for route in &config.routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::RoutePath {
                name: route.name.clone(),
                path: route.path.clone(),
            });
        }
        if route.module.trim().is_empty() {
            errors.push(ValidationError::RouteModule(route.name.clone()));
        }
        if !paths.insert(route.path.to_lowercase()) {
            errors.push(ValidationError::DuplicatePath(route.path.clone()));
        }
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateName(route.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the proxy rule set. Used on hot reload as well as startup.
pub fn validate_proxy_rules(rules: &[ProxyRuleConfig]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        if rule.context.trim_start_matches('^').is_empty() {
            errors.push(ValidationError::EmptyContext { index });
        }
        if let Err(reason) = check_origin(&rule.target) {
            errors.push(ValidationError::ProxyTarget {
                index,
                target: rule.target.clone(),
                reason,
            });
        }
        if rule.path_rewrite.patterns().any(|k| k.trim_start_matches('^').is_empty()) {
            errors.push(ValidationError::EmptyRewrite { index });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_origin(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() {
        return Err("origin must not carry a path or query".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&DevServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = DevServerConfig::default();
        config.server.port = 0;
        config.base_path = "app".into();
        config.proxy[0].target = "localhost:8000/api".into();
        config.routes.push(RouteConfig {
            path: "/viewer".into(),
            name: "home".into(),
            module: "src/views/Other.vue".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroPort));
        assert!(errors.contains(&ValidationError::BasePath("app".into())));
        assert!(errors.contains(&ValidationError::DuplicatePath("/viewer".into())));
        assert!(errors.contains(&ValidationError::DuplicateName("home".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ProxyTarget { index: 0, .. })));
    }

    #[test]
    fn test_proxy_target_shapes() {
        assert!(check_origin("http://localhost:8000").is_ok());
        assert!(check_origin("https://api.example.com").is_ok());
        assert!(check_origin("ftp://localhost").is_err());
        assert!(check_origin("http://localhost:8000/v1").is_err());
        assert!(check_origin("not a url").is_err());
    }

    #[test]
    fn test_empty_context_rejected() {
        let mut rule = ProxyRuleConfig::default();
        rule.context = "^".into();
        let errors = validate_proxy_rules(&[rule]).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyContext { index: 0 }]);
    }
}
