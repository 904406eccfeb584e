//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{BuildMode, DevServerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the deployment sub-path.
pub const BASE_URL_ENV: &str = "BASE_URL";

/// Environment variable selecting the build mode.
pub const NODE_ENV_ENV: &str = "NODE_ENV";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration file without validating it.
pub fn read_config(path: &Path) -> Result<DevServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file, then apply the
/// environment overlay.
pub fn load_config(path: &Path) -> Result<DevServerConfig, ConfigError> {
    let mut config = read_config(path)?;
    apply_env(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults plus the environment overlay, validated.
pub fn load_default() -> Result<DevServerConfig, ConfigError> {
    let mut config = DevServerConfig::default();
    apply_env(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `BASE_URL` and `NODE_ENV` onto a parsed configuration.
pub fn apply_env<F>(config: &mut DevServerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
        config.base_path = base;
    }
    if let Some(env) = lookup(NODE_ENV_ENV) {
        config.build.mode = if env == "production" {
            BuildMode::Production
        } else {
            BuildMode::Development
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_overlay() {
        let mut config = DevServerConfig::default();
        apply_env(&mut config, |key| match key {
            BASE_URL_ENV => Some("/pointcloud/".into()),
            NODE_ENV_ENV => Some("production".into()),
            _ => None,
        });
        assert_eq!(config.base_path, "/pointcloud/");
        assert_eq!(config.build.mode, BuildMode::Production);

        apply_env(&mut config, |key| (key == NODE_ENV_ENV).then(|| "test".into()));
        assert_eq!(config.build.mode, BuildMode::Development);
        assert_eq!(config.base_path, "/pointcloud/");
    }

    #[test]
    fn test_empty_base_url_ignored() {
        let mut config = DevServerConfig::default();
        apply_env(&mut config, |key| (key == BASE_URL_ENV).then(String::new));
        assert_eq!(config.base_path, "/");
    }

    #[test]
    fn test_read_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 3100").unwrap();

        let config = read_config(file.path()).unwrap();
        assert_eq!(config.server.port, 3100);
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_malformed_file_reports_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        assert!(matches!(read_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
