//! Configuration management module
//!
//! YAML configuration with a default location under the user config
//! directory. Every threshold has a default, so an absent file or an
//! absent section is never an error.

use std::path::{Path, PathBuf};

use perceiver_form::MatchThresholds;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tool_fill::FillPolicyView;
use tracing::{info, warn};

use crate::errors::FormFuseError;

/// Environment variable overriding the configured profile location.
pub const PROFILE_ENV: &str = "FORMFUSE_PROFILE";

const APP_DIR: &str = "formfuse";
const CONFIG_FILE: &str = "config.yaml";
const PROFILE_FILE: &str = "profile.json";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Profile JSON location; defaults to the user data directory.
    pub profile_path: Option<PathBuf>,
    pub matcher: MatchThresholds,
    pub fill: FillPolicyView,
}

impl AppConfig {
    /// Profile location after applying `env_override`, the configured path
    /// and the platform default, in that order.
    pub fn resolve_profile_path(&self, env_override: Option<&str>) -> Result<PathBuf, FormFuseError> {
        if let Some(path) = env_override.map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.profile_path {
            return Ok(path.clone());
        }
        default_profile_path()
    }

    /// [`resolve_profile_path`](Self::resolve_profile_path) with the
    /// process environment.
    pub fn profile_path(&self) -> Result<PathBuf, FormFuseError> {
        let env_override = std::env::var(PROFILE_ENV).ok();
        self.resolve_profile_path(env_override.as_deref())
    }
}

pub fn default_config_path() -> Result<PathBuf, FormFuseError> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| FormFuseError::config("failed to get config directory"))?;
    path.push(APP_DIR);
    path.push(CONFIG_FILE);
    Ok(path)
}

pub fn default_profile_path() -> Result<PathBuf, FormFuseError> {
    let mut path = dirs::data_dir()
        .ok_or_else(|| FormFuseError::config("failed to get data directory"))?;
    path.push(APP_DIR);
    path.push(PROFILE_FILE);
    Ok(path)
}

pub async fn load_config(config_path: Option<&Path>) -> Result<AppConfig, FormFuseError> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if fs::try_exists(&config_path).await.unwrap_or(false) {
        let content = fs::read_to_string(&config_path).await?;
        let config = parse_config(&content)?;
        info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(AppConfig::default())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, FormFuseError> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_keep_defaults() {
        let config = parse_config(
            "matcher:\n  min_gap: 3\nfill:\n  poll:\n    attempts: 2\n",
        )
        .unwrap();
        assert_eq!(config.matcher.min_gap, 3);
        assert_eq!(config.matcher.min_confidence, 5);
        assert_eq!(config.fill.similarity_threshold, 560);
        assert_eq!(config.fill.poll.attempts, 2);
        assert_eq!(config.fill.poll.initial_delay_ms, 80);
        assert!(config.profile_path.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn profile_path_precedence() {
        let config = AppConfig {
            profile_path: Some(PathBuf::from("/tmp/configured.json")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolve_profile_path(Some("/tmp/env.json")).unwrap(),
            PathBuf::from("/tmp/env.json")
        );
        assert_eq!(
            config.resolve_profile_path(Some("  ")).unwrap(),
            PathBuf::from("/tmp/configured.json")
        );
        assert_eq!(
            config.resolve_profile_path(None).unwrap(),
            PathBuf::from("/tmp/configured.json")
        );
    }

    #[test]
    fn malformed_yaml_is_reported() {
        assert!(matches!(
            parse_config("matcher: [1, 2"),
            Err(FormFuseError::ConfigParse(_))
        ));
    }
}
