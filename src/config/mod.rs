//! Connection settings for the Okapi gateway
//!
//! Settings come from a TOML file and can be overridden by environment
//! variables. The file is looked up in this order: the path given with
//! `--config`, `./polbatch.toml`, then the platform config directory.

use crate::error::{common, ErrorCode, ErrorExt, PolBatchError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const LOCAL_CONFIG_FILE: &str = "polbatch.toml";

pub const ENV_URL: &str = "OKAPI_URL";
pub const ENV_TENANT: &str = "OKAPI_TENANT";
pub const ENV_USERNAME: &str = "OKAPI_USERNAME";
pub const ENV_PASSWORD: &str = "OKAPI_PASSWORD";

/// Get the per-user config file location, if the platform has one
pub fn get_global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("edu", "polbatch", "polbatch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub okapi: OkapiSection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct OkapiSection {
    pub url: Option<String>,
    pub tenant_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for OkapiSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OkapiSection")
            .field("url", &self.url)
            .field("tenant_id", &self.tenant_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> u32 {
    100
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

/// Fully resolved settings needed to open an Okapi session
#[derive(Clone)]
pub struct OkapiSettings {
    pub url: String,
    pub tenant_id: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub page_size: u32,
}

impl fmt::Debug for OkapiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OkapiSettings")
            .field("url", &self.url)
            .field("tenant_id", &self.tenant_id)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            PolBatchError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, e.to_string(), None)
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(common::config_not_found(path));
        }
        let content = std::fs::read_to_string(path)
            .to_config_error(format!("cannot read {}", path.display()))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            PolBatchError::Config { code, message, .. } => {
                PolBatchError::config_with_code(code, message, Some(path.to_path_buf()))
            }
            other => other,
        })
    }

    /// Load the config file and apply environment overrides.
    ///
    /// A file named explicitly must exist. Without one, the default locations
    /// are tried and silently skipped when absent, so a run can be configured
    /// from the environment alone.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
                    .chain(get_global_config_path());
                let mut found = None;
                for candidate in candidates {
                    if candidate.exists() {
                        debug!("Loading config from {}", candidate.display());
                        found = Some(Self::from_file(&candidate)?);
                        break;
                    }
                }
                found.unwrap_or_default()
            }
        };

        config.merge_env_vars();
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_URL) {
            self.okapi.url = Some(url);
        }
        if let Some(tenant) = lookup(ENV_TENANT) {
            self.okapi.tenant_id = Some(tenant);
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.okapi.username = Some(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.okapi.password = Some(password);
        }
    }

    /// Validate and resolve into settings for the HTTP client
    pub fn resolve(&self) -> Result<OkapiSettings> {
        let url = required(&self.okapi.url, "okapi.url", ENV_URL)?.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PolBatchError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("okapi.url must be an http(s) URL, got '{}'", url),
                None,
            ));
        }
        if self.http.page_size == 0 {
            return Err(PolBatchError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "http.page_size must be greater than zero",
                None,
            ));
        }

        Ok(OkapiSettings {
            url: url.trim_end_matches('/').to_string(),
            tenant_id: required(&self.okapi.tenant_id, "okapi.tenant_id", ENV_TENANT)?
                .trim()
                .to_string(),
            username: required(&self.okapi.username, "okapi.username", ENV_USERNAME)?
                .trim()
                .to_string(),
            // not trimmed; spaces are part of the password
            password: required(&self.okapi.password, "okapi.password", ENV_PASSWORD)?.to_string(),
            timeout: Duration::from_secs(self.http.timeout_secs),
            page_size: self.http.page_size,
        })
    }
}

/// The value as given, unless it is absent or blank
fn required<'a>(value: &'a Option<String>, key: &str, env_var: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(common::missing_setting(key, env_var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL: &str = r#"
[okapi]
url = "https://okapi.example.edu/"
tenant_id = "diku"
username = "batch"
password = "secret"

[http]
timeout_secs = 30
"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(FULL).unwrap();
        let settings = config.resolve().unwrap();
        assert_eq!(settings.url, "https://okapi.example.edu");
        assert_eq!(settings.tenant_id, "diku");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.page_size, 100);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::from_toml_str(FULL).unwrap();
        let env: HashMap<&str, &str> =
            [(ENV_TENANT, "other"), (ENV_PASSWORD, "from-env")].into_iter().collect();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        let settings = config.resolve().unwrap();
        assert_eq!(settings.tenant_id, "other");
        assert_eq!(settings.password, "from-env");
        assert_eq!(settings.username, "batch");
    }

    #[test]
    fn test_missing_required_value() {
        let config = Config::from_toml_str("[okapi]\nurl = \"https://x\"\n").unwrap();
        let err = config.resolve().unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_MISSING_REQUIRED);
        assert!(err.to_string().contains("okapi.tenant_id"));
    }

    #[test]
    fn test_password_kept_verbatim() {
        let mut config = Config::from_toml_str(FULL).unwrap();
        config.okapi.username = Some("  batch ".into());
        config.okapi.password = Some("  s p  ".into());
        let settings = config.resolve().unwrap();
        assert_eq!(settings.username, "batch");
        assert_eq!(settings.password, "  s p  ");

        config.okapi.password = Some("   ".into());
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("okapi.password"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = Config::from_toml_str(FULL).unwrap();
        config.okapi.url = Some("okapi.example.edu".into());
        let err = config.resolve().unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[okapi\nurl=").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_TOML);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_explicit_missing_file_is_fatal() {
        let err = Config::from_file(Path::new("/nonexistent/polbatch.toml")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NOT_FOUND);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.okapi.username.as_deref(), Some("batch"));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::from_toml_str(FULL).unwrap();
        let shown = format!("{:?}", config);
        assert!(!shown.contains("secret"));
        let shown = format!("{:?}", config.resolve().unwrap());
        assert!(!shown.contains("secret"));
    }
}
