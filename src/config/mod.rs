use crate::core::path::{config_file, ensure_dir};
use crate::core::{PipguardError, PipguardResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Monthly downloads below this fail the download check.
pub const DOWNLOADS_FAILURE_THRESHOLD: u64 = 100;
/// Monthly downloads below this warn in the download check.
pub const DOWNLOADS_WARNING_THRESHOLD: u64 = 5000;
/// Repositories with fewer stars get an emphasised warning.
pub const STARS_BOLD_WARNING_THRESHOLD: u64 = 100;
/// Repositories with fewer stars get a plain warning.
pub const STARS_WARNING_THRESHOLD: u64 = 1000;
/// A package whose first upload is younger than this many days is "newly published".
pub const NEW_PACKAGE_DAYS: i64 = 22;
/// A release older than this many days gets a warning.
pub const OLD_RELEASE_DAYS: i64 = 365;
/// How many vulnerability ids are listed before "and N more".
pub const MAX_DISPLAYED_VULNERABILITIES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// PyPI base URL (JSON, Simple and integrity APIs live under it)
    #[serde(default = "default_pypi_url")]
    pub pypi_url: String,

    /// pypistats.org API base URL
    #[serde(default = "default_pypistats_url")]
    pub pypistats_url: String,

    /// OSV API base URL
    #[serde(default = "default_osv_url")]
    pub osv_url: String,

    /// GitHub REST API base URL
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// GitLab REST API base URL
    #[serde(default = "default_gitlab_api_url")]
    pub gitlab_api_url: String,

    /// Token for GitHub API requests (raises the anonymous rate limit).
    /// Falls back to the GITHUB_TOKEN environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Timeout for a single request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Check thresholds
    #[serde(default)]
    pub thresholds: CheckThresholds,
}

/// Numeric thresholds used by the checkers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckThresholds {
    pub downloads_failure: u64,
    pub downloads_warning: u64,
    pub stars_bold_warning: u64,
    pub stars_warning: u64,
    pub new_package_days: i64,
    pub old_release_days: i64,
    pub max_displayed_vulnerabilities: usize,
}

impl Default for CheckThresholds {
    fn default() -> Self {
        Self {
            downloads_failure: DOWNLOADS_FAILURE_THRESHOLD,
            downloads_warning: DOWNLOADS_WARNING_THRESHOLD,
            stars_bold_warning: STARS_BOLD_WARNING_THRESHOLD,
            stars_warning: STARS_WARNING_THRESHOLD,
            new_package_days: NEW_PACKAGE_DAYS,
            old_release_days: OLD_RELEASE_DAYS,
            max_displayed_vulnerabilities: MAX_DISPLAYED_VULNERABILITIES,
        }
    }
}

fn default_pypi_url() -> String {
    "https://pypi.org".to_string()
}

fn default_pypistats_url() -> String {
    "https://pypistats.org/api".to_string()
}

fn default_osv_url() -> String {
    "https://api.osv.dev".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_gitlab_api_url() -> String {
    "https://gitlab.com/api/v4".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pypi_url: default_pypi_url(),
            pypistats_url: default_pypistats_url(),
            osv_url: default_osv_url(),
            github_api_url: default_github_api_url(),
            gitlab_api_url: default_gitlab_api_url(),
            github_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            thresholds: CheckThresholds::default(),
        }
    }
}

impl Config {
    /// Load config from the platform-specific config directory, creating a default one if it doesn't exist
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\pipguard\config.yaml
    /// - Linux: ~/.config/pipguard/config.yaml
    /// - macOS: ~/Library/Application Support/pipguard/config.yaml
    pub fn load() -> PipguardResult<Self> {
        let config_path = config_file()?;

        if !config_path.exists() {
            let config = Self::default();
            // A read-only config dir must not stop the gate from running
            if let Err(e) = config.save_to(&config_path) {
                tracing::debug!("Could not write default config to {}: {}", config_path.display(), e);
            }
            return Ok(config.with_env_overrides());
        }

        Ok(Self::load_from(&config_path)?.with_env_overrides())
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> PipguardResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| PipguardError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> PipguardResult<()> {
        if let Some(dir) = path.parent() {
            ensure_dir(dir)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| PipguardError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if self.github_token.is_none() {
            self.github_token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.pypi_url, "https://pypi.org");
        assert_eq!(config.thresholds.downloads_failure, 100);
        assert_eq!(config.thresholds.downloads_warning, 5000);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.thresholds.stars_warning = 2000;
        config.save_to(&config_path).unwrap();

        let loaded = Config::load_from(&config_path).unwrap();
        assert_eq!(loaded.pypi_url, config.pypi_url);
        assert_eq!(loaded.thresholds.stars_warning, 2000);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        fs::write(&config_path, "request_timeout_secs: 3\nthresholds:\n  new_package_days: 7\n").unwrap();

        let loaded = Config::load_from(&config_path).unwrap();
        assert_eq!(loaded.request_timeout_secs, 3);
        assert_eq!(loaded.thresholds.new_package_days, 7);
        assert_eq!(loaded.thresholds.old_release_days, OLD_RELEASE_DAYS);
        assert_eq!(loaded.osv_url, "https://api.osv.dev");
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        fs::write(&config_path, "request_timeout_secs: [not, a, number]\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(matches!(err, PipguardError::Config(_)));
    }
}
