//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Every section has serde
//! defaults so a minimal file (or none of the optional sections) works.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Dry-run mode: run every flow up to the final commit click, but never
    /// actually commit a wager.
    #[serde(default)]
    pub dry_run: bool,
    /// Test mode: run the browser headful and keep pages open after a request
    /// completes so they can be inspected.
    #[serde(default)]
    pub test_mode: bool,
}

/// Session pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum age of a browser session before a lease triggers rotation.
    #[serde(default = "default_max_session_age_secs")]
    pub max_session_age_secs: u64,
}

fn default_max_session_age_secs() -> u64 {
    1800
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_session_age_secs: default_max_session_age_secs(),
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn max_session_age(&self) -> Duration {
        Duration::from_secs(self.max_session_age_secs)
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    900
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

/// Per-step timeouts for driver flows.
///
/// Every wait-for-element/navigation step carries one of these; exceeding it
/// is classified at the call site as either benign (section unavailable) or
/// fatal to the current flow.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Post-login stabilization. Some venues are slow here.
    #[serde(default = "default_auth_secs")]
    pub auth_secs: u64,
    /// Page navigation and selector waits during section navigation.
    #[serde(default = "default_navigation_secs")]
    pub navigation_secs: u64,
    /// Waiting for extractable market content after navigation.
    #[serde(default = "default_market_ready_secs")]
    pub market_ready_secs: u64,
    /// Bounded poll for the venue-displayed maximum stake (loads via AJAX).
    #[serde(default = "default_stake_read_millis")]
    pub stake_read_millis: u64,
    /// Fixed pause between interactive retry attempts.
    #[serde(default = "default_interactive_pause_millis")]
    pub interactive_pause_millis: u64,
}

fn default_auth_secs() -> u64 {
    60
}

fn default_navigation_secs() -> u64 {
    20
}

fn default_market_ready_secs() -> u64 {
    10
}

fn default_stake_read_millis() -> u64 {
    1000
}

fn default_interactive_pause_millis() -> u64 {
    500
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            auth_secs: default_auth_secs(),
            navigation_secs: default_navigation_secs(),
            market_ready_secs: default_market_ready_secs(),
            stake_read_millis: default_stake_read_millis(),
            interactive_pause_millis: default_interactive_pause_millis(),
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn auth(&self) -> Duration {
        Duration::from_secs(self.auth_secs)
    }

    #[must_use]
    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    #[must_use]
    pub fn market_ready(&self) -> Duration {
        Duration::from_secs(self.market_ready_secs)
    }

    #[must_use]
    pub fn stake_read(&self) -> Duration {
        Duration::from_millis(self.stake_read_millis)
    }

    #[must_use]
    pub fn interactive_pause(&self) -> Duration {
        Duration::from_millis(self.interactive_pause_millis)
    }
}

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

/// Audit artifact store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("audit_screenshots")
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pool.max_session_age_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.max_session_age_secs",
                reason: "must be > 0".into(),
            }
            .into());
        }
        if self.timeouts.navigation_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeouts.navigation_secs",
                reason: "must be > 0".into(),
            }
            .into());
        }
        if self.timeouts.market_ready_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeouts.market_ready_secs",
                reason: "must be > 0".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
