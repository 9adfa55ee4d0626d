//! Engine configuration.
//!
//! # Responsibility
//! - Load `EngineConfig` from TOML and apply environment overrides.
//! - Validate every field before the engine is assembled.
//!
//! # Invariants
//! - Source priority: explicit path, then `CLASSSYNC_CONFIG`, then defaults.
//! - Per-field environment variables override whichever source was used.
//! - A returned config has passed validation.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "CLASSSYNC_CONFIG";
pub const API_BASE_URL_ENV: &str = "CLASSSYNC_API_BASE_URL";
pub const CACHE_PATH_ENV: &str = "CLASSSYNC_CACHE_PATH";
pub const LOG_LEVEL_ENV: &str = "CLASSSYNC_LOG_LEVEL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_CACHE_FILE: &str = "classsync-cache.sqlite3";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 300;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Invalid { field: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
            Self::Invalid { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend root; endpoint paths are appended to it.
    pub api_base_url: String,
    pub cache_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("classsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with_env(explicit, |name| std::env::var(name).ok())
    }

    /// Same as [`EngineConfig::load`] with an injectable variable lookup.
    pub fn load_with_env(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).filter(|value| !value.trim().is_empty()).map(PathBuf::from));

        let base = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        base.with_env_overrides(env).validated()
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    fn with_env_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = env(API_BASE_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(path) = env(CACHE_PATH_ENV) {
            self.cache_path = PathBuf::from(path);
        }
        if let Some(level) = env(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
        self
    }

    /// Normalizes and checks every field.
    pub fn validated(mut self) -> ConfigResult<Self> {
        self.api_base_url = normalize_api_base_url(&self.api_base_url)?;
        self.log_level = normalize_log_level(&self.log_level)?.to_string();
        self.request_timeout_secs = normalize_timeout_secs(self.request_timeout_secs)?;
        if self.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "cache_path",
                message: "cannot be empty".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = Self::default().user_agent;
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn normalize_log_level(level: &str) -> ConfigResult<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ConfigError::Invalid {
            field: "log_level",
            message: format!("unsupported level `{other}`; expected trace|debug|info|warn|error"),
        }),
    }
}

/// Requires an absolute http(s) url; a trailing slash is dropped.
pub fn normalize_api_base_url(raw: &str) -> ConfigResult<String> {
    let invalid = |message: String| ConfigError::Invalid {
        field: "api_base_url",
        message,
    };
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|err| invalid(format!("`{trimmed}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid(format!("`{trimmed}` cannot be a base url")));
    }
    Ok(trimmed.to_string())
}

pub fn normalize_timeout_secs(secs: u64) -> ConfigResult<u64> {
    if (1..=MAX_TIMEOUT_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::Invalid {
            field: "request_timeout_secs",
            message: format!("expected 1..={MAX_TIMEOUT_SECS}, got {secs}"),
        })
    }
}
