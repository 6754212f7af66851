//! CLI configuration.
//!
//! # Responsibility
//! - Read the optional TOML config file.
//! - Fill unset values with per-user defaults.
//!
//! # Invariants
//! - An explicitly requested config file must exist; the default one may not.
//! - Resolved paths are absolute whenever the platform data dir is known.

use counteria_core::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "counteria";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_FILE: &str = "default.db";
const LOG_DIR: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// No data dir on this platform and no explicit path configured.
    NoDataDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
            Self::NoDataDir => write!(
                f,
                "cannot determine data directory; set database_path and log_dir in the config"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::NoDataDir => None,
        }
    }
}

/// Config file contents; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

/// Config with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Config {
    /// Loads `explicit` when given, else the per-user config file if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn resolve(self) -> Result<Settings, ConfigError> {
        self.resolve_with(dirs::data_dir())
    }

    pub fn resolve_with(self, data_dir: Option<PathBuf>) -> Result<Settings, ConfigError> {
        let app_dir = data_dir.map(|dir| dir.join(APP_DIR));
        let from_app_dir = |name: &str| {
            app_dir
                .as_ref()
                .map(|dir| dir.join(name))
                .ok_or(ConfigError::NoDataDir)
        };

        let database_path = match self.database_path {
            Some(path) => path,
            None => from_app_dir(DEFAULT_DB_FILE)?,
        };
        let log_dir = match self.log_dir {
            Some(path) => path,
            None => from_app_dir(LOG_DIR)?,
        };
        let log_level = self
            .log_level
            .unwrap_or_else(|| default_log_level().to_string());

        Ok(Settings {
            database_path,
            log_level,
            log_dir,
        })
    }
}

/// `$XDG_CONFIG_HOME/counteria/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
