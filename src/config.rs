/*!
 * Configuration types for the capctl CLI
 */

use capctl_connect::{ControllerConfig, Transport, DEFAULT_CACHE_PATH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Operator configuration, usually read from `capctl.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Node addresses (host:port), in the order operations visit them
    #[serde(default)]
    pub nodes: Vec<String>,

    /// Dial nodes over TLS without certificate validation
    #[serde(default)]
    pub secure: bool,

    /// Where node addresses are cached between runs
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Controller tuning
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            secure: false,
            cache_path: default_cache_path(),
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
            controller: ControllerConfig::default(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_PATH)
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CliConfig = toml::from_str(&contents).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.controller.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| CliError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn transport(&self) -> Transport {
        Transport::from_secure_flag(self.secure)
    }
}
