/*!
 * Error types for the capctl CLI
 */

use capctl_connect::ControlError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Invalid {what}: {reason}")]
    InvalidArgument { what: &'static str, reason: String },

    #[error(transparent)]
    Control(#[from] ControlError),
}

impl CliError {
    /// Map error to a process exit code.
    ///
    /// Anything that stops the controller from reaching the fleet is fatal;
    /// an operation rejected by nodes is a partial failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Control(e) => control_exit_code(e),
            _ => EXIT_FATAL,
        }
    }
}

pub fn control_exit_code(error: &ControlError) -> i32 {
    match error {
        ControlError::InvalidAddress { .. }
        | ControlError::Connection { .. }
        | ControlError::Tls(_)
        | ControlError::InvalidConfig(_)
        | ControlError::NoNodes(_)
        | ControlError::CacheRead { .. }
        | ControlError::CacheWrite { .. }
        | ControlError::CacheEmpty(_) => EXIT_FATAL,
        _ => EXIT_PARTIAL,
    }
}

/// Exit code of a presence check: a capability missing on any node is partial.
pub fn presence_exit_code(present: bool) -> i32 {
    if present {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL
    }
}

/// Exit code for an error surfaced through `anyhow`.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<CliError>() {
        return e.exit_code();
    }
    if let Some(e) = error.downcast_ref::<ControlError>() {
        return control_exit_code(e);
    }
    EXIT_FATAL
}
