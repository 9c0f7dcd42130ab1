//! Error types for the capctl-connect crate

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ControlError>;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Invalid node address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Connection to node {address} failed: {source}")]
    Connection {
        address: String,
        source: tonic::transport::Error,
    },

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Invalid controller configuration: {0}")]
    InvalidConfig(String),

    #[error("No nodes available for {0}")]
    NoNodes(&'static str),

    #[error("{operation} failed on node {node}: {source}")]
    NodeFailed {
        operation: &'static str,
        node: String,
        source: tonic::Status,
    },

    #[error("Failed to delete capability {capability} on {node}: {source}")]
    CapabilityDeleteFailed {
        capability: String,
        node: String,
        source: tonic::Status,
    },

    #[error("Cannot hook into executable at {node}: {source}")]
    HookFailed { node: String, source: tonic::Status },

    #[error("All {operation} calls failed: {}", join_causes(.causes))]
    AllFailed {
        operation: &'static str,
        causes: Vec<ControlError>,
    },

    #[error("Timed out after {waited:?} waiting for {target}{}", last_error_suffix(.last_error))]
    Timeout {
        target: String,
        waited: Duration,
        last_error: Option<String>,
    },

    #[error("Cancelled while waiting for {target}{}", last_error_suffix(.last_error))]
    Cancelled {
        target: String,
        last_error: Option<String>,
    },

    #[error("Failed to read node cache {}: {source}", .path.display())]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write node cache {}: {source}", .path.display())]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No node addresses found in cache file {}", .0.display())]
    CacheEmpty(PathBuf),
}

impl ControlError {
    /// Per-node causes of an aggregate failure; empty for every other kind.
    pub fn causes(&self) -> &[ControlError] {
        match self {
            ControlError::AllFailed { causes, .. } => causes,
            _ => &[],
        }
    }
}

/// Errors delivered through a stream's output queue rather than returned.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    #[error("stream error from {node}: {source}")]
    Transport { node: String, source: tonic::Status },

    #[error("processing error from {node}: {reason}")]
    Decode { node: String, reason: String },

    #[error("trigger error from {node}: {message}")]
    Remote { node: String, message: String },
}

impl StreamError {
    /// Address of the node the error came from.
    pub fn node(&self) -> &str {
        match self {
            StreamError::Transport { node, .. }
            | StreamError::Decode { node, .. }
            | StreamError::Remote { node, .. } => node,
        }
    }
}

pub(crate) fn join_causes(causes: &[ControlError]) -> String {
    causes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {})", e),
        None => String::new(),
    }
}
