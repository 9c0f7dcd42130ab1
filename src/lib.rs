/*!
 * Capctl - operator tooling for fleets of mock capability nodes
 *
 * The `capctl` binary drives every node of a test fleet at once:
 * - inventory and readiness queries across all nodes
 * - capability creation and removal
 * - trigger event injection and live trigger subscriptions
 * - executable hooks that echo requests back to their node
 *
 * The control-plane logic lives in `capctl-connect`; this crate holds the
 * CLI configuration, logging setup, output formatting and command runners.
 */

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use config::{CliConfig, LogLevel};
pub use error::{CliError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
