/*!
 * Fleet commands run by the capctl CLI
 *
 * Every command runs against a connected `Session`. Long-running commands
 * (subscribe, hook, waits) stop when the session token is cancelled, which
 * the binary wires to Ctrl-C.
 */

mod capabilities;
mod hook;
mod triggers;

pub use capabilities::{create, delete, has, list, wait_for_capability};
pub use hook::hook;
pub use triggers::{send_trigger, subscribe, subscribers, wait_for_subscribers};

use capctl_connect::types::encode_value_map;
use capctl_connect::{Controller, NodeCache, ValueMap};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::output::{OperationResult, OutputWriter};

/// A connected controller plus the cancellation scope of one CLI run
pub struct Session {
    pub controller: Controller,
    pub cancel: CancellationToken,
    pub output: OutputWriter,
}

impl Session {
    pub fn new(controller: Controller, output: OutputWriter) -> Self {
        Self {
            controller,
            cancel: CancellationToken::new(),
            output,
        }
    }

    /// Cancel the session on the first Ctrl-C.
    pub fn cancel_on_interrupt(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping");
                    cancel.cancel();
                }
                Err(e) => warn!(error = %e, "Unable to listen for interrupt signal"),
            }
        });
    }
}

/// Connect to the configured nodes, or to the cached ones.
///
/// With `persist` the connected addresses are written back to the cache.
pub async fn connect_fleet(config: &CliConfig, from_cache: bool, persist: bool) -> Result<Controller> {
    let cache = NodeCache::new(config.cache_path.clone());

    let controller = if from_cache {
        Controller::from_cache(&cache, config.transport(), config.controller.clone()).await?
    } else {
        if config.nodes.is_empty() {
            return Err(CliError::InvalidArgument {
                what: "node list",
                reason: "pass --node or set `nodes` in the config file".to_string(),
            });
        }
        Controller::connect(&config.nodes, config.transport(), config.controller.clone()).await?
    };

    info!(
        nodes = controller.registry().len(),
        transport = ?config.transport(),
        "Connected to fleet"
    );

    if persist {
        let addresses: Vec<String> = controller.registry().addresses().map(str::to_string).collect();
        cache.store(&addresses)?;
    }

    Ok(controller)
}

/// Validate a JSON object argument and encode it for the wire.
pub fn encode_json_arg(what: &'static str, json: &str) -> Result<Vec<u8>> {
    let map: ValueMap = serde_json::from_str(json).map_err(|e| CliError::InvalidArgument {
        what,
        reason: e.to_string(),
    })?;
    encode_value_map(&map).map_err(|e| CliError::InvalidArgument {
        what,
        reason: e.to_string(),
    })
}

fn done(operation: &str, target: &str) -> OperationResult {
    OperationResult {
        operation: operation.to_string(),
        success: true,
        target: Some(target.to_string()),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_json_arg_accepts_object() {
        let bytes = encode_json_arg("outputs", r#"{"b": 2, "a": [1, 2]}"#).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["a"], serde_json::json!([1, 2]));
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn test_encode_json_arg_rejects_non_object() {
        for bad in ["[1, 2]", "not json", "42"] {
            assert!(matches!(
                encode_json_arg("outputs", bad),
                Err(CliError::InvalidArgument { what: "outputs", .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_connect_fleet_requires_nodes() {
        let err = connect_fleet(&CliConfig::default(), false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { what: "node list", .. }));
    }

    #[tokio::test]
    async fn test_connect_fleet_from_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            cache_path: dir.path().join("nodes.txt"),
            ..Default::default()
        };
        let err = connect_fleet(&config, true, false).await.unwrap_err();
        assert!(matches!(err, CliError::Control(_)));
    }
}
