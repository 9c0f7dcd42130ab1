//! Tests against running capability nodes.
//!
//! Set `CAPCTL_TEST_NODES` to a comma separated address list and run with
//! `cargo test -- --ignored`.

use capctl_connect::{Controller, ControllerConfig, Transport};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn live_nodes() -> Vec<String> {
    std::env::var("CAPCTL_TEST_NODES")
        .unwrap_or_else(|_| "127.0.0.1:7777".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[tokio::test]
#[ignore]
async fn test_list_live_fleet() -> anyhow::Result<()> {
    let nodes = live_nodes();
    let controller =
        Controller::connect(&nodes, Transport::Plaintext, ControllerConfig::default()).await?;

    let inventory = controller.list(&CancellationToken::new()).await?;
    assert_eq!(inventory.len(), nodes.len());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_wait_for_missing_capability_times_out() -> anyhow::Result<()> {
    let nodes = live_nodes();
    let controller =
        Controller::connect(&nodes, Transport::Plaintext, ControllerConfig::default()).await?;

    let result = controller
        .wait_for_capability(
            &CancellationToken::new(),
            "does-not-exist@0.0.0",
            Duration::from_secs(3),
        )
        .await;
    assert!(result.is_err());
    Ok(())
}
