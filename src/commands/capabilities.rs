//! Capability inventory commands

use capctl_connect::CapabilityInfo;
use std::time::Duration;
use tracing::info;

use super::{done, Session};
use crate::error::Result;

pub async fn list(session: &Session) -> Result<()> {
    let inventory = session.controller.list(&session.cancel).await?;
    session.output.inventory(&inventory);
    Ok(())
}

/// Report whether every node has `capability_id`.
pub async fn has(session: &Session, capability_id: &str) -> Result<bool> {
    let present = session
        .controller
        .has_capability(&session.cancel, capability_id)
        .await?;
    session.output.presence(capability_id, present);
    Ok(present)
}

pub async fn create(session: &Session, info: &CapabilityInfo) -> Result<()> {
    session
        .controller
        .create_capability(&session.cancel, info)
        .await?;
    session.output.operation_result(&done("create", &info.id));
    Ok(())
}

pub async fn delete(session: &Session, capability_id: &str) -> Result<()> {
    session
        .controller
        .delete_capability(&session.cancel, capability_id)
        .await?;
    session.output.operation_result(&done("delete", capability_id));
    Ok(())
}

pub async fn wait_for_capability(
    session: &Session,
    capability_id: &str,
    timeout: Duration,
) -> Result<()> {
    let started = std::time::Instant::now();
    session
        .controller
        .wait_for_capability(&session.cancel, capability_id, timeout)
        .await?;
    info!(
        capability = capability_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Capability ready"
    );
    session
        .output
        .operation_result(&done("wait-capability", capability_id));
    Ok(())
}
