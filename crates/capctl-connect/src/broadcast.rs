//! Fail-fast unary broadcasts
//!
//! Each operation visits nodes in registry order and stops at the first
//! error, which is returned tagged with the failing node. Later nodes are
//! not contacted. These calls are idempotent configuration pushes, so a
//! failed broadcast is retried as a whole.

use capctl_proto as pb;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{debug, info};

use crate::api::CapabilityApi;
use crate::controller::{guarded, Controller};
use crate::error::{ControlError, Result};
use crate::types::{CapInfosByNode, CapabilityInfo};

impl Controller {
    async fn fail_fast<F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation: &'static str,
        mut call: F,
    ) -> Result<()>
    where
        F: FnMut(Arc<dyn CapabilityApi>) -> Fut,
        Fut: Future<Output = std::result::Result<(), Status>>,
    {
        for node in self.registry.nodes() {
            debug!(node = %node.address, operation, "Broadcasting to node");
            guarded(cancel, call(node.api.clone()))
                .await
                .map_err(|source| ControlError::NodeFailed {
                    operation,
                    node: node.address.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn register_to_workflow(
        &self,
        cancel: &CancellationToken,
        request: &pb::RegisterToWorkflowRequest,
    ) -> Result<()> {
        self.fail_fast(cancel, "RegisterToWorkflow", |api| {
            let request = request.clone();
            async move { api.register_to_workflow(request).await }
        })
        .await
    }

    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: &pb::ExecutableRequest,
    ) -> Result<()> {
        self.fail_fast(cancel, "Execute", |api| {
            let request = request.clone();
            async move { api.execute(request).await }
        })
        .await
    }

    pub async fn create_capability(
        &self,
        cancel: &CancellationToken,
        info: &CapabilityInfo,
    ) -> Result<()> {
        info!(capability = %info.id, capability_type = %info.capability_type, "Creating capability on all nodes");
        let request = pb::CapabilityInfo::from(info);
        self.fail_fast(cancel, "CreateCapability", |api| {
            let request = request.clone();
            async move { api.create_capability(request).await }
        })
        .await
    }

    pub async fn send_trigger(
        &self,
        cancel: &CancellationToken,
        message: &pb::SendTriggerEventRequest,
    ) -> Result<()> {
        self.fail_fast(cancel, "SendTriggerEvent", |api| {
            let message = message.clone();
            async move {
                info!(
                    event_id = %message.id,
                    trigger_id = %message.trigger_id,
                    "Sending trigger event to subscribers"
                );
                api.send_trigger_event(message).await
            }
        })
        .await
    }

    /// Remove a capability from every node.
    pub async fn delete_capability(
        &self,
        cancel: &CancellationToken,
        capability_id: &str,
    ) -> Result<()> {
        for node in self.registry.nodes() {
            let request = pb::RemoveCapabilityRequest {
                id: capability_id.to_string(),
            };
            guarded(cancel, node.api.remove_capability(request))
                .await
                .map_err(|source| ControlError::CapabilityDeleteFailed {
                    capability: capability_id.to_string(),
                    node: node.address.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Capability inventory of every node, one entry per node in registry order.
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<CapInfosByNode>> {
        let mut inventory = Vec::with_capacity(self.registry.len());

        for node in self.registry.nodes() {
            let response = guarded(cancel, node.api.list(pb::ListRequest {}))
                .await
                .map_err(|source| ControlError::NodeFailed {
                    operation: "List",
                    node: node.address.clone(),
                    source,
                })?;

            debug!(node = %node.address, count = response.cap_infos.len(), "Fetched capabilities");

            inventory.push(CapInfosByNode {
                node: node.address.clone(),
                capabilities: response
                    .cap_infos
                    .into_iter()
                    .map(CapabilityInfo::from)
                    .collect(),
            });
        }

        Ok(inventory)
    }

    /// True only when every node reports `capability_id`.
    pub async fn has_capability(
        &self,
        cancel: &CancellationToken,
        capability_id: &str,
    ) -> Result<bool> {
        let inventory = self.list(cancel).await?;
        Ok(present_on_all(&inventory, capability_id))
    }

    /// Workflow IDs subscribed to `trigger_id`, keyed by node address.
    pub async fn get_trigger_subscribers(
        &self,
        cancel: &CancellationToken,
        trigger_id: &str,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let mut subscribers = BTreeMap::new();

        for node in self.registry.nodes() {
            let request = pb::GetTriggerSubscribersRequest {
                id: trigger_id.to_string(),
            };
            let response = guarded(cancel, node.api.get_trigger_subscribers(request))
                .await
                .map_err(|source| ControlError::NodeFailed {
                    operation: "GetTriggerSubscribers",
                    node: node.address.clone(),
                    source,
                })?;

            debug!(
                node = %node.address,
                trigger_id,
                subscriber_count = response.workflow_ids.len(),
                "Retrieved trigger subscribers"
            );

            subscribers.insert(node.address.clone(), response.workflow_ids);
        }

        Ok(subscribers)
    }
}

pub(crate) fn present_on_all(inventory: &[CapInfosByNode], capability_id: &str) -> bool {
    inventory.iter().all(|node| {
        let present = node.has(capability_id);
        if !present {
            debug!(node = %node.node, capability = capability_id, "Node does not have capability yet");
        }
        present
    })
}
