//! Stream multiplexing: trigger subscriptions and executable hooks
//!
//! Every open stream gets exactly one consumer task. Tasks talk to the
//! caller only through queues and stop when the caller's token is
//! cancelled; the node channels themselves stay open.

use capctl_proto as pb;
use futures::future::join_all;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{ExecutableStream, TriggerStream};
use crate::controller::{deliver, guarded, Controller};
use crate::error::{join_causes, ControlError, Result, StreamError};
use crate::types::{CapabilityRequest, TriggerRegistration, TriggerResponse};

impl Controller {
    /// Subscribe to a trigger on every node.
    ///
    /// Returns one queue per node, in registry order. A node whose stream
    /// could not be opened gets a queue that is already closed. Fails only
    /// when no node accepted the registration.
    ///
    /// Queues stop receiving when `cancel` fires, when the node ends the
    /// stream, or after a transport error has been delivered as the final
    /// item.
    pub async fn register_trigger(
        &self,
        cancel: &CancellationToken,
        registration: &TriggerRegistration,
    ) -> Result<Vec<mpsc::Receiver<TriggerResponse>>> {
        if self.registry.is_empty() {
            return Err(ControlError::NoNodes("trigger registration"));
        }

        let request = registration.to_request();
        let setups = join_all(self.registry.nodes().iter().map(|node| {
            let request = request.clone();
            async move {
                info!(node = %node.address, trigger_id = %request.trigger_id, "Registering trigger");
                guarded(cancel, node.api.register_trigger(request)).await
            }
        }))
        .await;

        let mut queues = Vec::with_capacity(self.registry.len());
        let mut failures = Vec::new();

        for (node, setup) in self.registry.nodes().iter().zip(setups) {
            let (tx, rx) = mpsc::channel(self.config.stream_buffer);
            queues.push(rx);

            match setup {
                Ok(stream) => {
                    tokio::spawn(consume_trigger_stream(
                        node.address.clone(),
                        stream,
                        tx,
                        cancel.clone(),
                    ));
                }
                Err(source) => {
                    // dropping tx closes this node's queue
                    failures.push(ControlError::NodeFailed {
                        operation: "RegisterTrigger",
                        node: node.address.clone(),
                        source,
                    });
                }
            }
        }

        if failures.len() == queues.len() {
            return Err(ControlError::AllFailed {
                operation: "RegisterTrigger",
                causes: failures,
            });
        }

        if !failures.is_empty() {
            warn!(
                failed_count = failures.len(),
                errors = %join_causes(&failures),
                "Some trigger registrations failed"
            );
        }

        Ok(queues)
    }

    /// Remove a trigger subscription from every node, best effort.
    ///
    /// Every node is attempted. Succeeds if at least one node accepted.
    pub async fn unregister_trigger(
        &self,
        cancel: &CancellationToken,
        registration: &TriggerRegistration,
    ) -> Result<()> {
        if self.registry.is_empty() {
            return Err(ControlError::NoNodes("trigger unregistration"));
        }

        let request = registration.to_request();
        let outcomes = join_all(self.registry.nodes().iter().map(|node| {
            let request = request.clone();
            async move {
                info!(node = %node.address, trigger_id = %request.trigger_id, "Unregistering trigger");
                guarded(cancel, node.api.unregister_trigger(request))
                    .await
                    .map_err(|source| ControlError::NodeFailed {
                        operation: "UnregisterTrigger",
                        node: node.address.clone(),
                        source,
                    })
            }
        }))
        .await;

        let failures: Vec<ControlError> = outcomes.into_iter().filter_map(|o| o.err()).collect();

        if failures.len() == self.registry.len() {
            return Err(ControlError::AllFailed {
                operation: "UnregisterTrigger",
                causes: failures,
            });
        }

        if !failures.is_empty() {
            warn!(
                failed_count = failures.len(),
                errors = %join_causes(&failures),
                "Some trigger unregistrations failed"
            );
        }

        Ok(())
    }

    /// Attach to the executable hook of every node.
    ///
    /// Decoded requests from all nodes are pushed onto `inbound`. Each one is
    /// answered on its own node's stream before that node's next request is
    /// read. Answered means the reply is queued on the node's outbound
    /// channel (`stream_buffer` deep), not that it has been flushed to the
    /// wire. Stops at the first node whose hook cannot be opened.
    pub async fn hook_executables(
        &self,
        cancel: &CancellationToken,
        inbound: mpsc::Sender<CapabilityRequest>,
    ) -> Result<()> {
        for node in self.registry.nodes() {
            let (reply_tx, reply_rx) = mpsc::channel(self.config.stream_buffer);

            let requests = guarded(
                cancel,
                node.api
                    .hook_executables(ReceiverStream::new(reply_rx).boxed()),
            )
            .await
            .map_err(|source| ControlError::HookFailed {
                node: node.address.clone(),
                source,
            })?;

            info!(node = %node.address, "Hooked into executables");

            tokio::spawn(serve_executable_hook(
                node.address.clone(),
                requests,
                reply_tx,
                inbound.clone(),
                cancel.clone(),
            ));
        }
        Ok(())
    }
}

async fn consume_trigger_stream(
    node: String,
    mut stream: TriggerStream,
    queue: mpsc::Sender<TriggerResponse>,
    cancel: CancellationToken,
) {
    debug!(node = %node, "Starting trigger stream handler");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(node = %node, "Context cancelled, stopping trigger stream");
                break;
            }
            next = stream.next() => next,
        };

        let response = match next {
            None => {
                info!(node = %node, "Trigger stream ended normally");
                break;
            }
            Some(Err(status)) => {
                error!(node = %node, error = %status, "Error receiving trigger event");
                let failure = TriggerResponse::failed(StreamError::Transport {
                    node: node.clone(),
                    source: status,
                });
                deliver(&queue, &cancel, failure).await;
                break;
            }
            Some(Ok(wire)) => match TriggerResponse::decode(&node, wire) {
                Ok(response) => response,
                Err(err) => {
                    error!(node = %node, error = %err, "Error processing trigger response");
                    if !deliver(&queue, &cancel, TriggerResponse::failed(err)).await {
                        break;
                    }
                    continue;
                }
            },
        };

        let event_id = response.event.id.clone();
        if !deliver(&queue, &cancel, response).await {
            debug!(node = %node, "Stopped while sending trigger response");
            break;
        }
        debug!(node = %node, event_id = %event_id, "Sent trigger response to channel");
    }

    debug!(node = %node, "Closing trigger stream handler");
}

async fn serve_executable_hook(
    node: String,
    mut requests: ExecutableStream,
    replies: mpsc::Sender<pb::ExecutableResponse>,
    inbound: mpsc::Sender<CapabilityRequest>,
    cancel: CancellationToken,
) {
    loop {
        debug!(node = %node, "Waiting for execute events");

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = requests.next() => next,
        };

        let request = match next {
            None => {
                info!(node = %node, "Executable hook closed by node");
                break;
            }
            Some(Err(status)) => {
                error!(node = %node, error = %status, "Can not receive execute event");
                break;
            }
            Some(Ok(request)) => request,
        };

        let reply = match CapabilityRequest::decode(&node, &request) {
            Ok(decoded) => {
                info!(
                    node = %node,
                    capability = %decoded.id,
                    workflow_id = %decoded.metadata.workflow_id,
                    execution_id = %decoded.metadata.workflow_execution_id,
                    "Got execute event"
                );
                if !deliver(&inbound, &cancel, decoded).await {
                    break;
                }
                pb::ExecutableResponse {
                    id: request.id,
                    capability_type: request.capability_type,
                    value: request.inputs,
                    error: String::new(),
                }
            }
            Err(err) => {
                warn!(node = %node, error = %err, "Rejecting undecodable execute event");
                pb::ExecutableResponse {
                    id: request.id,
                    capability_type: request.capability_type,
                    value: Vec::new(),
                    error: err.to_string(),
                }
            }
        };

        if !deliver(&replies, &cancel, reply).await {
            debug!(node = %node, "Executable hook reply stream closed");
            break;
        }
    }

    debug!(node = %node, "Executable hook handler stopped");
}
