//! Trigger commands: subscriber queries, event injection, subscriptions

use capctl_connect::TriggerRegistration;
use capctl_proto as pb;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{done, encode_json_arg, Session};
use crate::error::Result;

/// Upper bound on the best-effort unregistration after a subscription ends
const UNREGISTER_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn subscribers(session: &Session, trigger_id: &str) -> Result<()> {
    let subscribers = session
        .controller
        .get_trigger_subscribers(&session.cancel, trigger_id)
        .await?;
    session.output.subscribers(trigger_id, &subscribers);
    Ok(())
}

pub async fn wait_for_subscribers(
    session: &Session,
    trigger_id: &str,
    timeout: Duration,
) -> Result<()> {
    session
        .controller
        .wait_for_trigger_subscribers(&session.cancel, trigger_id, timeout)
        .await?;
    session
        .output
        .operation_result(&done("wait-subscribers", trigger_id));
    Ok(())
}

/// Inject one trigger event on every node. `outputs` is a JSON object.
pub async fn send_trigger(
    session: &Session,
    trigger_id: &str,
    event_id: &str,
    outputs: &str,
) -> Result<()> {
    let message = pb::SendTriggerEventRequest {
        trigger_id: trigger_id.to_string(),
        id: event_id.to_string(),
        outputs: encode_json_arg("outputs", outputs)?,
    };
    session
        .controller
        .send_trigger(&session.cancel, &message)
        .await?;
    session.output.operation_result(&done("send-trigger", event_id));
    Ok(())
}

/// Print events from every node until the session is cancelled or every
/// stream has ended, then unregister.
pub async fn subscribe(session: &Session, registration: &TriggerRegistration) -> Result<()> {
    let queues = session
        .controller
        .register_trigger(&session.cancel, registration)
        .await?;

    let nodes = session.controller.registry().addresses().map(str::to_string);
    let printers: Vec<_> = queues
        .into_iter()
        .zip(nodes)
        .map(|(mut queue, node)| {
            let output = session.output.clone();
            tokio::spawn(async move {
                let mut received = 0usize;
                while let Some(response) = queue.recv().await {
                    received += 1;
                    output.trigger_response(&node, &response);
                }
                debug!(node = %node, received, "Trigger queue closed");
                received
            })
        })
        .collect();

    let mut total = 0usize;
    for printer in printers {
        match printer.await {
            Ok(received) => total += received,
            Err(e) => warn!(error = %e, "Trigger printer task failed"),
        }
    }
    info!(trigger_id = %registration.trigger_id, total, "Subscription ended");

    // the session token is usually cancelled by now
    let cleanup = CancellationToken::new();
    match tokio::time::timeout(
        UNREGISTER_TIMEOUT,
        session.controller.unregister_trigger(&cleanup, registration),
    )
    .await
    {
        Ok(Ok(())) => info!(trigger_id = %registration.trigger_id, "Unregistered trigger"),
        Ok(Err(e)) => warn!(error = %e, "Failed to unregister trigger"),
        Err(_) => {
            cleanup.cancel();
            warn!(trigger_id = %registration.trigger_id, "Timed out unregistering trigger");
        }
    }

    Ok(())
}
