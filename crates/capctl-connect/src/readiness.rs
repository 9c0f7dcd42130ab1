//! Readiness polling across the fleet
//!
//! A wait re-runs its query on a fixed period until every node satisfies
//! the predicate, the timeout elapses, or the caller cancels. A failing
//! query only skips that tick.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::broadcast::present_on_all;
use crate::controller::Controller;
use crate::error::{ControlError, Result};

impl Controller {
    /// Wait until every node reports `capability_id`.
    pub async fn wait_for_capability(
        &self,
        cancel: &CancellationToken,
        capability_id: &str,
        timeout: Duration,
    ) -> Result<()> {
        info!(capability = capability_id, "Waiting for capability on all nodes");

        let target = format!("capability {}", capability_id);
        let period = self.config.capability_poll_interval();
        self.poll_until(cancel, &target, timeout, period, move || async move {
            let inventory = self.list(cancel).await?;
            Ok::<_, ControlError>(present_on_all(&inventory, capability_id))
        })
        .await?;

        info!(capability = capability_id, "All nodes now have capability");
        Ok(())
    }

    /// Wait until every node has at least one subscriber for `trigger_id`.
    pub async fn wait_for_trigger_subscribers(
        &self,
        cancel: &CancellationToken,
        trigger_id: &str,
        timeout: Duration,
    ) -> Result<()> {
        info!(trigger_id, "Waiting for subscribers on trigger for all nodes");

        let target = format!("subscribers on trigger {}", trigger_id);
        let period = self.config.subscriber_poll_interval();
        self.poll_until(cancel, &target, timeout, period, move || async move {
            let subscribers = self.get_trigger_subscribers(cancel, trigger_id).await?;
            Ok::<_, ControlError>(subscribers_cover(self.registry.addresses(), &subscribers))
        })
        .await?;

        info!(trigger_id, "All nodes now have subscribers for trigger");
        Ok(())
    }

    /// Poll `probe` every `period` (first probe after one period) until it
    /// yields true.
    ///
    /// When a tick and the deadline coincide the deadline wins. An in-flight
    /// probe is dropped as soon as the deadline passes or `cancel` fires.
    async fn poll_until<F, Fut>(
        &self,
        cancel: &CancellationToken,
        target: &str,
        timeout: Duration,
        period: Duration,
        mut probe: F,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let started = Instant::now();
        // a timeout too large to represent never expires
        let expires_at = started.checked_add(timeout);
        let deadline = async move {
            match expires_at {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut ticker = time::interval_at(started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_error: Option<String> = None;

        let timed_out = |last_error: Option<String>| ControlError::Timeout {
            target: target.to_string(),
            waited: timeout,
            last_error,
        };
        let cancelled = |last_error: Option<String>| ControlError::Cancelled {
            target: target.to_string(),
            last_error,
        };

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(last_error)),
                _ = &mut deadline => return Err(timed_out(last_error)),
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(last_error)),
                _ = &mut deadline => return Err(timed_out(last_error)),
                outcome = probe() => outcome,
            };

            match outcome {
                Ok(true) => return Ok(()),
                Ok(false) => debug!(waiting_for = target, "Not converged yet"),
                Err(e) => {
                    error!(waiting_for = target, error = %e, "Readiness query failed");
                    last_error = Some(e.to_string());
                }
            }
        }
    }
}

/// Every registry node appears in `subscribers` with at least one workflow.
///
/// A node missing from the map counts as not ready.
pub(crate) fn subscribers_cover<'a>(
    addresses: impl IntoIterator<Item = &'a str>,
    subscribers: &BTreeMap<String, Vec<String>>,
) -> bool {
    if let Some((node, _)) = subscribers.iter().find(|(_, ids)| ids.is_empty()) {
        debug!(node = %node, "Node does not have subscribers yet");
        return false;
    }

    let missing: Vec<&str> = addresses
        .into_iter()
        .filter(|address| !subscribers.contains_key(*address))
        .collect();
    if !missing.is_empty() {
        debug!(?missing, "Some nodes are absent from the subscriber report");
        return false;
    }

    true
}
