//! Controller: entry point for every fleet-wide operation
//!
//! Operations are spread over three modules by failure policy:
//! - `broadcast`: unary fan-out, fail-fast
//! - `streams`: subscriptions and hooks, tolerant of partial failure
//! - `readiness`: polling waits built on the broadcast queries

use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

use crate::cache::NodeCache;
use crate::config::ControllerConfig;
use crate::error::Result;
use crate::registry::NodeRegistry;
use crate::transport::Transport;

/// Multi-node capability controller.
///
/// The node list is fixed once constructed, so operations borrow `&self`
/// and may run concurrently.
#[derive(Debug, Clone)]
pub struct Controller {
    pub(crate) registry: NodeRegistry,
    pub(crate) config: ControllerConfig,
}

impl Controller {
    pub fn new(registry: NodeRegistry, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    /// Connect to every address and build a controller over the result.
    pub async fn connect(
        addresses: &[String],
        transport: Transport,
        config: ControllerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut registry = NodeRegistry::new();
        registry
            .connect_all(addresses, transport, &config.connect_options())
            .await?;
        Ok(Self { registry, config })
    }

    /// Connect to the addresses stored in `cache`.
    pub async fn from_cache(
        cache: &NodeCache,
        transport: Transport,
        config: ControllerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let registry =
            NodeRegistry::load_from_cache(cache, transport, &config.connect_options()).await?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

/// Run `call` unless `cancel` fires first.
pub(crate) async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = std::result::Result<T, Status>>,
) -> std::result::Result<T, Status> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Status::cancelled("operation cancelled by caller")),
        result = call => result,
    }
}

/// Push `value` onto `queue`, racing cancellation.
///
/// Returns false when the value was not delivered, either because `cancel`
/// fired or because the receiving side is gone.
pub(crate) async fn deliver<T>(
    queue: &mpsc::Sender<T>,
    cancel: &CancellationToken,
    value: T,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = queue.send(value) => sent.is_ok(),
    }
}
