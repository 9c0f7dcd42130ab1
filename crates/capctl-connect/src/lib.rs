//! Capctl Connect: control-plane client for a fleet of mock capability nodes
//!
//! Connects to every node of a fleet, broadcasts control operations to all
//! of them, multiplexes each node's event stream into its own queue, and
//! polls the fleet until it converges.
//!
//! # Architecture
//!
//! - **NodeRegistry**: ordered list of connected nodes, fixed after connect
//! - **Controller**: fleet-wide operations over a registry
//!   - fail-fast unary broadcasts (`register_to_workflow`, `execute`, `list`, ...)
//!   - tolerant stream fan-out (`register_trigger`, `unregister_trigger`)
//!   - fan-in executable hooks (`hook_executables`)
//!   - readiness waits (`wait_for_capability`, `wait_for_trigger_subscribers`)
//! - **CapabilityApi**: the per-node RPC seam, implemented over gRPC by
//!   `GrpcCapabilityApi`
//!
//! # Example
//!
//! ```rust,no_run
//! use capctl_connect::{Controller, ControllerConfig, Transport, TriggerRegistration};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let nodes = vec!["10.0.0.5:7777".to_string(), "10.0.0.6:7777".to_string()];
//!     let controller =
//!         Controller::connect(&nodes, Transport::Plaintext, ControllerConfig::default()).await?;
//!
//!     let cancel = CancellationToken::new();
//!     controller
//!         .wait_for_capability(&cancel, "cron-trigger@1.0.0", Duration::from_secs(60))
//!         .await?;
//!
//!     let registration = TriggerRegistration::new("cron-trigger@1.0.0").with_method("Trigger");
//!     let mut queues = controller.register_trigger(&cancel, &registration).await?;
//!     if let Some(response) = queues[0].recv().await {
//!         println!("first event from {}: {:?}", nodes[0], response.event);
//!     }
//!
//!     cancel.cancel();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod broadcast;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod readiness;
pub mod registry;
pub mod streams;
pub mod transport;
pub mod types;

pub use api::{CapabilityApi, ExecutableReplies, ExecutableStream, GrpcCapabilityApi, TriggerStream};
pub use cache::{NodeCache, DEFAULT_CACHE_PATH};
pub use config::ControllerConfig;
pub use controller::Controller;
pub use error::{ControlError, Result, StreamError};
pub use registry::{Node, NodeRegistry};
pub use transport::{ConnectOptions, Transport};
pub use types::{
    CapInfosByNode, CapabilityInfo, CapabilityRequest, CapabilityType, RequestMetadata,
    TriggerEvent, TriggerRegistration, TriggerResponse, ValueMap,
};
