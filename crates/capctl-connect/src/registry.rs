//! NodeRegistry: the ordered set of connected capability nodes

use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::api::{CapabilityApi, GrpcCapabilityApi};
use crate::cache::NodeCache;
use crate::error::Result;
use crate::transport::{self, ConnectOptions, Transport};

/// One connected remote node.
#[derive(Clone)]
pub struct Node {
    /// Address the node was dialed with; identifies it in logs and errors
    pub address: String,

    /// RPC handle
    pub api: Arc<dyn CapabilityApi>,
}

impl Node {
    pub fn new(address: impl Into<String>, api: Arc<dyn CapabilityApi>) -> Self {
        Self {
            address: address.into(),
            api,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Connected nodes, in the order their addresses were given.
///
/// Result vectors returned by the controller are indexed the same way, so
/// position `i` always refers to the same node.
///
/// # Example
///
/// ```rust,no_run
/// use capctl_connect::{ConnectOptions, NodeRegistry, Transport};
///
/// # async fn example() -> capctl_connect::Result<()> {
/// let mut registry = NodeRegistry::new();
/// registry
///     .connect_all(
///         &["10.0.0.5:7777".to_string(), "10.0.0.6:7777".to_string()],
///         Transport::Plaintext,
///         &ConnectOptions::default(),
///     )
///     .await?;
/// assert_eq!(registry.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-constructed nodes
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Dial every address in order and append the resulting nodes.
    ///
    /// Stops at the first failure. Nodes connected before it stay in the
    /// registry; callers should discard a registry whose connect failed.
    pub async fn connect_all(
        &mut self,
        addresses: &[String],
        transport: Transport,
        options: &ConnectOptions,
    ) -> Result<()> {
        for address in addresses {
            let channel = transport::connect(address, transport, options).await?;
            info!(node = %address, ?transport, "Connected to node");
            self.nodes.push(Node::new(
                address.clone(),
                Arc::new(GrpcCapabilityApi::new(channel)),
            ));
        }
        Ok(())
    }

    /// Connect to every address recorded in `cache`.
    pub async fn load_from_cache(
        cache: &NodeCache,
        transport: Transport,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let addresses = cache.load()?;
        let mut registry = Self::new();
        registry.connect_all(&addresses, transport, options).await?;
        Ok(registry)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(|n| n.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;
    use std::time::Duration;

    fn quick() -> ConnectOptions {
        ConnectOptions {
            connect_timeout: Duration::from_millis(500),
            tcp_keepalive: None,
        }
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = NodeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.addresses().count(), 0);
    }

    #[tokio::test]
    async fn test_connect_all_stops_at_invalid_address() {
        let mut registry = NodeRegistry::new();
        let result = registry
            .connect_all(
                &["bad host:1".to_string(), "127.0.0.1:1".to_string()],
                Transport::Plaintext,
                &quick(),
            )
            .await;

        assert!(matches!(result, Err(ControlError::InvalidAddress { .. })));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_missing_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = NodeCache::new(dir.path().join("mock-clients.txt"));

        let result = NodeRegistry::load_from_cache(&cache, Transport::Plaintext, &quick()).await;
        assert!(matches!(result, Err(ControlError::CacheRead { .. })));
    }
}
