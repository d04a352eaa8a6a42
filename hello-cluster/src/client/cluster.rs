//! Contract with the actor runtime's client.
//!
//! The handshake, gateway discovery and wire protocol belong to the runtime.
//! This crate only drives the client through connect and close, and forwards
//! grain calls.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::ClusterClientError;

/// One grain method call, with an already-encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorCall {
    /// Grain type name.
    pub grain_type: String,
    /// Grain key within the type.
    pub key: String,
    /// Method name.
    pub method: String,
    /// JSON-encoded request.
    pub body: Vec<u8>,
}

/// A built, not necessarily connected, cluster client.
///
/// # Single-core
///
/// No Send bounds, the client lives on one thread with its owner.
#[async_trait(?Send)]
pub trait ClusterClient {
    /// Perform one handshake attempt with the cluster.
    async fn connect(&self) -> Result<(), ClusterClientError>;

    /// Gracefully close the link.
    async fn close(&self) -> Result<(), ClusterClientError>;

    /// Whether the client reports a usable link.
    fn is_initialized(&self) -> bool;

    /// Forward a grain call and return the JSON-encoded response.
    async fn invoke(&self, call: ActorCall) -> Result<Vec<u8>, ClusterClientError>;
}

/// Builds a [`ClusterClient`] for the clustering mechanism a config selects.
pub trait ClientBuilder {
    /// Client type produced.
    type Client: ClusterClient;

    /// Build an unconnected client.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterClientError::Unsupported`] when the builder cannot
    /// reach the selected membership backend.
    fn build(&self, config: &ClientConfig) -> Result<Self::Client, ClusterClientError>;
}
