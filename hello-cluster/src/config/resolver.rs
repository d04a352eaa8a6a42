//! Top-level resolution for the node and client sides.
//!
//! Both sides resolve against the same [`KeyReader`] with the same storage
//! precedence. Resolve once at startup and hand the values down.
//!
//! # Example
//!
//! ```rust
//! use hello_cluster::config::{resolve, MapKeyReader, StorageProvider, SystemHostResolver};
//!
//! let reader = MapKeyReader::new().with("MONGO_CONNECTION_STRING", "mongodb://mongo:27017");
//! # let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
//! # runtime.block_on(async {
//! let (profile, plan) = resolve(&reader, &SystemHostResolver)
//!     .await
//!     .expect("local profile never fails");
//!
//! assert_eq!(profile.peer_port, 11111);
//! assert_eq!(plan.provider, StorageProvider::DocumentStore);
//! # });
//! # Ok::<(), std::io::Error>(())
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Serialize;

use super::constants::{CLUSTER_ID, DEFAULT_GATEWAY_PORT, NODE_NAME, SERVICE_ID};
use super::environment::{RuntimeEnvironment, RuntimeProfile};
use super::host::HostResolver;
use super::source::KeyReader;
use super::storage::{ClusteringMechanism, StoragePlan};
use crate::ConfigurationError;

/// Resolve the endpoint profile and storage plan.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] only for malformed managed-host settings
/// or a failed local host lookup. Every other input falls through to a
/// default.
pub async fn resolve(
    reader: &impl KeyReader,
    hosts: &impl HostResolver,
) -> Result<(RuntimeProfile, StoragePlan), ConfigurationError> {
    let environment = RuntimeEnvironment::detect(reader);
    let profile = RuntimeProfile::for_environment(environment, reader, hosts).await?;
    let plan = StoragePlan::resolve(reader);

    tracing::debug!(
        %environment,
        advertised = %profile.advertised_address,
        peer_port = profile.peer_port,
        gateway_port = profile.gateway_port,
        provider = ?plan.provider,
        "resolved deployment configuration"
    );

    Ok((profile, plan))
}

/// Identity shared by every member and client of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterIdentity {
    /// Cluster id; members with different ids never see each other.
    pub cluster_id: String,
    /// Service id; scopes persisted grain state.
    pub service_id: String,
}

impl Default for ClusterIdentity {
    fn default() -> Self {
        Self {
            cluster_id: CLUSTER_ID.to_string(),
            service_id: SERVICE_ID.to_string(),
        }
    }
}

/// Everything a node needs to join the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeConfig {
    /// Cluster and service ids.
    pub identity: ClusterIdentity,
    /// Name the node registers under.
    pub node_name: String,
    /// Endpoints.
    pub profile: RuntimeProfile,
    /// Membership and grain state backend.
    pub storage: StoragePlan,
}

impl NodeConfig {
    /// Resolve the node-side configuration.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub async fn resolve(
        reader: &impl KeyReader,
        hosts: &impl HostResolver,
    ) -> Result<Self, ConfigurationError> {
        let (profile, storage) = resolve(reader, hosts).await?;
        Ok(Self {
            identity: ClusterIdentity::default(),
            node_name: NODE_NAME.to_string(),
            profile,
            storage,
        })
    }
}

/// Everything a cluster client needs to find the gateways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    /// Cluster and service ids.
    pub identity: ClusterIdentity,
    /// Membership backend used to discover gateways.
    pub storage: StoragePlan,
    /// Fixed gateway for [`ClusteringMechanism::Localhost`].
    pub localhost_gateway: SocketAddr,
}

impl ClientConfig {
    /// Resolve the client-side configuration.
    ///
    /// Infallible: clients do not read endpoint settings.
    pub fn resolve(reader: &impl KeyReader) -> Self {
        Self {
            identity: ClusterIdentity::default(),
            storage: StoragePlan::resolve(reader),
            localhost_gateway: SocketAddr::new(
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                DEFAULT_GATEWAY_PORT,
            ),
        }
    }

    /// Membership mechanism the client uses to find gateways.
    pub fn clustering(&self) -> ClusteringMechanism {
        self.storage.clustering()
    }
}
