//! In-process cluster for the localhost clustering profile.
//!
//! With the in-memory storage plan a single local node serves every grain.
//! [`LocalCluster`] plays both sides: it is the client the
//! [`ConnectionManager`](crate::client::ConnectionManager) drives, and it hosts
//! the registered grain types in the same process.
//!
//! # Turn-based execution
//!
//! Each activation sits behind an async mutex: calls to one grain key run one
//! at a time, calls to different keys interleave freely.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::grain::{activator, Activation, Activator, Grain, GrainContext};
use super::state::{GrainStorage, MemoryGrainStorage};
use crate::client::{ActorCall, ClientBuilder, ClusterClient};
use crate::config::{ClientConfig, ClusteringMechanism};
use crate::ClusterClientError;

type ActivationKey = (String, String);
type SharedActivation = Rc<Mutex<Box<dyn Activation>>>;

/// Builder for [`LocalCluster`].
///
/// # Example
///
/// ```rust,ignore
/// let builder = LocalCluster::builder().register::<HelloWorld>();
/// let manager = ConnectionManager::build(&builder, &config, options, time)?;
/// ```
#[derive(Clone, Default)]
pub struct LocalClusterBuilder {
    activators: HashMap<&'static str, Activator>,
    storage: Option<Rc<dyn GrainStorage>>,
}

impl LocalClusterBuilder {
    /// Host grain type `G`.
    pub fn register<G: Grain>(mut self) -> Self {
        self.activators.insert(G::GRAIN_TYPE, activator::<G>());
        self
    }

    /// Keep grain state in `storage` instead of fresh storage for the plan.
    pub fn storage(mut self, storage: Rc<dyn GrainStorage>) -> Self {
        self.storage = Some(storage);
        self
    }
}

impl fmt::Debug for LocalClusterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalClusterBuilder")
            .field("grain_types", &self.activators.keys().collect::<Vec<_>>())
            .field("storage", &self.storage)
            .finish()
    }
}

impl ClientBuilder for LocalClusterBuilder {
    type Client = LocalCluster;

    fn build(&self, config: &ClientConfig) -> Result<LocalCluster, ClusterClientError> {
        let clustering = config.clustering();
        if clustering != ClusteringMechanism::Localhost {
            return Err(ClusterClientError::Unsupported(format!(
                "local cluster cannot join {clustering:?} membership"
            )));
        }

        let storage = self
            .storage
            .clone()
            .unwrap_or_else(|| Rc::new(MemoryGrainStorage::for_plan(&config.storage)));

        Ok(LocalCluster {
            gateway: config.localhost_gateway,
            activators: self.activators.clone(),
            activations: RefCell::new(HashMap::new()),
            storage,
            connected: Cell::new(false),
        })
    }
}

/// Single-process cluster hosting grains in memory.
pub struct LocalCluster {
    gateway: SocketAddr,
    activators: HashMap<&'static str, Activator>,
    activations: RefCell<HashMap<ActivationKey, SharedActivation>>,
    storage: Rc<dyn GrainStorage>,
    connected: Cell<bool>,
}

impl LocalCluster {
    /// Start building a local cluster.
    pub fn builder() -> LocalClusterBuilder {
        LocalClusterBuilder::default()
    }

    /// Number of live activations.
    pub fn activation_count(&self) -> usize {
        self.activations.borrow().len()
    }

    async fn activation(&self, call: &ActorCall) -> Result<SharedActivation, ClusterClientError> {
        let key = (call.grain_type.clone(), call.key.clone());
        if let Some(existing) = self.activations.borrow().get(&key) {
            return Ok(existing.clone());
        }

        let activate = self
            .activators
            .get(call.grain_type.as_str())
            .ok_or_else(|| ClusterClientError::UnknownGrainType(call.grain_type.clone()))?
            .clone();

        let grain = activate(GrainContext {
            key: call.key.clone(),
            storage: self.storage.clone(),
        })
        .await?;
        tracing::debug!(grain_type = %call.grain_type, key = %call.key, "grain activated");

        let activation = self
            .activations
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| Rc::new(Mutex::new(grain)))
            .clone();
        Ok(activation)
    }
}

impl fmt::Debug for LocalCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCluster")
            .field("gateway", &self.gateway)
            .field("grain_types", &self.activators.keys().collect::<Vec<_>>())
            .field("activations", &self.activation_count())
            .field("connected", &self.connected.get())
            .finish()
    }
}

#[async_trait(?Send)]
impl ClusterClient for LocalCluster {
    async fn connect(&self) -> Result<(), ClusterClientError> {
        self.connected.set(true);
        tracing::debug!(gateway = %self.gateway, "connected to local cluster");
        Ok(())
    }

    async fn close(&self) -> Result<(), ClusterClientError> {
        self.connected.set(false);
        let deactivated = self.activations.borrow_mut().drain().count();
        tracing::debug!(deactivated, "local cluster closed");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.connected.get()
    }

    async fn invoke(&self, call: ActorCall) -> Result<Vec<u8>, ClusterClientError> {
        if !self.connected.get() {
            return Err(ClusterClientError::Closed);
        }
        let activation = self.activation(&call).await?;
        let mut grain = activation.lock().await;
        Ok(grain.handle(&call.method, &call.body).await?)
    }
}
