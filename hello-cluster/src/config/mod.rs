//! Deployment configuration resolution.
//!
//! Reads ambient signals through an explicit [`KeyReader`] and produces two
//! immutable values:
//!
//! - a [`RuntimeProfile`]: which address a node advertises to its peers, which
//!   ports it uses, and which sockets it binds;
//! - a [`StoragePlan`]: which backend carries cluster membership and grain
//!   state, and how to reach it.
//!
//! Resolution is a pure function of its inputs apart from one local hostname
//! lookup (container profile only, behind [`HostResolver`]). Callers resolve
//! once at startup and pass the values down; nothing here caches global state.
//!
//! # Precedence
//!
//! ```text
//! environment:  RUN_ON_AZURE_APP_SERVICE > RUN_ON_AWS_ECS > local
//! storage:      AZURE_STORAGE_CONNECTION_STRING > MONGO_CONNECTION_STRING > in-memory
//! ```
//!
//! Client and node both go through [`StoragePlan::resolve`], so a client always
//! agrees with the nodes it talks to on the backing store in use.

pub mod constants;
mod environment;
mod host;
mod resolver;
mod source;
mod storage;

pub use environment::{RuntimeEnvironment, RuntimeProfile};
pub use host::{HostResolver, StaticHostResolver, SystemHostResolver};
pub use resolver::{resolve, ClientConfig, ClusterIdentity, NodeConfig};
pub use source::{EnvKeyReader, KeyReader, LayeredKeyReader, MapKeyReader};
pub use storage::{ClusteringMechanism, DatabaseNames, StoragePlan, StorageProvider};
