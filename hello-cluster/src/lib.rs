//! # hello-cluster
//!
//! Client and node wiring for a virtual actor ("grain") cluster.
//!
//! A cluster client invokes addressable, stateful grains hosted by a set of
//! nodes. The nodes persist grain state to a pluggable backing store. This
//! crate owns the two pieces that sit between the process and the runtime:
//!
//! - [`config`]: deterministic selection of endpoint and persistence profiles
//!   from an explicit [`KeyReader`](config::KeyReader).
//! - [`client`]: the connection lifecycle of a cluster client, with a fixed
//!   retry budget on connect and a cancellation race on shutdown.
//!
//! ## Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  bin/hello-cluster        resolve | greet                   │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │  client                  │       actors                     │
//! │  • ConnectionManager     │       • Grain trait              │
//! │  • ActorInvoker          │       • GrainStorage             │
//! │  • HealthProbe           │       • HelloWorld grain         │
//! │                          │       • LocalCluster             │
//! ├──────────────────────────┴──────────────────────────────────┤
//! │  config                               time                  │
//! │  KeyReader → RuntimeProfile + StoragePlan   TimeProvider    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hello_cluster::actors::{HelloWorld, HelloWorldRef, LocalCluster};
//! use hello_cluster::client::{ConnectOptions, ConnectionManager};
//! use hello_cluster::config::{ClientConfig, EnvKeyReader};
//! use hello_cluster::TokioTimeProvider;
//!
//! let config = ClientConfig::resolve(&EnvKeyReader);
//! let builder = LocalCluster::builder().register::<HelloWorld>();
//! let options = ConnectOptions::default();
//! let time = TokioTimeProvider::new();
//! let mut manager = ConnectionManager::build(&builder, &config, options, time)?;
//!
//! manager.start(&shutdown).await?;
//! let alice: HelloWorldRef<_> = manager.invoker().get_grain("alice");
//! let greeting = alice.say_hello_world().await?;
//! manager.stop(&shutdown).await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod actors;
pub mod client;
pub mod config;
mod error;
mod time;

pub use error::{ClusterClientError, ConfigurationError, ConnectFailure, GrainError, InvokeError};
pub use time::{TimeProvider, TokioTimeProvider};
