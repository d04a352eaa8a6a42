//! Cluster client lifecycle.
//!
//! The [`ConnectionManager`] exclusively owns the process's link to the
//! cluster. Collaborators never see the link itself; they get capabilities:
//!
//! - [`ActorInvoker`]: call a grain by type and string key;
//! - [`HealthProbe`]: readiness derived from the connection state.
//!
//! # Lifecycle
//!
//! ```text
//! Unconnected ──start──► Connecting ──ok──► Connected ──stop──► Closing ──► Closed
//!                         │  ▲    │
//!                         └──┘    └── budget exhausted ──► Failed
//!                        retry
//! ```

mod cluster;
mod health;
mod invoker;
mod manager;

pub use cluster::{ActorCall, ClientBuilder, ClusterClient};
pub use health::{HealthProbe, HealthReport, HealthStatus};
pub use invoker::{ActorInvoker, GrainRef};
pub use manager::{ConnectOptions, ConnectionManager, ConnectionState, RetryBudget};
