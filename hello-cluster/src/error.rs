//! Error types for configuration resolution and the cluster client.

use thiserror::Error;

use crate::client::ConnectionState;

/// Fatal configuration problems detected while resolving the runtime profile.
///
/// None of these are recoverable: the process must not start a node or a
/// client with a half-resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A key required by the selected environment is absent or empty.
    #[error("missing required configuration key {key}")]
    MissingKey {
        /// The configuration key.
        key: &'static str,
    },

    /// A configured IP address could not be parsed.
    #[error("invalid IP address {value:?} in {key}")]
    InvalidAddress {
        /// The configuration key.
        key: &'static str,
        /// The raw value.
        value: String,
    },

    /// The private ports list holds fewer than the peer and gateway ports.
    #[error("insufficient private ports configured: expected at least 2, found {found}")]
    InsufficientPorts {
        /// Number of comma-separated entries found.
        found: usize,
    },

    /// A port entry is not a valid port number.
    #[error("invalid port {value:?} in {key}")]
    InvalidPort {
        /// The configuration key.
        key: &'static str,
        /// The offending entry.
        value: String,
    },

    /// The local hostname could not be resolved to an address.
    #[error("could not resolve local host address: {0}")]
    HostLookup(String),

    /// Hostname resolution yielded an address peers cannot reach.
    #[error("resolved host address {0} cannot be advertised to peers")]
    UnroutableHostAddress(std::net::IpAddr),
}

/// Terminal outcomes of [`ConnectionManager::start`](crate::client::ConnectionManager::start).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectFailure {
    /// Every retry was consumed without a successful handshake.
    #[error("could not connect to the cluster after {attempts} attempts: {last_error}")]
    BudgetExhausted {
        /// Total handshake attempts made.
        attempts: u32,
        /// Message of the last handshake failure.
        last_error: String,
    },

    /// Shutdown was requested while waiting between attempts.
    #[error("connect cancelled after {attempts} attempts")]
    Cancelled {
        /// Total handshake attempts made before cancellation.
        attempts: u32,
    },

    /// The manager was stopped; build a new one to reconnect.
    #[error("connection manager is closed")]
    Closed,
}

/// Errors reported by a [`ClusterClient`](crate::client::ClusterClient) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterClientError {
    /// No gateway accepted the handshake.
    #[error("cluster unreachable: {0}")]
    Unreachable(String),

    /// The client cannot be built for the requested clustering mechanism.
    #[error("unsupported clustering: {0}")]
    Unsupported(String),

    /// No grain type with this name is hosted by the cluster.
    #[error("unknown grain type {0}")]
    UnknownGrainType(String),

    /// The grain call itself failed.
    #[error("grain call failed: {0}")]
    Grain(#[from] GrainError),

    /// The link was closed underneath the call.
    #[error("connection closed")]
    Closed,
}

/// Errors surfaced to callers of the invoke capability.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The client is not connected to the cluster.
    #[error("cluster client is not connected (state: {0:?})")]
    NotConnected(ConnectionState),

    /// Request or response payload could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The cluster rejected or failed the call.
    #[error(transparent)]
    Client(#[from] ClusterClientError),
}

/// Errors raised while activating or dispatching to a grain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrainError {
    /// The grain has no handler for the requested method.
    #[error("unknown method {method} on {grain_type}")]
    UnknownMethod {
        /// Grain type name.
        grain_type: String,
        /// Requested method.
        method: String,
    },

    /// Payload could not be decoded or encoded.
    #[error("payload error: {0}")]
    Payload(String),

    /// Reading or writing persistent state failed.
    #[error("state error: {0}")]
    State(String),
}

impl From<crate::actors::GrainStateError> for GrainError {
    fn from(err: crate::actors::GrainStateError) -> Self {
        GrainError::State(err.to_string())
    }
}
