//! Runtime environment detection and per-environment endpoint profiles.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Serialize;

use super::constants::{
    DEFAULT_GATEWAY_PORT, DEFAULT_PEER_PORT, RUN_ON_AWS_ECS, RUN_ON_AZURE_APP_SERVICE,
    WEBSITE_PRIVATE_IP, WEBSITE_PRIVATE_PORTS,
};
use super::host::HostResolver;
use super::source::KeyReader;
use crate::ConfigurationError;

/// Where the node process is running.
///
/// Determined once per process start from configuration flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeEnvironment {
    /// Developer machine: everything on loopback.
    Local,
    /// A managed web host that assigns a private IP and private ports.
    PlatformManagedHost,
    /// A container orchestrator that gives each container its own private IP.
    ContainerOrchestrated,
}

impl RuntimeEnvironment {
    /// Detect the environment from configuration flags.
    ///
    /// The managed-host flag wins over the orchestration flag; with neither
    /// set the environment is [`Local`](Self::Local). Conflicting flags are
    /// not reported.
    pub fn detect(reader: &impl KeyReader) -> Self {
        if reader.get_flag(RUN_ON_AZURE_APP_SERVICE) {
            return Self::PlatformManagedHost;
        }
        if reader.get_flag(RUN_ON_AWS_ECS) {
            return Self::ContainerOrchestrated;
        }
        Self::Local
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "Local"),
            Self::PlatformManagedHost => write!(f, "PlatformManagedHost"),
            Self::ContainerOrchestrated => write!(f, "ContainerOrchestrated"),
        }
    }
}

/// Endpoint configuration a node starts with.
///
/// The advertised address is what peers and gateways use to discover the
/// node; listen bindings are the sockets it actually binds. They differ when
/// the platform hands the container its own private IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeProfile {
    /// Environment this profile was built for.
    pub environment: RuntimeEnvironment,
    /// Address advertised to peers.
    pub advertised_address: IpAddr,
    /// Node-to-node port.
    pub peer_port: u16,
    /// Client-to-node gateway port.
    pub gateway_port: u16,
    /// Explicit socket bindings. Empty means "bind the advertised address".
    pub listen_bindings: Vec<SocketAddr>,
}

impl RuntimeProfile {
    /// Build the profile for `environment`.
    ///
    /// # Errors
    ///
    /// Only the managed-host and container profiles can fail, see
    /// [`platform_managed`](Self::platform_managed) and
    /// [`container_orchestrated`](Self::container_orchestrated).
    pub async fn for_environment(
        environment: RuntimeEnvironment,
        reader: &impl KeyReader,
        hosts: &impl HostResolver,
    ) -> Result<Self, ConfigurationError> {
        match environment {
            RuntimeEnvironment::Local => Ok(Self::local()),
            RuntimeEnvironment::PlatformManagedHost => Self::platform_managed(reader),
            RuntimeEnvironment::ContainerOrchestrated => Self::container_orchestrated(hosts).await,
        }
    }

    /// Loopback on the default ports.
    pub fn local() -> Self {
        Self {
            environment: RuntimeEnvironment::Local,
            advertised_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            peer_port: DEFAULT_PEER_PORT,
            gateway_port: DEFAULT_GATEWAY_PORT,
            listen_bindings: Vec::new(),
        }
    }

    /// Address and ports assigned by the managed host.
    ///
    /// The first private port is the peer port, the second the gateway port;
    /// further entries are ignored.
    ///
    /// # Errors
    ///
    /// Missing keys, an unparseable IP, fewer than two ports, or a port entry
    /// that is not a number are all fatal.
    pub fn platform_managed(reader: &impl KeyReader) -> Result<Self, ConfigurationError> {
        let raw_ip = reader
            .get_non_empty(WEBSITE_PRIVATE_IP)
            .ok_or(ConfigurationError::MissingKey {
                key: WEBSITE_PRIVATE_IP,
            })?;
        let raw_ports = reader
            .get(WEBSITE_PRIVATE_PORTS)
            .ok_or(ConfigurationError::MissingKey {
                key: WEBSITE_PRIVATE_PORTS,
            })?;

        let advertised_address: IpAddr =
            raw_ip
                .trim()
                .parse()
                .map_err(|_| ConfigurationError::InvalidAddress {
                    key: WEBSITE_PRIVATE_IP,
                    value: raw_ip.clone(),
                })?;

        let entries: Vec<&str> = raw_ports.split(',').collect();
        if entries.len() < 2 {
            return Err(ConfigurationError::InsufficientPorts {
                found: entries.len(),
            });
        }

        Ok(Self {
            environment: RuntimeEnvironment::PlatformManagedHost,
            advertised_address,
            peer_port: parse_port(entries[0])?,
            gateway_port: parse_port(entries[1])?,
            listen_bindings: Vec::new(),
        })
    }

    /// Advertise the host's own address, bind every interface.
    ///
    /// # Errors
    ///
    /// Fails when the hostname cannot be resolved, or resolves to the
    /// unspecified address (which peers cannot dial).
    pub async fn container_orchestrated(
        hosts: &impl HostResolver,
    ) -> Result<Self, ConfigurationError> {
        let advertised_address = hosts
            .local_address()
            .await
            .map_err(|e| ConfigurationError::HostLookup(e.to_string()))?;
        if advertised_address.is_unspecified() {
            return Err(ConfigurationError::UnroutableHostAddress(advertised_address));
        }

        let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        Ok(Self {
            environment: RuntimeEnvironment::ContainerOrchestrated,
            advertised_address,
            peer_port: DEFAULT_PEER_PORT,
            gateway_port: DEFAULT_GATEWAY_PORT,
            listen_bindings: vec![
                SocketAddr::new(any, DEFAULT_PEER_PORT),
                SocketAddr::new(any, DEFAULT_GATEWAY_PORT),
            ],
        })
    }

    /// Advertised peer endpoint.
    pub fn peer_endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.advertised_address, self.peer_port)
    }

    /// Advertised gateway endpoint.
    pub fn gateway_endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.advertised_address, self.gateway_port)
    }

    /// Sockets to bind: explicit bindings, or the advertised endpoints.
    pub fn effective_bindings(&self) -> Vec<SocketAddr> {
        if self.listen_bindings.is_empty() {
            vec![self.peer_endpoint(), self.gateway_endpoint()]
        } else {
            self.listen_bindings.clone()
        }
    }
}

fn parse_port(entry: &str) -> Result<u16, ConfigurationError> {
    entry
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidPort {
            key: WEBSITE_PRIVATE_PORTS,
            value: entry.to_string(),
        })
}
