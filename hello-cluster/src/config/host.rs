//! Local host address lookup for the container profile.

use std::io;
use std::net::IpAddr;

use async_trait::async_trait;

/// Resolves the address this host is reachable at.
#[async_trait(?Send)]
pub trait HostResolver {
    /// First address the local hostname resolves to.
    async fn local_address(&self) -> io::Result<IpAddr>;
}

/// Resolves the machine hostname through the system resolver.
///
/// Goes through `getaddrinfo`, so `/etc/hosts` entries and the container's
/// DNS configuration both apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostResolver;

#[async_trait(?Send)]
impl HostResolver for SystemHostResolver {
    async fn local_address(&self) -> io::Result<IpAddr> {
        let host = gethostname::gethostname().into_string().map_err(|raw| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("hostname {raw:?} is not valid UTF-8"),
            )
        })?;
        if host.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "empty hostname"));
        }
        let address = lookup(&host).await?;
        tracing::debug!(%host, %address, "resolved local host address");
        Ok(address)
    }
}

/// First address `host` resolves to.
pub(crate) async fn lookup(host: &str) -> io::Result<IpAddr> {
    tokio::net::lookup_host((host, 0))
        .await?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("hostname {host} resolved to no addresses"),
            )
        })
}

/// Always answers with a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHostResolver(pub IpAddr);

#[async_trait(?Send)]
impl HostResolver for StaticHostResolver {
    async fn local_address(&self) -> io::Result<IpAddr> {
        Ok(self.0)
    }
}
