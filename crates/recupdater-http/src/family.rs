//! Address family pinning
//!
//! A lookup "over IPv4" must really leave the host over IPv4, otherwise a
//! dual-stack host reports the same family twice. Each pinned client gets a
//! resolver that only hands out addresses of its family, and a local bind
//! address of that family.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use recupdater_core::traits::IpVersion;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unspecified local address of `version`
pub(crate) fn unspecified(version: IpVersion) -> IpAddr {
    match version {
        IpVersion::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpVersion::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}

pub(crate) fn matches(address: IpAddr, version: IpVersion) -> bool {
    match version {
        IpVersion::V4 => address.is_ipv4(),
        IpVersion::V6 => address.is_ipv6(),
    }
}

/// System resolver restricted to one address family
#[derive(Debug, Clone, Copy)]
pub(crate) struct FamilyResolver {
    version: IpVersion,
}

impl FamilyResolver {
    pub(crate) fn new(version: IpVersion) -> Self {
        Self { version }
    }
}

impl Resolve for FamilyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let version = self.version;
        Box::pin(async move {
            let host = format!("{}:0", name.as_str());
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&host)
                .await
                .map_err(|e| -> BoxError { Box::new(e) })?
                .filter(|addr| matches(addr.ip(), version))
                .collect();

            if addrs.is_empty() {
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("'{}' has no {} address", name.as_str(), version),
                )) as BoxError);
            }

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}

/// Literal IP host of `url`, if it has one
pub(crate) fn literal_host(url: &reqwest::Url) -> Option<IpAddr> {
    url.host_str()?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}
