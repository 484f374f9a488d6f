//! Public IP resolution
//!
//! [`IpResolver`] asks a "what is my IP" service for the host's IPv4 and,
//! when enabled, IPv6 address. Each lookup is forced onto its address family.
//! A family whose lookup fails is left empty; resolution as a whole only
//! fails when both are empty.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::traits::{HttpRequest, IpVersion, Transport};

/// Addresses resolved in one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedAddresses {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

impl ResolvedAddresses {
    pub fn new(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Self {
        Self { ipv4, ipv6 }
    }

    /// Both addresses empty
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }
}

impl fmt::Display for ResolvedAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ipv4, self.ipv6) {
            (Some(v4), Some(v6)) => write!(f, "{v4}, {v6}"),
            (Some(v4), None) => write!(f, "{v4}"),
            (None, Some(v6)) => write!(f, "{v6}"),
            (None, None) => f.write_str("<none>"),
        }
    }
}

/// Resolves the public addresses through a [`Transport`]
pub struct IpResolver {
    transport: Arc<dyn Transport>,
    service_url: String,
    timeout: Option<Duration>,
    enable_ipv6: bool,
}

impl IpResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `transport`: HTTP transport used for the lookups
    /// - `service_url`: URL answering with the caller's address as plain text
    /// - `timeout`: per-lookup timeout, `None` for no limit
    /// - `enable_ipv6`: whether to attempt the IPv6 lookup at all
    pub fn new(
        transport: Arc<dyn Transport>,
        service_url: impl Into<String>,
        timeout: Option<Duration>,
        enable_ipv6: bool,
    ) -> Self {
        Self {
            transport,
            service_url: service_url.into(),
            timeout,
            enable_ipv6,
        }
    }

    /// Create a resolver from the runtime configuration
    pub fn from_config(transport: Arc<dyn Transport>, config: &UpdaterConfig) -> Self {
        Self::new(
            transport,
            config.ip_service.clone(),
            config.request_timeout(),
            config.enable_ipv6,
        )
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn ipv6_enabled(&self) -> bool {
        self.enable_ipv6
    }

    /// Resolve the current public addresses
    ///
    /// # Returns
    ///
    /// - `Ok(ResolvedAddresses)`: at least one address is present
    /// - `Err(Error::IpResolution)`: both lookups came back empty
    pub async fn resolve(&self) -> Result<ResolvedAddresses> {
        let ipv4 = self
            .lookup(IpVersion::V4)
            .await
            .and_then(|text| parse_family(&text, IpVersion::V4, str::parse::<Ipv4Addr>));

        let ipv6 = if self.enable_ipv6 {
            self.lookup(IpVersion::V6)
                .await
                .and_then(|text| parse_family(&text, IpVersion::V6, str::parse::<Ipv6Addr>))
        } else {
            None
        };

        let addresses = ResolvedAddresses::new(ipv4, ipv6);
        if addresses.is_empty() {
            return Err(Error::ip_resolution(&self.service_url));
        }

        debug!("Resolved public address(es): {}", addresses);
        Ok(addresses)
    }

    /// Fetch the raw lookup body for one family, `None` on failure or empty body
    async fn lookup(&self, version: IpVersion) -> Option<String> {
        let request = HttpRequest::get(&self.service_url)
            .with_timeout(self.timeout)
            .over(version);

        match self.transport.perform(request).await {
            Ok(body) => {
                let text = body.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                debug!("{} lookup via {} failed: {}", version, self.service_url, e);
                None
            }
        }
    }
}

fn parse_family<T, E>(
    text: &str,
    version: IpVersion,
    parse: impl Fn(&str) -> std::result::Result<T, E>,
) -> Option<T> {
    match parse(text) {
        Ok(address) => Some(address),
        Err(_) => {
            warn!("Ignoring {} lookup result, not an address: '{}'", version, text);
            None
        }
    }
}
