// # HTTP Transport
//
// reqwest-backed implementation of `recupdater_core::traits::Transport`.
//
// ## Clients
//
// Three clients are built up front and reused for every request:
//
// - an unpinned client for provider API calls
// - an IPv4-pinned client for `over(IpVersion::V4)` lookups
// - an IPv6-pinned client for `over(IpVersion::V6)` lookups
//
// ## Responses
//
// The body is returned for every status code. Deciding what a response
// means is up to the caller (the resolver parses an address, the provider
// looks for its success marker). Only failing to get a body at all is an
// error.

mod family;

use std::sync::Arc;

use async_trait::async_trait;
use recupdater_core::traits::{HttpRequest, IpVersion, Method, Transport};
use recupdater_core::{Error, Result};

use crate::family::FamilyResolver;

/// Transport performing real HTTP requests
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    any: reqwest::Client,
    v4: reqwest::Client,
    v6: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the three clients
    pub fn new() -> Result<Self> {
        Ok(Self {
            any: base_builder()
                .build()
                .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?,
            v4: pinned(IpVersion::V4)?,
            v6: pinned(IpVersion::V6)?,
        })
    }

    fn client(&self, version: Option<IpVersion>) -> &reqwest::Client {
        match version {
            None => &self.any,
            Some(IpVersion::V4) => &self.v4,
            Some(IpVersion::V6) => &self.v6,
        }
    }
}

fn base_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().user_agent(concat!("recupdater/", env!("CARGO_PKG_VERSION")))
}

fn pinned(version: IpVersion) -> Result<reqwest::Client> {
    base_builder()
        .local_address(family::unspecified(version))
        .dns_resolver(Arc::new(FamilyResolver::new(version)))
        .build()
        .map_err(|e| Error::transport(format!("Failed to build {} HTTP client: {}", version, e)))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(&self, request: HttpRequest) -> Result<String> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| Error::invalid_input(format!("Invalid URL '{}': {}", request.url, e)))?;

        // A literal address bypasses the family resolver
        if let (Some(version), Some(host)) = (request.ip_version, family::literal_host(&url))
            && !family::matches(host, version)
        {
            return Err(Error::transport(format!("{} is not an {} address", host, version)));
        }

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client(request.ip_version).request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {}", e)))?;

        tracing::trace!("{} -> {} ({} bytes)", request.url, status, body.len());
        Ok(body)
    }

    fn transport_name(&self) -> &'static str {
        "reqwest"
    }
}
