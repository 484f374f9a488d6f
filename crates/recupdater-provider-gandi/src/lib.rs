// # Gandi LiveDNS Provider
//
// Implements `DnsProvider` against the Gandi LiveDNS v5 API.
//
// ## Protocol
//
// One request per subdomain and address family:
//
// ```http
// PUT <api>/domains/<domain>/records/<subdomain>/<A|AAAA>
// X-Api-Key: <key>
// Content-Type: application/json
//
// {"rrset_ttl": "18000", "rrset_values": ["1.2.3.4"]}
// ```
//
// ## Classification
//
// The HTTP status is not consulted. A response is accepted when its body,
// lowercased, contains the configured success marker. Anything else is a
// rejection whose message is the quoted value after `"message":`, or
// `Unknown error`. An empty body (transport failure, timeout) is a rejection
// as well.
//
// ## Scope
//
// The provider is single-shot: no retries, no state, no background tasks.
// Iteration over subdomains, atomicity and cancellation belong to the engine.

use async_trait::async_trait;
use recupdater_core::config::UpdaterConfig;
use recupdater_core::traits::{DnsProvider, HttpRequest, IpVersion, Transport, UpdateTarget};
use recupdater_core::{Error, Result};
use serde::Serialize;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Detail used when a rejection carries no readable message
pub const UNKNOWN_ERROR: &str = "Unknown error";

const MESSAGE_KEY: &str = "\"message\":";

/// Request body of a single rrset update
///
/// The TTL travels as a JSON string.
#[derive(Debug, Serialize)]
struct RrsetUpdate {
    rrset_ttl: String,
    rrset_values: Vec<String>,
}

impl RrsetUpdate {
    /// JSON with a space after every `:` and `,`
    fn to_body(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| Error::Other(e.to_string()))
    }
}

/// Single-line JSON in the `{"key": "value", ...}` layout
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}

/// Gandi LiveDNS provider
pub struct GandiProvider {
    transport: Arc<dyn Transport>,

    /// API base without trailing slash
    api_base: String,

    ttl_secs: u32,

    /// Lowercased success marker
    success_marker: String,

    timeout: Option<Duration>,
}

impl std::fmt::Debug for GandiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiProvider")
            .field("transport", &self.transport.transport_name())
            .field("api_base", &self.api_base)
            .field("ttl_secs", &self.ttl_secs)
            .field("success_marker", &self.success_marker)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GandiProvider {
    /// Create a provider from the runtime configuration
    ///
    /// # Parameters
    ///
    /// - `transport`: HTTP transport, shared with the IP resolver
    /// - `config`: supplies API base, TTL, success marker and timeout
    pub fn new(transport: Arc<dyn Transport>, config: &UpdaterConfig) -> Self {
        Self {
            transport,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            ttl_secs: config.ttl_secs,
            success_marker: config.success_marker.to_lowercase(),
            timeout: config.request_timeout(),
        }
    }

    /// Resource URL of one rrset
    pub fn record_url(&self, domain: &str, subdomain: &str, version: IpVersion) -> String {
        format!(
            "{}/domains/{}/records/{}/{}",
            self.api_base,
            domain,
            subdomain,
            version.record_type()
        )
    }

    fn request_for(&self, target: &UpdateTarget<'_>, address: IpAddr) -> Result<HttpRequest> {
        let version = match address {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        };

        let body = RrsetUpdate {
            rrset_ttl: self.ttl_secs.to_string(),
            rrset_values: vec![address.to_string()],
        }
        .to_body()?;

        Ok(HttpRequest::put_json(self.record_url(target.domain, target.subdomain, version), body)
            .header("X-Api-Key", target.api_key.expose())
            .with_timeout(self.timeout))
    }

    /// Decide whether a response body reports success
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the body contains the success marker, case-insensitively
    /// - `Err(Error::ProviderRejected)`: with the extracted message
    pub fn classify(&self, body: &str) -> Result<()> {
        if body.to_lowercase().contains(&self.success_marker) {
            return Ok(());
        }

        let message = extract_message(body).unwrap_or(UNKNOWN_ERROR);
        Err(Error::rejected(message))
    }
}

/// Quoted value following the first `"message":` key
///
/// The key is matched case-insensitively, whitespace before the opening
/// quote is skipped and the value keeps its original case. No JSON parsing
/// is attempted, so truncated or non-JSON bodies still yield a message when
/// one is recognizable.
pub fn extract_message(body: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `body`
    let start = body.to_ascii_lowercase().find(MESSAGE_KEY)? + MESSAGE_KEY.len();
    let rest = body[start..].trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;

    Some(&rest[..end]).filter(|message| !message.is_empty())
}

#[async_trait]
impl DnsProvider for GandiProvider {
    async fn update_address(&self, target: &UpdateTarget<'_>, address: IpAddr) -> Result<()> {
        let request = self.request_for(target, address)?;
        tracing::debug!("PUT {} -> {}", request.url, address);

        let body = match self.transport.perform(request).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(
                    "No response for {}.{}: {}",
                    target.subdomain,
                    target.domain,
                    e
                );
                String::new()
            }
        };

        self.classify(&body)
    }

    fn provider_name(&self) -> &'static str {
        "gandi"
    }
}
