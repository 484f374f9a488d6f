// # Transport Trait
//
// Black-box "perform HTTP request, return body or failure" capability.
//
// ## Implementations
//
// - reqwest: `recupdater-http` crate
//
// ## Usage
//
// ```rust,ignore
// use recupdater_core::traits::{HttpRequest, IpVersion, Transport};
//
// let body = transport
//     .perform(HttpRequest::get("http://me.gandi.net").over(IpVersion::V4))
//     .await?;
// ```
//
// The same trait serves IP lookups and provider updates. Callers decide what
// a body means; the transport never interprets it and never looks at the
// HTTP status.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Header names whose values must never be printed
const SECRET_HEADERS: &[&str] = &["x-api-key", "authorization"];

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// DNS record type holding addresses of this version
    pub fn record_type(self) -> &'static str {
        match self {
            IpVersion::V4 => "A",
            IpVersion::V6 => "AAAA",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

/// A single HTTP request
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Extra headers, in order
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Option<String>,
    /// Timeout for the whole request, `None` for no limit
    pub timeout: Option<Duration>,
    /// Force the connection onto one address family
    pub ip_version: Option<IpVersion>,
}

impl HttpRequest {
    /// Create a request
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            ip_version: None,
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a PUT request carrying a JSON body
    pub fn put_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(Method::Put, url);
        request.body = Some(body.into());
        request.header("Content-Type", "application/json")
    }

    /// Append a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Force the request over the given IP version
    pub fn over(mut self, version: IpVersion) -> Self {
        self.ip_version = Some(version);
        self
    }

    /// Look up a header value (case-insensitive name)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Custom Debug implementation that hides secret header values
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let lower = name.to_ascii_lowercase();
                if SECRET_HEADERS.contains(&lower.as_str()) {
                    (name.as_str(), "<REDACTED>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("ip_version", &self.ip_version)
            .finish()
    }
}

/// Trait for HTTP transports
///
/// # Contract
///
/// - `Ok(body)` whenever a response arrived, whatever its status
/// - `Err(Error::Transport)` when no response arrived (connection refused,
///   DNS failure, timeout, unreadable body)
/// - No retries, no caching: one call is one request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and return the raw response body
    async fn perform(&self, request: HttpRequest) -> Result<String, crate::Error>;

    /// Transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str {
        "http"
    }
}
