//! Configuration types for recupdater
//!
//! [`UpdaterConfig`] is built once at startup by a loader (the daemon reads
//! it from a key/value file) and stays immutable for the rest of the run.

use serde::Deserialize;
use std::time::Duration;

/// Default service used to determine the public IP
pub const DEFAULT_IP_SERVICE: &str = "http://me.gandi.net";

/// Default LiveDNS API base
pub const DEFAULT_API_BASE: &str = "https://dns.api.gandi.net/api/v5/";

/// Default body marker of a successful update
pub const DEFAULT_SUCCESS_MARKER: &str = "DNS Record Created";

/// Default record TTL in seconds
pub const DEFAULT_TTL_SECS: u32 = 18000;

/// Default polling period in seconds
pub const DEFAULT_UPDATE_PERIOD_SECS: u64 = 120;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Runtime configuration
///
/// Field names on the wire are the config file attribute names, so a map of
/// `Key=Value` pairs deserializes straight into it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdaterConfig {
    /// Base URL of the provider API
    #[serde(rename = "API")]
    pub api_base: String,

    /// URL of the "what is my IP" service
    #[serde(rename = "IPService")]
    pub ip_service: String,

    /// Substring of the response body that marks a successful update
    #[serde(rename = "SuccessMsg")]
    pub success_marker: String,

    /// TTL written into every updated rrset
    #[serde(rename = "TTL")]
    pub ttl_secs: u32,

    /// Time between two update cycles
    #[serde(rename = "UpdatePeriodS")]
    pub update_period_secs: u64,

    /// Per-request timeout, 0 disables it
    #[serde(rename = "CurlTimeoutS", alias = "RequestTimeoutS")]
    pub request_timeout_secs: u64,

    /// Whether IPv6 addresses are looked up and pushed
    #[serde(rename = "EnableIPv6")]
    pub enable_ipv6: bool,

    /// Whether a log file is written in addition to the console
    #[serde(rename = "Logging")]
    pub logging: bool,
}

impl UpdaterConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ip_service: DEFAULT_IP_SERVICE.to_string(),
            success_marker: DEFAULT_SUCCESS_MARKER.to_string(),
            ttl_secs: DEFAULT_TTL_SECS,
            update_period_secs: DEFAULT_UPDATE_PERIOD_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            enable_ipv6: true,
            logging: false,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_base.trim().is_empty() {
            return Err(crate::Error::config("API base URL cannot be empty"));
        }
        if self.ip_service.trim().is_empty() {
            return Err(crate::Error::config("IP service URL cannot be empty"));
        }
        if self.success_marker.is_empty() {
            return Err(crate::Error::config("Success marker cannot be empty"));
        }
        Ok(())
    }

    /// Time to wait between cycles
    pub fn update_period(&self) -> Duration {
        Duration::from_secs(self.update_period_secs)
    }

    /// Timeout applied to every HTTP request, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_provider() {
        let config = UpdaterConfig::default();
        assert_eq!(config.ttl_secs, 18000);
        assert_eq!(config.update_period(), Duration::from_secs(120));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
        assert!(config.enable_ipv6);
        assert!(!config.logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = UpdaterConfig {
            request_timeout_secs: 0,
            ..UpdaterConfig::default()
        };
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn empty_marker_is_rejected() {
        let config = UpdaterConfig {
            success_marker: String::new(),
            ..UpdaterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_from_attribute_names() {
        let config: UpdaterConfig = serde_json::from_str(
            r#"{
                "IPService": "http://me.example",
                "API": "https://api.example/v5/",
                "SuccessMsg": "Created",
                "TTL": 300,
                "UpdatePeriodS": 30,
                "RequestTimeoutS": 15,
                "EnableIPv6": false,
                "Logging": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.ttl_secs, 300);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert!(!config.enable_ipv6);
        assert!(config.logging);
    }

    #[test]
    fn missing_attribute_fails_deserialization() {
        let result = serde_json::from_str::<UpdaterConfig>(r#"{"TTL": 300}"#);
        assert!(result.is_err());
    }
}
