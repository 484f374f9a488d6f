// # DNS Provider Trait
//
// Defines the interface for pushing one address into one rrset.
//
// ## Implementations
//
// - LiveDNS (gandi.net): `recupdater-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use recupdater_core::traits::{DnsProvider, UpdateTarget};
//
// let target = UpdateTarget::new(&api_key, "example.com", "home");
// provider.update_address(&target, "1.2.3.4".parse()?).await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::store::ApiKey;

/// The rrset an update is aimed at
#[derive(Debug, Clone, Copy)]
pub struct UpdateTarget<'a> {
    /// API key of the owning record
    pub api_key: &'a ApiKey,
    /// Domain (zone) name
    pub domain: &'a str,
    /// Subdomain label inside the domain
    pub subdomain: &'a str,
}

impl<'a> UpdateTarget<'a> {
    /// Create a new update target
    pub fn new(api_key: &'a ApiKey, domain: &'a str, subdomain: &'a str) -> Self {
        Self {
            api_key,
            domain,
            subdomain,
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Single Request
///
/// One call performs exactly one provider request. Iterating subdomains and
/// address families, checking for shutdown and deciding when a record is
/// synchronized is owned by `UpdateEngine`.
///
/// ## Forbidden
/// - ❌ Retry or back off (the next cycle retries)
/// - ❌ Touch the record store
/// - ❌ Spawn tasks
///
/// # Errors
///
/// A response without the success marker, and a request that produced no
/// response at all, are both reported as `Error::ProviderRejected`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Set the rrset of `target` matching the version of `address`
    async fn update_address(
        &self,
        target: &UpdateTarget<'_>,
        address: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
