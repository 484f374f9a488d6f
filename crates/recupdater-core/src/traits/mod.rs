//! Core traits for recupdater
//!
//! This module defines the seams between the engine and the outside world.
//!
//! - [`Transport`]: Perform an HTTP request and return the body
//! - [`DnsProvider`]: Push one address into one rrset

pub mod transport;
pub mod dns_provider;

pub use transport::{Transport, HttpRequest, Method, IpVersion};
pub use dns_provider::{DnsProvider, UpdateTarget};
