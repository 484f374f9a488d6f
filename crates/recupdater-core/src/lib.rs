// # recupdater-core
//
// Core library for the recupdater dynamic DNS agent.
//
// ## Architecture Overview
//
// This library provides the update-orchestration engine:
// - **Transport**: Trait for "perform HTTP request, return body"
// - **DnsProvider**: Trait for pushing one address into one rrset
// - **IpResolver**: Public IPv4/IPv6 lookup with partial-success policy
// - **RecordStore**: Ordered records with per-record freshness flags
// - **ChangeDetector**: Invalidates every record when an address changes
// - **UpdateEngine**: Drives resolve -> detect -> update cycles
// - **Scheduler**: Period wait that wakes immediately on shutdown
//
// ## Design Principles
//
// 1. **Idempotency**: An unchanged address causes zero provider calls for
//    synchronized records
// 2. **Sequential**: One worker, one record at a time, one request at a time
// 3. **Cooperative cancellation**: Shutdown is observed at well-defined
//    checkpoints, in-flight requests are never torn down
// 4. **Library-First**: Every component can be instantiated on its own

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod resolver;
pub mod detector;
pub mod scheduler;
pub mod store;

// Re-export core types for convenience
pub use traits::{DnsProvider, Transport};
pub use engine::{CycleReport, EngineEvent, UpdateEngine, UpdateOutcome};
pub use config::UpdaterConfig;
pub use error::{ConfigError, Error, Result};
pub use resolver::{IpResolver, ResolvedAddresses};
pub use detector::ChangeDetector;
pub use scheduler::{Scheduler, Wake};
pub use store::{ApiKey, DomainRecord, RecordStore};

// Re-exported so embedders share the engine's token type
pub use tokio_util::sync::CancellationToken;
