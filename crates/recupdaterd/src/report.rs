//! Event reporter
//!
//! Turns engine events into the user-facing log lines. Runs as its own task
//! so rendering never holds up the engine.

use recupdater_core::EngineEvent;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Render one event
pub fn describe(event: &EngineEvent) -> (Severity, String) {
    match event {
        EngineEvent::Started { records_count } => (
            Severity::Info,
            format!("Initialization successful, watching {} record(s)", records_count),
        ),
        EngineEvent::IpResolutionFailed { service } => (
            Severity::Error,
            format!("Something went wrong. Cannot get your IP from '{}'", service),
        ),
        EngineEvent::AddressChanged { addresses } => {
            (Severity::Info, format!("Public address is now {}", addresses))
        }
        EngineEvent::UpdateStarted { domain, subdomains } => (
            Severity::Info,
            format!("Updating record/s for '{}' ({})...", domain, subdomains.join(", ")),
        ),
        EngineEvent::UpdateSucceeded { domain, synced_at } => (
            Severity::Info,
            format!(
                "Updating record/s for '{}'... Done (synced {})",
                domain,
                synced_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        ),
        EngineEvent::UpdateCanceled { domain } => (
            Severity::Warn,
            format!("Updating record/s for '{}'... Canceled", domain),
        ),
        EngineEvent::UpdateFailed { domain, reason } => (
            Severity::Error,
            format!("Failed to update record/s for '{}': {}.", domain, reason),
        ),
        EngineEvent::Stopped { reason } => (Severity::Info, format!("Terminated ({})", reason)),
    }
}

/// Log every event until the engine drops its sender
pub async fn report_events(events: mpsc::Receiver<EngineEvent>) {
    let mut events = ReceiverStream::new(events);

    while let Some(event) = events.next().await {
        match describe(&event) {
            (Severity::Info, line) => info!("{}", line),
            (Severity::Warn, line) => warn!("{}", line),
            (Severity::Error, line) => error!("{}", line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn update_started_lists_subdomains() {
        let event = EngineEvent::UpdateStarted {
            domain: "example.com".to_string(),
            subdomains: vec!["home".to_string(), "www".to_string()],
        };
        assert_eq!(
            describe(&event),
            (Severity::Info, "Updating record/s for 'example.com' (home, www)...".to_string())
        );
    }

    #[test]
    fn failure_carries_provider_message() {
        let event = EngineEvent::UpdateFailed {
            domain: "example.com".to_string(),
            reason: "Domain not found".to_string(),
        };
        assert_eq!(
            describe(&event),
            (
                Severity::Error,
                "Failed to update record/s for 'example.com': Domain not found.".to_string()
            )
        );
    }

    #[test]
    fn success_shows_sync_time() {
        let event = EngineEvent::UpdateSucceeded {
            domain: "example.com".to_string(),
            synced_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };
        let (severity, line) = describe(&event);
        assert_eq!(severity, Severity::Info);
        assert!(line.ends_with("Done (synced 2024-05-01 12:30:00 UTC)"));
    }

    #[test]
    fn canceled_and_resolution_failure() {
        let canceled = EngineEvent::UpdateCanceled {
            domain: "example.com".to_string(),
        };
        assert_eq!(describe(&canceled).0, Severity::Warn);

        let failed = EngineEvent::IpResolutionFailed {
            service: "http://me.gandi.net".to_string(),
        };
        assert_eq!(
            describe(&failed).1,
            "Something went wrong. Cannot get your IP from 'http://me.gandi.net'"
        );
    }

    #[tokio::test]
    async fn reporter_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        report_events(rx).await;
    }
}
