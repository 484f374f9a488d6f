// # recupdaterd - record updater daemon
//
// Keeps Gandi LiveDNS records in sync with the host's public IP address.
//
// This binary is the integration layer only. It is responsible for:
// 1. Parsing the records from the command line
// 2. Loading (or generating) the configuration file
// 3. Setting up console and file logging
// 4. Wiring transport, resolver, provider and engine together
// 5. Translating SIGINT/SIGTERM into a shutdown request
//
// All update logic lives in recupdater-core.
//
// ## Usage
//
// ```bash
// recupdaterd -k <APIKey> -d example.com home www -d example.org nas
// ```
//
// ## Environment
//
// - `RECUPDATER_CONFIG`: config file (default `/etc/recUpdater/recUpdater.conf`)
// - `RECUPDATER_LOG_FILE`: log file (default `/var/log/recUpdater.log`)
// - `RECUPDATER_LOG_LEVEL`: trace, debug, info, warn or error (default info)

mod config_file;
mod logging;
mod records;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use recupdater_core::{
    CancellationToken, ConfigError, DomainRecord, EngineEvent, IpResolver, Transport,
    UpdateEngine, UpdaterConfig,
};
use recupdater_http::ReqwestTransport;
use recupdater_provider_gandi::GandiProvider;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum UpdaterExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UpdaterExitCode> for ExitCode {
    fn from(code: UpdaterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Where the configuration came from
enum ConfigSource {
    File(PathBuf),
    /// The file was missing and has just been written with defaults
    Generated(PathBuf),
}

/// Load the config file, generating a default one if it does not exist
fn load_config() -> Result<(UpdaterConfig, ConfigSource)> {
    let path = config_file::config_path();

    match config_file::load(&path) {
        Ok(config) => Ok((config, ConfigSource::File(path))),
        Err(ConfigError::Missing { .. }) => {
            config_file::generate_default(&path).map_err(|e| {
                anyhow::anyhow!("Cannot create config file '{}': {}.", path.display(), e)
            })?;
            Ok((UpdaterConfig::default(), ConfigSource::Generated(path)))
        }
        Err(e) => Err(anyhow::anyhow!(
            "{} ({}). Please correct it and try again.",
            e,
            path.display()
        )),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let records = match records::parse_records(&args) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("[ERROR]: {} {}", e, records::USAGE);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let (config, source) = match load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("[ERROR]: {}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let level = match logging::level_from_env() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let log_file = config.logging.then(logging::log_file_path);
    let log_target = match logging::init(level, log_file.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    info!("Starting recupdaterd v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::File(path) => info!("Config loaded from '{}'", path.display()),
        ConfigSource::Generated(path) => warn!(
            "Missing config. Generated '{}' with default settings",
            path.display()
        ),
    }
    match log_target {
        Some(path) => info!("Logging to '{}'", path.display()),
        None if !config.logging => info!("[Config]: Logging disabled."),
        None => {}
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdaterExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (engine, events) = match build_engine(&config, records) {
            Ok(built) => built,
            Err(e) => {
                error!("Initialization has failed: {}", e);
                return UpdaterExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(engine, events).await {
            error!("Daemon error: {}", e);
            UpdaterExitCode::RuntimeError
        } else {
            UpdaterExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire transport, resolver and provider into an engine
fn build_engine(
    config: &UpdaterConfig,
    records: Vec<DomainRecord>,
) -> Result<(UpdateEngine, mpsc::Receiver<EngineEvent>)> {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
    let resolver = IpResolver::from_config(Arc::clone(&transport), config);
    let provider = GandiProvider::new(transport, config);
    let shutdown = CancellationToken::new();

    for record in &records {
        info!(
            "Managing '{}' ({})",
            record.domain(),
            record.subdomains().join(", ")
        );
    }

    Ok(UpdateEngine::new(
        resolver,
        Box::new(provider),
        records,
        config,
        shutdown,
    )?)
}

/// Run the engine until a shutdown signal arrives
async fn run_daemon(mut engine: UpdateEngine, events: mpsc::Receiver<EngineEvent>) -> Result<()> {
    let mut signals = ShutdownSignals::install()?;
    let shutdown = engine.shutdown_token();

    let reporter = tokio::spawn(report::report_events(events));
    let watcher = tokio::spawn(async move {
        let signal = signals.recv().await;
        info!("Received shutdown signal: {}", signal);
        shutdown.cancel();
    });

    let result = engine.run().await;

    // Dropping the engine closes the event channel, the reporter drains and ends
    drop(engine);
    if let Err(e) = reporter.await {
        warn!("Reporter task failed: {}", e);
    }
    watcher.abort();

    result?;
    Ok(())
}

/// SIGTERM and SIGINT handlers
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for the first of either signal
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// CTRL-C only
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending().await
            }
        }
    }
}
