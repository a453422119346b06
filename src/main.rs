use std::sync::Arc;

use signal_watch::api::{run_server, AppState};
use signal_watch::config::{AppConfig, LogConfig, LogFormat};
use signal_watch::constants::defaults::{DIAGNOSTIC_BUS_CAPACITY, SHUTDOWN_FLUSH_TIMEOUT};
use signal_watch::ingest::{build_transport, AllowList, IngestionListener, MessageHandler};
use signal_watch::persistence::{self, MemoryGateway, PersistenceWorker, R2Gateway, SnapshotGateway};
use signal_watch::services::diagnostics::DiagnosticsTally;
use signal_watch::services::status_reporter::StatusReporter;
use signal_watch::{DiagnosticBus, SignalStore};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,reqwest=warn,tungstenite=warn", config.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.log);

    info!("Starting Signal Watch...");
    info!("Loaded Configuration: {:?}", config);

    let diagnostics_bus = DiagnosticBus::new(DIAGNOSTIC_BUS_CAPACITY);
    let tally = DiagnosticsTally::new();
    tally.start(&diagnostics_bus);

    // Remote store is optional; without it snapshots live in memory only.
    let gateway: Arc<dyn SnapshotGateway> = match &config.storage {
        Some(storage) => match R2Gateway::new(storage) {
            Ok(gateway) => {
                info!("💾 Snapshot store: {}", gateway.object_url());
                Arc::new(gateway)
            }
            Err(e) => {
                error!("❌ Invalid storage configuration, keeping snapshots in memory: {}", e);
                Arc::new(MemoryGateway::new())
            }
        },
        None => {
            warn!("⚠️ R2 storage not configured - snapshots will not survive a restart");
            Arc::new(MemoryGateway::new())
        }
    };

    let (snapshot_sender, _persistence_handle) =
        PersistenceWorker::new(gateway.clone(), diagnostics_bus.clone()).spawn();
    let store = SignalStore::new()
        .with_persistence(snapshot_sender.clone())
        .with_diagnostics(diagnostics_bus.clone());

    if let Some(snapshot) = persistence::load_or_cold_start(gateway.as_ref(), &diagnostics_bus).await {
        let seeded = store.seed(snapshot);
        info!("Seeded store with {} signals", seeded);
    }

    // Ingestion task
    let allow_list = AllowList::new(&config.listener.allow_list);
    if allow_list.is_empty() {
        warn!("⚠️ Allow-list is empty - no channel messages will be parsed");
    } else {
        info!("🎯 Monitoring channels: {:?}", config.listener.allow_list);
    }
    let listener: Arc<dyn MessageHandler> = Arc::new(IngestionListener::new(
        store.clone(),
        allow_list,
        diagnostics_bus.clone(),
    ));

    match build_transport(&config.transport)? {
        Some(transport) => {
            info!("📡 Starting {} transport", transport.name());
            tokio::spawn(async move {
                if let Err(e) = transport.run(listener).await {
                    error!("❌ {} transport stopped: {}", transport.name(), e);
                }
            });
        }
        None => info!("ℹ️ No transport configured - manual submissions only"),
    }

    // Status task
    let _status_scheduler = if config.status.enabled {
        match StatusReporter::new(store.clone(), config.status.schedule.clone()).start().await {
            Ok(scheduler) => Some(scheduler),
            Err(e) => {
                warn!("⚠️ Failed to start status reporter: {}", e);
                None
            }
        }
    } else {
        None
    };

    let state = Arc::new(AppState {
        store,
        diagnostics: tally,
    });

    let outcome = if config.api.enabled {
        let tcp = tokio::net::TcpListener::bind(&config.api.bind).await?;
        tokio::select! {
            result = run_server(state, tcp) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                Ok(())
            }
        }
    } else {
        let result = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
        result
    };

    // Snapshots still queued include the one for the last accepted signal.
    match tokio::time::timeout(SHUTDOWN_FLUSH_TIMEOUT, snapshot_sender.flush()).await {
        Ok(true) => info!("💾 Pending snapshots flushed"),
        Ok(false) => warn!("⚠️ Persistence worker already stopped"),
        Err(_) => warn!("⚠️ Timed out flushing pending snapshots"),
    }

    outcome?;
    Ok(())
}
