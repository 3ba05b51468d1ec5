//! where-am-i - current address as a watch complication
//!
//! This is the composition root that wires together all the components.

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use whereami::adapters::inbound::{ApiServer, ApiState};
use whereami::adapters::outbound::{
    ConfigPermissionGate, FixedLocationSource, GpsdLocationSource, LoggingComplicationHost,
    NominatimGeocoder, SqliteLocationStore, StdoutTextView,
};
use whereami::application::DEFAULT_THROTTLE;
use whereami::config::{load_config, LocationSourceKind, Mode};
use whereami::domain::ports::LocationSource;
use whereami::{
    ActivitySession, ComplicationProvider, ComplicationRenderer, DescriptionFormatter,
    LocationPipeline, LocationRecorder, LocationRequest, MainThread, UpdateHandler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting where-am-i mode={:?} source={:?}",
        cfg.mode,
        cfg.location_source
    );

    // ===== COMPOSITION ROOT =====

    // 1. Create outbound adapters
    let permissions = Arc::new(ConfigPermissionGate::new(cfg.permission_granted));

    let source: Arc<dyn LocationSource> = match cfg.location_source {
        LocationSourceKind::Fixed => Arc::new(FixedLocationSource::new(
            cfg.fixed_latitude,
            cfg.fixed_longitude,
        )),
        LocationSourceKind::Gpsd => {
            let gpsd = GpsdLocationSource::new(
                cfg.gpsd_addr.clone(),
                Duration::from_secs(cfg.last_location_max_age_secs),
            );
            gpsd.start();
            Arc::new(gpsd)
        }
    };

    let geocoder = Arc::new(NominatimGeocoder::new(
        cfg.geocoder_url.clone(),
        &cfg.geocoder_user_agent,
    )?);
    tracing::info!("reverse geocoding via {}", geocoder.base_url());

    let host = Arc::new(LoggingComplicationHost::new());
    let main_thread = MainThread::start()?;
    let formatter = DescriptionFormatter::new(cfg.strings.clone());

    // 2. Create application services
    let pipeline = Arc::new(LocationPipeline::new(permissions.clone(), source, geocoder));

    match cfg.mode {
        Mode::Serve => {
            let store = Arc::new(SqliteLocationStore::open(&cfg.db_path)?);
            tracing::info!("location store at {}", cfg.db_path);

            let update_handler = Arc::new(UpdateHandler::new(host.clone(), DEFAULT_THROTTLE));
            let recorder = Arc::new(LocationRecorder::new(
                pipeline.clone(),
                store,
                update_handler,
                formatter.clone(),
            ));
            recorder.initialize().await?;
            recorder.watch(LocationRequest::activity());

            let provider = Arc::new(ComplicationProvider::new(
                pipeline,
                ComplicationRenderer::new(formatter),
                main_thread,
            ));

            // 3. Create inbound adapter and run
            let state = ApiState::new(provider.clone(), recorder.clone(), host);
            let server = ApiServer::new(cfg.listen_addr.clone(), state);

            tokio::select! {
                result = server.run() => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down");
                }
            }

            provider.on_destroy();
            recorder.shutdown();
        }
        Mode::Activity => {
            let session = ActivitySession::new(
                pipeline,
                permissions,
                host,
                Arc::new(StdoutTextView::new()),
                main_thread.clone(),
                formatter,
            );

            session.on_start();
            tokio::signal::ctrl_c().await?;
            session.on_stop().await;
            main_thread.flush().await;
        }
    }

    Ok(())
}
