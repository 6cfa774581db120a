use crate::cli::ServeArgs;
use crate::infra::{seeded_store, AppState};
use crate::routes::with_rating_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use final_rating::config::AppConfig;
use final_rating::error::AppError;
use final_rating::rating::{RatingService, RatingServiceError, SignalLedger};
use final_rating::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = match args.signals_csv.take() {
        Some(path) => {
            let ledger = SignalLedger::from_csv_path(&path)?;
            info!(path = %path.display(), entries = ledger.len(), "signal ledger loaded");
            ledger
        }
        None => SignalLedger::default(),
    };

    let (store, active) = seeded_store().map_err(RatingServiceError::from)?;
    info!(config_id = %active.id, name = %active.name, "default final rating config active");

    let rating_service = Arc::new(
        RatingService::new(Arc::new(store), Arc::new(ledger))
            .with_concurrency(config.rating.batch_concurrency),
    );

    let app = with_rating_routes(rating_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "final rating service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
