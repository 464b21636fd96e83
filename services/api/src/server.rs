use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryBulletinStore, InMemoryExchangeStore, InMemorySubmissionStore, LogChannel,
    SeedDirectory,
};
use crate::routes::with_coordination_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use rota::config::AppConfig;
use rota::error::AppError;
use rota::scheduling::{CoordinationService, NotificationChannel};
use rota::telemetry;

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

    let channels: Vec<Arc<dyn NotificationChannel>> = vec![
        Arc::new(LogChannel::push()),
        Arc::new(LogChannel::chat_bot()),
    ];
    let coordination_service = Arc::new(CoordinationService::new(
        Arc::new(InMemorySubmissionStore::default()),
        Arc::new(InMemoryExchangeStore::default()),
        Arc::new(SeedDirectory::default()),
        Arc::new(InMemoryBulletinStore::default()),
        channels,
    ));

    let app = with_coordination_routes(coordination_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shift coordination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
