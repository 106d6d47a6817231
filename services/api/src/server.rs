use crate::cli::ServeArgs;
use crate::infra::{AppState, DeskState};
use crate::routes::with_notice_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use notice_desk::config::AppConfig;
use notice_desk::error::AppError;
use notice_desk::telemetry;
use notice_desk::workflows::notices::SystemClock;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let desk = DeskState::in_memory(
        Arc::new(SystemClock),
        config.notices.clone(),
        config.reports.clone(),
    );
    if !args.no_seed {
        desk.seed().await?;
    }

    let app = with_notice_routes(desk)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        operator = %config.notices.operator,
        seeded = !args.no_seed,
        "notice desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
