use crate::cli::ServeArgs;
use crate::demo::demo_seed;
use crate::infra::{build_service, AppState, ReportsApi, SeedData};
use crate::routes::with_report_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use dashboard_reports::config::AppConfig;
use dashboard_reports::error::AppError;
use dashboard_reports::telemetry;
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

    let seed = match config.reports.seed_path.as_deref() {
        Some(path) => SeedData::load(path)?,
        None => {
            info!("no REPORTS_SEED_PATH configured, serving demo data");
            demo_seed(Utc::now())
        }
    };
    let (service, _outbox) = build_service(&seed);

    let app = with_report_routes(ReportsApi {
        service,
        default_format: config.reports.default_format,
    })
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_format = %config.reports.default_format,
        "dashboard reports service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
