use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryGovStore, InMemoryNotificationHub, InMemoryProfileDirectory};
use crate::routes::{notification_routes, operational_routes};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use egov_services::config::AppConfig;
use egov_services::error::AppError;
use egov_services::telemetry;
use egov_services::workflows::applications::{application_router, ApplicationLifecycleService};
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

    let store = Arc::new(InMemoryGovStore::default());
    let hub = Arc::new(InMemoryNotificationHub::default());
    let profiles = Arc::new(InMemoryProfileDirectory::default());
    let lifecycle = Arc::new(ApplicationLifecycleService::new(
        store,
        hub.clone(),
        profiles,
    ));

    let app = application_router(lifecycle)
        .merge(notification_routes(hub))
        .merge(operational_routes())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "application lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
