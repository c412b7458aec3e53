use crate::cli::ServeArgs;
use crate::infra::{authenticator, confirmation_cache, AppState, ConfiguredStore};
use crate::routes::with_portal_routes;
use admission_portal::config::AppConfig;
use admission_portal::error::AppError;
use admission_portal::telemetry;
use admission_portal::workflows::admissions::applications::AdmissionService;
use admission_portal::workflows::admissions::{AdminState, Institution};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let store = Arc::new(ConfiguredStore::open(&config.storage)?);
    let admission_service = Arc::new(AdmissionService::new(
        store,
        confirmation_cache(&config.admissions),
        config.admissions.status,
    ));
    let admin_state = AdminState::new(
        admission_service.clone(),
        Arc::new(authenticator(&config.auth)?),
        Institution::from_config(&config.admissions),
    );

    let app = with_portal_routes(admission_service, admin_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        admissions_open = config.admissions.status.is_open(),
        "admission portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
