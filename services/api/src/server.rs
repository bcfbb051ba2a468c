use crate::cli::ServeArgs;
use crate::cors::cors_middleware;
use crate::infra::{load_catalog, AppState, ConfiguredSink};
use crate::routes::with_form_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use devnet_forms::config::AppConfig;
use devnet_forms::error::AppError;
use devnet_forms::forms::FormSessionService;
use devnet_forms::telemetry;
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

    let catalog = Arc::new(load_catalog(&config)?);
    let sink = Arc::new(ConfiguredSink::from_config(&config));
    info!(
        forms = ?catalog.ids().collect::<Vec<_>>(),
        sink = %sink.describe(),
        "form catalog ready"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let limits = config.sessions.limits();
    info!(
        idle_ttl_secs = limits.idle_ttl.as_secs(),
        max_sessions = limits.max_sessions,
        "form session limits"
    );
    let sessions = Arc::new(FormSessionService::new(catalog, sink).with_limits(limits));
    let cors = Arc::new(config.cors.clone());

    let app = with_form_routes(sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(axum::middleware::from_fn_with_state(cors, cors_middleware));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "developer network form service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
