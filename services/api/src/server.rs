use crate::cli::ServeArgs;
use crate::infra::{load_model_handle, resolve_model_path, AppState, PricingState};
use crate::routes::{router, with_metrics};
use axum_prometheus::PrometheusMetricLayer;
use housing_price::config::AppConfig;
use housing_price::error::AppError;
use housing_price::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    config.pricing.model_path = resolve_model_path(&config.pricing, args.model.take());

    telemetry::init(&config.telemetry)?;

    let model = load_model_handle(&config.pricing.model_path);
    if let Some(reason) = model.unavailable_reason() {
        warn!(%reason, "serving without a price model");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let app_state = AppState::new(PricingState::new(&config.pricing, model));
    let readiness_flag = app_state.readiness.clone();

    let app = with_metrics(router(app_state), Arc::new(prometheus_handle)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        model = %config.pricing.model_path.display(),
        "housing price service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
