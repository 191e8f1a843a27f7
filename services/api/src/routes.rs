use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use housing_price::error::AppError;
use housing_price::pricing::batch::{ComparisonPoint, ComparisonSummary};
use housing_price::pricing::{
    BatchComparison, CoefficientEntry, CoefficientReport, Feature, RawFeatureInputs, SizeUnit,
    DEFAULT_PREVIEW_ROWS,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub(crate) struct PredictRequest {
    pub(crate) size: f64,
    pub(crate) rooms: f64,
    pub(crate) bathrooms: f64,
    pub(crate) offers: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct InputBar {
    pub(crate) feature: Feature,
    pub(crate) label: String,
    pub(crate) value: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictResponse {
    pub(crate) value: f64,
    pub(crate) currency: String,
    pub(crate) formatted: String,
    pub(crate) inputs: Vec<InputBar>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FieldSpec {
    pub(crate) feature: Feature,
    pub(crate) label: String,
    pub(crate) column: String,
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) allow_fractional: bool,
    pub(crate) default: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModelInfoResponse {
    pub(crate) available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) loaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) unavailable_reason: Option<String>,
    pub(crate) model_path: String,
    pub(crate) size_unit: SizeUnit,
    pub(crate) currency: String,
    pub(crate) feature_order: Vec<Feature>,
    pub(crate) price_column: String,
    pub(crate) fields: Vec<FieldSpec>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CoefficientsResponse {
    pub(crate) available: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) coefficients: Vec<CoefficientEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) importance: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) intercept: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareRequest {
    pub(crate) csv: String,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Paired chart series; a failed row holds `null` in `predicted`.
#[derive(Debug, Serialize)]
pub(crate) struct ComparisonSeries {
    pub(crate) actual: Vec<Option<f64>>,
    pub(crate) predicted: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareResponse {
    pub(crate) limit: usize,
    pub(crate) preview: Vec<ComparisonPoint>,
    pub(crate) series: ComparisonSeries,
    pub(crate) summary: ComparisonSummary,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/api/v1/model", get(model_info_endpoint))
        .route("/api/v1/model/coefficients", get(coefficients_endpoint))
        .route("/api/v1/price/predict", post(predict_endpoint))
        .route("/api/v1/price/compare", post(compare_endpoint))
        .with_state(state)
}

pub(crate) fn with_metrics(router: Router, metrics: Arc<PrometheusHandle>) -> Router {
    router
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(metrics))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else if let Some(reason) = state.pricing.model.unavailable_reason() {
        json!({ "status": "model_unavailable", "reason": reason })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(
    Extension(metrics): Extension<Arc<PrometheusHandle>>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(),
    )
}

pub(crate) async fn model_info_endpoint(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let pricing = &state.pricing;
    let config = pricing.pipeline.config();

    let fields = Feature::ALL
        .into_iter()
        .map(|feature| {
            let bounds = config.bounds.for_feature(feature);
            FieldSpec {
                feature,
                label: pricing.feature_label(feature),
                column: pricing.columns.feature(feature).to_string(),
                min: bounds.min,
                max: bounds.max,
                allow_fractional: bounds.allow_fractional,
                default: pricing.form_default(feature),
            }
        })
        .collect();

    Json(ModelInfoResponse {
        available: pricing.model.is_available(),
        family: pricing.model.family().map(str::to_string),
        loaded_at: pricing.model.loaded_at(),
        unavailable_reason: pricing.model.unavailable_reason().map(str::to_string),
        model_path: pricing.model_path.display().to_string(),
        size_unit: pricing.size_unit,
        currency: config.currency_label.clone(),
        feature_order: config.feature_order().features().to_vec(),
        price_column: pricing.columns.price.clone(),
        fields,
    })
}

pub(crate) async fn predict_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let PredictRequest {
        size,
        rooms,
        bathrooms,
        offers,
    } = payload;
    let inputs = RawFeatureInputs::new(size, rooms, bathrooms, offers);

    let pricing = &state.pricing;
    let result = pricing.pipeline.predict(inputs, &pricing.model)?;
    info!(value = result.value, "price estimate served");

    let bars = Feature::ALL
        .into_iter()
        .map(|feature| InputBar {
            feature,
            label: pricing.feature_label(feature),
            value: inputs.value(feature),
        })
        .collect();

    Ok(Json(PredictResponse {
        value: result.value,
        formatted: result.formatted(),
        currency: result.currency_label,
        inputs: bars,
    }))
}

pub(crate) async fn coefficients_endpoint(
    State(state): State<AppState>,
) -> Result<Json<CoefficientsResponse>, AppError> {
    let pricing = &state.pricing;
    let model = pricing.model.model()?;

    match CoefficientReport::describe(model, &pricing.feature_names()) {
        Ok(report) => {
            let importance = report
                .ranked_by_magnitude()
                .into_iter()
                .map(|entry| entry.name.clone())
                .collect();
            Ok(Json(CoefficientsResponse {
                available: true,
                importance,
                intercept: Some(report.intercept),
                coefficients: report.entries,
                warning: None,
            }))
        }
        Err(err) if err.is_soft() => {
            warn!(error = %err, "coefficient report unavailable");
            Ok(Json(CoefficientsResponse {
                available: false,
                coefficients: Vec::new(),
                importance: Vec::new(),
                intercept: None,
                warning: Some(err.to_string()),
            }))
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn compare_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    let CompareRequest { csv, limit } = payload;
    let limit = limit.unwrap_or(DEFAULT_PREVIEW_ROWS);

    let pricing = &state.pricing;
    let comparison = BatchComparison::compare(
        Cursor::new(csv.into_bytes()),
        &pricing.columns,
        &pricing.pipeline,
        &pricing.model,
    )?;

    let (actual, predicted) = comparison.series(limit);
    Ok(Json(CompareResponse {
        limit,
        preview: comparison.preview(limit),
        series: ComparisonSeries { actual, predicted },
        summary: comparison.summary(),
    }))
}
