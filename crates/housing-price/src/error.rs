use crate::config::ConfigError;
use crate::pricing::model::ModelLoadError;
use crate::pricing::{BatchError, ErrorKind, PricingError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    ModelLoad(ModelLoadError),
    Pricing(PricingError),
    Batch(BatchError),
}

impl AppError {
    /// Pricing classification, when the failure came from the pipeline.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Pricing(err) => Some(err.kind()),
            AppError::Batch(err) => err.kind(),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            Some(ErrorKind::OutOfRange) | Some(ErrorKind::SchemaMismatch) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Some(ErrorKind::ModelUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            Some(ErrorKind::PredictionFailed) | Some(ErrorKind::CoefficientsUnavailable) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            None => match self {
                AppError::Batch(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::ModelLoad(err) => write!(f, "model error: {}", err),
            AppError::Pricing(err) => write!(f, "{}", err),
            AppError::Batch(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::ModelLoad(err) => Some(err),
            AppError::Pricing(err) => Some(err),
            AppError::Batch(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.kind() {
            Some(kind) => json!({ "error": self.to_string(), "kind": kind }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ModelLoadError> for AppError {
    fn from(value: ModelLoadError) -> Self {
        Self::ModelLoad(value)
    }
}

impl From<PricingError> for AppError {
    fn from(value: PricingError) -> Self {
        Self::Pricing(value)
    }
}

impl From<BatchError> for AppError {
    fn from(value: BatchError) -> Self {
        Self::Batch(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::error::{ModelError, RangeViolation};
    use crate::pricing::Feature;

    #[test]
    fn pricing_errors_map_to_http_statuses() {
        let out_of_range = AppError::from(PricingError::OutOfRange {
            feature: Feature::Offers,
            value: 21.0,
            violation: RangeViolation::AboveMaximum { max: 20.0 },
        });
        assert_eq!(out_of_range.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let unavailable = AppError::from(PricingError::ModelUnavailable {
            reason: "missing".to_string(),
        });
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let failed = AppError::from(PricingError::PredictionFailed(ModelError::EmptyOutput));
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let schema = AppError::from(BatchError::from(PricingError::SchemaMismatch {
            missing: vec!["Precio".to_string()],
        }));
        assert_eq!(schema.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(schema.kind(), Some(ErrorKind::SchemaMismatch));
    }

    #[test]
    fn unreadable_csv_is_a_bad_request() {
        let error = AppError::from(BatchError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "truncated upload",
        )));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.kind().is_none());
    }
}
