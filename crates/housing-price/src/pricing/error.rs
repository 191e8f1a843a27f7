use super::domain::Feature;
use serde::Serialize;
use std::fmt;

/// How a field value broke its configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RangeViolation {
    NotFinite,
    BelowMinimum { min: f64 },
    AboveMaximum { max: f64 },
    Fractional,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeViolation::NotFinite => write!(f, "value is not a finite number"),
            RangeViolation::BelowMinimum { min } => write!(f, "must be at least {min}"),
            RangeViolation::AboveMaximum { max } => write!(f, "must be at most {max}"),
            RangeViolation::Fractional => write!(f, "must be a whole number"),
        }
    }
}

/// Failures raised by a model adapter while producing a prediction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model expects {expected} features per row, received {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("model returned no prediction")]
    EmptyOutput,
    #[error("model returned a non-finite prediction ({0})")]
    NonFinite(f64),
    #[error("{0}")]
    Backend(String),
}

/// Flat classification of [`PricingError`], used for status mapping and wire
/// payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OutOfRange,
    ModelUnavailable,
    PredictionFailed,
    CoefficientsUnavailable,
    SchemaMismatch,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("{feature} value {value} is out of range: {violation}")]
    OutOfRange {
        feature: Feature,
        value: f64,
        violation: RangeViolation,
    },
    #[error("price model is not available: {reason}")]
    ModelUnavailable { reason: String },
    #[error("price model failed to predict: {0}")]
    PredictionFailed(#[source] ModelError),
    #[error("{family} model does not expose coefficients: {reason}")]
    CoefficientsUnavailable { family: String, reason: String },
    #[error("comparison file is missing required columns: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
}

impl PricingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::OutOfRange { .. } => ErrorKind::OutOfRange,
            PricingError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            PricingError::PredictionFailed(_) => ErrorKind::PredictionFailed,
            PricingError::CoefficientsUnavailable { .. } => ErrorKind::CoefficientsUnavailable,
            PricingError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
        }
    }

    /// Only a missing coefficient table is a soft condition.
    pub fn is_soft(&self) -> bool {
        matches!(self, PricingError::CoefficientsUnavailable { .. })
    }
}

impl From<ModelError> for PricingError {
    fn from(value: ModelError) -> Self {
        Self::PredictionFailed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        let error = PricingError::OutOfRange {
            feature: Feature::Rooms,
            value: 11.0,
            violation: RangeViolation::AboveMaximum { max: 10.0 },
        };
        assert_eq!(
            error.to_string(),
            "rooms value 11 is out of range: must be at most 10"
        );
        assert_eq!(error.kind(), ErrorKind::OutOfRange);
        assert!(!error.is_soft());
    }

    #[test]
    fn schema_mismatch_lists_every_missing_column() {
        let error = PricingError::SchemaMismatch {
            missing: vec!["Baños".to_string(), "Precio".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "comparison file is missing required columns: Baños, Precio"
        );
    }

    #[test]
    fn prediction_failure_keeps_cause() {
        let error = PricingError::from(ModelError::EmptyOutput);
        assert_eq!(error.kind(), ErrorKind::PredictionFailed);
        let source = std::error::Error::source(&error).expect("cause retained");
        assert_eq!(source.to_string(), "model returned no prediction");
    }
}
