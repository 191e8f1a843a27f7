use super::PriceModel;
use crate::pricing::error::ModelError;
use serde::{Deserialize, Serialize};

/// Ordinary least squares weights exported from a trained linear regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn width(&self) -> usize {
        self.coefficients.len()
    }
}

impl PriceModel for LinearModel {
    fn family(&self) -> &str {
        "linear"
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                found: row.len(),
            });
        }

        let value = self
            .coefficients
            .iter()
            .zip(row)
            .fold(self.intercept, |acc, (weight, x)| acc + weight * x);

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite(value))
        }
    }

    fn coefficients(&self) -> Option<&[f64]> {
        Some(&self.coefficients)
    }

    fn intercept(&self) -> Option<f64> {
        Some(self.intercept)
    }
}
