use super::PriceModel;
use crate::pricing::error::ModelError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

pub type ForestRegressor = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Payload of a `random_forest` artifact. The regressor does not remember how
/// many columns it was fitted on, so the width travels alongside it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForestPayload {
    pub n_features: usize,
    pub regressor: ForestRegressor,
}

/// Random forest regressor serialized by `smartcore`.
///
/// Tree ensembles carry no per-feature weights, so this adapter never exposes
/// coefficients.
pub struct ForestModel {
    regressor: ForestRegressor,
    n_features: usize,
}

impl ForestModel {
    pub fn new(regressor: ForestRegressor, n_features: usize) -> Self {
        Self {
            regressor,
            n_features,
        }
    }
}

impl From<ForestPayload> for ForestModel {
    fn from(payload: ForestPayload) -> Self {
        Self::new(payload.regressor, payload.n_features)
    }
}

impl PriceModel for ForestModel {
    fn family(&self) -> &str {
        "random_forest"
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        // smartcore answers rows of any width, so the shape is checked here.
        if row.len() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }

        let input = DenseMatrix::from_2d_vec(&vec![row.to_vec()])
            .map_err(|e| ModelError::Backend(format!("matrix creation failed: {e}")))?;

        let predictions = self
            .regressor
            .predict(&input)
            .map_err(|e| ModelError::Backend(format!("forest prediction failed: {e}")))?;

        match predictions.first() {
            Some(value) if value.is_finite() => Ok(*value),
            Some(value) => Err(ModelError::NonFinite(*value)),
            None => Err(ModelError::EmptyOutput),
        }
    }
}
