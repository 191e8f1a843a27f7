mod artifact;
mod forest;
mod linear;

pub use artifact::{load_model, ModelArtifact, ModelFamily, ModelLoadError};
pub use forest::{ForestModel, ForestPayload};
pub use linear::LinearModel;

use super::error::{ModelError, PricingError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// Capabilities the pipeline needs from a trained price model.
///
/// Rows are positional: `row[i]` is whatever feature the deployment placed at
/// position `i`. Implementations must not mutate themselves while predicting.
pub trait PriceModel: Send + Sync {
    fn family(&self) -> &str;

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError>;

    fn coefficients(&self) -> Option<&[f64]> {
        None
    }

    fn intercept(&self) -> Option<f64> {
        None
    }
}

/// Shared, read-only handle to the loaded model, or the reason it is missing.
#[derive(Clone)]
pub struct ModelHandle {
    state: HandleState,
}

#[derive(Clone)]
enum HandleState {
    Loaded {
        model: Arc<dyn PriceModel>,
        loaded_at: DateTime<Utc>,
    },
    Unavailable {
        reason: String,
    },
}

impl ModelHandle {
    pub fn new<M: PriceModel + 'static>(model: M) -> Self {
        Self::from_arc(Arc::new(model))
    }

    pub fn from_arc(model: Arc<dyn PriceModel>) -> Self {
        Self {
            state: HandleState::Loaded {
                model,
                loaded_at: Utc::now(),
            },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: HandleState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Keeps a failed load around as an unavailable handle so callers can
    /// still report it. The failure is logged, never replaced by a stand-in
    /// model.
    pub fn from_load_result(result: Result<ModelHandle, ModelLoadError>) -> Self {
        match result {
            Ok(handle) => handle,
            Err(err) => {
                error!(error = %err, "price model could not be loaded");
                Self::unavailable(err.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, HandleState::Loaded { .. })
    }

    pub fn model(&self) -> Result<&dyn PriceModel, PricingError> {
        match &self.state {
            HandleState::Loaded { model, .. } => Ok(model.as_ref()),
            HandleState::Unavailable { reason } => Err(PricingError::ModelUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    pub fn family(&self) -> Option<&str> {
        match &self.state {
            HandleState::Loaded { model, .. } => Some(model.family()),
            HandleState::Unavailable { .. } => None,
        }
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            HandleState::Loaded { loaded_at, .. } => Some(*loaded_at),
            HandleState::Unavailable { .. } => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            HandleState::Loaded { .. } => None,
            HandleState::Unavailable { reason } => Some(reason),
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            HandleState::Loaded { model, loaded_at } => f
                .debug_struct("ModelHandle")
                .field("family", &model.family())
                .field("loaded_at", loaded_at)
                .finish(),
            HandleState::Unavailable { reason } => f
                .debug_struct("ModelHandle")
                .field("unavailable", reason)
                .finish(),
        }
    }
}
