use housing_price::config::PricingConfig;
use housing_price::pricing::{
    load_model, BatchColumns, Feature, ModelHandle, PricePredictionPipeline, RawFeatureInputs,
    SizeUnit,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Values the input form starts with.
pub(crate) const FORM_DEFAULTS: RawFeatureInputs = RawFeatureInputs {
    size: 1800.0,
    rooms: 3.0,
    bathrooms: 2.0,
    offers: 2.0,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) pricing: PricingState,
}

impl AppState {
    pub(crate) fn new(pricing: PricingState) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            pricing,
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.readiness.load(Ordering::Relaxed) && self.pricing.model.is_available()
    }
}

/// Everything a request needs to price a house, shared read-only.
#[derive(Clone)]
pub(crate) struct PricingState {
    pub(crate) pipeline: Arc<PricePredictionPipeline>,
    pub(crate) model: ModelHandle,
    pub(crate) columns: Arc<BatchColumns>,
    pub(crate) size_unit: SizeUnit,
    pub(crate) model_path: Arc<PathBuf>,
}

impl PricingState {
    pub(crate) fn new(config: &PricingConfig, model: ModelHandle) -> Self {
        Self {
            pipeline: Arc::new(PricePredictionPipeline::new(config.pipeline.clone())),
            model,
            columns: Arc::new(config.columns.clone()),
            size_unit: config.size_unit,
            model_path: Arc::new(config.model_path.clone()),
        }
    }

    /// Column labels in the model's positional order.
    pub(crate) fn feature_names(&self) -> Vec<String> {
        self.columns
            .ordered(self.pipeline.config().feature_order())
    }

    pub(crate) fn feature_label(&self, feature: Feature) -> String {
        match feature {
            Feature::Size => format!("{} ({})", feature.label(), self.size_unit.label()),
            _ => feature.label().to_string(),
        }
    }

    /// Form default for a field, pulled inside the deployment's bounds.
    pub(crate) fn form_default(&self, feature: Feature) -> f64 {
        let bounds = self.pipeline.config().bounds.for_feature(feature);
        FORM_DEFAULTS.value(feature).clamp(bounds.min, bounds.max)
    }
}

pub(crate) fn resolve_model_path(config: &PricingConfig, model: Option<PathBuf>) -> PathBuf {
    model.unwrap_or_else(|| config.model_path.clone())
}

/// Loads the artifact for the server. A failed load is kept as an unavailable
/// handle so the service still starts and reports it.
pub(crate) fn load_model_handle(path: &Path) -> ModelHandle {
    ModelHandle::from_load_result(load_model(path))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use housing_price::pricing::model::LinearModel;
    use housing_price::pricing::PipelineConfig;

    pub(crate) fn pricing_config() -> PricingConfig {
        PricingConfig {
            model_path: PathBuf::from("modelo_vivienda.json"),
            size_unit: SizeUnit::SquareFeet,
            pipeline: PipelineConfig::default(),
            columns: BatchColumns::default(),
        }
    }

    pub(crate) fn reference_model() -> ModelHandle {
        ModelHandle::new(LinearModel::new(
            vec![50.0, 2000.0, 3000.0, -1000.0],
            10_000.0,
        ))
    }

    pub(crate) fn ready_state(model: ModelHandle) -> AppState {
        let state = AppState::new(PricingState::new(&pricing_config(), model));
        state.readiness.store(true, Ordering::Release);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn readiness_requires_loaded_model() {
        let state = ready_state(ModelHandle::unavailable("model file not found"));
        assert!(!state.is_ready());

        let state = ready_state(reference_model());
        assert!(state.is_ready());
    }

    #[test]
    fn form_defaults_stay_inside_bounds() {
        let mut config = pricing_config();
        config.size_unit = SizeUnit::SquareMeters;
        config.pipeline.bounds.size.min = 20.0;
        config.pipeline.bounds.size.max = 1000.0;
        let pricing = PricingState::new(&config, reference_model());

        assert_eq!(pricing.form_default(Feature::Size), 1000.0);
        assert_eq!(pricing.form_default(Feature::Rooms), 3.0);
        assert_eq!(
            pricing.feature_label(Feature::Size),
            "Size (square meters)"
        );
    }

    #[test]
    fn model_override_wins_over_config() {
        let config = pricing_config();
        assert_eq!(
            resolve_model_path(&config, None),
            PathBuf::from("modelo_vivienda.json")
        );
        assert_eq!(
            resolve_model_path(&config, Some(PathBuf::from("otro.json"))),
            PathBuf::from("otro.json")
        );
    }
}
