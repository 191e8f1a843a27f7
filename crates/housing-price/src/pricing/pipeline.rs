use super::bounds::{BoundsConfig, FeatureOrder};
use super::domain::{Feature, FeatureVector, PredictionResult, RawFeatureInputs};
use super::error::PricingError;
use super::model::ModelHandle;
use tracing::{debug, warn};

/// Everything the pipeline needs besides the model itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub bounds: BoundsConfig,
    pub currency_label: String,
}

impl PipelineConfig {
    pub fn feature_order(&self) -> &FeatureOrder {
        &self.bounds.feature_order
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsConfig::default(),
            currency_label: "$".to_string(),
        }
    }
}

/// Validates raw inputs, lays them out in the model's positional order and
/// turns the model output into a display-ready price.
///
/// Bounds are enforced before the model is touched. The row is built purely
/// by position from [`FeatureOrder`]; no column names are compared.
pub fn predict(
    raw_inputs: RawFeatureInputs,
    model: &ModelHandle,
    config: &PipelineConfig,
) -> Result<PredictionResult, PricingError> {
    let vector = config.bounds.validate(raw_inputs).inspect_err(|err| {
        debug!(error = %err, "rejected price inputs");
    })?;
    predict_vector(&vector, model, config)
}

fn predict_vector(
    vector: &FeatureVector,
    model: &ModelHandle,
    config: &PipelineConfig,
) -> Result<PredictionResult, PricingError> {
    let model = model.model()?;
    let row = config.feature_order().row(vector);

    let value = model.predict(&row).map_err(|err| {
        warn!(family = model.family(), error = %err, "price model rejected input row");
        PricingError::PredictionFailed(err)
    })?;

    let result = PredictionResult::new(value, &config.currency_label);
    debug!(value = result.value, "price predicted");
    Ok(result)
}

/// Bundles a [`PipelineConfig`] so consumers can share one instance.
#[derive(Debug, Clone, Default)]
pub struct PricePredictionPipeline {
    config: PipelineConfig,
}

impl PricePredictionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn predict(
        &self,
        raw_inputs: RawFeatureInputs,
        model: &ModelHandle,
    ) -> Result<PredictionResult, PricingError> {
        predict(raw_inputs, model, &self.config)
    }

    /// Feature labels in the model's positional order.
    pub fn ordered_features(&self) -> [Feature; 4] {
        *self.config.feature_order().features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::error::{ErrorKind, ModelError};
    use crate::pricing::model::{LinearModel, PriceModel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingModel {
        calls: Arc<AtomicUsize>,
    }

    impl PriceModel for CountingModel {
        fn family(&self) -> &str {
            "counting"
        }

        fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(row.iter().sum())
        }
    }

    struct FailingModel(ModelError);

    impl PriceModel for FailingModel {
        fn family(&self) -> &str {
            "failing"
        }

        fn predict(&self, _row: &[f64]) -> Result<f64, ModelError> {
            Err(self.0.clone())
        }
    }

    fn reference_model() -> ModelHandle {
        ModelHandle::new(LinearModel::new(
            vec![50.0, 2000.0, 3000.0, -1000.0],
            10_000.0,
        ))
    }

    #[test]
    fn reference_example_prices_at_110k() {
        let result = predict(
            RawFeatureInputs::new(1800.0, 3.0, 2.0, 2.0),
            &reference_model(),
            &PipelineConfig::default(),
        )
        .expect("prediction succeeds");

        assert_eq!(result.value, 110_000.0);
        assert_eq!(result.currency_label, "$");
        assert_eq!(result.formatted(), "$ 110,000.00");
    }

    #[test]
    fn out_of_range_input_never_reaches_model() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = ModelHandle::new(CountingModel {
            calls: calls.clone(),
        });
        let config = PipelineConfig::default();

        for inputs in [
            RawFeatureInputs::new(199.0, 3.0, 2.0, 2.0),
            RawFeatureInputs::new(1800.0, 11.0, 2.0, 2.0),
            RawFeatureInputs::new(1800.0, 3.0, 0.0, 2.0),
            RawFeatureInputs::new(1800.0, 3.0, 2.0, -1.0),
            RawFeatureInputs::new(1800.0, 3.0, 2.0, 2.5),
            RawFeatureInputs::new(f64::NAN, 3.0, 2.0, 2.0),
        ] {
            let error = predict(inputs, &model, &config).expect_err("rejected");
            assert_eq!(error.kind(), ErrorKind::OutOfRange);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn model_failures_are_classified() {
        let config = PipelineConfig::default();
        let inputs = RawFeatureInputs::new(1800.0, 3.0, 2.0, 2.0);

        let model = ModelHandle::new(FailingModel(ModelError::EmptyOutput));
        let error = predict(inputs, &model, &config).expect_err("model fails");
        assert_eq!(error, PricingError::PredictionFailed(ModelError::EmptyOutput));

        let narrow = ModelHandle::new(LinearModel::new(vec![1.0, 1.0], 0.0));
        let error = predict(inputs, &narrow, &config).expect_err("shape rejected");
        assert_eq!(
            error,
            PricingError::PredictionFailed(ModelError::ShapeMismatch {
                expected: 2,
                found: 4
            })
        );
    }

    #[test]
    fn unavailable_model_is_reported() {
        let error = predict(
            RawFeatureInputs::new(1800.0, 3.0, 2.0, 2.0),
            &ModelHandle::unavailable("model file not found at modelo_vivienda.json"),
            &PipelineConfig::default(),
        )
        .expect_err("no model");
        assert_eq!(error.kind(), ErrorKind::ModelUnavailable);
        assert!(error.to_string().contains("modelo_vivienda.json"));
    }

    #[test]
    fn result_is_rounded_to_cents() {
        let model = ModelHandle::new(LinearModel::new(vec![0.333, 0.0, 0.0, 0.0], 0.004));
        let result = predict(
            RawFeatureInputs::new(1001.0, 1.0, 1.0, 0.0),
            &model,
            &PipelineConfig::default(),
        )
        .expect("prediction succeeds");
        assert_eq!(result.value, 333.34);
    }

    #[test]
    fn pipeline_struct_delegates_to_configuration() {
        let mut config = PipelineConfig::default();
        config.currency_label = "€".to_string();
        config.bounds.feature_order =
            FeatureOrder::parse("rooms,size,bathrooms,offers").expect("valid order");
        let pipeline = PricePredictionPipeline::new(config);

        assert_eq!(
            pipeline.ordered_features(),
            [
                Feature::Rooms,
                Feature::Size,
                Feature::Bathrooms,
                Feature::Offers
            ]
        );

        let result = pipeline
            .predict(
                RawFeatureInputs::new(1800.0, 3.0, 2.0, 2.0),
                &reference_model(),
            )
            .expect("prediction succeeds");
        assert_eq!(result.currency_label, "€");
        assert_eq!(result.value, 50.0 * 3.0 + 2000.0 * 1800.0 + 6000.0 - 2000.0 + 10_000.0);
    }
}
