pub mod batch;
pub mod bounds;
pub mod coefficients;
pub mod domain;
pub mod error;
pub mod model;
mod pipeline;

pub use batch::{BatchColumns, BatchComparison, BatchError, DEFAULT_PREVIEW_ROWS};
pub use bounds::{BoundsConfig, FeatureOrder, FieldBounds};
pub use coefficients::{CoefficientEntry, CoefficientReport};
pub use domain::{
    group_thousands, Feature, FeatureVector, PredictionResult, RawFeatureInputs, SizeUnit,
};
pub use error::{ErrorKind, ModelError, PricingError};
pub use model::{load_model, ModelHandle, PriceModel};
pub use pipeline::{predict, PipelineConfig, PricePredictionPipeline};
