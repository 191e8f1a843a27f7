use crate::infra::{resolve_model_path, PricingState, FORM_DEFAULTS};
use clap::Args;
use housing_price::config::AppConfig;
use housing_price::error::AppError;
use housing_price::pricing::batch::ComparisonPoint;
use housing_price::pricing::{
    group_thousands, load_model, BatchComparison, CoefficientReport, Feature, PredictionResult,
    RawFeatureInputs, DEFAULT_PREVIEW_ROWS,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ModelArgs {
    /// Model artifact to load instead of the configured one
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    #[command(flatten)]
    pub(crate) model: ModelArgs,
    /// Living area, in the deployment's size unit
    #[arg(long, default_value_t = FORM_DEFAULTS.size)]
    pub(crate) size: f64,
    /// Number of rooms
    #[arg(long, default_value_t = FORM_DEFAULTS.rooms)]
    pub(crate) rooms: f64,
    /// Number of bathrooms
    #[arg(long, default_value_t = FORM_DEFAULTS.bathrooms)]
    pub(crate) bathrooms: f64,
    /// Offers already received on the property
    #[arg(long, default_value_t = FORM_DEFAULTS.offers)]
    pub(crate) offers: f64,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    #[command(flatten)]
    pub(crate) model: ModelArgs,
    /// CSV file with feature columns and the actual price
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Rows to include in the comparison table
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub(crate) limit: usize,
}

/// Loads configuration and the model for a one-shot command. Unlike the
/// server, a missing artifact ends the command.
fn load_pricing(model: ModelArgs) -> Result<PricingState, AppError> {
    let mut config = AppConfig::load()?;
    let path = resolve_model_path(&config.pricing, model.model);
    let handle = load_model(&path)?;
    config.pricing.model_path = path;
    Ok(PricingState::new(&config.pricing, handle))
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        model,
        size,
        rooms,
        bathrooms,
        offers,
    } = args;

    let pricing = load_pricing(model)?;
    let inputs = RawFeatureInputs::new(size, rooms, bathrooms, offers);
    let result = pricing.pipeline.predict(inputs, &pricing.model)?;
    render_prediction(&pricing, &inputs, &result);
    Ok(())
}

pub(crate) fn run_coefficients(args: ModelArgs) -> Result<(), AppError> {
    let pricing = load_pricing(args)?;
    let model = pricing.model.model()?;

    println!("Model coefficients");
    println!("  Family: {}", model.family());
    println!("  Artifact: {}", pricing.model_path.display());

    match CoefficientReport::describe_or_warn(model, &pricing.feature_names()) {
        Some(report) => render_coefficients(&report),
        None => println!("  Coefficients are not available for this model."),
    }
    Ok(())
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let CompareArgs { model, csv, limit } = args;

    let pricing = load_pricing(model)?;
    let comparison =
        BatchComparison::from_path(&csv, &pricing.columns, &pricing.pipeline, &pricing.model)?;

    println!("Actual vs predicted prices ({})", csv.display());
    render_comparison(
        &comparison.preview(limit),
        &pricing.pipeline.config().currency_label,
    );

    let summary = comparison.summary();
    println!(
        "\n  Rows: {} | Predicted: {} | Failed: {}",
        summary.rows, summary.predicted, summary.failed
    );
    if let (Some(mae), Some(rmse)) = (
        summary.mean_absolute_error,
        summary.root_mean_squared_error,
    ) {
        println!("  Mean absolute error: {mae:.2}");
        println!("  Root mean squared error: {rmse:.2}");
    }
    Ok(())
}

fn render_prediction(
    pricing: &PricingState,
    inputs: &RawFeatureInputs,
    result: &PredictionResult,
) {
    println!("Estimated price: {}", result.formatted());
    println!("\nInputs");
    for feature in Feature::ALL {
        println!(
            "  {:<24} {}",
            pricing.feature_label(feature),
            inputs.value(feature)
        );
    }
}

fn render_coefficients(report: &CoefficientReport) {
    for entry in &report.entries {
        println!("  {:<12} {:>14.4}", entry.name, entry.coefficient);
    }
    println!("  {:<12} {:>14.4}", "(intercept)", report.intercept);

    let ranked: Vec<&str> = report
        .ranked_by_magnitude()
        .into_iter()
        .map(|entry| entry.name.as_str())
        .collect();
    println!("\n  Largest influence first: {}", ranked.join(", "));
}

fn render_comparison(points: &[ComparisonPoint], currency: &str) {
    println!("  {:>4}  {:>16}  {:>16}", "Row", "Actual", "Predicted");
    for point in points {
        let actual = format_amount(point.actual, currency);
        match (&point.error, point.predicted) {
            (Some(error), _) => println!("  {:>4}  {:>16}  failed: {}", point.row, actual, error),
            (None, predicted) => println!(
                "  {:>4}  {:>16}  {:>16}",
                point.row,
                actual,
                format_amount(predicted, currency)
            ),
        }
    }
}

fn format_amount(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(value) => format!("{currency} {}", group_thousands(value)),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_amounts_group_thousands() {
        assert_eq!(format_amount(None, "$"), "-");
        assert_eq!(format_amount(Some(110_000.0), "$"), "$ 110,000.00");
        assert_eq!(format_amount(Some(1_234_567.891), "€"), "€ 1,234,567.89");
    }
}
