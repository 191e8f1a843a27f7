use super::bounds::FeatureOrder;
use super::domain::{Feature, RawFeatureInputs};
use super::error::{ErrorKind, PricingError};
use super::model::ModelHandle;
use super::pipeline::PricePredictionPipeline;
use csv::StringRecord;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Rows shown in the actual-vs-predicted comparison.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Header names of the comparison file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchColumns {
    pub size: String,
    pub rooms: String,
    pub bathrooms: String,
    pub offers: String,
    pub price: String,
}

impl BatchColumns {
    pub fn feature(&self, feature: Feature) -> &str {
        match feature {
            Feature::Size => &self.size,
            Feature::Rooms => &self.rooms,
            Feature::Bathrooms => &self.bathrooms,
            Feature::Offers => &self.offers,
        }
    }

    /// Feature column names laid out in model order, e.g. for labelling
    /// coefficients.
    pub fn ordered(&self, order: &FeatureOrder) -> Vec<String> {
        order
            .features()
            .iter()
            .map(|feature| self.feature(*feature).to_string())
            .collect()
    }

    fn required(&self) -> [&str; 5] {
        [
            &self.size,
            &self.rooms,
            &self.bathrooms,
            &self.offers,
            &self.price,
        ]
    }
}

impl Default for BatchColumns {
    fn default() -> Self {
        Self {
            size: "Piescuad".to_string(),
            rooms: "Cuartos".to_string(),
            bathrooms: "Baños".to_string(),
            offers: "Ofertas".to_string(),
            price: "Precio".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("invalid comparison CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read comparison file: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            BatchError::Pricing(err) => Some(err.kind()),
            BatchError::Csv(_) | BatchError::Io(_) => None,
        }
    }
}

/// Why a single row produced no prediction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowFailure {
    #[error("column '{column}' is empty")]
    MissingCell { column: String },
    #[error("column '{column}' holds '{value}', which is not a number")]
    InvalidCell { column: String, value: String },
    #[error("unreadable row: {0}")]
    Malformed(String),
    #[error(transparent)]
    Prediction(PricingError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// 1-based position among the data rows.
    pub row: usize,
    pub actual: Option<f64>,
    pub outcome: Result<f64, RowFailure>,
}

impl ComparisonRow {
    pub fn predicted(&self) -> Option<f64> {
        self.outcome.as_ref().ok().copied()
    }
}

/// One point of the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub row: usize,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub rows: usize,
    pub predicted: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_absolute_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_mean_squared_error: Option<f64>,
}

/// Actual prices from a file paired with pipeline predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchComparison {
    rows: Vec<ComparisonRow>,
}

impl BatchComparison {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        columns: &BatchColumns,
        pipeline: &PricePredictionPipeline,
        model: &ModelHandle,
    ) -> Result<Self, BatchError> {
        let file = std::fs::File::open(path)?;
        Self::compare(file, columns, pipeline, model)
    }

    /// Runs every data row through the pipeline.
    ///
    /// The header must carry all feature columns and the price column,
    /// otherwise nothing is predicted. A row that cannot be parsed or
    /// predicted is kept as a failed row and the remaining rows still run.
    pub fn compare<R: Read>(
        reader: R,
        columns: &BatchColumns,
        pipeline: &PricePredictionPipeline,
        model: &ModelHandle,
    ) -> Result<Self, BatchError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let layout = ColumnLayout::resolve(&headers, columns)?;
        model.model()?;

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let row = idx + 1;
            let compared = match record {
                Ok(record) => layout.compare_record(row, &record, pipeline, model),
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => ComparisonRow {
                    row,
                    actual: None,
                    outcome: Err(RowFailure::Malformed(err.to_string())),
                },
            };
            if let Err(failure) = &compared.outcome {
                debug!(row, error = %failure, "comparison row failed");
            }
            rows.push(compared);
        }

        let comparison = Self { rows };
        let summary = comparison.summary();
        info!(
            rows = summary.rows,
            predicted = summary.predicted,
            failed = summary.failed,
            "batch comparison complete"
        );
        Ok(comparison)
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn preview(&self, limit: usize) -> Vec<ComparisonPoint> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| ComparisonPoint {
                row: row.row,
                actual: row.actual,
                predicted: row.predicted(),
                error: row.outcome.as_ref().err().map(ToString::to_string),
            })
            .collect()
    }

    /// Paired series for the first `limit` rows, as drawn by the comparison
    /// chart.
    pub fn series(&self, limit: usize) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        self.rows
            .iter()
            .take(limit)
            .map(|row| (row.actual, row.predicted()))
            .unzip()
    }

    pub fn summary(&self) -> ComparisonSummary {
        let pairs: Vec<(f64, f64)> = self
            .rows
            .iter()
            .filter_map(|row| Some((row.actual?, row.predicted()?)))
            .collect();

        let (mean_absolute_error, root_mean_squared_error) = if pairs.is_empty() {
            (None, None)
        } else {
            let n = pairs.len() as f64;
            let abs: f64 = pairs.iter().map(|(a, p)| (a - p).abs()).sum();
            let sq: f64 = pairs.iter().map(|(a, p)| (a - p).powi(2)).sum();
            (Some(abs / n), Some((sq / n).sqrt()))
        };

        let predicted = self.rows.iter().filter(|row| row.outcome.is_ok()).count();
        ComparisonSummary {
            rows: self.rows.len(),
            predicted,
            failed: self.rows.len() - predicted,
            mean_absolute_error,
            root_mean_squared_error,
        }
    }
}

struct ColumnLayout {
    features: [(Feature, usize); 4],
    price: usize,
    names: BatchColumns,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, columns: &BatchColumns) -> Result<Self, PricingError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let position = |name: &str| normalized.iter().position(|header| header == name);

        let missing: Vec<String> = columns
            .required()
            .into_iter()
            .filter(|name| position(*name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(PricingError::SchemaMismatch { missing });
        }

        let mut features = [(Feature::Size, 0); 4];
        for (slot, feature) in features.iter_mut().zip(Feature::ALL) {
            *slot = (feature, position(columns.feature(feature)).unwrap_or_default());
        }

        Ok(Self {
            features,
            price: position(&columns.price).unwrap_or_default(),
            names: columns.clone(),
        })
    }

    fn compare_record(
        &self,
        row: usize,
        record: &StringRecord,
        pipeline: &PricePredictionPipeline,
        model: &ModelHandle,
    ) -> ComparisonRow {
        let actual = self.cell(record, self.price, &self.names.price);
        let outcome = self.inputs(record).and_then(|inputs| {
            let actual = actual.clone()?;
            let predicted = pipeline
                .predict(inputs, model)
                .map_err(RowFailure::Prediction)?;
            debug!(row, actual, predicted = predicted.value, "compared row");
            Ok(predicted.value)
        });

        ComparisonRow {
            row,
            actual: actual.ok(),
            outcome,
        }
    }

    fn inputs(&self, record: &StringRecord) -> Result<RawFeatureInputs, RowFailure> {
        let mut values = [0.0; 4];
        for (value, (feature, idx)) in values.iter_mut().zip(self.features) {
            *value = self.cell(record, idx, self.names.feature(feature))?;
        }
        Ok(RawFeatureInputs::new(values[0], values[1], values[2], values[3]))
    }

    fn cell(&self, record: &StringRecord, idx: usize, column: &str) -> Result<f64, RowFailure> {
        let raw = record.get(idx).unwrap_or_default();
        if raw.is_empty() {
            return Err(RowFailure::MissingCell {
                column: column.to_string(),
            });
        }
        raw.parse::<f64>().map_err(|_| RowFailure::InvalidCell {
            column: column.to_string(),
            value: raw.to_string(),
        })
    }
}

fn normalize_header(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}
