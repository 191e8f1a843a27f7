use super::error::PricingError;
use super::model::PriceModel;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientEntry {
    pub name: String,
    pub coefficient: f64,
}

/// Labelled linear weights and intercept of a model, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientReport {
    pub entries: Vec<CoefficientEntry>,
    pub intercept: f64,
}

impl CoefficientReport {
    /// Pairs each coefficient with the name at the same position.
    ///
    /// A model that exposes coefficients but no intercept was fitted without
    /// one, so the intercept reads as zero.
    pub fn describe<S: AsRef<str>>(
        model: &dyn PriceModel,
        feature_names: &[S],
    ) -> Result<Self, PricingError> {
        let coefficients =
            model
                .coefficients()
                .ok_or_else(|| PricingError::CoefficientsUnavailable {
                    family: model.family().to_string(),
                    reason: "model family has no linear coefficients".to_string(),
                })?;

        if coefficients.len() != feature_names.len() {
            return Err(PricingError::CoefficientsUnavailable {
                family: model.family().to_string(),
                reason: format!(
                    "{} coefficients cannot be labelled with {} feature names",
                    coefficients.len(),
                    feature_names.len()
                ),
            });
        }

        let entries = feature_names
            .iter()
            .zip(coefficients)
            .map(|(name, coefficient)| CoefficientEntry {
                name: name.as_ref().to_string(),
                coefficient: *coefficient,
            })
            .collect();

        Ok(Self {
            entries,
            intercept: model.intercept().unwrap_or(0.0),
        })
    }

    /// Same as [`CoefficientReport::describe`], but a missing table is logged
    /// as a warning instead of surfacing as an error.
    pub fn describe_or_warn<S: AsRef<str>>(
        model: &dyn PriceModel,
        feature_names: &[S],
    ) -> Option<Self> {
        match Self::describe(model, feature_names) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error = %err, "coefficient report unavailable");
                None
            }
        }
    }

    /// Entries sorted by absolute weight, largest first.
    pub fn ranked_by_magnitude(&self) -> Vec<&CoefficientEntry> {
        let mut ranked: Vec<&CoefficientEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::error::{ErrorKind, ModelError};
    use crate::pricing::model::LinearModel;

    struct OpaqueModel;

    impl PriceModel for OpaqueModel {
        fn family(&self) -> &str {
            "opaque"
        }

        fn predict(&self, _row: &[f64]) -> Result<f64, ModelError> {
            Ok(1.0)
        }
    }

    const NAMES: [&str; 4] = ["Piescuad", "Cuartos", "Baños", "Ofertas"];

    #[test]
    fn describe_labels_coefficients_in_order() {
        let model = LinearModel::new(vec![50.0, 2000.0, 3000.0, -1000.0], 10_000.0);
        let report = CoefficientReport::describe(&model, &NAMES).expect("linear has weights");

        assert_eq!(report.intercept, 10_000.0);
        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.entries[2].name, "Baños");
        assert_eq!(report.entries[2].coefficient, 3000.0);
    }

    #[test]
    fn describe_without_coefficients_is_soft_error() {
        let error = CoefficientReport::describe(&OpaqueModel, &NAMES).expect_err("no weights");
        assert_eq!(error.kind(), ErrorKind::CoefficientsUnavailable);
        assert!(error.is_soft());
        assert!(CoefficientReport::describe_or_warn(&OpaqueModel, &NAMES).is_none());
    }

    #[test]
    fn describe_rejects_mismatched_names() {
        let model = LinearModel::new(vec![1.0, 2.0], 0.0);
        let error = CoefficientReport::describe(&model, &NAMES).expect_err("length mismatch");
        assert!(error.to_string().contains("2 coefficients"));
    }

    #[test]
    fn ranking_orders_by_absolute_weight() {
        let model = LinearModel::new(vec![50.0, 2000.0, 3000.0, -4000.0], 0.0);
        let report = CoefficientReport::describe(&model, &NAMES).expect("report");
        let ranked: Vec<&str> = report
            .ranked_by_magnitude()
            .into_iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(ranked, vec!["Ofertas", "Baños", "Cuartos", "Piescuad"]);
    }
}
