use serde::{Deserialize, Serialize};
use std::fmt;

/// The four housing characteristics a price model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Size,
    Rooms,
    Bathrooms,
    Offers,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Size,
        Feature::Rooms,
        Feature::Bathrooms,
        Feature::Offers,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Rooms => "rooms",
            Self::Bathrooms => "bathrooms",
            Self::Offers => "offers",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Size => "Size",
            Self::Rooms => "Rooms",
            Self::Bathrooms => "Bathrooms",
            Self::Offers => "Offers received",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "size" | "area" => Some(Self::Size),
            "rooms" => Some(Self::Rooms),
            "bathrooms" | "baths" => Some(Self::Bathrooms),
            "offers" => Some(Self::Offers),
            _ => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Unit the `size` feature is expressed in. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    SquareFeet,
    SquareMeters,
}

impl SizeUnit {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqft" | "ft2" | "square_feet" | "square feet" => Some(Self::SquareFeet),
            "sqm" | "m2" | "square_meters" | "square meters" => Some(Self::SquareMeters),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SquareFeet => "square feet",
            Self::SquareMeters => "square meters",
        }
    }
}

/// Scalars exactly as a caller supplied them. Nothing here has been checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFeatureInputs {
    pub size: f64,
    pub rooms: f64,
    pub bathrooms: f64,
    pub offers: f64,
}

impl RawFeatureInputs {
    pub fn new(size: f64, rooms: f64, bathrooms: f64, offers: f64) -> Self {
        Self {
            size,
            rooms,
            bathrooms,
            offers,
        }
    }

    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Size => self.size,
            Feature::Rooms => self.rooms,
            Feature::Bathrooms => self.bathrooms,
            Feature::Offers => self.offers,
        }
    }
}

/// Feature values that passed bounds validation.
///
/// Only the pipeline's validator constructs these, so holding one means every
/// field sits inside its configured range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    size: f64,
    rooms: f64,
    bathrooms: f64,
    offers: f64,
}

impl FeatureVector {
    pub(crate) fn from_validated(inputs: RawFeatureInputs) -> Self {
        Self {
            size: inputs.size,
            rooms: inputs.rooms,
            bathrooms: inputs.bathrooms,
            offers: inputs.offers,
        }
    }

    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Size => self.size,
            Feature::Rooms => self.rooms,
            Feature::Bathrooms => self.bathrooms,
            Feature::Offers => self.offers,
        }
    }

}

/// A price estimate ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub value: f64,
    pub currency_label: String,
}

impl PredictionResult {
    pub(crate) fn new(raw_value: f64, currency_label: &str) -> Self {
        Self {
            value: round_cents(raw_value),
            currency_label: currency_label.to_string(),
        }
    }

    /// Renders `"$ 110,000.00"` style text.
    pub fn formatted(&self) -> String {
        format!("{} {}", self.currency_label, group_thousands(self.value))
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Rounds half away from zero to two decimals. Values too large to scale are
/// already whole and come back unchanged.
pub(crate) fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// Two-decimal amount with comma thousands separators, e.g. `110,000.00`.
pub fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round_cents(110_000.004), 110_000.0);
        assert_eq!(round_cents(1234.567), 1234.57);
        assert_eq!(round_cents(-2.345_001), -2.35);
    }

    #[test]
    fn rounding_huge_values_stays_finite() {
        assert_eq!(round_cents(1e307), 1e307);
        assert_eq!(round_cents(-f64::MAX), -f64::MAX);

        let result = PredictionResult::new(f64::MAX, "$");
        assert!(result.value.is_finite());
    }

    #[test]
    fn formatted_groups_thousands() {
        let result = PredictionResult::new(110_000.0, "$");
        assert_eq!(result.formatted(), "$ 110,000.00");

        let result = PredictionResult::new(-1_234_567.891, "€");
        assert_eq!(result.formatted(), "€ -1,234,567.89");

        let result = PredictionResult::new(999.5, "S/");
        assert_eq!(result.formatted(), "S/ 999.50");
    }

    #[test]
    fn feature_parse_accepts_aliases() {
        assert_eq!(Feature::parse(" Size "), Some(Feature::Size));
        assert_eq!(Feature::parse("baths"), Some(Feature::Bathrooms));
        assert_eq!(Feature::parse("garage"), None);
    }

    #[test]
    fn size_unit_parse_recognizes_both_systems() {
        assert_eq!(SizeUnit::parse("sqft"), Some(SizeUnit::SquareFeet));
        assert_eq!(SizeUnit::parse("M2"), Some(SizeUnit::SquareMeters));
        assert_eq!(SizeUnit::parse("acres"), None);
    }
}
