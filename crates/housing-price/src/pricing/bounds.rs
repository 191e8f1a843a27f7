use super::domain::{Feature, FeatureVector, RawFeatureInputs};
use super::error::{PricingError, RangeViolation};
use serde::Serialize;
use std::fmt;

/// Accepted range for a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub allow_fractional: bool,
}

impl FieldBounds {
    pub const fn integer(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            allow_fractional: false,
        }
    }

    pub const fn real(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            allow_fractional: true,
        }
    }

    pub fn check(&self, value: f64) -> Result<(), RangeViolation> {
        if !value.is_finite() {
            return Err(RangeViolation::NotFinite);
        }
        if value < self.min {
            return Err(RangeViolation::BelowMinimum { min: self.min });
        }
        if value > self.max {
            return Err(RangeViolation::AboveMaximum { max: self.max });
        }
        if !self.allow_fractional && value.fract() != 0.0 {
            return Err(RangeViolation::Fractional);
        }
        Ok(())
    }
}

/// Positional layout of the row handed to the model.
///
/// Models receive a bare numeric row and know nothing about field names, so
/// this order must be the one used at training time. Nothing here matches
/// names; a wrong order yields wrong prices without any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureOrder([Feature; 4]);

impl FeatureOrder {
    pub fn new(order: [Feature; 4]) -> Result<Self, FeatureOrderError> {
        for (idx, feature) in order.iter().enumerate() {
            if order[..idx].contains(feature) {
                return Err(FeatureOrderError::Duplicate(*feature));
            }
        }
        Ok(Self(order))
    }

    pub fn parse(raw: &str) -> Result<Self, FeatureOrderError> {
        let names: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        if names.len() != 4 {
            return Err(FeatureOrderError::WrongLength(names.len()));
        }

        let mut order = [Feature::Size; 4];
        for (slot, name) in order.iter_mut().zip(names) {
            *slot = Feature::parse(name)
                .ok_or_else(|| FeatureOrderError::Unknown(name.to_string()))?;
        }
        Self::new(order)
    }

    pub fn features(&self) -> &[Feature; 4] {
        &self.0
    }

    pub fn row(&self, vector: &FeatureVector) -> [f64; 4] {
        self.0.map(|feature| vector.value(feature))
    }
}

impl Default for FeatureOrder {
    fn default() -> Self {
        Self(Feature::ALL)
    }
}

impl fmt::Display for FeatureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.iter().map(|feature| feature.key()).collect();
        f.write_str(&keys.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureOrderError {
    #[error("feature order must name exactly 4 features, found {0}")]
    WrongLength(usize),
    #[error("unknown feature '{0}' in feature order")]
    Unknown(String),
    #[error("feature '{0}' appears more than once in feature order")]
    Duplicate(Feature),
}

/// Per-field bounds plus the model's positional feature order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsConfig {
    pub size: FieldBounds,
    pub rooms: FieldBounds,
    pub bathrooms: FieldBounds,
    pub offers: FieldBounds,
    pub feature_order: FeatureOrder,
}

impl BoundsConfig {
    pub fn for_feature(&self, feature: Feature) -> &FieldBounds {
        match feature {
            Feature::Size => &self.size,
            Feature::Rooms => &self.rooms,
            Feature::Bathrooms => &self.bathrooms,
            Feature::Offers => &self.offers,
        }
    }

    /// Rejects the first field outside its bounds, checking in declaration
    /// order (size, rooms, bathrooms, offers).
    pub fn validate(&self, inputs: RawFeatureInputs) -> Result<FeatureVector, PricingError> {
        for feature in Feature::ALL {
            let value = inputs.value(feature);
            self.for_feature(feature)
                .check(value)
                .map_err(|violation| PricingError::OutOfRange {
                    feature,
                    value,
                    violation,
                })?;
        }
        Ok(FeatureVector::from_validated(inputs))
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            size: FieldBounds::real(200.0, 10_000.0),
            rooms: FieldBounds::integer(1.0, 10.0),
            bathrooms: FieldBounds::integer(1.0, 10.0),
            offers: FieldBounds::integer(0.0, 20.0),
            feature_order: FeatureOrder::default(),
        }
    }
}
