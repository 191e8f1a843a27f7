use crate::pricing::bounds::FeatureOrderError;
use crate::pricing::{
    BatchColumns, BoundsConfig, Feature, FeatureOrder, FieldBounds, PipelineConfig, SizeUnit,
};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pricing: PricingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Deployment-specific pricing settings: which artifact to load, how inputs
/// are bounded and ordered, and how the comparison file is laid out.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub model_path: PathBuf,
    pub size_unit: SizeUnit,
    pub pipeline: PipelineConfig,
    pub columns: BatchColumns,
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let model_path = PathBuf::from(
            env::var("PRICING_MODEL_PATH").unwrap_or_else(|_| "modelo_vivienda.json".to_string()),
        );

        let raw_unit = env::var("PRICING_SIZE_UNIT").unwrap_or_else(|_| "sqft".to_string());
        let size_unit =
            SizeUnit::parse(&raw_unit).ok_or(ConfigError::InvalidSizeUnit(raw_unit))?;

        let feature_order = match env::var("PRICING_FEATURE_ORDER") {
            Ok(raw) => FeatureOrder::parse(&raw).map_err(ConfigError::InvalidFeatureOrder)?,
            Err(_) => FeatureOrder::default(),
        };

        let defaults = BoundsConfig::default();
        let bathrooms_fractional = env_bool("PRICING_BATHROOMS_FRACTIONAL", false)?;
        let bounds = BoundsConfig {
            size: env_bounds(Feature::Size, defaults.size, true)?,
            rooms: env_bounds(Feature::Rooms, defaults.rooms, false)?,
            bathrooms: env_bounds(Feature::Bathrooms, defaults.bathrooms, bathrooms_fractional)?,
            offers: env_bounds(Feature::Offers, defaults.offers, false)?,
            feature_order,
        };

        let currency_label = env::var("PRICING_CURRENCY").unwrap_or_else(|_| "$".to_string());

        let default_columns = BatchColumns::default();
        let columns = BatchColumns {
            size: env_or("PRICING_COLUMN_SIZE", default_columns.size),
            rooms: env_or("PRICING_COLUMN_ROOMS", default_columns.rooms),
            bathrooms: env_or("PRICING_COLUMN_BATHROOMS", default_columns.bathrooms),
            offers: env_or("PRICING_COLUMN_OFFERS", default_columns.offers),
            price: env_or("PRICING_COLUMN_PRICE", default_columns.price),
        };

        Ok(Self {
            model_path,
            size_unit,
            pipeline: PipelineConfig {
                bounds,
                currency_label,
            },
            columns,
        })
    }
}

fn env_or(var: &str, default: String) -> String {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default)
}

fn env_f64(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(ConfigError::InvalidNumber { var, value: raw }),
        Err(_) => Ok(default),
    }
}

fn env_bool(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { var, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

fn env_bounds(
    feature: Feature,
    defaults: FieldBounds,
    allow_fractional: bool,
) -> Result<FieldBounds, ConfigError> {
    let (min_var, max_var) = match feature {
        Feature::Size => ("PRICING_SIZE_MIN", "PRICING_SIZE_MAX"),
        Feature::Rooms => ("PRICING_ROOMS_MIN", "PRICING_ROOMS_MAX"),
        Feature::Bathrooms => ("PRICING_BATHROOMS_MIN", "PRICING_BATHROOMS_MAX"),
        Feature::Offers => ("PRICING_OFFERS_MIN", "PRICING_OFFERS_MAX"),
    };

    let min = env_f64(min_var, defaults.min)?;
    let max = env_f64(max_var, defaults.max)?;
    if min > max {
        return Err(ConfigError::InvalidBounds { feature, min, max });
    }

    Ok(FieldBounds {
        min,
        max,
        allow_fractional,
    })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        var: &'static str,
        value: String,
    },
    InvalidFlag {
        var: &'static str,
        value: String,
    },
    InvalidSizeUnit(String),
    InvalidFeatureOrder(FeatureOrderError),
    InvalidBounds {
        feature: Feature,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a finite number, found '{value}'")
            }
            ConfigError::InvalidFlag { var, value } => {
                write!(f, "{var} must be true or false, found '{value}'")
            }
            ConfigError::InvalidSizeUnit(value) => {
                write!(f, "PRICING_SIZE_UNIT must be 'sqft' or 'sqm', found '{value}'")
            }
            ConfigError::InvalidFeatureOrder(err) => {
                write!(f, "PRICING_FEATURE_ORDER is invalid: {err}")
            }
            ConfigError::InvalidBounds { feature, min, max } => {
                write!(f, "{feature} bounds are inverted (min {min} > max {max})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidFeatureOrder(err) => Some(err),
            _ => None,
        }
    }
}
