use super::forest::{ForestModel, ForestPayload};
use super::linear::LinearModel;
use super::{ModelHandle, PriceModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Linear,
    RandomForest,
}

/// On-disk envelope wrapping a family-specific model payload.
///
/// `feature_names` is informational; row layout always comes from the
/// configured feature order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub family: ModelFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub model: serde_json::Value,
}

impl ModelArtifact {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        serde_json::from_reader(reader).map_err(ModelLoadError::Format)
    }

    pub fn into_model(self) -> Result<Arc<dyn PriceModel>, ModelLoadError> {
        match self.family {
            ModelFamily::Linear => {
                let model: LinearModel =
                    serde_json::from_value(self.model).map_err(ModelLoadError::Format)?;
                if model.width() == 0 {
                    return Err(ModelLoadError::EmptyCoefficients);
                }
                Ok(Arc::new(model))
            }
            ModelFamily::RandomForest => {
                let payload: ForestPayload =
                    serde_json::from_value(self.model).map_err(ModelLoadError::Format)?;
                Ok(Arc::new(ForestModel::from(payload)))
            }
        }
    }
}

#[derive(Debug)]
pub enum ModelLoadError {
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Format(serde_json::Error),
    EmptyCoefficients,
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelLoadError::NotFound(path) => {
                write!(f, "model file not found at {}", path.display())
            }
            ModelLoadError::Io { path, source } => {
                write!(f, "failed to read model file {}: {}", path.display(), source)
            }
            ModelLoadError::Format(err) => write!(f, "invalid model artifact: {}", err),
            ModelLoadError::EmptyCoefficients => {
                write!(f, "invalid model artifact: linear model has no coefficients")
            }
        }
    }
}

impl std::error::Error for ModelLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelLoadError::NotFound(_) | ModelLoadError::EmptyCoefficients => None,
            ModelLoadError::Io { source, .. } => Some(source),
            ModelLoadError::Format(err) => Some(err),
        }
    }
}

/// Reads a model artifact from disk into a shareable handle.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelHandle, ModelLoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ModelLoadError::NotFound(path.to_path_buf())
        } else {
            ModelLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let artifact = ModelArtifact::from_reader(std::io::BufReader::new(file))?;
    let family = artifact.family;
    let model = artifact.into_model()?;
    info!(?family, path = %path.display(), "loaded price model");

    Ok(ModelHandle::from_arc(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::model::forest::tests::small_forest;
    use std::io::{Cursor, Write};

    #[test]
    fn linear_artifact_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("modelo_vivienda.json");
        let mut file = std::fs::File::create(&path).expect("create artifact");
        file.write_all(
            br#"{"family":"linear","feature_names":["Piescuad","Cuartos","Banos","Ofertas"],
                "model":{"coefficients":[50.0,2000.0,3000.0,-1000.0],"intercept":10000.0}}"#,
        )
        .expect("write artifact");

        let handle = load_model(&path).expect("artifact loads");
        let model = handle.model().expect("available");
        assert_eq!(model.family(), "linear");
        assert_eq!(model.coefficients(), Some(&[50.0, 2000.0, 3000.0, -1000.0][..]));
        assert_eq!(model.intercept(), Some(10_000.0));
    }

    #[test]
    fn forest_artifact_deserializes() {
        let artifact = ModelArtifact {
            family: ModelFamily::RandomForest,
            feature_names: None,
            model: serde_json::to_value(ForestPayload {
                n_features: 4,
                regressor: small_forest(),
            })
            .expect("serialize forest"),
        };
        let encoded = serde_json::to_vec(&artifact).expect("encode envelope");

        let model = ModelArtifact::from_reader(Cursor::new(encoded))
            .expect("envelope parses")
            .into_model()
            .expect("forest restores");
        assert_eq!(model.family(), "random_forest");
        assert!(model.predict(&[1500.0, 3.0, 2.0, 1.0]).is_ok());
    }

    #[test]
    fn forest_artifact_without_width_is_rejected() {
        let artifact = ModelArtifact {
            family: ModelFamily::RandomForest,
            feature_names: None,
            model: serde_json::json!({
                "regressor": serde_json::to_value(small_forest()).expect("serialize forest"),
            }),
        };
        let result = artifact.into_model();
        assert!(matches!(result, Err(ModelLoadError::Format(_))));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let error = load_model("./does-not-exist.json").expect_err("expected failure");
        match error {
            ModelLoadError::NotFound(path) => {
                assert_eq!(path, PathBuf::from("./does-not-exist.json"))
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_artifact_is_a_format_error() {
        let error = ModelArtifact::from_reader(Cursor::new("\u{80}pickle"))
            .expect_err("not json");
        assert!(matches!(error, ModelLoadError::Format(_)));

        let error = ModelArtifact::from_reader(Cursor::new(
            r#"{"family":"gradient_boosting","model":{}}"#,
        ))
        .expect_err("unknown family");
        assert!(error.to_string().starts_with("invalid model artifact"));
    }

    #[test]
    fn linear_artifact_without_coefficients_is_rejected() {
        let result = ModelArtifact::from_reader(Cursor::new(
            r#"{"family":"linear","model":{"coefficients":[],"intercept":1.0}}"#,
        ))
        .expect("envelope parses")
        .into_model();
        assert!(matches!(result, Err(ModelLoadError::EmptyCoefficients)));
    }
}
