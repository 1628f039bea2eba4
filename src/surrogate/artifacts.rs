//! Artifact directory layout and JSON loading.
//!
//! File names are derived from target names so the training pipeline and
//! this crate agree without a manifest.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Canonical feature ordering (required)
pub const FEATURE_ORDER_FILE: &str = "feature_cols.json";

/// Outlier detector bundle (model + threshold + feature order)
pub const ANOMALY_BUNDLE_FILE: &str = "anomaly_iforest.json";

/// Default values for context/engineered columns the caller may omit
pub const CONTEXT_DEFAULTS_FILE: &str = "context_defaults.json";

/// Default artifact directory, relative to the working directory
pub const DEFAULT_ARTIFACT_DIR: &str = "ml/artifacts";

/// Path of the regressor for a continuous target.
pub fn regressor_path(dir: &Path, target: &str) -> PathBuf {
    dir.join(format!("{target}_lgbm.json"))
}

/// Path of the classifier for a binary target.
pub fn classifier_path(dir: &Path, target: &str) -> PathBuf {
    dir.join(format!("{target}_catboost.json"))
}

/// Failure to read one artifact file.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model in {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ArtifactError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read and deserialize a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_follow_target_convention() {
        let dir = Path::new("/models");
        assert_eq!(
            regressor_path(dir, "yield_pct"),
            PathBuf::from("/models/yield_pct_lgbm.json")
        );
        assert_eq!(
            classifier_path(dir, "rework_required"),
            PathBuf::from("/models/rework_required_catboost.json")
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = read_json::<Vec<String>>(&tmp.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_garbage_file_is_parse_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_json::<Vec<String>>(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }
}
