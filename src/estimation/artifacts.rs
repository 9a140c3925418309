//! Persistence of the regressor, encoder and scaler as one versioned triple.
//!
//! Every file is a JSON envelope carrying the schema version, the artifact
//! kind and the generation of the training run that produced it. A triple is
//! only accepted when all three files agree on version and generation.

use crate::estimation::features::{CategoryEncoder, StandardScaler};
use crate::estimation::forest::RandomForest;
use crate::estimation::model::LearnedModel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Regressor,
    Encoder,
    Scaler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub regressor: PathBuf,
    pub encoder: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            regressor: dir.join("eco_points_regressor.json"),
            encoder: dir.join("category_encoder.json"),
            scaler: dir.join("feature_scaler.json"),
        }
    }

    fn all(&self) -> [&Path; 3] {
        [&self.regressor, &self.encoder, &self.scaler]
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact {path} has schema version {found}, expected {expected}")]
    SchemaVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("artifact {path} holds a {found:?}, expected {expected:?}")]
    WrongKind {
        path: PathBuf,
        found: ArtifactKind,
        expected: ArtifactKind,
    },
    #[error(
        "artifacts come from different training runs (regressor {regressor}, encoder {encoder}, scaler {scaler})"
    )]
    GenerationMismatch {
        regressor: u64,
        encoder: u64,
        scaler: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    kind: ArtifactKind,
    generation: u64,
    payload: T,
}

/// Writes all three artifacts to temporary files before renaming any into place.
pub fn save_artifacts(paths: &ArtifactPaths, model: &LearnedModel) -> Result<(), ArtifactError> {
    let generation = model.generation();
    let staged = [
        (
            &paths.regressor,
            encode(ArtifactKind::Regressor, generation, model.regressor(), &paths.regressor)?,
        ),
        (
            &paths.encoder,
            encode(ArtifactKind::Encoder, generation, model.encoder(), &paths.encoder)?,
        ),
        (
            &paths.scaler,
            encode(ArtifactKind::Scaler, generation, model.scaler(), &paths.scaler)?,
        ),
    ];

    let mut temporaries = Vec::with_capacity(staged.len());
    for (path, contents) in &staged {
        let temporary = temporary_path(path);
        write_synced(&temporary, contents)?;
        temporaries.push((temporary, *path));
    }

    for (temporary, path) in &temporaries {
        fs::rename(temporary, path).map_err(|source| ArtifactError::Io {
            path: (*path).clone(),
            source,
        })?;
    }

    info!(generation, regressor = %paths.regressor.display(), "Model artifacts saved");
    Ok(())
}

/// Loads the triple. `Ok(None)` when any of the three files is missing.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<Option<LearnedModel>, ArtifactError> {
    if let Some(missing) = paths.all().into_iter().find(|path| !path.exists()) {
        debug!(path = %missing.display(), "Model artifact missing");
        return Ok(None);
    }

    let regressor: Envelope<RandomForest> = decode(&paths.regressor, ArtifactKind::Regressor)?;
    let encoder: Envelope<CategoryEncoder> = decode(&paths.encoder, ArtifactKind::Encoder)?;
    let scaler: Envelope<StandardScaler> = decode(&paths.scaler, ArtifactKind::Scaler)?;

    if regressor.generation != encoder.generation || regressor.generation != scaler.generation {
        return Err(ArtifactError::GenerationMismatch {
            regressor: regressor.generation,
            encoder: encoder.generation,
            scaler: scaler.generation,
        });
    }

    Ok(Some(LearnedModel::new(
        regressor.payload,
        encoder.payload,
        scaler.payload,
        regressor.generation,
    )))
}

fn encode<T: Serialize>(
    kind: ArtifactKind,
    generation: u64,
    payload: &T,
    path: &Path,
) -> Result<Vec<u8>, ArtifactError> {
    let envelope = Envelope {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        kind,
        generation,
        payload,
    };
    serde_json::to_vec(&envelope).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn decode<T: DeserializeOwned>(path: &Path, expected: ArtifactKind) -> Result<Envelope<T>, ArtifactError> {
    let contents = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Check the header before the payload so version skew reports as such.
    let header: Envelope<serde::de::IgnoredAny> =
        serde_json::from_slice(&contents).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if header.schema_version != ARTIFACT_SCHEMA_VERSION {
        return Err(ArtifactError::SchemaVersion {
            path: path.to_path_buf(),
            found: header.schema_version,
            expected: ARTIFACT_SCHEMA_VERSION,
        });
    }
    if header.kind != expected {
        return Err(ArtifactError::WrongKind {
            path: path.to_path_buf(),
            found: header.kind,
            expected,
        });
    }

    serde_json::from_slice(&contents).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_synced(path: &Path, contents: &[u8]) -> Result<(), ArtifactError> {
    let io_error = |source: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut file = fs::File::create(path).map_err(io_error)?;
    file.write_all(contents).map_err(io_error)?;
    file.sync_all().map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::training::{TrainingParams, fit_learned_model};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_dir(label: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        Ok(std::env::temp_dir().join(format!("ecopulse-{label}-{unique}")))
    }

    fn trained(generation: u64) -> Result<LearnedModel, Box<dyn std::error::Error>> {
        let params = TrainingParams {
            n_trees: 5,
            ..TrainingParams::default()
        };
        Ok(fit_learned_model(60, &params, generation)?.0)
    }

    #[test]
    fn saved_triple_loads_back_identically() -> Result<(), Box<dyn std::error::Error>> {
        let dir = unique_dir("artifacts-roundtrip")?;
        let paths = ArtifactPaths::in_dir(&dir);
        let model = trained(11)?;

        save_artifacts(&paths, &model)?;
        let loaded = load_artifacts(&paths)?;
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(loaded, Some(model));
        Ok(())
    }

    #[test]
    fn no_temporary_files_survive_a_save() -> Result<(), Box<dyn std::error::Error>> {
        let dir = unique_dir("artifacts-tmp")?;
        let paths = ArtifactPaths::in_dir(&dir);

        save_artifacts(&paths, &trained(1)?)?;
        let leftovers = fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[test]
    fn partial_triple_is_treated_as_absent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = unique_dir("artifacts-partial")?;
        let paths = ArtifactPaths::in_dir(&dir);
        save_artifacts(&paths, &trained(2)?)?;
        fs::remove_file(&paths.scaler)?;

        let loaded = load_artifacts(&paths)?;
        let _ = fs::remove_dir_all(&dir);

        assert!(loaded.is_none());
        Ok(())
    }

    #[test]
    fn mixed_generations_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let first_dir = unique_dir("artifacts-gen-a")?;
        let second_dir = unique_dir("artifacts-gen-b")?;
        let first = ArtifactPaths::in_dir(&first_dir);
        let second = ArtifactPaths::in_dir(&second_dir);
        save_artifacts(&first, &trained(3)?)?;
        save_artifacts(&second, &trained(4)?)?;
        fs::copy(&second.encoder, &first.encoder)?;

        let result = load_artifacts(&first);
        let _ = fs::remove_dir_all(&first_dir);
        let _ = fs::remove_dir_all(&second_dir);

        assert!(matches!(
            result,
            Err(ArtifactError::GenerationMismatch {
                regressor: 3,
                encoder: 4,
                scaler: 3
            })
        ));
        Ok(())
    }

    #[test]
    fn stale_schema_version_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = unique_dir("artifacts-version")?;
        let paths = ArtifactPaths::in_dir(&dir);
        save_artifacts(&paths, &trained(5)?)?;
        let mut scaler: serde_json::Value = serde_json::from_slice(&fs::read(&paths.scaler)?)?;
        scaler["schema_version"] = serde_json::json!(0);
        fs::write(&paths.scaler, serde_json::to_vec(&scaler)?)?;

        let result = load_artifacts(&paths);
        let _ = fs::remove_dir_all(&dir);

        assert!(matches!(
            result,
            Err(ArtifactError::SchemaVersion { found: 0, .. })
        ));
        Ok(())
    }

    #[test]
    fn swapped_files_are_rejected_by_kind() -> Result<(), Box<dyn std::error::Error>> {
        let dir = unique_dir("artifacts-kind")?;
        let paths = ArtifactPaths::in_dir(&dir);
        save_artifacts(&paths, &trained(6)?)?;
        fs::copy(&paths.encoder, &paths.scaler)?;

        let result = load_artifacts(&paths);
        let _ = fs::remove_dir_all(&dir);

        assert!(matches!(
            result,
            Err(ArtifactError::WrongKind {
                found: ArtifactKind::Encoder,
                expected: ArtifactKind::Scaler,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn corrupt_file_reports_json_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = unique_dir("artifacts-corrupt")?;
        let paths = ArtifactPaths::in_dir(&dir);
        save_artifacts(&paths, &trained(7)?)?;
        fs::write(&paths.regressor, b"{ truncated")?;

        let result = load_artifacts(&paths);
        let _ = fs::remove_dir_all(&dir);

        assert!(matches!(result, Err(ArtifactError::Json { .. })));
        Ok(())
    }
}
