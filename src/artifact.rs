//! On-disk form of a trained model.
//!
//! Two JSON files are written side by side: the model artifact, which embeds
//! the feature columns it was trained on, and a standalone feature-column list.
//! Both are first written to temporary files in their destination directories
//! and only then renamed into place, so readers never observe a half-written
//! artifact.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Error, LoadError, Result};
use crate::model::forest::RandomForest;
use crate::parsing::TARGET_COLUMN;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_columns: Vec<String>,
    pub target_column: String,
    pub forest: RandomForest,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

/// Write the model and its feature-column list
pub fn persist(
    model: &RandomForest,
    feature_columns: &[String],
    model_path: &Path,
    columns_path: &Path,
) -> Result<()> {
    let persist_err = |path: &Path, source: io::Error| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    if !model.is_fitted() {
        return Err(persist_err(
            model_path,
            io::Error::new(io::ErrorKind::InvalidInput, "refusing to persist an unfitted model"),
        ));
    }
    if feature_columns.len() != model.n_features {
        return Err(persist_err(
            columns_path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "{} feature columns for a model trained on {} features",
                    feature_columns.len(),
                    model.n_features
                ),
            ),
        ));
    }

    let artifact = ModelArtifact {
        format_version: FORMAT_VERSION,
        feature_columns: feature_columns.to_vec(),
        target_column: TARGET_COLUMN.to_string(),
        forest: model.clone(),
    };

    let model_bytes = serde_json::to_vec(&artifact).map_err(|e| persist_err(model_path, e.into()))?;
    let column_bytes =
        serde_json::to_vec_pretty(feature_columns).map_err(|e| persist_err(columns_path, e.into()))?;

    // Stage both files before renaming either, so a bad destination leaves nothing behind.
    // The model goes last: it embeds the columns, so a stale model is caught on load
    let staged_model = stage(model_path, &model_bytes).map_err(|e| persist_err(model_path, e))?;
    let staged_columns = stage(columns_path, &column_bytes).map_err(|e| persist_err(columns_path, e))?;

    commit(staged_columns, columns_path).map_err(|e| persist_err(columns_path, e))?;
    commit(staged_model, model_path).map_err(|e| persist_err(model_path, e))?;

    log::info!(
        "saved model to {} and feature columns to {}",
        model_path.display(),
        columns_path.display()
    );

    Ok(())
}

/// Write `bytes` to a synced temporary file next to `path`
fn stage(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;

    Ok(file)
}

fn commit(file: NamedTempFile, path: &Path) -> io::Result<()> {
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

fn read_artifact(path: &Path) -> std::result::Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound);
    }

    Ok(std::fs::read_to_string(path)?)
}

fn load_model_inner(path: &Path) -> std::result::Result<ModelArtifact, LoadError> {
    let contents = read_artifact(path)?;

    let probe: VersionProbe = serde_json::from_str(&contents)?;
    if probe.format_version != FORMAT_VERSION {
        return Err(LoadError::VersionMismatch {
            expected: FORMAT_VERSION,
            found: probe.format_version,
        });
    }

    let artifact: ModelArtifact = serde_json::from_str(&contents)?;
    let forest = &artifact.forest;

    if !forest.is_fitted() {
        return Err(LoadError::Unfitted);
    }
    if forest.n_features != artifact.feature_columns.len() {
        return Err(LoadError::Malformed(format!(
            "forest uses {} features but lists {} columns",
            forest.n_features,
            artifact.feature_columns.len()
        )));
    }
    if let Some(idx) = forest
        .trees()
        .iter()
        .position(|tree| !tree.is_well_formed(forest.n_features))
    {
        return Err(LoadError::Malformed(format!("tree {} is inconsistent", idx)));
    }

    Ok(artifact)
}

pub fn load_model(path: &Path) -> Result<ModelArtifact> {
    load_model_inner(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_feature_columns(path: &Path) -> Result<Vec<String>> {
    let load = || -> std::result::Result<Vec<String>, LoadError> {
        Ok(serde_json::from_str(&read_artifact(path)?)?)
    };

    load().map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the model and check it against the standalone column list
pub fn load(model_path: &Path, columns_path: &Path) -> Result<ModelArtifact> {
    let artifact = load_model(model_path)?;
    let columns = load_feature_columns(columns_path)?;

    if columns != artifact.feature_columns {
        return Err(Error::Load {
            path: columns_path.to_path_buf(),
            source: LoadError::ColumnMismatch {
                model: artifact.feature_columns,
                columns,
            },
        });
    }

    log::info!(
        "loaded model with {} trees from {}",
        artifact.forest.trees().len(),
        model_path.display()
    );

    Ok(artifact)
}
