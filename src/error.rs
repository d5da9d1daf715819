use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load dataset {path}: {source}")]
    DatasetLoad {
        path: PathBuf,
        #[source]
        source: DatasetLoadError,
    },

    #[error("training failed: {0}")]
    Training(#[from] TrainingError),

    #[error("failed to persist artifact to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load artifact {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("invalid feature vector: {0}")]
    PredictionShape(#[from] PredictionShapeError),
}

#[derive(Error, Debug)]
pub enum DatasetLoadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("dataset contains no records")]
    Empty,
}

#[derive(Error, Debug, PartialEq)]
pub enum TrainingError {
    #[error("test fraction must lie strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),

    #[error("degenerate partition: {train} training and {test} test records")]
    DegeneratePartition { train: usize, test: usize },

    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("invalid hyperparameter '{name}': {reason}")]
    InvalidHyperparameter { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file does not exist")]
    NotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("not a valid artifact: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("unsupported format version {found}, expected {expected}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("feature columns {columns:?} do not match the model's {model:?}")]
    ColumnMismatch {
        model: Vec<String>,
        columns: Vec<String>,
    },

    #[error("model was never fitted")]
    Unfitted,

    #[error("malformed model: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum PredictionShapeError {
    #[error("expected {expected} values, got {got}")]
    Length { expected: usize, got: usize },

    #[error("model expects unknown feature column '{0}'")]
    UnknownColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = Error::from(TrainingError::DegeneratePartition { train: 0, test: 3 });
        assert_eq!(
            err.to_string(),
            "training failed: degenerate partition: 0 training and 3 test records"
        );

        let err = Error::from(PredictionShapeError::Length {
            expected: 4,
            got: 3,
        });
        assert_eq!(err.to_string(), "invalid feature vector: expected 4 values, got 3");
    }

    #[test]
    fn test_load_error_keeps_path() {
        let err = Error::Load {
            path: PathBuf::from("missing/model.json"),
            source: LoadError::NotFound,
        };
        assert_eq!(
            err.to_string(),
            "failed to load artifact missing/model.json: file does not exist"
        );
    }
}
