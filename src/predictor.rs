use ndarray::ArrayView1;
use std::path::PathBuf;

use crate::artifact::{self, ModelArtifact};
use crate::error::{PredictionShapeError, Result};
use crate::parsing::FEATURE_COLUMNS;

/// Where the persisted artifacts live
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub model_path: PathBuf,
    pub columns_path: PathBuf,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            model_path: PathBuf::from("model.json"),
            columns_path: PathBuf::from("feature_columns.json"),
        }
    }
}

/// One student's inputs, addressed by name rather than position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub study_hours: f64,
    pub attendance: f64,
    pub midterm: f64,
    pub homework: f64,
}

/// Ranges the input form offered. Values outside are accepted but logged
const EXPECTED_RANGES: [(f64, f64); 4] = [(5.0, 30.0), (0.5, 1.0), (0.0, 100.0), (0.6, 1.0)];

impl FeatureVector {
    pub fn to_array(&self) -> [f64; 4] {
        [self.study_hours, self.attendance, self.midterm, self.homework]
    }

    pub fn value_of(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.to_array()[idx])
    }

    /// Names of the features whose values fall outside the usual input ranges
    pub fn out_of_range(&self) -> Vec<&'static str> {
        self.to_array()
            .iter()
            .zip(EXPECTED_RANGES.iter())
            .zip(FEATURE_COLUMNS.iter())
            .filter(|((value, (lo, hi)), _)| !(*value >= lo && *value <= hi))
            .map(|(_, column)| *column)
            .collect()
    }
}

/// Predicts final scores from a persisted model
pub struct Predictor {
    artifact: ModelArtifact,
}

impl Predictor {
    /// Load the model. There is no fallback: any problem with the artifacts is an error
    pub fn load(config: &PredictorConfig) -> Result<Predictor> {
        let artifact = artifact::load(&config.model_path, &config.columns_path)?;

        Ok(Predictor { artifact })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Predictor {
        Predictor { artifact }
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.artifact.feature_columns
    }

    /// Predict from values in the model's column order
    pub fn predict(&self, values: &[f64]) -> Result<f64> {
        let expected = self.artifact.feature_columns.len();
        if values.len() != expected {
            return Err(PredictionShapeError::Length {
                expected,
                got: values.len(),
            }
            .into());
        }

        Ok(self.artifact.forest.predict_row(&ArrayView1::from(values)))
    }

    /// Predict for one student. Values are matched to the model's columns by name
    pub fn predict_one(&self, vector: &FeatureVector) -> Result<f64> {
        for column in vector.out_of_range() {
            log::warn!(
                "{} = {} is outside the range seen by the input form",
                column,
                vector.value_of(column).unwrap_or(f64::NAN)
            );
        }

        let values = self
            .artifact
            .feature_columns
            .iter()
            .map(|column| {
                vector
                    .value_of(column)
                    .ok_or_else(|| PredictionShapeError::UnknownColumn(column.clone()))
            })
            .collect::<std::result::Result<Vec<f64>, _>>()?;

        self.predict(&values)
    }
}
