use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::Model;
use crate::error::{Result, TrainingError};
use crate::parsing::Dataset;

/// Forest hyperparams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// Bagged ensemble of regression trees. The prediction is the mean over trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub seed: u64,
    pub n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams, seed: u64) -> RandomForest {
        RandomForest {
            params,
            seed,
            n_features: 0,
            trees: vec![],
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Prediction for a single feature row
    pub fn predict_row(&self, row: &ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();

        total / self.trees.len() as f64
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), TrainingError> {
        let invalid = |name, reason: &str| TrainingError::InvalidHyperparameter {
            name,
            reason: reason.to_string(),
        };

        if self.params.n_estimators == 0 {
            return Err(invalid("n_estimators", "must be at least 1"));
        }
        if self.params.min_samples_split < 2 {
            return Err(invalid("min_samples_split", "must be at least 2"));
        }
        if self.params.max_depth == Some(0) {
            return Err(invalid("max_depth", "must be at least 1"));
        }
        if let Some(max_features) = self.params.max_features {
            if max_features == 0 || max_features > n_features {
                return Err(invalid(
                    "max_features",
                    &format!("must lie between 1 and {}", n_features),
                ));
            }
        }

        Ok(())
    }
}

impl Model for RandomForest {
    /// Fit one tree per estimator, each on its own bootstrap sample.
    /// All randomness derives from `self.seed`
    fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyTrainingSet.into());
        }

        let n_features = dataset.data.ncols();
        self.validate(n_features)?;

        let n = dataset.len();
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            max_features: self.params.max_features,
        };
        let data = dataset.data.view();
        let target = dataset.target.view();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<RegressionTree> = (0..self.params.n_estimators)
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let rows = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();

                RegressionTree::grow(&data, &target, rows, tree_params, &mut tree_rng)
            })
            .collect();

        log::debug!(
            "grew {} trees on {} rows, deepest has depth {}",
            trees.len(),
            n,
            trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
        );

        self.n_features = n_features;
        self.trees = trees;

        Ok(())
    }

    fn predict(&self, inputs: &ArrayView2<f64>) -> Array1<f64> {
        inputs
            .axis_iter(Axis(0))
            .map(|row| self.predict_row(&row))
            .collect()
    }
}
