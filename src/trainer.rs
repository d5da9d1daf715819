use std::path::PathBuf;

use crate::artifact;
use crate::error::Result;
use crate::metrics::{mean_squared_error, r2_score};
use crate::model::forest::{ForestParams, RandomForest};
use crate::model::Model;
use crate::parsing::{students, Dataset, FEATURE_COLUMNS};

/// Everything a training run needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub columns_path: PathBuf,
    /// Share of the records held out for evaluation, in (0, 1)
    pub test_fraction: f64,
    /// Seeds both the partition and the forest
    pub seed: u64,
    pub forest: ForestParams,
}

impl TrainerConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> TrainerConfig {
        TrainerConfig {
            data_path: data_path.into(),
            model_path: PathBuf::from("model.json"),
            columns_path: PathBuf::from("feature_columns.json"),
            test_fraction: 0.2,
            seed: 42,
            forest: ForestParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub mse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub evaluation: Evaluation,
}

pub fn feature_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Fit a forest on the training partition
pub fn fit(train: &Dataset, params: ForestParams, seed: u64) -> Result<RandomForest> {
    let mut forest = RandomForest::new(params, seed);
    forest.fit(train)?;

    Ok(forest)
}

/// MSE and R² of the model on a held-out partition
pub fn evaluate(model: &impl Model, test: &Dataset) -> Evaluation {
    let predictions = model.predict(&test.data.view());

    Evaluation {
        mse: mean_squared_error(&test.target.view(), &predictions.view()),
        r2: r2_score(&test.target.view(), &predictions.view()),
    }
}

pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Trainer {
        Trainer { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Load, split, fit, evaluate and persist
    pub fn run(&self) -> Result<TrainingReport> {
        let config = &self.config;

        let dataset = students::parse_dataset(&config.data_path)?;
        let (train, test) = dataset.split(config.test_fraction, config.seed)?;
        log::info!(
            "split {} records into {} train / {} test (seed {})",
            dataset.len(),
            train.len(),
            test.len(),
            config.seed
        );

        let forest = fit(&train, config.forest, config.seed)?;
        log::info!("fitted {} trees", forest.trees().len());

        let evaluation = evaluate(&forest, &test);
        log::info!("test mse {:.4}, r2 {:.4}", evaluation.mse, evaluation.r2);

        artifact::persist(
            &forest,
            &feature_columns(),
            &config.model_path,
            &config.columns_path,
        )?;

        Ok(TrainingReport {
            n_train: train.len(),
            n_test: test.len(),
            evaluation,
        })
    }
}
