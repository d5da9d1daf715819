pub mod artifact;
pub mod error;
pub mod metrics;
pub mod model;
pub mod parsing;
pub mod predictor;
pub mod stats;
pub mod trainer;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use clap::{Parser, Subcommand};
use json::object;
use model::forest::ForestParams;
use parsing::students;
use predictor::{FeatureVector, Predictor, PredictorConfig};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use trainer::{Trainer, TrainerConfig, TrainingReport};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a random forest on the dataset and save it
    Train {
        /// The path of the student dataset (CSV)
        #[arg(short, long)]
        data_path: PathBuf,

        /// Where to write the model
        #[arg(short, long, default_value = "model.json")]
        model_path: PathBuf,

        /// Where to write the feature column list
        #[arg(short, long, default_value = "feature_columns.json")]
        columns_path: PathBuf,

        /// Share of the records held out for evaluation
        #[arg(short, long, default_value_t = 0.2)]
        test_fraction: f64,

        /// Seed for the partition and the forest
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Number of trees in the forest
        #[arg(short, long, default_value_t = 100)]
        num_trees: usize,

        /// Maximum depth of each tree. Unlimited if not provided
        #[arg(long, default_value = None)]
        max_depth: Option<usize>,

        /// Minimum number of samples needed to split a node
        #[arg(long, default_value_t = 2)]
        min_samples_split: usize,

        /// Features considered per split. All of them if not provided
        #[arg(long, default_value = None)]
        max_features: Option<usize>,

        /// Whether or not to export the evaluation results
        /// They are exported in JSON format
        #[arg(short, long, default_value = None)]
        report_path: Option<PathBuf>,
    },

    /// Predict a student's final exam score
    Predict {
        #[arg(short, long, default_value = "model.json")]
        model_path: PathBuf,

        #[arg(short, long, default_value = "feature_columns.json")]
        columns_path: PathBuf,

        /// Weekly study hours
        #[arg(short, long)]
        study_hours: f64,

        /// Attendance rate, 0 to 1
        #[arg(short, long)]
        attendance: f64,

        /// Midterm exam score
        #[arg(long)]
        midterm: f64,

        /// Homework completion rate, 0 to 1
        #[arg(long)]
        homework: f64,
    },

    /// Print per-major statistics of the dataset
    Summary {
        /// The path of the student dataset (CSV)
        #[arg(short, long)]
        data_path: PathBuf,

        /// Major to report on in detail
        #[arg(short, long, default_value = "大数据管理")]
        major: String,

        /// Number of bins in the final score histogram
        #[arg(short, long, default_value_t = 10)]
        bins: usize,
    },
}

/// Write the evaluation results of a training run in JSON format
fn write_report(report_path: &Path, config: &TrainerConfig, report: &TrainingReport) -> std::io::Result<()> {
    let mut data = object! {};
    let mut file = File::create(report_path)?;

    data["mse"] = report.evaluation.mse.into();
    data["r2"] = report.evaluation.r2.into();
    data["n_train"] = report.n_train.into();
    data["n_test"] = report.n_test.into();
    data["seed"] = config.seed.into();
    data["n_estimators"] = config.forest.n_estimators.into();
    data["feature_columns"] = trainer::feature_columns().into();

    file.write_all(data.pretty(2).as_bytes())?;

    Ok(())
}

fn train(config: TrainerConfig, report_path: Option<PathBuf>) -> anyhow::Result<()> {
    let trainer = Trainer::new(config);
    let report = trainer.run().context("training run failed")?;

    println!(
        "Training finished. MSE: {:.2}, R²: {:.2} ({} train / {} test records)",
        report.evaluation.mse, report.evaluation.r2, report.n_train, report.n_test
    );
    println!("Model saved to {}", trainer.config().model_path.display());

    if let Some(report_path) = report_path {
        write_report(&report_path, trainer.config(), &report)
            .with_context(|| format!("failed to write report {}", report_path.display()))?;
    }

    Ok(())
}

fn predict(config: PredictorConfig, vector: FeatureVector) -> anyhow::Result<()> {
    let predictor = Predictor::load(&config).context("failed to load the model")?;
    let score = predictor.predict_one(&vector)?;

    println!("Predicted final exam score: {:.1}", score);
    if score >= stats::PASS_MARK {
        println!("The prediction says this student will pass.");
    } else {
        println!("The prediction says this student needs to work harder.");
    }

    Ok(())
}

fn summary(data_path: &Path, major: &str, bins: usize) -> anyhow::Result<()> {
    let records = students::parse_records(data_path)?;

    println!(
        "{:<12} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "major", "count", "female%", "male%", "hours", "midterm", "final", "attendance"
    );
    for s in stats::summarize(&records) {
        let (female, male) = s.gender_ratio();
        println!(
            "{:<12} {:>6} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>9.1}%",
            s.major,
            s.count,
            female,
            male,
            s.mean_study_hours,
            s.mean_midterm,
            s.mean_final,
            s.mean_attendance * 100f64
        );
    }

    match stats::focus(&records, major, bins) {
        Some(report) => {
            println!();
            println!("{} ({} students)", report.major, report.count);
            println!("  attendance:  {:.1}%", report.mean_attendance * 100f64);
            println!("  final score: {:.1}", report.mean_final);
            println!("  pass rate:   {:.1}%", report.pass_rate * 100f64);
            println!("  study hours: {:.1}", report.mean_study_hours);

            let b = report.final_box;
            println!(
                "  final box:   min {:.1} | q1 {:.1} | median {:.1} | q3 {:.1} | max {:.1}",
                b.min, b.q1, b.median, b.q3, b.max
            );

            let h = &report.final_scores;
            for (i, count) in h.counts.iter().enumerate() {
                println!("  [{:>5.1}, {:>5.1}) {}", h.edges[i], h.edges[i + 1], "#".repeat(*count));
            }
        }
        None => log::warn!("no students found for major {}", major),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Train {
            data_path,
            model_path,
            columns_path,
            test_fraction,
            seed,
            num_trees,
            max_depth,
            min_samples_split,
            max_features,
            report_path,
        } => {
            let config = TrainerConfig {
                data_path,
                model_path,
                columns_path,
                test_fraction,
                seed,
                forest: ForestParams {
                    n_estimators: num_trees,
                    max_depth,
                    min_samples_split,
                    max_features,
                },
            };

            train(config, report_path)
        }
        Command::Predict {
            model_path,
            columns_path,
            study_hours,
            attendance,
            midterm,
            homework,
        } => predict(
            PredictorConfig {
                model_path,
                columns_path,
            },
            FeatureVector {
                study_hours,
                attendance,
                midterm,
                homework,
            },
        ),
        Command::Summary {
            data_path,
            major,
            bins,
        } => summary(&data_path, &major, bins),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_train_defaults() {
        let args = Args::parse_from(["rust_gradeforest", "train", "--data-path", "students.csv"]);

        match args.command {
            Command::Train {
                test_fraction,
                seed,
                num_trees,
                max_depth,
                model_path,
                ..
            } => {
                assert_eq!(test_fraction, 0.2);
                assert_eq!(seed, 42);
                assert_eq!(num_trees, 100);
                assert_eq!(max_depth, None);
                assert_eq!(model_path, PathBuf::from("model.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_report_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let config = TrainerConfig::new("students.csv");
        let report = TrainingReport {
            n_train: 8,
            n_test: 2,
            evaluation: trainer::Evaluation { mse: 1.5, r2: 0.25 },
        };

        write_report(&path, &config, &report).unwrap();
        let parsed = json::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(parsed["mse"].as_f64(), Some(1.5));
        assert_eq!(parsed["n_test"].as_usize(), Some(2));
        assert_eq!(parsed["feature_columns"].len(), 4);
    }
}
