use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{Result, TrainingError};

pub mod students;

/// Feature columns, in the order the model consumes them
pub const FEATURE_COLUMNS: [&str; 4] = ["每周学习时长（小时）", "上课出勤率", "期中考试分数", "作业完成率"];
pub const TARGET_COLUMN: &str = "期末考试分数";
pub const MAJOR_COLUMN: &str = "专业";
pub const GENDER_COLUMN: &str = "性别";

/// One row of the student dataset
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub study_hours: f64,
    pub attendance: f64,
    pub midterm: f64,
    pub homework: f64,
    pub final_score: f64,
    pub major: Option<String>,
    pub gender: Option<String>,
}

impl StudentRecord {
    /// The feature values in `FEATURE_COLUMNS` order
    pub fn features(&self) -> [f64; 4] {
        [self.study_hours, self.attendance, self.midterm, self.homework]
    }
}

pub struct Dataset {
    pub data: Array2<f64>,
    pub target: Array1<f64>,
}

impl Dataset {
    pub fn from_records(records: &[StudentRecord]) -> Dataset {
        let mut data = Array2::zeros((records.len(), FEATURE_COLUMNS.len()));
        let mut target = Array1::zeros(records.len());

        for (i, record) in records.iter().enumerate() {
            for (j, value) in record.features().into_iter().enumerate() {
                data[[i, j]] = value;
            }
            target[i] = record.final_score;
        }

        Dataset { data, target }
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Rows at the given indices, in that order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            data: self.data.select(Axis(0), indices),
            target: self.target.select(Axis(0), indices),
        }
    }

    /// Shuffle the row indices with a seeded RNG and cut them into
    /// (train, test). The test side gets `ceil(test_fraction * n)` rows.
    pub fn split_indices(&self, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
        if !(test_fraction > 0f64 && test_fraction < 1f64) {
            return Err(TrainingError::InvalidTestFraction(test_fraction).into());
        }

        let n = self.len();
        let n_test = (test_fraction * n as f64).ceil() as usize;
        let n_train = n.saturating_sub(n_test);

        if n_train == 0 || n_test == 0 {
            return Err(TrainingError::DegeneratePartition {
                train: n_train,
                test: n_test,
            }
            .into());
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test);

        Ok((train, indices))
    }

    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        let (train, test) = self.split_indices(test_fraction, seed)?;

        Ok((self.select(&train), self.select(&test)))
    }
}
