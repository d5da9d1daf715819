//! Deterministic fixtures shared by the unit tests.

use crate::parsing::{StudentRecord, FEATURE_COLUMNS, GENDER_COLUMN, MAJOR_COLUMN, TARGET_COLUMN};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAJORS: [&str; 3] = ["大数据管理", "会计学", "计算机科学"];

/// Students whose final score is a fixed function of the features plus a
/// small periodic offset, so every run sees the same data.
pub fn synthetic_records(n: usize) -> Vec<StudentRecord> {
    (0..n)
        .map(|i| {
            let study_hours = 5f64 + (i * 7 % 26) as f64;
            let attendance = 0.5 + (i * 3 % 11) as f64 * 0.05;
            let midterm = 40f64 + (i * 13 % 61) as f64;
            let homework = 0.6 + (i * 5 % 9) as f64 * 0.05;
            let final_score = 0.6 * midterm
                + 15f64 * homework
                + 10f64 * attendance
                + 0.4 * study_hours
                + ((i % 5) as f64 - 2f64);

            StudentRecord {
                study_hours,
                attendance,
                midterm,
                homework,
                final_score,
                major: Some(MAJORS[i % MAJORS.len()].to_string()),
                gender: Some(if i % 2 == 0 { "男" } else { "女" }.to_string()),
            }
        })
        .collect()
}

/// Write records as a CSV file with the dataset's header row
pub fn write_csv(dir: &Path, records: &[StudentRecord]) -> PathBuf {
    let path = dir.join("students.csv");
    let mut file = std::fs::File::create(&path).unwrap();

    writeln!(
        file,
        "{},{},{},{},{},{},{}",
        GENDER_COLUMN,
        MAJOR_COLUMN,
        FEATURE_COLUMNS[0],
        FEATURE_COLUMNS[1],
        FEATURE_COLUMNS[2],
        FEATURE_COLUMNS[3],
        TARGET_COLUMN
    )
    .unwrap();

    for r in records {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            r.gender.as_deref().unwrap_or(""),
            r.major.as_deref().unwrap_or(""),
            r.study_hours,
            r.attendance,
            r.midterm,
            r.homework,
            r.final_score
        )
        .unwrap();
    }

    path
}
