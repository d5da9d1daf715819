//! Aggregate statistics over the raw student records.

use std::collections::BTreeMap;

use crate::parsing::StudentRecord;

pub const PASS_MARK: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MajorSummary {
    pub major: String,
    pub count: usize,
    pub female: usize,
    pub male: usize,
    pub mean_study_hours: f64,
    pub mean_midterm: f64,
    pub mean_final: f64,
    pub mean_attendance: f64,
}

impl MajorSummary {
    /// Female and male share in percent. Students with no recorded gender are left out
    pub fn gender_ratio(&self) -> (f64, f64) {
        let known = (self.female + self.male) as f64;
        if known == 0f64 {
            return (0f64, 0f64);
        }

        (
            self.female as f64 / known * 100f64,
            self.male as f64 / known * 100f64,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `edges.len() == counts.len() + 1`
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Five-number summary behind a box plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusReport {
    pub major: String,
    pub count: usize,
    pub mean_attendance: f64,
    pub mean_final: f64,
    pub pass_rate: f64,
    pub mean_study_hours: f64,
    pub final_scores: Histogram,
    pub final_box: BoxSummary,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0f64, 0usize), |(s, n), v| (s + v, n + 1));

    sum / n as f64
}

/// Per-major aggregates, sorted by major. Records without a major are skipped
pub fn summarize(records: &[StudentRecord]) -> Vec<MajorSummary> {
    let mut groups: BTreeMap<&str, Vec<&StudentRecord>> = BTreeMap::new();

    for record in records {
        if let Some(major) = record.major.as_deref() {
            groups.entry(major).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(major, group)| MajorSummary {
            major: major.to_string(),
            count: group.len(),
            female: group.iter().filter(|r| r.gender.as_deref() == Some("女")).count(),
            male: group.iter().filter(|r| r.gender.as_deref() == Some("男")).count(),
            mean_study_hours: mean(group.iter().map(|r| r.study_hours)),
            mean_midterm: mean(group.iter().map(|r| r.midterm)),
            mean_final: mean(group.iter().map(|r| r.final_score)),
            mean_attendance: mean(group.iter().map(|r| r.attendance)),
        })
        .collect()
}

/// Equal-width bins between the min and max value; the last bin is closed on the right
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() || bins == 0 {
        return Histogram {
            edges: vec![],
            counts: vec![],
        };
    }

    let mut lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];

    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram { edges, counts }
}

/// Quantile `q` of sorted values, interpolating linearly between neighbours
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;

    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn five_number_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Some(BoxSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Detailed report on one major, or `None` when nobody studies it
pub fn focus(records: &[StudentRecord], major: &str, bins: usize) -> Option<FocusReport> {
    let group: Vec<&StudentRecord> = records
        .iter()
        .filter(|r| r.major.as_deref() == Some(major))
        .collect();

    if group.is_empty() {
        return None;
    }

    let finals: Vec<f64> = group.iter().map(|r| r.final_score).collect();
    let final_box = five_number_summary(&finals)?;
    let passed = finals.iter().filter(|score| **score >= PASS_MARK).count();

    Some(FocusReport {
        major: major.to_string(),
        count: group.len(),
        mean_attendance: mean(group.iter().map(|r| r.attendance)),
        mean_final: mean(finals.iter().cloned()),
        pass_rate: passed as f64 / group.len() as f64,
        mean_study_hours: mean(group.iter().map(|r| r.study_hours)),
        final_scores: histogram(&finals, bins),
        final_box,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(major: Option<&str>, gender: &str, final_score: f64) -> StudentRecord {
        StudentRecord {
            study_hours: 10.0,
            attendance: 0.8,
            midterm: 70.0,
            homework: 0.9,
            final_score,
            major: major.map(String::from),
            gender: Some(gender.to_string()),
        }
    }

    #[test]
    fn test_summaries_are_grouped_and_sorted() {
        let records = vec![
            student(Some("会计学"), "女", 80.0),
            student(Some("大数据管理"), "男", 50.0),
            student(Some("会计学"), "男", 70.0),
            student(None, "男", 10.0),
            student(Some("会计学"), "女", 60.0),
        ];
        let summaries = summarize(&records);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].major, "会计学");
        assert_eq!(summaries[0].count, 3);
        assert_eq!((summaries[0].female, summaries[0].male), (2, 1));
        assert_eq!(summaries[0].mean_final, 70.0);
        assert_eq!(summaries[1].major, "大数据管理");
        assert_eq!(summaries[1].gender_ratio(), (0.0, 100.0));
    }

    #[test]
    fn test_gender_ratio() {
        let records = vec![
            student(Some("会计学"), "女", 80.0),
            student(Some("会计学"), "男", 80.0),
            student(Some("会计学"), "男", 80.0),
            student(Some("会计学"), "男", 80.0),
        ];

        assert_eq!(summarize(&records)[0].gender_ratio(), (25.0, 75.0));
    }

    #[test]
    fn test_histogram_bins() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5);

        assert_eq!(h.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(h.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(histogram(&[], 10).counts, Vec::<usize>::new());
    }

    #[test]
    fn test_histogram_of_identical_values() {
        let h = histogram(&[5.0, 5.0, 5.0], 2);

        assert_eq!(h.edges, vec![4.5, 5.0, 5.5]);
        assert_eq!(h.counts, vec![0, 3]);
    }

    #[test]
    fn test_five_number_summary() {
        let summary = five_number_summary(&[7.0, 1.0, 3.0, 5.0, 9.0, 2.0]).unwrap();

        assert_eq!(
            summary,
            BoxSummary {
                min: 1.0,
                q1: 2.25,
                median: 4.0,
                q3: 6.5,
                max: 9.0
            }
        );
        assert_eq!(five_number_summary(&[4.0]).unwrap().q3, 4.0);
        assert!(five_number_summary(&[]).is_none());
    }

    #[test]
    fn test_focus_report() {
        let records = vec![
            student(Some("大数据管理"), "女", 90.0),
            student(Some("大数据管理"), "男", 59.5),
            student(Some("大数据管理"), "男", 60.0),
            student(Some("会计学"), "女", 20.0),
        ];
        let report = focus(&records, "大数据管理", 10).unwrap();

        assert_eq!(report.count, 3);
        assert_eq!(report.pass_rate, 2.0 / 3.0);
        assert_eq!(report.final_scores.counts.iter().sum::<usize>(), 3);
        assert_eq!(report.final_box.median, 60.0);
        assert_eq!((report.final_box.min, report.final_box.max), (59.5, 90.0));
        assert!(focus(&records, "哲学", 10).is_none());
    }
}
