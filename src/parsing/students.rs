use super::{Dataset, StudentRecord, FEATURE_COLUMNS, GENDER_COLUMN, MAJOR_COLUMN, TARGET_COLUMN};
use crate::error::{DatasetLoadError, Error, Result};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

/// Column positions resolved once from the header row
struct Schema {
    features: [usize; 4],
    target: usize,
    major: Option<usize>,
    gender: Option<usize>,
}

impl Schema {
    fn resolve(headers: &StringRecord) -> std::result::Result<Schema, DatasetLoadError> {
        // Spreadsheet exports tend to prefix the first header with a BOM
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        let find = |column: &str| names.iter().position(|name| *name == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| DatasetLoadError::MissingColumn(column.to_string()))
        };

        Ok(Schema {
            features: [
                require(FEATURE_COLUMNS[0])?,
                require(FEATURE_COLUMNS[1])?,
                require(FEATURE_COLUMNS[2])?,
                require(FEATURE_COLUMNS[3])?,
            ],
            target: require(TARGET_COLUMN)?,
            major: find(MAJOR_COLUMN),
            gender: find(GENDER_COLUMN),
        })
    }

    fn parse(&self, row: &StringRecord) -> std::result::Result<StudentRecord, DatasetLoadError> {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let number = |idx: usize, column: &str| {
            let raw = row.get(idx).unwrap_or("").trim();
            // NaN and infinities parse as f64 but stand for missing data
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(DatasetLoadError::InvalidValue {
                    line,
                    column: column.to_string(),
                    value: raw.to_string(),
                }),
            }
        };
        let text = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Ok(StudentRecord {
            study_hours: number(self.features[0], FEATURE_COLUMNS[0])?,
            attendance: number(self.features[1], FEATURE_COLUMNS[1])?,
            midterm: number(self.features[2], FEATURE_COLUMNS[2])?,
            homework: number(self.features[3], FEATURE_COLUMNS[3])?,
            final_score: number(self.target, TARGET_COLUMN)?,
            major: text(self.major),
            gender: text(self.gender),
        })
    }
}

/// Read student records from any CSV source with a header row.
/// Columns are matched by name, so their order in the file does not matter.
pub fn read_records<R: Read>(source: R) -> std::result::Result<Vec<StudentRecord>, DatasetLoadError> {
    let mut reader = csv::Reader::from_reader(source);
    let schema = Schema::resolve(reader.headers()?)?;
    let mut records = vec![];

    for row in reader.records() {
        records.push(schema.parse(&row?)?);
    }

    if records.is_empty() {
        return Err(DatasetLoadError::Empty);
    }

    Ok(records)
}

pub fn parse_records(path: &Path) -> Result<Vec<StudentRecord>> {
    let wrap = |source: DatasetLoadError| Error::DatasetLoad {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|e| wrap(csv::Error::from(e).into()))?;
    let records = read_records(file).map_err(wrap)?;

    log::info!("loaded {} records from {}", records.len(), path.display());

    Ok(records)
}

// Return matrix that represents the dataset
pub fn parse_dataset(path: &Path) -> Result<Dataset> {
    Ok(Dataset::from_records(&parse_records(path)?))
}
