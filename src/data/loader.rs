//! CSV loading for sensor recordings
//!
//! Reads the raw export, merges the separate `Date` and `Time` columns into one
//! timestamp and drops every row that has a missing cell.

use super::types::{Observation, TARGET_NAME};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Cell contents treated as a missing value (the pandas default NA set)
const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Accepted layouts for `"<Date> <Time>"`
const TIMESTAMP_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

/// Errors that can occur while loading a recording
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: unrecognised timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
}

/// Result of loading a recording
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Complete observations, in file order
    pub observations: Vec<Observation>,
    /// Data rows read from the file (header excluded)
    pub rows_read: usize,
    /// Rows discarded because a cell was missing
    pub rows_dropped: usize,
}

/// Positions of the required columns in the header
struct ColumnIndex {
    date: usize,
    time: usize,
    temperature: usize,
    ecg: usize,
    pulse: usize,
    sleepscore: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(LoadError::MissingColumn(name))
        };

        Ok(Self {
            date: find("Date")?,
            time: find("Time")?,
            temperature: find("temperature")?,
            ecg: find("ecg")?,
            pulse: find("pulse")?,
            sleepscore: find(TARGET_NAME)?,
        })
    }
}

/// Load observations from a CSV file
pub fn load_observations<P: AsRef<Path>>(path: P) -> Result<LoadedData, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = read_observations(file)?;
    info!(
        "Loaded {} observations from {:?} ({} incomplete rows dropped)",
        loaded.observations.len(),
        path,
        loaded.rows_dropped
    );

    Ok(loaded)
}

/// Load observations from any CSV source
pub fn read_observations<R: Read>(reader: R) -> Result<LoadedData, LoadError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnIndex::from_headers(reader.headers()?)?;
    let n_columns = reader.headers()?.len();

    let mut observations = Vec::new();
    let mut rows_read = 0;
    let mut rows_dropped = 0;

    for result in reader.records() {
        let record = result?;
        rows_read += 1;

        // Short rows are missing their trailing cells
        if record.len() < n_columns || record.iter().any(is_missing) {
            rows_dropped += 1;
            continue;
        }

        match parse_record(&record, &columns, rows_read)? {
            Some(observation) => observations.push(observation),
            None => rows_dropped += 1,
        }
    }

    if rows_dropped > 0 {
        warn!("Dropped {} of {} rows with missing or non-finite values", rows_dropped, rows_read);
    }

    Ok(LoadedData {
        observations,
        rows_read,
        rows_dropped,
    })
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_TOKENS.contains(&cell)
}

/// Parse one complete row. `None` when a reading parses to NaN or infinity.
fn parse_record(
    record: &StringRecord,
    columns: &ColumnIndex,
    row: usize,
) -> Result<Option<Observation>, LoadError> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let number = |idx: usize, column: &'static str| {
        field(idx).parse::<f64>().map_err(|_| LoadError::InvalidValue {
            row,
            column,
            value: field(idx).to_string(),
        })
    };

    let stamp = format!("{} {}", field(columns.date), field(columns.time));
    let timestamp = parse_timestamp(&stamp).ok_or(LoadError::InvalidTimestamp { row, value: stamp })?;

    let observation = Observation {
        timestamp,
        temperature: number(columns.temperature, "temperature")?,
        ecg: number(columns.ecg, "ecg")?,
        pulse: number(columns.pulse, "pulse")?,
        sleepscore: number(columns.sleepscore, TARGET_NAME)?,
    };

    let finite = [
        observation.temperature,
        observation.ecg,
        observation.pulse,
        observation.sleepscore,
    ]
    .iter()
    .all(|v| v.is_finite());

    Ok(finite.then_some(observation))
}

/// Parse a combined `"<Date> <Time>"` string
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Date,Time,temperature,ecg,pulse,sleepscore\n";

    #[test]
    fn test_loads_complete_rows() {
        let csv = format!(
            "{}2024-01-01,22:00:00,36.5,0.8,72,80\n2024-01-01,22:01:00,36.6,0.7,71,81\n2024-01-01,22:02:00,36.4,0.9,70,79\n",
            HEADER
        );
        let loaded = read_observations(csv.as_bytes()).unwrap();

        assert_eq!(loaded.observations.len(), 3);
        assert_eq!(loaded.rows_read, 3);
        assert_eq!(loaded.rows_dropped, 0);
        assert_eq!(
            loaded.observations[1].timestamp,
            parse_timestamp("2024-01-01 22:01:00").unwrap()
        );
        assert_eq!(loaded.observations[2].pulse, 70.0);
    }

    #[test]
    fn test_drops_incomplete_rows() {
        let csv = format!(
            "{}2024-01-01,22:00:00,36.5,0.8,72,80\n2024-01-01,22:01:00,,0.7,71,81\n2024-01-01,22:02:00,36.4,NaN,70,79\n2024-01-01,22:03:00,36.4,0.9\n2024-01-01,22:04:00,36.3,0.9,69,78\n",
            HEADER
        );
        let loaded = read_observations(csv.as_bytes()).unwrap();

        assert_eq!(loaded.observations.len(), 2);
        assert_eq!(loaded.rows_dropped, 3);
        assert_eq!(loaded.observations[1].sleepscore, 78.0);
    }

    #[test]
    fn test_non_finite_readings_drop_row() {
        let csv = format!(
            "{}2024-01-01,22:00:00,36.5,0.8,72,80\n2024-01-01,22:01:00,36.5,-nan,72,80\n2024-01-01,22:02:00,36.5,NAN,72,80\n2024-01-01,22:03:00,36.5,0.7,72,80\n2024-01-01,22:04:00,36.5,inf,72,80\n2024-01-01,22:05:00,36.5,0.6,-Infinity,80\n",
            HEADER
        );
        let loaded = read_observations(csv.as_bytes()).unwrap();

        assert_eq!(loaded.rows_read, 6);
        assert_eq!(loaded.rows_dropped, 4);
        let ecgs: Vec<f64> = loaded.observations.iter().map(|o| o.ecg).collect();
        assert_eq!(ecgs, vec![0.8, 0.7]);
    }

    #[test]
    fn test_missing_tokens_drop_row() {
        let tokens = [
            "", " ", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
            "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
        ];

        for token in tokens {
            let csv = format!(
                "{}2024-01-01,22:00:00,36.5,{},72,80\n2024-01-01,22:01:00,36.5,0.8,72,80\n",
                HEADER, token
            );
            let loaded = read_observations(csv.as_bytes())
                .unwrap_or_else(|e| panic!("token {:?} failed: {}", token, e));

            assert_eq!(loaded.observations.len(), 1, "token {:?}", token);
            assert_eq!(loaded.rows_dropped, 1, "token {:?}", token);
        }
    }

    #[test]
    fn test_extra_column_gaps_drop_row() {
        let csv = "Date,Time,temperature,ecg,pulse,sleepscore,note\n\
                   2024-01-01,22:00:00,36.5,0.8,72,80,ok\n\
                   2024-01-01,22:01:00,36.5,0.8,72,80,\n";
        let loaded = read_observations(csv.as_bytes()).unwrap();

        assert_eq!(loaded.observations.len(), 1);
        assert_eq!(loaded.rows_dropped, 1);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "Date,Time,temp,ecg,pulse,sleepscore\n2024-01-01,22:00:00,36.5,0.8,72,80\n";
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("temperature")));
    }

    #[test]
    fn test_invalid_number_is_fatal() {
        let csv = format!("{}2024-01-01,22:00:00,warm,0.8,72,80\n", HEADER);
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 1, column: "temperature", .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_observations("/nonexistent/MediSync Data.csv").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}01/15/2024,07:30:00,36.9,0.5,65,90\n", HEADER).unwrap();

        let loaded = load_observations(file.path()).unwrap();
        assert_eq!(loaded.observations.len(), 1);
        assert_eq!(
            loaded.observations[0].timestamp,
            parse_timestamp("2024-01-15 07:30:00").unwrap()
        );
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01 10:15").is_some());
        assert!(parse_timestamp("2024-03-01 10:15:30.250").is_some());
        assert!(parse_timestamp("01.03.2024 10:15:30").is_some());
        assert!(parse_timestamp("yesterday noon").is_none());
    }
}
