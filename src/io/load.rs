//! CSV load-profile import.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::profile::{LoadSample, LoadSeries, QualityWarning};

/// Datetime layouts accepted in the `timestamp` column, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Fatal import error: the file itself is unusable.
///
/// Row-level problems are never fatal; they become [`QualityWarning`]s on
/// the returned series instead.
#[derive(Debug)]
pub struct LoadError {
    pub message: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load profile error: {}", self.message)
    }
}

impl std::error::Error for LoadError {}

/// Reads a load profile from a CSV file at `path`.
///
/// # Errors
///
/// Returns a [`LoadError`] if the file cannot be opened, has no usable
/// header, or contains no parseable samples.
pub fn read_load_csv(path: &Path) -> Result<LoadSeries, LoadError> {
    let file = File::open(path).map_err(|e| LoadError {
        message: format!("cannot open \"{}\": {e}", path.display()),
    })?;
    from_reader(file)
}

/// Parses a load profile from any reader.
///
/// Requires `timestamp` and `load` columns (case-insensitive, extra
/// columns ignored). Rows with an unparseable timestamp are skipped with
/// a warning; an unparseable or non-finite load value is substituted with
/// 0 kW and warned, so one bad row never aborts an import.
///
/// # Errors
///
/// Returns a [`LoadError`] if the header is missing either required
/// column or no rows survive parsing.
pub fn from_reader(reader: impl Read) -> Result<LoadSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| LoadError {
        message: format!("cannot read CSV header: {e}"),
    })?;
    let ts_col = find_column(headers, "timestamp").ok_or_else(|| LoadError {
        message: "missing required column \"timestamp\"".into(),
    })?;
    let load_col = find_column(headers, "load").ok_or_else(|| LoadError {
        message: "missing required column \"load\"".into(),
    })?;

    let mut samples = Vec::new();
    let mut warnings = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let row = i + 2; // 1-based, counting the header line
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warnings.push(QualityWarning {
                    message: format!("row {row}: malformed record skipped ({e})"),
                });
                continue;
            }
        };

        let Some(timestamp) = record.get(ts_col).and_then(parse_timestamp) else {
            warnings.push(QualityWarning {
                message: format!("row {row}: unparseable timestamp, row skipped"),
            });
            continue;
        };

        let load_kw = match record.get(load_col).map(str::parse::<f64>) {
            Some(Ok(v)) if v.is_finite() => v,
            _ => {
                warnings.push(QualityWarning {
                    message: format!("row {row}: non-numeric load, substituted 0 kW"),
                });
                0.0
            }
        };

        samples.push(LoadSample { timestamp, load_kw });
    }

    if samples.is_empty() {
        return Err(LoadError {
            message: "no parseable samples in input".into(),
        });
    }

    Ok(LoadSeries::from_samples(samples, warnings))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
