//! CSV interaction dataset reader with full input validation.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::StringRecord;
use ctr_synth::{Browser, Dataset, DeviceType, InteractionRecord, ParseCategoryError, Referrer};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{CSV_HEADER, TIMESTAMP_FORMAT};

/// Reads an interaction dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row exactly [`CSV_HEADER`]
/// - `timestamp` as `YYYY-MM-DD HH:MM:SS` (UTC)
/// - `exited_screen` and `clicked` as `0`/`1` or `false`/`true`
/// - categorical cells in lowercase, as written by [`DatasetWriter`](crate::DatasetWriter)
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::HeaderMismatch`] | Header is not [`CSV_HEADER`] |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidValue`] | Unparseable cell, or negative/non-finite time on screen |
/// | [`IoError::UnknownCategory`] | Unknown device, browser, or referrer |
pub struct InteractionReader {
    path: PathBuf,
}

impl InteractionReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`] in file order.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // Row lengths are checked below so short rows get a precise error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        if header.iter().ne(CSV_HEADER) {
            return Err(IoError::HeaderMismatch {
                path: self.path.clone(),
                expected: CSV_HEADER.join(","),
                got: header.iter().collect::<Vec<_>>().join(","),
            });
        }
        debug!("header validated");

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| self.csv_error(e))?;
            if row.len() != CSV_HEADER.len() {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: CSV_HEADER.len(),
                    got: row.len(),
                });
            }
            records.push(self.parse_row(row_index, &row)?);
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_samples = records.len(), "dataset loaded");
        Ok(Dataset::new(records))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn invalid(&self, row_index: usize, column: &'static str, raw: &str) -> IoError {
        IoError::InvalidValue {
            path: self.path.clone(),
            row_index,
            column,
            raw: raw.to_string(),
        }
    }

    fn category<T>(&self, row_index: usize, raw: &str) -> Result<T, IoError>
    where
        T: FromStr<Err = ParseCategoryError>,
    {
        raw.parse().map_err(|source| IoError::UnknownCategory {
            path: self.path.clone(),
            row_index,
            source,
        })
    }

    fn flag(&self, row_index: usize, column: &'static str, raw: &str) -> Result<bool, IoError> {
        match raw {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(self.invalid(row_index, column, raw)),
        }
    }

    fn parse_row(&self, row_index: usize, row: &StringRecord) -> Result<InteractionRecord, IoError> {
        // Length was checked by the caller.
        let cell = |i: usize| row.get(i).unwrap_or("");

        let timestamp = NaiveDateTime::parse_from_str(cell(0), TIMESTAMP_FORMAT)
            .map_err(|_| self.invalid(row_index, "timestamp", cell(0)))?
            .and_utc();

        let time_on_screen: f64 = cell(1)
            .parse()
            .map_err(|_| self.invalid(row_index, "time_on_screen", cell(1)))?;
        if !time_on_screen.is_finite() || time_on_screen < 0.0 {
            return Err(self.invalid(row_index, "time_on_screen", cell(1)));
        }

        let search_count: u32 = cell(3)
            .parse()
            .map_err(|_| self.invalid(row_index, "search_count", cell(3)))?;

        let search_term = cell(4);
        if search_term.is_empty() {
            return Err(self.invalid(row_index, "search_term", search_term));
        }

        Ok(InteractionRecord {
            timestamp,
            time_on_screen,
            exited_screen: self.flag(row_index, "exited_screen", cell(2))?,
            search_count,
            search_term: search_term.to_string(),
            device_type: self.category::<DeviceType>(row_index, cell(5))?,
            browser: self.category::<Browser>(row_index, cell(6))?,
            referrer: self.category::<Referrer>(row_index, cell(7))?,
            clicked: self.flag(row_index, "clicked", cell(8))?,
        })
    }
}
