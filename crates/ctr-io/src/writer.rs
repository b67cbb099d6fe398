//! CSV dataset writer and JSON result artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use ctr_forest::RankedFeature;
use ctr_model::Evaluation;
use ctr_synth::analytics::{
    self, CORRELATION_COLUMNS, Category, CategoryRate, DailyRate, DatasetSummary,
};
use ctr_synth::Dataset;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{CSV_HEADER, ExperimentName, TIMESTAMP_FORMAT};

/// Writes a dataset as CSV in the layout [`InteractionReader`](crate::InteractionReader) reads.
pub struct DatasetWriter {
    path: PathBuf,
}

impl DatasetWriter {
    /// Create a writer for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Write every record in order, booleans as `0`/`1`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::CsvWrite`] if the file cannot be created or written.
    #[instrument(skip_all, fields(path = %self.path.display(), n_samples = dataset.len()))]
    pub fn write(&self, dataset: &Dataset) -> Result<(), IoError> {
        let csv_error = |source| IoError::CsvWrite {
            path: self.path.clone(),
            source,
        };
        let mut wtr = csv::Writer::from_path(&self.path).map_err(csv_error)?;
        wtr.write_record(CSV_HEADER).map_err(csv_error)?;
        for record in dataset {
            let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
            let time_on_screen = record.time_on_screen.to_string();
            let search_count = record.search_count.to_string();
            wtr.write_record([
                timestamp.as_str(),
                time_on_screen.as_str(),
                flag(record.exited_screen),
                search_count.as_str(),
                record.search_term.as_str(),
                record.device_type.as_str(),
                record.browser.as_str(),
                record.referrer.as_str(),
                flag(record.clicked),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        info!("dataset written");
        Ok(())
    }
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Writes model and analytics results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_report.json` and
/// `{experiment}_predictions.json`; [`dataset_path`](Self::dataset_path)
/// names the CSV that goes alongside them.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return `{output_dir}/{experiment}_dataset.csv` without writing anything.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.artifact_path("dataset.csv")
    }

    /// Write the held-out evaluation, importance table, and dataset
    /// analytics to `{experiment}_report.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] if the file
    /// cannot be produced.
    #[instrument(skip_all)]
    pub fn write_report(
        &self,
        dataset: &Dataset,
        evaluation: &Evaluation,
        feature_importance: &[RankedFeature],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("report.json");

        let artifact = ReportArtifact {
            experiment: self.experiment.as_str(),
            accuracy: evaluation.accuracy,
            evaluation,
            feature_importance,
            analytics: AnalyticsEntry {
                summary: analytics::summary(dataset),
                click_rate_by_search_term: analytics::click_rate_by(dataset, Category::SearchTerm),
                click_rate_by_device_type: analytics::click_rate_by(dataset, Category::DeviceType),
                click_rate_by_browser: analytics::click_rate_by(dataset, Category::Browser),
                click_rate_by_referrer: analytics::click_rate_by(dataset, Category::Referrer),
                daily_click_rate: analytics::daily_click_rate(dataset),
                search_frequency: analytics::search_frequency(dataset)
                    .into_iter()
                    .map(|(term, count)| TermCount { term, count })
                    .collect(),
                correlation: CorrelationEntry {
                    columns: CORRELATION_COLUMNS,
                    matrix: analytics::correlation_matrix(dataset),
                },
            },
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }

    /// Write per-row click probabilities to `{experiment}_predictions.json`.
    ///
    /// `probabilities[i]` belongs to the `i`-th record of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] if the file
    /// cannot be produced.
    #[instrument(skip_all, fields(n_rows = probabilities.len()))]
    pub fn write_predictions(
        &self,
        dataset: &Dataset,
        probabilities: &[f64],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predictions.json");

        let predictions: Vec<PredictionEntry> = dataset
            .iter()
            .zip(probabilities)
            .enumerate()
            .map(|(row, (record, &probability))| PredictionEntry {
                row,
                timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                search_term: record.search_term.as_str(),
                device_type: record.device_type.as_str(),
                clicked: record.clicked,
                probability,
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            mean_probability: if predictions.is_empty() {
                0.0
            } else {
                probabilities.iter().sum::<f64>() / probabilities.len() as f64
            },
            predictions,
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }
}

fn write_json(path: &Path, artifact: &impl Serialize) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct ReportArtifact<'a> {
    experiment: &'a str,
    accuracy: f64,
    evaluation: &'a Evaluation,
    feature_importance: &'a [RankedFeature],
    analytics: AnalyticsEntry,
}

#[derive(Serialize)]
struct AnalyticsEntry {
    summary: DatasetSummary,
    click_rate_by_search_term: Vec<CategoryRate>,
    click_rate_by_device_type: Vec<CategoryRate>,
    click_rate_by_browser: Vec<CategoryRate>,
    click_rate_by_referrer: Vec<CategoryRate>,
    daily_click_rate: Vec<DailyRate>,
    search_frequency: Vec<TermCount>,
    correlation: CorrelationEntry,
}

#[derive(Serialize)]
struct TermCount {
    term: String,
    count: usize,
}

#[derive(Serialize)]
struct CorrelationEntry {
    columns: [&'static str; 4],
    matrix: [[f64; 4]; 4],
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    mean_probability: f64,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row: usize,
    timestamp: String,
    search_term: &'a str,
    device_type: &'a str,
    clicked: bool,
    probability: f64,
}
