//! Dataset to numeric feature table, with fit-once categorical encoders.

use chrono::{Datelike, Timelike};
use ctr_synth::{Dataset, InteractionRecord};
use tracing::debug;

use crate::error::ModelError;

/// Column order of every [`FeatureTable`] row.
pub const FEATURE_NAMES: [&str; 9] = [
    "time_on_screen",
    "exited_screen",
    "search_count",
    "hour",
    "day_of_week",
    "search_term",
    "device_type",
    "browser",
    "referrer",
];

/// Categorical columns, in the order they appear in [`FEATURE_NAMES`].
pub const CATEGORICAL_COLUMNS: [&str; 4] = ["search_term", "device_type", "browser", "referrer"];

/// Value-to-code mapping for one categorical column.
///
/// Starts `Unfit`; the first [`FeatureEncoder::prepare`] fits it to the
/// sorted distinct values it sees, and later calls only apply it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryEncoder {
    #[default]
    Unfit,
    /// `classes` is sorted and deduplicated; a value's code is its index.
    Fit { classes: Vec<String> },
}

impl CategoryEncoder {
    fn fit<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = values.map(str::to_string).collect();
        classes.sort_unstable();
        classes.dedup();
        CategoryEncoder::Fit { classes }
    }

    /// Return `true` once the encoder has a vocabulary.
    #[must_use]
    pub fn is_fit(&self) -> bool {
        matches!(self, CategoryEncoder::Fit { .. })
    }

    /// The fitted vocabulary, if any.
    #[must_use]
    pub fn classes(&self) -> Option<&[String]> {
        match self {
            CategoryEncoder::Unfit => None,
            CategoryEncoder::Fit { classes } => Some(classes),
        }
    }

    /// Code of `value` within `column`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NotTrained`] | the encoder is `Unfit` |
    /// | [`ModelError::UnseenCategory`] | `value` is not in the vocabulary |
    pub fn encode(&self, column: &'static str, value: &str) -> Result<usize, ModelError> {
        let CategoryEncoder::Fit { classes } = self else {
            return Err(ModelError::NotTrained);
        };
        classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map_err(|_| ModelError::UnseenCategory {
                column,
                value: value.to_string(),
            })
    }
}

/// Numeric rows in [`FEATURE_NAMES`] order with their click labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl FeatureTable {
    /// Feature rows, one per record.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// `1` for clicked, `0` otherwise.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn categorical_value(record: &InteractionRecord, column: usize) -> &str {
    match column {
        0 => &record.search_term,
        1 => record.device_type.as_str(),
        2 => record.browser.as_str(),
        _ => record.referrer.as_str(),
    }
}

/// One [`CategoryEncoder`] per entry of [`CATEGORICAL_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureEncoder {
    encoders: [CategoryEncoder; 4],
}

impl FeatureEncoder {
    /// Create an encoder with every column unfit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoder of a categorical column, by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&CategoryEncoder> {
        CATEGORICAL_COLUMNS
            .iter()
            .position(|&c| c == name)
            .map(|i| &self.encoders[i])
    }

    /// Fit any unfit column on `dataset`, then encode it. An empty dataset
    /// fits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnseenCategory`] when an already fit column meets
    /// a value outside its vocabulary. Columns fit by this call stay fit even
    /// on error; callers that need atomicity encode on a clone.
    pub fn prepare(&mut self, dataset: &Dataset) -> Result<FeatureTable, ModelError> {
        for (i, encoder) in self.encoders.iter_mut().enumerate() {
            if !encoder.is_fit() && !dataset.is_empty() {
                *encoder = CategoryEncoder::fit(dataset.iter().map(|r| categorical_value(r, i)));
                debug!(
                    column = CATEGORICAL_COLUMNS[i],
                    n_classes = encoder.classes().map_or(0, <[String]>::len),
                    "category encoder fit"
                );
            }
        }
        self.transform(dataset)
    }

    /// Encode `dataset` with the existing vocabularies, never fitting.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NotTrained`] | a categorical column is still unfit |
    /// | [`ModelError::UnseenCategory`] | a value is outside its column's vocabulary |
    pub fn transform(&self, dataset: &Dataset) -> Result<FeatureTable, ModelError> {
        let mut rows = Vec::with_capacity(dataset.len());
        let mut labels = Vec::with_capacity(dataset.len());
        for record in dataset {
            let mut row = Vec::with_capacity(FEATURE_NAMES.len());
            row.push(record.time_on_screen);
            row.push(f64::from(u8::from(record.exited_screen)));
            row.push(f64::from(record.search_count));
            row.push(f64::from(record.timestamp.hour()));
            row.push(f64::from(record.timestamp.weekday().num_days_from_monday()));
            for (i, encoder) in self.encoders.iter().enumerate() {
                let code = encoder.encode(CATEGORICAL_COLUMNS[i], categorical_value(record, i))?;
                row.push(code as f64);
            }
            rows.push(row);
            labels.push(usize::from(record.clicked));
        }
        Ok(FeatureTable { rows, labels })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ctr_synth::{Browser, DeviceType, Referrer};

    use super::*;

    fn record(term: &str, device: DeviceType, clicked: bool) -> InteractionRecord {
        InteractionRecord {
            // A Wednesday.
            timestamp: Utc.with_ymd_and_hms(2024, 5, 15, 17, 30, 0).unwrap(),
            time_on_screen: 120.5,
            exited_screen: false,
            search_count: 3,
            search_term: term.to_string(),
            device_type: device,
            browser: Browser::Safari,
            referrer: Referrer::Email,
            clicked,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            record("laptop", DeviceType::Mobile, true),
            record("dress", DeviceType::Desktop, false),
            record("laptop", DeviceType::Mobile, false),
        ])
    }

    #[test]
    fn rows_follow_feature_order() {
        let table = FeatureEncoder::new().prepare(&dataset()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.labels(), &[1, 0, 0]);
        // dress < laptop, desktop < mobile; one browser and one referrer seen.
        assert_eq!(table.rows()[0], vec![120.5, 0.0, 3.0, 17.0, 2.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(table.rows()[1][5..], [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn vocabulary_is_sorted_and_distinct() {
        let mut encoder = FeatureEncoder::new();
        encoder.prepare(&dataset()).unwrap();
        let terms = encoder.column("search_term").unwrap().classes().unwrap();
        assert_eq!(terms, ["dress", "laptop"]);
        assert!(encoder.column("hour").is_none());
    }

    #[test]
    fn fit_once_then_reuse() {
        let mut encoder = FeatureEncoder::new();
        encoder.prepare(&dataset()).unwrap();
        let fitted = encoder.clone();

        let subset = Dataset::new(vec![record("laptop", DeviceType::Desktop, true)]);
        let table = encoder.prepare(&subset).unwrap();
        assert_eq!(encoder, fitted);
        assert_eq!(table.rows()[0][5], 1.0);
    }

    #[test]
    fn unseen_value_is_rejected() {
        let mut encoder = FeatureEncoder::new();
        encoder.prepare(&dataset()).unwrap();

        let novel = Dataset::new(vec![record("air fryer", DeviceType::Mobile, false)]);
        let err = encoder.prepare(&novel).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnseenCategory { column: "search_term", ref value } if value == "air fryer"
        ));

        let tablet = Dataset::new(vec![record("laptop", DeviceType::Tablet, false)]);
        assert!(matches!(
            encoder.transform(&tablet).unwrap_err(),
            ModelError::UnseenCategory { column: "device_type", .. }
        ));
    }

    #[test]
    fn transform_requires_fit() {
        assert!(matches!(
            FeatureEncoder::new().transform(&dataset()).unwrap_err(),
            ModelError::NotTrained
        ));
    }

    #[test]
    fn empty_dataset_encodes_to_empty_table() {
        let table = FeatureEncoder::new().prepare(&Dataset::default()).unwrap();
        assert!(table.is_empty());
    }
}
