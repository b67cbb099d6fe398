//! Error types for ctr-model.

use ctr_forest::RfError;

use crate::split::Split;

/// Errors from encoding, training, and scoring.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Returned when a fitted column encoder meets a value it was not fit on.
    #[error("unseen category \"{value}\" in column {column}")]
    UnseenCategory {
        /// Categorical column name.
        column: &'static str,
        /// The unknown value.
        value: String,
    },

    /// Returned by scoring before the first successful training run.
    #[error("model has not been trained")]
    NotTrained,

    /// Returned when a split holds fewer than two label classes.
    #[error("{split} split holds {n_classes} label class(es), need both clicked and not clicked")]
    DegenerateTrainingSet {
        /// Which side of the split is degenerate.
        split: Split,
        /// Distinct labels found in that split.
        n_classes: usize,
    },

    /// Returned when training on a dataset with no records.
    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    /// Returned when the held-out fraction is outside (0.0, 1.0).
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The rejected fraction.
        fraction: f64,
    },

    /// Forest configuration or fitting failure.
    #[error(transparent)]
    Forest(#[from] RfError),
}
