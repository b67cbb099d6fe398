//! Click-probability modelling over interaction datasets.
//!
//! [`FeatureEncoder`] turns a [`Dataset`](ctr_synth::Dataset) into the
//! numeric table the forest consumes; [`ClickModel`] owns the encoder and
//! the fitted forest, reports held-out accuracy and feature importance, and
//! scores new rows.

mod encoder;
mod error;
mod model;
mod split;

pub use encoder::{CategoryEncoder, FeatureEncoder, FeatureTable, CATEGORICAL_COLUMNS, FEATURE_NAMES};
pub use error::ModelError;
pub use model::{ClickModel, Evaluation, ModelConfig};
pub use split::Split;
