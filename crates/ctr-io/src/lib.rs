//! File I/O, validation, and serialization for the ctr pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{CSV_HEADER, ExperimentName, TIMESTAMP_FORMAT};
pub use error::IoError;
pub use reader::InteractionReader;
pub use writer::{DatasetWriter, ResultWriter};
