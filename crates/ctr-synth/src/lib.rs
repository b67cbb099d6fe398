//! Synthetic e-commerce interaction data with an embedded click model,
//! plus the aggregate analytics a dashboard reads.
//!
//! ```
//! use ctr_synth::GeneratorConfig;
//!
//! let dataset = GeneratorConfig::new(500)?.with_seed(7).generate();
//! assert_eq!(dataset.len(), 500);
//! assert!(dataset.iter().all(|r| !(r.exited_screen && r.clicked)));
//! # Ok::<(), ctr_synth::SynthError>(())
//! ```

pub mod analytics;
mod error;
mod generator;
mod record;
mod sampling;
mod vocabulary;

pub use analytics::{
    Category, CategoryRate, DailyRate, DatasetFilter, DatasetSummary, CORRELATION_COLUMNS,
};
pub use error::SynthError;
pub use generator::{ExitPolicy, GeneratorConfig, MAX_SAMPLES};
pub use record::{Browser, Dataset, DeviceType, InteractionRecord, ParseCategoryError, Referrer};
pub use vocabulary::Vocabulary;
