//! The click model: held-out training run, importance table, scoring.

use ctr_forest::{
    ClassMetrics, ConfusionMatrix, RandomForest, RandomForestConfig, RankedFeature, RfError,
};
use ctr_synth::Dataset;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::encoder::{FEATURE_NAMES, FeatureEncoder, FeatureTable};
use crate::error::ModelError;
use crate::split::{Split, train_test_split};

/// Training configuration for [`ClickModel`].
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `n_trees`          | 100     |
/// | `max_depth`        | `None`  |
/// | `min_samples_leaf` | 1       |
/// | `test_fraction`    | 0.2     |
/// | `seed`             | 42      |
///
/// The seed drives both the held-out split and the forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_leaf: usize,
    test_fraction: f64,
    seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_leaf: 1,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Create a config with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] (wrapped) if `n_trees` is zero.
    pub fn with_n_trees(mut self, n_trees: usize) -> Result<Self, ModelError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees }.into());
        }
        self.n_trees = n_trees;
        Ok(self)
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of training rows per leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the share of rows held out for evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTestFraction`] unless `0 < fraction < 1`.
    pub fn with_test_fraction(mut self, fraction: f64) -> Result<Self, ModelError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ModelError::InvalidTestFraction { fraction });
        }
        self.test_fraction = fraction;
        Ok(self)
    }

    /// Set the seed for the split and the forest.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the held-out fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn forest_config(&self) -> Result<RandomForestConfig, RfError> {
        Ok(RandomForestConfig::new(self.n_trees)?
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_seed(self.seed))
    }
}

/// Held-out report of the last successful training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Share of held-out rows classified correctly.
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    /// Rows are true labels, columns predictions; class 1 is clicked.
    pub confusion: ConfusionMatrix,
    pub class_metrics: Vec<ClassMetrics>,
}

#[derive(Debug)]
struct Trained {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    evaluation: Evaluation,
}

/// Encoder plus fitted forest.
///
/// Constructed untrained; [`train`](ClickModel::train) fits it and
/// [`predict`](ClickModel::predict) scores rows afterwards. Retraining keeps
/// the already fit category vocabularies.
#[derive(Debug, Default)]
pub struct ClickModel {
    config: ModelConfig,
    encoder: FeatureEncoder,
    trained: Option<Trained>,
}

fn class_count(labels: &[usize], indices: &[usize]) -> usize {
    let positives = indices.iter().filter(|&&i| labels[i] == 1).count();
    usize::from(positives > 0) + usize::from(positives < indices.len())
}

fn select(table: &FeatureTable, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<usize>) {
    indices
        .iter()
        .map(|&i| (table.rows()[i].clone(), table.labels()[i]))
        .unzip()
}

impl ClickModel {
    /// Create an untrained model with the default [`ModelConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an untrained model with `config`.
    #[must_use]
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Fit the model on a seeded train/held-out split of `dataset` and
    /// return the held-out accuracy.
    ///
    /// On error the model keeps its previous encoder, forest, importance
    /// table, and evaluation.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyDataset`] | `dataset` has no records |
    /// | [`ModelError::UnseenCategory`] | a fit column meets an unknown value |
    /// | [`ModelError::DegenerateTrainingSet`] | either split lacks clicked or non-clicked rows |
    /// | [`ModelError::Forest`] | the forest rejects the configuration |
    #[instrument(skip_all, fields(n_samples = dataset.len(), n_trees = self.config.n_trees))]
    pub fn train(&mut self, dataset: &Dataset) -> Result<f64, ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let mut encoder = self.encoder.clone();
        let table = encoder.prepare(dataset)?;

        let (train_idx, test_idx) =
            train_test_split(table.len(), self.config.test_fraction, self.config.seed);
        for (split, indices) in [(Split::Training, &train_idx), (Split::HeldOut, &test_idx)] {
            let n_classes = class_count(table.labels(), indices);
            if n_classes < 2 {
                return Err(ModelError::DegenerateTrainingSet { split, n_classes });
            }
        }
        let (train_x, train_y) = select(&table, &train_idx);
        let (test_x, test_y) = select(&table, &test_idx);
        debug!(n_train = train_x.len(), n_test = test_x.len(), "split ready");

        let names: Vec<String> = FEATURE_NAMES.iter().map(|&n| n.to_string()).collect();
        let fitted = self.config.forest_config()?.fit(&train_x, &train_y, &names)?;
        debug!(
            max_features = fitted.metadata().max_features_resolved,
            n_classes = fitted.metadata().n_classes,
            "forest fitted"
        );
        let (forest, importances) = fitted.into_parts();

        let predicted = forest.predict_batch(&test_x)?;
        let confusion = ConfusionMatrix::from_labels(&test_y, &predicted, 2)?;
        let evaluation = Evaluation {
            accuracy: confusion.accuracy(),
            n_train: train_x.len(),
            n_test: test_x.len(),
            class_metrics: confusion.class_metrics(),
            confusion,
        };
        let accuracy = evaluation.accuracy;

        info!(
            accuracy,
            top_feature = importances.first().map_or("", |f| f.name.as_str()),
            "click model trained"
        );

        self.encoder = encoder;
        self.trained = Some(Trained {
            forest,
            importances,
            evaluation,
        });
        Ok(accuracy)
    }

    /// Click probability for every record of `dataset`, in order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NotTrained`] | no successful [`train`](ClickModel::train) yet |
    /// | [`ModelError::UnseenCategory`] | a categorical value was not seen in training |
    #[instrument(skip_all, fields(n_samples = dataset.len()))]
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<f64>, ModelError> {
        let trained = self.trained.as_ref().ok_or(ModelError::NotTrained)?;
        let table = self.encoder.transform(dataset)?;
        let distributions = trained.forest.predict_proba_batch(table.rows())?;
        Ok(distributions.iter().map(|d| d.probability(1)).collect())
    }

    /// Return `true` after a successful training run.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// Ranked importance table, empty until trained.
    #[must_use]
    pub fn feature_importance(&self) -> &[RankedFeature] {
        match &self.trained {
            Some(trained) => &trained.importances,
            None => &[],
        }
    }

    /// Held-out accuracy of the last successful training run.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.trained.as_ref().map(|t| t.evaluation.accuracy)
    }

    /// Held-out report of the last successful training run.
    #[must_use]
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.trained.as_ref().map(|t| &t.evaluation)
    }

    /// The category encoders.
    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Return the training configuration.
    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}
