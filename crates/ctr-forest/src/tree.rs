use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::RfError;
use crate::node::{Node, NodeIndex};
use crate::split::{SplitCriterion, SplitSearch};

/// Configuration for a single CART decision tree.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a config with the defaults listed above.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum depth (root is depth 0). `None` grows until leaves are pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each child.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many non-constant features each split evaluates. `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(max_features)
    }

    /// Train a tree on a row-major dataset.
    ///
    /// `features[sample][feature]`, `labels[sample]` zero-based classes.
    ///
    /// # Errors
    ///
    /// | Variant                                                   | When                                   |
    /// |-----------------------------------------------------------|----------------------------------------|
    /// | [`RfError::EmptyDataset`]                                 | `features` is empty                    |
    /// | [`RfError::LabelCountMismatch`]                           | `labels.len() != features.len()`       |
    /// | [`RfError::ZeroFeatures`]                                 | rows have zero columns                 |
    /// | [`RfError::FeatureCountMismatch`]                         | ragged rows                            |
    /// | [`RfError::NonFiniteValue`]                               | NaN or infinite value                  |
    /// | [`RfError::InvalidMaxDepth`]                              | `max_depth` is `Some(0)`               |
    /// | [`RfError::InvalidMinSamplesSplit`]                       | `min_samples_split` < 2                |
    /// | [`RfError::InvalidMinSamplesLeaf`]                        | `min_samples_leaf` < 1                 |
    /// | [`RfError::InvalidMaxFeatures`]                           | `max_features` outside [1, n_features] |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_features = validate_matrix(features, labels)?;
        self.validate(n_features)?;
        let columns = to_columns(features, n_features);
        let n_classes = labels.iter().max().map_or(1, |&m| m + 1);
        let samples: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&columns, labels, &samples, n_classes))
    }

    /// Grow a tree over `samples` (row indices, repeats allowed) of
    /// pre-validated column-major data.
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        samples: &[usize],
        n_classes: usize,
    ) -> DecisionTree {
        let max_features = self.max_features.unwrap_or(columns.len());
        let mut builder = TreeBuilder {
            config: self,
            search: SplitSearch {
                columns,
                labels,
                n_classes,
                criterion: self.criterion,
                min_samples_leaf: self.min_samples_leaf,
            },
            max_features,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            nodes: Vec::new(),
        };
        builder.build(samples, 0);

        debug!(n_nodes = builder.nodes.len(), "decision tree grown");

        DecisionTree {
            nodes: builder.nodes,
            n_features: columns.len(),
            n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check shape and finiteness of a row-major matrix against its labels.
///
/// Returns the feature count on success.
pub(crate) fn validate_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major rows into one `Vec` per feature.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

struct TreeBuilder<'a> {
    config: &'a DecisionTreeConfig,
    search: SplitSearch<'a>,
    max_features: usize,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Append the subtree for `samples` and return its root index.
    fn build(&mut self, samples: &[usize], depth: usize) -> NodeIndex {
        let mut class_counts = vec![0usize; self.search.n_classes];
        for &row in samples {
            class_counts[self.search.labels[row]] += 1;
        }

        let pure = class_counts.iter().filter(|&&c| c > 0).count() <= 1;
        let at_depth_limit = self.config.max_depth.is_some_and(|d| depth >= d);
        if pure || at_depth_limit || samples.len() < self.config.min_samples_split {
            return self.push(Node::leaf(&class_counts));
        }

        let Some(split) =
            self.search
                .best_split(samples, &class_counts, self.max_features, &mut self.rng)
        else {
            return self.push(Node::leaf(&class_counts));
        };

        // Reserve the slot so the subtree root keeps a lower index than its children.
        let index = self.push(Node::leaf(&class_counts));
        let (left_samples, right_samples) = self.search.partition(samples, &split);
        let left = self.build(&left_samples, depth + 1);
        let right = self.build(&right_samples, depth + 1);

        self.nodes[index.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples: samples.len(),
            impurity_decrease: split.impurity_decrease,
        };
        index
    }

    fn push(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        NodeIndex::new(self.nodes.len() - 1)
    }
}

/// A fitted CART decision tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the majority class of the leaf `sample` lands in.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(self.leaf_for(sample)?.majority_class().unwrap_or(0))
    }

    /// Return the class distribution of the leaf `sample` lands in.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        match self.leaf_for(sample)? {
            Node::Leaf { distribution, .. } => Ok(distribution),
            Node::Split { .. } => unreachable!("descent always stops at a leaf"),
        }
    }

    /// Mean Decrease in Impurity per feature, normalized to sum to 1.0.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the arena of nodes, root first.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of classes the tree distributes over.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(NodeIndex::ROOT, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            match &self.nodes[index.index()] {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        deepest
    }

    fn leaf_for(&self, sample: &[f64]) -> Result<&Node, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut node = &self.nodes[NodeIndex::ROOT.index()];
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } = node
        {
            let next = if sample[feature.index()] <= *threshold { *left } else { *right };
            node = &self.nodes[next.index()];
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        (features, vec![0, 0, 0, 1, 1, 1])
    }

    fn xor_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        (features, vec![0, 1, 1, 0])
    }

    #[test]
    fn empty_dataset_error() {
        let err = DecisionTreeConfig::new().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn label_count_mismatch_error() {
        let (features, _) = step_data();
        let err = DecisionTreeConfig::new().fit(&features, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelCountMismatch { n_samples: 6, n_labels: 2 }
        ));
    }

    #[test]
    fn pure_labels_give_single_leaf() {
        let features = vec![vec![1.0], vec![3.0], vec![5.0]];
        let tree = DecisionTreeConfig::new().fit(&features, &[1, 1, 1]).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(&[100.0]).unwrap(), 1);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn step_function_is_learned() {
        let (features, labels) = step_data();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert_eq!(tree.predict(&[2.5, 0.0]).unwrap(), 0);
        assert_eq!(tree.predict(&[10.5, 0.0]).unwrap(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.feature_importances(), vec![1.0, 0.0]);
    }

    #[test]
    fn xor_grows_two_levels() {
        let (features, labels) = xor_data();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert!(tree.depth() >= 2);
        for (row, &label) in features.iter().zip(&labels) {
            assert_eq!(tree.predict(row).unwrap(), label);
        }
    }

    #[test]
    fn max_depth_caps_growth() {
        let (features, labels) = xor_data();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(1))
            .fit(&features, &labels)
            .unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn leaf_distribution_sums_to_one() {
        let (features, labels) = xor_data();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(1))
            .fit(&features, &labels)
            .unwrap();
        let sum: f64 = tree.predict_proba(&[0.0, 0.0]).unwrap().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn config_validation() {
        let (features, labels) = step_data();
        let err = DecisionTreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMaxDepth { .. }));

        let err = DecisionTreeConfig::new()
            .with_max_features(Some(3))
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::InvalidMaxFeatures { max_features: 3, n_features: 2 }
        ));

        let err = DecisionTreeConfig::new()
            .with_min_samples_split(1)
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMinSamplesSplit { .. }));
    }

    #[test]
    fn non_finite_and_ragged_inputs_rejected() {
        let err = DecisionTreeConfig::new()
            .fit(&[vec![1.0, f64::NAN], vec![3.0, 4.0]], &[0, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::NonFiniteValue { sample_index: 0, feature_index: 1 }
        ));

        let err = DecisionTreeConfig::new()
            .fit(&[vec![1.0, 2.0], vec![3.0]], &[0, 1])
            .unwrap_err();
        assert!(matches!(err, RfError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn prediction_width_checked() {
        let (features, labels) = step_data();
        let tree = DecisionTreeConfig::new().fit(&features, &labels).unwrap();
        assert!(matches!(
            tree.predict(&[1.0]).unwrap_err(),
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn same_seed_same_tree() {
        let (features, labels) = xor_data();
        let a = DecisionTreeConfig::new().with_seed(9).fit(&features, &labels).unwrap();
        let b = DecisionTreeConfig::new().with_seed(9).fit(&features, &labels).unwrap();
        assert_eq!(a.nodes(), b.nodes());
    }
}
