use std::fmt;

/// Zero-based feature column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Position of a node in a tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root always occupies the first arena slot.
    pub(crate) const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Children are referenced by [`NodeIndex`] into the owning tree's
/// `Vec<Node>`, never by pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An interior split: samples with `value <= threshold` go left.
    Split {
        /// Feature tested at this node.
        feature: FeatureIndex,
        /// Midpoint between the two closest values on either side.
        threshold: f64,
        /// Left child.
        left: NodeIndex,
        /// Right child.
        right: NodeIndex,
        /// Training samples (bootstrap draws) that reached this node.
        n_samples: usize,
        /// Sample-weighted impurity decrease produced by the split.
        impurity_decrease: f64,
    },
    /// A terminal node carrying the class frequencies of its samples.
    Leaf {
        /// Class probabilities, one entry per class, summing to 1.
        distribution: Vec<f64>,
        /// Training samples (bootstrap draws) in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Build a leaf from raw class counts.
    pub(crate) fn leaf(class_counts: &[usize]) -> Self {
        let n_samples: usize = class_counts.iter().sum();
        let total = n_samples.max(1) as f64;
        Node::Leaf {
            distribution: class_counts.iter().map(|&c| c as f64 / total).collect(),
            n_samples,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Majority class of a leaf; `None` for split nodes.
    ///
    /// Ties resolve to the lowest class index.
    #[must_use]
    pub fn majority_class(&self) -> Option<usize> {
        match self {
            Node::Leaf { distribution, .. } => Some(
                distribution
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (i, &p)| {
                        if p > best.1 { (i, p) } else { best }
                    })
                    .0,
            ),
            Node::Split { .. } => None,
        }
    }
}
