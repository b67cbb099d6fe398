//! Random Forest classification: train, score, explain.
//!
//! A bagged ensemble of CART decision trees with Gini/Entropy split
//! criteria, seeded per-tree randomness (identical output for any rayon
//! thread count), Mean Decrease in Impurity feature importance, and
//! averaged leaf distributions for probability prediction.

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod result;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
