use rand::Rng;
use rand::seq::SliceRandom;

use crate::node::FeatureIndex;

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node from its class counts; 0.0 for an empty node.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        let proportions = class_counts.iter().filter(|&&c| c > 0).map(|&c| c as f64 / n);
        match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.ln()).sum::<f64>(),
        }
    }
}

/// Best split found for one node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitCandidate {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) − n_left·I(left) − n_right·I(right)`.
    pub(crate) impurity_decrease: f64,
}

/// Exact threshold search over column-major training data.
///
/// `columns[feature][row]` holds the values; `samples` passed to the
/// methods are row indices and may repeat (bootstrap draws).
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Find the split with the largest impurity decrease.
    ///
    /// Features are visited in a random order until `max_features` of them
    /// have been evaluated; features that are constant within `samples` do
    /// not count toward that budget. Returns `None` when no feature admits a
    /// split that respects `min_samples_leaf`.
    pub(crate) fn best_split(
        &self,
        samples: &[usize],
        class_counts: &[usize],
        max_features: usize,
        rng: &mut impl Rng,
    ) -> Option<SplitCandidate> {
        let n_samples = samples.len();
        if n_samples < 2 * self.min_samples_leaf {
            return None;
        }
        let parent = self.criterion.impurity(class_counts, n_samples);

        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        order.shuffle(rng);

        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);
        let mut left = vec![0usize; self.n_classes];
        let mut right = vec![0usize; self.n_classes];
        let mut evaluated = 0usize;
        let mut best: Option<SplitCandidate> = None;

        for feature in order {
            if evaluated == max_features {
                break;
            }
            let column = &self.columns[feature];
            sorted.clear();
            sorted.extend(samples.iter().map(|&row| (column[row], self.labels[row])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            if sorted[0].0 == sorted[n_samples - 1].0 {
                continue;
            }
            evaluated += 1;

            left.iter_mut().for_each(|c| *c = 0);
            right.copy_from_slice(class_counts);

            for i in 0..n_samples - 1 {
                let (value, label) = sorted[i];
                left[label] += 1;
                right[label] -= 1;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n_samples - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = n_samples as f64 * parent
                    - n_left as f64 * self.criterion.impurity(&left, n_left)
                    - n_right as f64 * self.criterion.impurity(&right, n_right);

                if best.is_none_or(|b| decrease > b.impurity_decrease) {
                    best = Some(SplitCandidate {
                        feature: FeatureIndex::new(feature),
                        threshold: value + (next - value) / 2.0,
                        impurity_decrease: decrease,
                    });
                }
            }
        }

        best
    }

    /// Route `samples` to the left (`<= threshold`) or right child.
    pub(crate) fn partition(
        &self,
        samples: &[usize],
        split: &SplitCandidate,
    ) -> (Vec<usize>, Vec<usize>) {
        let column = &self.columns[split.feature.index()];
        samples.iter().copied().partition(|&row| column[row] <= split.threshold)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitCriterion, SplitSearch};

    fn counts(labels: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
        let mut c = vec![0; n_classes];
        for &s in samples {
            c[labels[s]] += 1;
        }
        c
    }

    #[test]
    fn gini_values() {
        assert!(SplitCriterion::Gini.impurity(&[10, 0], 10).abs() < f64::EPSILON);
        assert!((SplitCriterion::Gini.impurity(&[5, 5], 10) - 0.5).abs() < f64::EPSILON);
        assert!(SplitCriterion::Gini.impurity(&[], 0).abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_values() {
        assert!(SplitCriterion::Entropy.impurity(&[0, 7], 7).abs() < f64::EPSILON);
        let balanced = SplitCriterion::Entropy.impurity(&[5, 5], 10);
        assert!((balanced - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn separable_column_is_found_among_noise() {
        // Column 0 is constant, column 1 separates the classes at 3 / 10.
        let columns = vec![
            vec![1.0; 6],
            vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            min_samples_leaf: 1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // Budget of one feature still reaches column 1 because the constant
        // column does not consume it.
        let split = search
            .best_split(&samples, &counts(&labels, &samples, 2), 1, &mut rng)
            .expect("separable data must split");
        assert_eq!(split.feature.index(), 1);
        assert!((split.threshold - 6.5).abs() < 1e-12);
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);

        let (l, r) = search.partition(&samples, &split);
        assert_eq!(l, vec![0, 1, 2]);
        assert_eq!(r, vec![3, 4, 5]);
    }

    #[test]
    fn duplicated_bootstrap_rows_are_counted() {
        let columns = vec![vec![0.0, 1.0]];
        let labels = vec![0, 1];
        let samples = vec![0, 0, 0, 1];
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            min_samples_leaf: 1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let split = search
            .best_split(&samples, &counts(&labels, &samples, 2), 1, &mut rng)
            .expect("two distinct values");
        let (l, r) = search.partition(&samples, &split);
        assert_eq!(l.len(), 3);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn constant_columns_yield_none() {
        let columns = vec![vec![5.0; 4], vec![2.0; 4]];
        let labels = vec![0, 1, 0, 1];
        let samples: Vec<usize> = (0..4).collect();
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Entropy,
            min_samples_leaf: 1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(
            search
                .best_split(&samples, &counts(&labels, &samples, 2), 2, &mut rng)
                .is_none()
        );
    }

    #[test]
    fn min_samples_leaf_blocks_small_children() {
        let columns = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let samples = vec![0, 1];
        let search = SplitSearch {
            columns: &columns,
            labels: &labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            min_samples_leaf: 2,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(
            search
                .best_split(&samples, &counts(&labels, &samples, 2), 1, &mut rng)
                .is_none()
        );
    }
}
