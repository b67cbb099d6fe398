//! Feature importance aggregation across trees.

use serde::Serialize;

/// One row of a feature importance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance (the table sums to 1.0 unless every tree is a lone leaf).
    pub importance: f64,
    /// 1-based rank, 1 = most important.
    pub rank: usize,
}

/// Sum per-tree MDI vectors, renormalize, and rank descending.
///
/// Ties keep the column order of `names`.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, value) in totals.iter_mut().zip(tree) {
            *total += value;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::aggregate_importances;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sums_normalizes_and_ranks() {
        let per_tree = vec![vec![0.5, 0.5, 0.0], vec![1.0, 0.0, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(&["a", "b", "c"]));
        assert_eq!(ranked[0].name, "a");
        assert!((ranked[0].importance - 0.75).abs() < 1e-12);
        assert_eq!(ranked[1].name, "b");
        assert_eq!(ranked[2].rank, 3);
        let total: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_stays_zero() {
        let ranked = aggregate_importances(&[vec![0.0, 0.0]], &names(&["a", "b"]));
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        assert_eq!(ranked[0].name, "a");
    }

    #[test]
    fn no_trees_gives_zero_table() {
        let ranked = aggregate_importances(&[], &names(&["a"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].importance, 0.0);
    }
}
