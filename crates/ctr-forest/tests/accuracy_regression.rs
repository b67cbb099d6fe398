//! Accuracy regression tests for ctr-forest.
//!
//! A noisy binary task shaped like click data: one binary feature fully
//! determines the negative class when set, one continuous feature shifts
//! the positive rate, the rest is noise.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ctr_forest::{ConfusionMatrix, RandomForestConfig};

/// 1000 samples, 5 features: `gate`, `signal`, three noise columns.
fn make_gated_classification(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(1000);
    let mut labels = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let gate = f64::from(u8::from(rng.gen_bool(0.3)));
        let signal: f64 = rng.r#gen();
        let noise: [f64; 3] = [rng.r#gen(), rng.r#gen(), rng.r#gen()];
        let clicked = gate == 0.0 && rng.gen_bool(0.1 + 0.8 * signal);
        labels.push(usize::from(clicked));
        features.push(vec![gate, signal, noise[0], noise[1], noise[2]]);
    }
    let names = ["gate", "signal", "n0", "n1", "n2"].map(String::from).to_vec();
    (features, labels, names)
}

#[test]
fn held_out_accuracy_beats_majority_baseline() {
    let (features, labels, names) = make_gated_classification(42);
    let (train_x, test_x) = features.split_at(800);
    let (train_y, test_y) = labels.split_at(800);

    let result = RandomForestConfig::new(100)
        .unwrap()
        .with_min_samples_leaf(5)
        .fit(train_x, train_y, &names)
        .unwrap();
    let predicted = result.forest().predict_batch(test_x).unwrap();
    let cm = ConfusionMatrix::from_labels(test_y, &predicted, 2).unwrap();

    let positives = test_y.iter().filter(|&&y| y == 1).count();
    let baseline = positives.max(test_y.len() - positives) as f64 / test_y.len() as f64;
    assert!(
        cm.accuracy() > baseline,
        "accuracy {} <= majority baseline {baseline}",
        cm.accuracy()
    );
}

#[test]
fn informative_features_lead_importance() {
    let (features, labels, names) = make_gated_classification(7);
    let result = RandomForestConfig::new(100)
        .unwrap()
        .with_max_depth(Some(4))
        .fit(&features, &labels, &names)
        .unwrap();

    let top2: Vec<&str> = result.importances().iter().take(2).map(|f| f.name.as_str()).collect();
    assert!(top2.contains(&"gate"), "top-2: {top2:?}");
    assert!(top2.contains(&"signal"), "top-2: {top2:?}");
}

#[test]
fn gated_rows_score_low() {
    let (features, labels, names) = make_gated_classification(3);
    let result = RandomForestConfig::new(50).unwrap().fit(&features, &labels, &names).unwrap();
    let forest = result.forest();

    let mean_click_probability = |gate: f64| {
        let rows: Vec<Vec<f64>> = features.iter().filter(|row| row[0] == gate).cloned().collect();
        let probs = forest.predict_proba_batch(&rows).unwrap();
        probs.iter().map(|d| d.probability(1)).sum::<f64>() / probs.len() as f64
    };
    let gated = mean_click_probability(1.0);
    let open = mean_click_probability(0.0);
    assert!(gated < 0.2, "gated mean probability {gated}");
    assert!(open > gated, "open {open} <= gated {gated}");
}

#[test]
fn deterministic_probabilities() {
    let (features, labels, names) = make_gated_classification(42);
    let config = RandomForestConfig::new(30).unwrap().with_seed(5);

    let first = config.fit(&features, &labels, &names).unwrap();
    let second = config.fit(&features, &labels, &names).unwrap();

    assert_eq!(
        first.forest().predict_proba_batch(&features).unwrap(),
        second.forest().predict_proba_batch(&features).unwrap()
    );
    assert_eq!(first.importances(), second.importances());
}
