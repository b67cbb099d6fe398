//! Seeded train/held-out partition of row indices.

use std::fmt;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Side of a train/held-out partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Training,
    HeldOut,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Split::Training => "training",
            Split::HeldOut => "held-out",
        })
    }
}

/// Shuffle `0..n` and take `ceil(test_fraction * n)` indices as held-out.
///
/// Returns `(training, held_out)`. `test_fraction` must already be in (0, 1).
pub(crate) fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let training = indices.split_off(n_test.min(n));
    (training, indices)
}
