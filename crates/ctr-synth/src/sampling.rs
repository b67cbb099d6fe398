//! Distribution samplers built on `rand` primitives.

use rand::Rng;

/// Exponential draw with the given mean via inverse CDF.
pub(crate) fn exponential(rng: &mut impl Rng, mean: f64) -> f64 {
    // 1 - u lies in (0, 1], so the log is finite and the draw non-negative.
    let u: f64 = rng.r#gen();
    -mean * (1.0 - u).ln()
}

/// Poisson draw by Knuth's product-of-uniforms method. Suited to small rates.
pub(crate) fn poisson(rng: &mut impl Rng, lambda: f64) -> u32 {
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut product: f64 = rng.r#gen();
    while product > limit {
        k += 1;
        product *= rng.r#gen::<f64>();
    }
    k
}

/// Index drawn proportionally to `weights`, which must sum to 1.
pub(crate) fn weighted_index(rng: &mut impl Rng, weights: &[f64]) -> usize {
    let u: f64 = rng.r#gen();
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if u < cumulative {
            return i;
        }
    }
    weights.len() - 1
}
