//! Seeded generation of labeled interaction datasets.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::SynthError;
use crate::record::{Browser, Dataset, DeviceType, InteractionRecord, Referrer};
use crate::sampling::{exponential, poisson, weighted_index};
use crate::vocabulary::Vocabulary;

/// Largest dataset [`GeneratorConfig::new`] accepts.
pub const MAX_SAMPLES: usize = 1_000_000;

const MAX_WINDOW_DAYS: u32 = 3650;
const MEAN_TIME_ON_SCREEN: f64 = 300.0;
const SEARCH_RATE: f64 = 2.0;
const BASE_CLICK_PROBABILITY: f64 = 0.3;
const LOOSE_EXIT_PENALTY: f64 = 0.1;

// Weights follow the declaration order of each enum's `ALL`.
const DEVICE_WEIGHTS: [f64; 3] = [0.6, 0.3, 0.1];
const BROWSER_WEIGHTS: [f64; 4] = [0.5, 0.2, 0.2, 0.1];
const REFERRER_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// How an exit affects the click label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// An exited session never clicks. The probability is zeroed and the
    /// label is overridden afterwards.
    #[default]
    Strict,
    /// An exit only lowers the click probability by 0.1. Exited sessions
    /// may still be labeled as clicked.
    Loose,
}

/// Configuration for synthetic dataset generation.
///
/// Construct via [`GeneratorConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default                     |
/// |--------------------|-----------------------------|
/// | `seed`             | 42                          |
/// | `anchor`           | `Utc::now()` at construction |
/// | `window_days`      | 30                          |
/// | `exit_probability` | 0.3                         |
/// | `exit_policy`      | `Strict`                    |
/// | `vocabulary`       | `Ecommerce`                 |
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    n_samples: usize,
    seed: u64,
    anchor: DateTime<Utc>,
    window_days: u32,
    exit_probability: f64,
    exit_policy: ExitPolicy,
    vocabulary: Vocabulary,
}

impl GeneratorConfig {
    /// Create a config producing `n_samples` records.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::InvalidSampleSize`] unless `1 <= n_samples <= MAX_SAMPLES`.
    pub fn new(n_samples: usize) -> Result<Self, SynthError> {
        if n_samples == 0 || n_samples > MAX_SAMPLES {
            return Err(SynthError::InvalidSampleSize {
                n_samples,
                max: MAX_SAMPLES,
            });
        }
        Ok(Self {
            n_samples,
            seed: 42,
            anchor: Utc::now().trunc_subsecs(0),
            window_days: 30,
            exit_probability: 0.3,
            exit_policy: ExitPolicy::Strict,
            vocabulary: Vocabulary::Ecommerce,
        })
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Pin the end of the timestamp window. Sub-second precision is dropped.
    #[must_use]
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor.trunc_subsecs(0);
        self
    }

    /// Set the timestamp window length in days.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::InvalidWindow`] unless `1 <= days <= 3650`.
    pub fn with_window_days(mut self, days: u32) -> Result<Self, SynthError> {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(SynthError::InvalidWindow { days });
        }
        self.window_days = days;
        Ok(self)
    }

    /// Set the per-session exit probability.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::InvalidProbability`] unless the value is in `[0.0, 1.0]`.
    pub fn with_exit_probability(mut self, probability: f64) -> Result<Self, SynthError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SynthError::InvalidProbability {
                name: "exit_probability",
                value: probability,
            });
        }
        self.exit_probability = probability;
        Ok(self)
    }

    /// Set how exits affect the click label.
    #[must_use]
    pub fn with_exit_policy(mut self, exit_policy: ExitPolicy) -> Self {
        self.exit_policy = exit_policy;
        self
    }

    /// Set the search-term vocabulary.
    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Return the number of records to generate.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Return the RNG seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the end of the timestamp window.
    #[must_use]
    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Return the timestamp window length in days.
    #[must_use]
    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Return the exit policy.
    #[must_use]
    pub fn exit_policy(&self) -> ExitPolicy {
        self.exit_policy
    }

    /// Return the search-term vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary
    }

    /// Generate the dataset. The same config always yields the same records.
    #[instrument(skip_all, fields(n_samples = self.n_samples, seed = self.seed))]
    pub fn generate(&self) -> Dataset {
        let n = self.n_samples;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Columns are drawn one at a time, each consuming the stream in turn.
        let window = TimeDelta::days(i64::from(self.window_days));
        let start = self.anchor - window;
        let span = window.num_seconds();
        let timestamps: Vec<DateTime<Utc>> = (0..n)
            .map(|_| start + TimeDelta::seconds(rng.gen_range(0..=span)))
            .collect();
        let times: Vec<f64> = (0..n)
            .map(|_| exponential(&mut rng, MEAN_TIME_ON_SCREEN))
            .collect();
        let exits: Vec<bool> = (0..n).map(|_| rng.gen_bool(self.exit_probability)).collect();
        let searches: Vec<u32> = (0..n).map(|_| poisson(&mut rng, SEARCH_RATE)).collect();
        let terms = self.vocabulary.terms();
        let search_terms: Vec<&str> = (0..n).map(|_| terms[rng.gen_range(0..terms.len())]).collect();
        let devices: Vec<DeviceType> = (0..n)
            .map(|_| DeviceType::ALL[weighted_index(&mut rng, &DEVICE_WEIGHTS)])
            .collect();
        let browsers: Vec<Browser> = (0..n)
            .map(|_| Browser::ALL[weighted_index(&mut rng, &BROWSER_WEIGHTS)])
            .collect();
        let referrers: Vec<Referrer> = (0..n)
            .map(|_| Referrer::ALL[weighted_index(&mut rng, &REFERRER_WEIGHTS)])
            .collect();
        debug!("independent columns sampled");

        let mut records: Vec<InteractionRecord> = (0..n)
            .map(|i| {
                let p = click_probability(
                    self.exit_policy,
                    devices[i],
                    browsers[i],
                    times[i],
                    exits[i],
                );
                InteractionRecord {
                    timestamp: timestamps[i],
                    time_on_screen: times[i],
                    exited_screen: exits[i],
                    search_count: searches[i],
                    search_term: search_terms[i].to_string(),
                    device_type: devices[i],
                    browser: browsers[i],
                    referrer: referrers[i],
                    clicked: rng.gen_bool(p),
                }
            })
            .collect();

        if self.exit_policy == ExitPolicy::Strict {
            // Holds even if the probability formula above changes.
            for record in records.iter_mut().filter(|r| r.exited_screen) {
                record.clicked = false;
            }
        }

        let clicks = records.iter().filter(|r| r.clicked).count();
        info!(
            n_samples = n,
            ctr = clicks as f64 / n as f64,
            "dataset generated"
        );
        Dataset::new(records)
    }
}

fn device_effect(device: DeviceType) -> f64 {
    match device {
        DeviceType::Desktop => 0.10,
        DeviceType::Mobile => -0.05,
        DeviceType::Tablet => 0.0,
    }
}

fn browser_effect(browser: Browser) -> f64 {
    match browser {
        Browser::Chrome => 0.05,
        Browser::Firefox | Browser::Safari => 0.0,
        Browser::Edge => -0.05,
    }
}

/// Click probability for one session, clipped to `[0, 1]`.
fn click_probability(
    policy: ExitPolicy,
    device: DeviceType,
    browser: Browser,
    time_on_screen: f64,
    exited: bool,
) -> f64 {
    let engaged = BASE_CLICK_PROBABILITY
        + device_effect(device)
        + browser_effect(browser)
        + f64::min(0.2, time_on_screen / 1000.0);
    let p = match (exited, policy) {
        (false, _) => engaged,
        (true, ExitPolicy::Strict) => 0.0,
        (true, ExitPolicy::Loose) => engaged - LOOSE_EXIT_PENALTY,
    };
    p.clamp(0.0, 1.0)
}
