//! Error types for ctr-synth.

/// Errors from generator configuration.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Returned when the requested sample count is zero or above the cap.
    #[error("n_samples must be in [1, {max}], got {n_samples}")]
    InvalidSampleSize {
        /// The requested sample count.
        n_samples: usize,
        /// Largest accepted sample count.
        max: usize,
    },

    /// Returned when a probability knob is outside `[0.0, 1.0]` or not finite.
    #[error("{name} must be in [0.0, 1.0], got {value}")]
    InvalidProbability {
        /// Name of the offending knob.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the timestamp window is empty or longer than ten years.
    #[error("timestamp window must be in [1, 3650] days, got {days}")]
    InvalidWindow {
        /// The requested window length in days.
        days: u32,
    },
}
