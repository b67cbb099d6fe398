//! Shared file-format constants and validated names.

use crate::IoError;

/// Header line of every dataset CSV file.
pub const CSV_HEADER: [&str; 9] = [
    "timestamp",
    "time_on_screen",
    "exited_screen",
    "search_count",
    "search_term",
    "device_type",
    "browser",
    "referrer",
    "clicked",
];

/// `chrono` format of the `timestamp` column, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("ctr-baseline_01".to_string()).unwrap();
        assert_eq!(name.as_str(), "ctr-baseline_01");
        assert_eq!(name.to_string(), "ctr-baseline_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_path_characters() {
        for bad in ["../escape", "two words", "run/1"] {
            let name = ExperimentName::new(bad.to_string());
            assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })), "{bad}");
        }
    }
}
