//! Interaction records and the categorical columns they carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Returned when a string names no declared value of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {column} \"{value}\"")]
pub struct ParseCategoryError {
    /// Column being parsed (`device_type`, `browser`, `referrer`).
    pub column: &'static str,
    /// The rejected string.
    pub value: String,
}

/// Device the session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    /// Every declared value, in declaration order.
    pub const ALL: &'static [DeviceType] = &[DeviceType::Desktop, DeviceType::Mobile, DeviceType::Tablet];

    /// Column name used in tables and error messages.
    pub const COLUMN: &'static str = "device_type";

    /// Lowercase name as written in datasets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(DeviceType::Desktop),
            "mobile" => Ok(DeviceType::Mobile),
            "tablet" => Ok(DeviceType::Tablet),
            _ => Err(ParseCategoryError {
                column: Self::COLUMN,
                value: s.to_string(),
            }),
        }
    }
}

/// Browser family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl Browser {
    /// Every declared value, in declaration order.
    pub const ALL: &'static [Browser] = &[Browser::Chrome, Browser::Firefox, Browser::Safari, Browser::Edge];

    /// Column name used in tables and error messages.
    pub const COLUMN: &'static str = "browser";

    /// Lowercase name as written in datasets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Safari => "safari",
            Browser::Edge => "edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chrome" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            "safari" => Ok(Browser::Safari),
            "edge" => Ok(Browser::Edge),
            _ => Err(ParseCategoryError {
                column: Self::COLUMN,
                value: s.to_string(),
            }),
        }
    }
}

/// Traffic source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Referrer {
    Direct,
    Search,
    Social,
    Email,
}

impl Referrer {
    /// Every declared value, in declaration order.
    pub const ALL: &'static [Referrer] = &[Referrer::Direct, Referrer::Search, Referrer::Social, Referrer::Email];

    /// Column name used in tables and error messages.
    pub const COLUMN: &'static str = "referrer";

    /// Lowercase name as written in datasets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Referrer::Direct => "direct",
            Referrer::Search => "search",
            Referrer::Social => "social",
            Referrer::Email => "email",
        }
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Referrer {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Referrer::Direct),
            "search" => Ok(Referrer::Search),
            "social" => Ok(Referrer::Social),
            "email" => Ok(Referrer::Email),
            _ => Err(ParseCategoryError {
                column: Self::COLUMN,
                value: s.to_string(),
            }),
        }
    }
}

/// One simulated user session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRecord {
    /// Session time, whole seconds.
    pub timestamp: DateTime<Utc>,
    /// Dwell time in seconds, never negative.
    pub time_on_screen: f64,
    /// The user bounced off the page.
    pub exited_screen: bool,
    /// Searches issued during the session.
    pub search_count: u32,
    /// Free-text query drawn from a [`Vocabulary`](crate::Vocabulary).
    pub search_term: String,
    pub device_type: DeviceType,
    pub browser: Browser,
    pub referrer: Referrer,
    /// Label: the session ended in a click.
    pub clicked: bool,
}

/// An ordered collection of interaction records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<InteractionRecord>,
}

impl Dataset {
    /// Wrap records, keeping their order.
    #[must_use]
    pub fn new(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }

    /// Return the records in order.
    #[must_use]
    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    /// Iterate over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, InteractionRecord> {
        self.records.iter()
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Return `true` when there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume into the underlying records.
    #[must_use]
    pub fn into_records(self) -> Vec<InteractionRecord> {
        self.records
    }
}

impl FromIterator<InteractionRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = InteractionRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a InteractionRecord;
    type IntoIter = std::slice::Iter<'a, InteractionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for &device in DeviceType::ALL {
            assert_eq!(device.as_str().parse::<DeviceType>().unwrap(), device);
        }
        for &browser in Browser::ALL {
            assert_eq!(browser.to_string().parse::<Browser>().unwrap(), browser);
        }
        for &referrer in Referrer::ALL {
            assert_eq!(referrer.as_str().parse::<Referrer>().unwrap(), referrer);
        }
    }

    #[test]
    fn unknown_name_reports_column() {
        let err = "opera".parse::<Browser>().unwrap_err();
        assert_eq!(err.column, "browser");
        assert_eq!(err.value, "opera");
        assert_eq!(err.to_string(), "unknown browser \"opera\"");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("Desktop".parse::<DeviceType>().is_err());
    }

    #[test]
    fn declared_vocabularies() {
        assert_eq!(DeviceType::ALL.len(), 3);
        assert_eq!(Browser::ALL.len(), 4);
        assert_eq!(Referrer::ALL.len(), 4);
        assert_eq!(Referrer::COLUMN, "referrer");
    }
}
