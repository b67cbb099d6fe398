//! Aggregates over a dataset: headline rates, click rate per category and
//! per day, term frequency, correlations, and row filters.
//!
//! Every function accepts an empty dataset and returns zeroed rates or
//! empty tables for it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::{Browser, Dataset, DeviceType, InteractionRecord};

/// Column order of [`correlation_matrix`].
pub const CORRELATION_COLUMNS: [&str; 4] = ["time_on_screen", "exited_screen", "search_count", "clicked"];

/// Headline metrics of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Number of records.
    pub n_samples: usize,
    /// Share of records that clicked.
    pub click_rate: f64,
    /// Mean dwell time in seconds.
    pub avg_time_on_screen: f64,
    /// Share of records that exited.
    pub bounce_rate: f64,
    /// Mean searches per session.
    pub avg_search_count: f64,
}

/// Categorical column to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    SearchTerm,
    DeviceType,
    Browser,
    Referrer,
}

impl Category {
    /// Column name as it appears in datasets.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Category::SearchTerm => "search_term",
            Category::DeviceType => DeviceType::COLUMN,
            Category::Browser => Browser::COLUMN,
            Category::Referrer => crate::record::Referrer::COLUMN,
        }
    }

    fn value_of(self, record: &InteractionRecord) -> &str {
        match self {
            Category::SearchTerm => &record.search_term,
            Category::DeviceType => record.device_type.as_str(),
            Category::Browser => record.browser.as_str(),
            Category::Referrer => record.referrer.as_str(),
        }
    }
}

/// Click rate of one category value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    pub value: String,
    pub click_rate: f64,
    /// Records carrying this value.
    pub count: usize,
}

/// Click rate of one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRate {
    pub date: NaiveDate,
    pub click_rate: f64,
    pub count: usize,
}

fn share(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Headline metrics: click rate, mean dwell time, bounce rate, mean searches.
#[must_use]
pub fn summary(dataset: &Dataset) -> DatasetSummary {
    let n = dataset.len();
    DatasetSummary {
        n_samples: n,
        click_rate: share(dataset.iter().filter(|r| r.clicked).count(), n),
        avg_time_on_screen: mean(dataset.iter().map(|r| r.time_on_screen)),
        bounce_rate: share(dataset.iter().filter(|r| r.exited_screen).count(), n),
        avg_search_count: mean(dataset.iter().map(|r| f64::from(r.search_count))),
    }
}

/// Click rate per value of `category`, sorted by value. Values absent from
/// the dataset are omitted.
#[must_use]
pub fn click_rate_by(dataset: &Dataset, category: Category) -> Vec<CategoryRate> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in dataset {
        let entry = groups.entry(category.value_of(record)).or_default();
        entry.0 += usize::from(record.clicked);
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(value, (clicks, count))| CategoryRate {
            value: value.to_string(),
            click_rate: share(clicks, count),
            count,
        })
        .collect()
}

/// Click rate per calendar day, oldest first.
#[must_use]
pub fn daily_click_rate(dataset: &Dataset) -> Vec<DailyRate> {
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for record in dataset {
        let entry = days.entry(record.timestamp.date_naive()).or_default();
        entry.0 += usize::from(record.clicked);
        entry.1 += 1;
    }
    days.into_iter()
        .map(|(date, (clicks, count))| DailyRate {
            date,
            click_rate: share(clicks, count),
            count,
        })
        .collect()
}

/// Occurrences of each search term, most frequent first, ties by term.
#[must_use]
pub fn search_frequency(dataset: &Dataset) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in dataset {
        *counts.entry(record.search_term.as_str()).or_default() += 1;
    }
    let mut frequency: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(term, count)| (term.to_string(), count))
        .collect();
    // Stable sort keeps the alphabetical order among equal counts.
    frequency.sort_by(|a, b| b.1.cmp(&a.1));
    frequency
}

/// Pearson correlation between the [`CORRELATION_COLUMNS`].
///
/// A column without variance correlates 0 with every other column and 1
/// with itself.
#[must_use]
pub fn correlation_matrix(dataset: &Dataset) -> [[f64; 4]; 4] {
    let columns: [Vec<f64>; 4] = [
        dataset.iter().map(|r| r.time_on_screen).collect(),
        dataset.iter().map(|r| f64::from(u8::from(r.exited_screen))).collect(),
        dataset.iter().map(|r| f64::from(r.search_count)).collect(),
        dataset.iter().map(|r| f64::from(u8::from(r.clicked))).collect(),
    ];
    let means: Vec<f64> = columns.iter().map(|c| mean(c.iter().copied())).collect();

    let mut matrix = [[0.0; 4]; 4];
    for i in 0..4 {
        matrix[i][i] = 1.0;
        for j in (i + 1)..4 {
            let (mut cov, mut var_i, mut var_j) = (0.0, 0.0, 0.0);
            for (x, y) in columns[i].iter().zip(&columns[j]) {
                let dx = x - means[i];
                let dy = y - means[j];
                cov += dx * dy;
                var_i += dx * dx;
                var_j += dy * dy;
            }
            let r = if var_i > 0.0 && var_j > 0.0 {
                (cov / (var_i * var_j).sqrt()).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

/// Row selection for exploring a dataset. An empty list keeps every value
/// of that column; `clicked: None` keeps both labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetFilter {
    pub devices: Vec<DeviceType>,
    pub browsers: Vec<Browser>,
    pub clicked: Option<bool>,
}

impl DatasetFilter {
    /// Return `true` if `record` passes every selection.
    #[must_use]
    pub fn matches(&self, record: &InteractionRecord) -> bool {
        (self.devices.is_empty() || self.devices.contains(&record.device_type))
            && (self.browsers.is_empty() || self.browsers.contains(&record.browser))
            && self.clicked.is_none_or(|clicked| record.clicked == clicked)
    }

    /// Copy the matching records, keeping their order.
    #[must_use]
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        dataset.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::record::Referrer;

    fn record(day: u32, device: DeviceType, browser: Browser, exited: bool, clicked: bool) -> InteractionRecord {
        InteractionRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
            time_on_screen: f64::from(day) * 100.0,
            exited_screen: exited,
            search_count: day,
            search_term: if day % 2 == 0 { "laptop" } else { "jeans" }.to_string(),
            device_type: device,
            browser,
            referrer: Referrer::Direct,
            clicked,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            record(1, DeviceType::Desktop, Browser::Chrome, false, true),
            record(1, DeviceType::Mobile, Browser::Safari, true, false),
            record(2, DeviceType::Desktop, Browser::Edge, false, false),
            record(3, DeviceType::Tablet, Browser::Chrome, false, true),
        ])
    }

    #[test]
    fn headline_metrics() {
        let s = summary(&sample());
        assert_eq!(s.n_samples, 4);
        assert!((s.click_rate - 0.5).abs() < 1e-12);
        assert!((s.bounce_rate - 0.25).abs() < 1e-12);
        assert!((s.avg_time_on_screen - 175.0).abs() < 1e-12);
        assert!((s.avg_search_count - 1.75).abs() < 1e-12);
    }

    #[test]
    fn empty_dataset_is_zeroed() {
        let empty = Dataset::default();
        let s = summary(&empty);
        assert_eq!(s.click_rate, 0.0);
        assert_eq!(s.avg_time_on_screen, 0.0);
        assert!(click_rate_by(&empty, Category::Browser).is_empty());
        assert!(daily_click_rate(&empty).is_empty());
        let corr = correlation_matrix(&empty);
        assert_eq!(corr[0][0], 1.0);
        assert_eq!(corr[0][3], 0.0);
    }

    #[test]
    fn rate_by_device_sorted_by_value() {
        let rates = click_rate_by(&sample(), Category::DeviceType);
        let values: Vec<&str> = rates.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, ["desktop", "mobile", "tablet"]);
        assert!((rates[0].click_rate - 0.5).abs() < 1e-12);
        assert_eq!(rates[0].count, 2);
        assert_eq!(rates[1].click_rate, 0.0);
    }

    #[test]
    fn daily_rates_oldest_first() {
        let days = daily_click_rate(&sample());
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].count, 2);
        assert!((days[0].click_rate - 0.5).abs() < 1e-12);
        assert_eq!(days[2].click_rate, 1.0);
    }

    #[test]
    fn frequency_ties_break_by_term() {
        let freq = search_frequency(&sample());
        assert_eq!(freq, vec![("jeans".to_string(), 3), ("laptop".to_string(), 1)]);
    }

    #[test]
    fn correlation_is_symmetric_and_bounded() {
        let corr = correlation_matrix(&sample());
        for i in 0..4 {
            assert_eq!(corr[i][i], 1.0);
            for j in 0..4 {
                assert_eq!(corr[i][j], corr[j][i]);
                assert!((-1.0..=1.0).contains(&corr[i][j]));
            }
        }
        // time_on_screen and search_count are both proportional to the day.
        assert!((corr[0][2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_column_has_zero_correlation() {
        let dataset = Dataset::new(vec![
            record(1, DeviceType::Desktop, Browser::Chrome, false, false),
            record(2, DeviceType::Desktop, Browser::Chrome, false, false),
        ]);
        let corr = correlation_matrix(&dataset);
        assert_eq!(corr[1][0], 0.0);
        assert_eq!(corr[3][2], 0.0);
        assert_eq!(corr[3][3], 1.0);
    }

    #[test]
    fn filter_selections_combine() {
        let data = sample();
        assert_eq!(DatasetFilter::default().apply(&data), data);

        let desktop_clicks = DatasetFilter {
            devices: vec![DeviceType::Desktop],
            clicked: Some(true),
            ..DatasetFilter::default()
        }
        .apply(&data);
        assert_eq!(desktop_clicks.len(), 1);
        assert_eq!(desktop_clicks.records()[0].browser, Browser::Chrome);

        let chrome_or_edge = DatasetFilter {
            browsers: vec![Browser::Chrome, Browser::Edge],
            ..DatasetFilter::default()
        }
        .apply(&data);
        assert_eq!(chrome_or_edge.len(), 3);
    }
}
