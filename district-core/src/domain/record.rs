//! Transaction records and region datasets

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use url::Url;

use super::dimension::DimensionLabel;
use super::result::{Error, Result};

/// One aggregated card-transaction bucket
///
/// Coded columns are stored already normalized; the raw code is not kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub region: String,
    pub major_category: String,
    pub minor_category: String,
    pub gender: String,
    pub age: DimensionLabel,
    pub weekday: DimensionLabel,
    pub hour: DimensionLabel,
    pub amount: Decimal,
    pub count: u64,
}

impl TransactionRecord {
    /// Calendar month (1..=12)
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// A calendar month within a specific year, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Handle passed in from region selection: either a dataset key resolved
/// against the local data directory, or an HTTP(S) URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionId {
    Key(String),
    Url(Url),
}

impl RegionId {
    /// Parse a region handle. An empty handle means no region was selected.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::precondition(
                "No region selected. Select a region first.",
            ));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| Error::validation(format!("Invalid region URL '{}': {}", raw, e)))?;
            return Ok(RegionId::Url(url));
        }

        if raw.contains("://") {
            return Err(Error::validation(format!(
                "Unsupported region URL scheme: {}",
                raw
            )));
        }

        // Keys name a file or directory directly under the data directory
        if raw.contains('/') || raw.contains('\\') || raw == "." || raw == ".." {
            return Err(Error::validation(format!("Invalid region key: {}", raw)));
        }

        Ok(RegionId::Key(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionId::Key(k) => k,
            RegionId::Url(u) => u.as_str(),
        }
    }

    /// Short name for display and for text enrichment: the key itself, or
    /// the last path segment of a URL without its extension
    pub fn display_name(&self) -> String {
        match self {
            RegionId::Key(k) => k.clone(),
            RegionId::Url(u) => u
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(|s| s.split('.').next().unwrap_or(s).to_string())
                .unwrap_or_else(|| u.host_str().unwrap_or("").to_string()),
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every transaction record loaded for one region
#[derive(Debug, Clone)]
pub struct RegionDataset {
    region: RegionId,
    records: Vec<TransactionRecord>,
}

impl RegionDataset {
    pub fn new(region: RegionId, records: Vec<TransactionRecord>) -> Self {
        Self { region, records }
    }

    /// Dataset returned alongside a load failure
    pub fn empty(region: RegionId) -> Self {
        Self {
            region,
            records: Vec::new(),
        }
    }

    pub fn region(&self) -> &RegionId {
        &self.region
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_amount(&self) -> Decimal {
        self.records.iter().map(|r| r.amount).sum()
    }

    /// Distinct major categories, sorted
    pub fn major_categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.major_category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct minor categories of one major category, sorted
    pub fn minor_categories(&self, major: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.major_category == major)
            .map(|r| r.minor_category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dimension::Dimension;

    fn record(major: &str, minor: &str, amount: i64) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            region: "11110515".to_string(),
            major_category: major.to_string(),
            minor_category: minor.to_string(),
            gender: "F".to_string(),
            age: Dimension::AgeBracket.from_code(3),
            weekday: Dimension::Weekday.from_code(2),
            hour: Dimension::HourBucket.from_code(4),
            amount: Decimal::new(amount, 0),
            count: 1,
        }
    }

    #[test]
    fn test_region_id_parse() {
        assert_eq!(
            RegionId::parse(" 11110515 ").unwrap(),
            RegionId::Key("11110515".to_string())
        );
        assert!(matches!(
            RegionId::parse("https://example.com/data/jongno.csv").unwrap(),
            RegionId::Url(_)
        ));
        assert!(matches!(RegionId::parse(""), Err(Error::Precondition(_))));
        assert!(matches!(RegionId::parse("../etc"), Err(Error::Validation(_))));
        assert!(matches!(RegionId::parse("ftp://x/y"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_region_display_name() {
        let url = RegionId::parse("https://example.com/data/jongno.csv").unwrap();
        assert_eq!(url.display_name(), "jongno");
        let key = RegionId::parse("종로구").unwrap();
        assert_eq!(key.display_name(), "종로구");
    }

    #[test]
    fn test_year_month_display_and_order() {
        let jan = YearMonth { year: 2024, month: 1 };
        let dec = YearMonth { year: 2023, month: 12 };
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2024-01");
    }

    #[test]
    fn test_category_catalogue() {
        let dataset = RegionDataset::new(
            RegionId::Key("r".to_string()),
            vec![
                record("음식", "한식", 10),
                record("소매", "편의점", 20),
                record("음식", "카페", 30),
                record("음식", "한식", 40),
            ],
        );
        assert_eq!(dataset.major_categories(), vec!["소매", "음식"]);
        assert_eq!(dataset.minor_categories("음식"), vec!["카페", "한식"]);
        assert!(dataset.minor_categories("없음").is_empty());
        assert_eq!(dataset.total_amount(), Decimal::new(100, 0));
    }
}
