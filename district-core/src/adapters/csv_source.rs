//! CSV dataset source
//!
//! A region key resolves against the data directory to either
//! `<data_dir>/<key>.csv` or every `*.csv` file in `<data_dir>/<key>/`
//! (combined in file-name order). A region URL is fetched with a single
//! blocking GET and parsed the same way.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::blocking::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};
use url::Url;

use crate::config::{ColumnMappings, Config, SampleConfig};
use crate::domain::dimension::normalize_gender;
use crate::domain::result::{Error, Result};
use crate::domain::{Dimension, RegionId, TransactionRecord, UNKNOWN_LABEL};
use crate::ports::DatasetSource;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Column positions resolved from a header row
struct ColumnIndex {
    date: usize,
    region: usize,
    major_category: usize,
    minor_category: usize,
    gender: usize,
    age: usize,
    weekday: usize,
    hour: usize,
    amount: usize,
    count: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, mappings: &ColumnMappings, source: &str) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let wanted = [
            &mappings.date,
            &mappings.region,
            &mappings.major_category,
            &mappings.minor_category,
            &mappings.gender,
            &mappings.age,
            &mappings.weekday,
            &mappings.hour,
            &mappings.amount,
            &mappings.count,
        ];
        let missing: Vec<&str> = wanted
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::load(format!(
                "{}: missing required columns: {}",
                source,
                missing.join(", ")
            )));
        }

        let idx = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            date: idx(&mappings.date),
            region: idx(&mappings.region),
            major_category: idx(&mappings.major_category),
            minor_category: idx(&mappings.minor_category),
            gender: idx(&mappings.gender),
            age: idx(&mappings.age),
            weekday: idx(&mappings.weekday),
            hour: idx(&mappings.hour),
            amount: idx(&mappings.amount),
            count: idx(&mappings.count),
        })
    }
}

/// Parse card-sales CSV content into normalized records
///
/// Every mapped column must be present. A row whose date, amount or
/// count cannot be parsed fails the whole read with its line number;
/// unmapped dimension codes become the unknown label.
pub fn parse_records<R: Read>(
    reader: R,
    source: &str,
    mappings: &ColumnMappings,
) -> Result<Vec<TransactionRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| Error::load(format!("{}: {}", source, e)))?
        .clone();
    let columns = ColumnIndex::resolve(&headers, mappings, source)?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row = row.map_err(|e| Error::load(format!("{}: line {}: {}", source, line, e)))?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();
        let bad = |what: &str, value: &str| {
            Error::load(format!("{}: line {}: invalid {} '{}'", source, line, what, value))
        };

        let date = parse_date(cell(columns.date)).ok_or_else(|| bad("date", cell(columns.date)))?;
        let amount = parse_amount(cell(columns.amount))
            .ok_or_else(|| bad("amount", cell(columns.amount)))?;
        let count = parse_count(cell(columns.count))
            .ok_or_else(|| bad("count", cell(columns.count)))?;

        records.push(TransactionRecord {
            date,
            region: cell(columns.region).to_string(),
            major_category: category(cell(columns.major_category)),
            minor_category: category(cell(columns.minor_category)),
            gender: normalize_gender(cell(columns.gender)),
            age: Dimension::AgeBracket.normalize(cell(columns.age)),
            weekday: Dimension::Weekday.normalize(cell(columns.weekday)),
            hour: Dimension::HourBucket.normalize(cell(columns.hour)),
            amount,
            count,
        });
    }

    Ok(records)
}

fn category(raw: &str) -> String {
    if raw.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        raw.to_string()
    }
}

/// `YYYYMMDD`, with ISO dates accepted as well
fn parse_date(s: &str) -> Option<NaiveDate> {
    ["%Y%m%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&cleaned).ok())
}

/// Whole, non-negative counts that fit a `u64`; `"3.0"` and `"3e2"` are accepted
fn parse_count(s: &str) -> Option<u64> {
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    let value = parse_amount(s)?;
    if !value.fract().is_zero() {
        return None;
    }
    value.to_u64()
}

/// Reduce rows to a seeded random sample, keeping source order
pub fn sample_rows(records: Vec<TransactionRecord>, sample: &SampleConfig) -> Vec<TransactionRecord> {
    if sample.rows == 0 || records.len() <= sample.rows {
        return records;
    }

    let mut rng = StdRng::seed_from_u64(sample.seed);
    let mut picked = rand::seq::index::sample(&mut rng, records.len(), sample.rows).into_vec();
    picked.sort_unstable();

    let mut picked = picked.into_iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if picked.peek() == Some(&i) {
                picked.next();
                Some(record)
            } else {
                None
            }
        })
        .collect()
}

/// Dataset source backed by local CSV files or remote CSV URLs
#[derive(Debug)]
pub struct CsvDatasetSource {
    data_dir: PathBuf,
    mappings: ColumnMappings,
    sample: Option<SampleConfig>,
    client: Client,
}

impl CsvDatasetSource {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_settings(
            config.data_dir.clone(),
            config.column_mappings.clone(),
            config.sample,
            Duration::from_secs(FETCH_TIMEOUT_SECS),
        )
    }

    pub fn with_settings(
        data_dir: PathBuf,
        mappings: ColumnMappings,
        sample: Option<SampleConfig>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            data_dir,
            mappings,
            sample,
            client,
        })
    }

    /// Files backing a region key, in combination order
    pub fn local_files(&self, key: &str) -> Result<Vec<PathBuf>> {
        let single = self.data_dir.join(format!("{}.csv", key));
        if single.is_file() {
            return Ok(vec![single]);
        }

        let dir = self.data_dir.join(key);
        if !dir.is_dir() {
            return Err(Error::not_found(format!("No dataset for region '{}'", key)));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(|e| Error::load(format!("{}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_csv_extension(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(Error::not_found(format!(
                "No CSV files for region '{}' in {}",
                key,
                dir.display()
            )));
        }
        Ok(files)
    }

    fn fetch_local(&self, key: &str) -> Result<Vec<TransactionRecord>> {
        let mut combined = Vec::new();
        for path in self.local_files(key)? {
            let file = File::open(&path)
                .map_err(|e| Error::load(format!("{}: {}", path.display(), e)))?;
            let rows = parse_records(file, &path.display().to_string(), &self.mappings)?;
            debug!(file = %path.display(), rows = rows.len(), "parsed dataset file");
            combined.extend(rows);
        }
        Ok(combined)
    }

    fn fetch_remote(&self, url: &Url) -> Result<Vec<TransactionRecord>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| map_request_error(url, e))?;

        match response.status().as_u16() {
            200..=299 => {}
            404 => return Err(Error::not_found(format!("No dataset at {}", url))),
            status => {
                return Err(Error::load(format!("{}: HTTP {}", url, status)));
            }
        }

        let body = response
            .bytes()
            .map_err(|e| Error::load(format!("{}: failed to read body: {}", url, e)))?;
        parse_records(body.as_ref(), url.as_str(), &self.mappings)
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn map_request_error(url: &Url, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::load(format!("{}: request timed out", url))
    } else if error.is_connect() {
        Error::load(format!("{}: unable to connect", url))
    } else {
        Error::load(format!("{}: request failed: {}", url, error))
    }
}

impl DatasetSource for CsvDatasetSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, region: &RegionId) -> Result<Vec<TransactionRecord>> {
        let records = match region {
            RegionId::Key(key) => self.fetch_local(key)?,
            RegionId::Url(url) => self.fetch_remote(url)?,
        };

        let total = records.len();
        let records = match &self.sample {
            Some(sample) => sample_rows(records, sample),
            None => records,
        };
        info!(region = %region, rows = records.len(), total, "fetched region dataset");
        Ok(records)
    }

    /// Region keys available under the data directory
    fn available_regions(&self) -> Result<Vec<String>> {
        if !self.data_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = std::fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|p| {
                if p.is_dir() || has_csv_extension(&p) {
                    p.file_stem().map(|s| s.to_string_lossy().into_owned())
                } else {
                    None
                }
            })
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
