//! Data loader - per-region dataset resolution with a session cache

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{RegionDataset, RegionId};
use crate::ports::DatasetSource;

/// Loaded datasets keyed by region, shared across callers
///
/// Concurrent loads of the same key may both write; the last write wins
/// and either dataset is equivalent since sources are read-only.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<RegionId, Arc<RegionDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region: &RegionId) -> Option<Arc<RegionDataset>> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(region).cloned())
    }

    pub fn insert(&self, dataset: Arc<RegionDataset>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;
        entries.insert(dataset.region().clone(), dataset);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a non-failing load
///
/// On failure `dataset` is empty for the requested region and `failure`
/// holds the reason. Failed loads are never cached.
#[derive(Debug)]
pub struct LoadOutcome {
    pub dataset: Arc<RegionDataset>,
    pub failure: Option<Error>,
    pub from_cache: bool,
}

/// Summary of a loaded region for display
#[derive(Debug, Clone, Serialize)]
pub struct RegionInfo {
    pub region: String,
    pub name: String,
    pub rows: usize,
    pub major_categories: usize,
}

impl RegionInfo {
    pub fn of(dataset: &RegionDataset) -> Self {
        Self {
            region: dataset.region().to_string(),
            name: dataset.region().display_name(),
            rows: dataset.len(),
            major_categories: dataset.major_categories().len(),
        }
    }
}

pub struct DataLoader {
    source: Arc<dyn DatasetSource>,
    cache: DatasetCache,
}

impl DataLoader {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            cache: DatasetCache::new(),
        }
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn source(&self) -> &Arc<dyn DatasetSource> {
        &self.source
    }

    /// Resolve a region to its dataset, serving repeats from the cache
    pub fn load(&self, region: &RegionId) -> LoadOutcome {
        if let Some(dataset) = self.cache.get(region) {
            return LoadOutcome {
                dataset,
                failure: None,
                from_cache: true,
            };
        }

        let started = Instant::now();
        match self.source.fetch(region) {
            Ok(records) => {
                let dataset = Arc::new(RegionDataset::new(region.clone(), records));
                if let Err(e) = self.cache.insert(dataset.clone()) {
                    warn!(region = %region, error = %e, "dataset not cached");
                }
                info!(
                    region = %region,
                    rows = dataset.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "region loaded"
                );
                LoadOutcome {
                    dataset,
                    failure: None,
                    from_cache: false,
                }
            }
            Err(e) => {
                warn!(region = %region, error = %e, "region load failed");
                LoadOutcome {
                    dataset: Arc::new(RegionDataset::empty(region.clone())),
                    failure: Some(e),
                    from_cache: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dimension::{Dimension, UNKNOWN_LABEL};
    use crate::domain::TransactionRecord;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: AtomicUsize,
    }

    impl DatasetSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self, region: &RegionId) -> Result<Vec<TransactionRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if region.as_str() == "missing" {
                return Err(Error::not_found("No dataset for region 'missing'"));
            }
            Ok(vec![TransactionRecord {
                date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                region: region.as_str().to_string(),
                major_category: "음식".to_string(),
                minor_category: "한식".to_string(),
                gender: "M".to_string(),
                age: Dimension::AgeBracket.from_code(3),
                weekday: Dimension::Weekday.from_code(1),
                hour: Dimension::HourBucket.from_code(3),
                amount: Decimal::from(100),
                count: 1,
            }])
        }
    }

    fn loader() -> (Arc<CountingSource>, DataLoader) {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
        });
        (source.clone(), DataLoader::new(source))
    }

    #[test]
    fn test_repeat_loads_hit_cache() {
        let (source, loader) = loader();
        let region = RegionId::parse("gangnam").unwrap();

        let first = loader.load(&region);
        assert!(first.failure.is_none());
        assert!(!first.from_cache);

        let second = loader.load(&region);
        assert!(second.from_cache);
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_returns_empty_and_is_not_cached() {
        let (source, loader) = loader();
        let region = RegionId::parse("missing").unwrap();

        let outcome = loader.load(&region);
        assert!(outcome.dataset.is_empty());
        assert!(matches!(outcome.failure, Some(Error::NotFound(_))));
        assert!(loader.cache().get(&region).is_none());

        assert!(loader.load(&region).failure.is_some());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_regions_are_cached_independently() {
        let (_, loader) = loader();
        let a = RegionId::parse("a").unwrap();
        let b = RegionId::parse("b").unwrap();
        loader.load(&a);
        loader.load(&b);
        assert_eq!(loader.cache().len(), 2);
        assert_eq!(loader.cache().get(&a).unwrap().region(), &a);
        assert_eq!(loader.cache().get(&b).unwrap().region(), &b);
    }

    #[test]
    fn test_concurrent_loads_share_cache() {
        let (_, loader) = loader();
        let loader = Arc::new(loader);
        let region = RegionId::parse("gangnam").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                let region = region.clone();
                std::thread::spawn(move || loader.load(&region).dataset.len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(loader.cache().len(), 1);
        assert_eq!(loader.load(&region).dataset.records()[0].minor_category, "한식");
        assert_ne!(loader.load(&region).dataset.records()[0].minor_category, UNKNOWN_LABEL);
    }

    #[test]
    fn test_region_info() {
        let (_, loader) = loader();
        let dataset = loader.load(&RegionId::parse("gangnam").unwrap()).dataset;
        let info = RegionInfo::of(&dataset);
        assert_eq!(info.name, "gangnam");
        assert_eq!(info.rows, 1);
        assert_eq!(info.major_categories, 1);
    }
}
