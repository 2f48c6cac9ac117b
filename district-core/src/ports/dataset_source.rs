//! Dataset source port
//!
//! Fetches the raw card-sales rows for one region, either from local
//! files or a remote CSV.

use crate::domain::result::Result;
use crate::domain::{RegionId, TransactionRecord};

/// Source of per-region transaction rows
///
/// Implementations perform a single attempt per call and return
/// `Error::NotFound` when the region has no dataset, `Error::Load` when
/// the data exists but cannot be read or parsed.
pub trait DatasetSource: Send + Sync {
    /// Source name (e.g., "csv")
    fn name(&self) -> &str;

    /// Fetch every row for the region
    fn fetch(&self, region: &RegionId) -> Result<Vec<TransactionRecord>>;

    /// Region keys this source can list, if it can enumerate them
    fn available_regions(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
