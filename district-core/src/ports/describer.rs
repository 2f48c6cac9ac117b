//! Region description port

use crate::domain::result::Result;

/// Produces a short descriptive sentence about a region
///
/// Failures are reported as `Error::Enrichment`; callers degrade them to
/// placeholder text instead of aborting.
pub trait RegionDescriber: Send + Sync {
    fn name(&self) -> &str;

    fn describe(&self, region_name: &str) -> Result<String>;
}
