//! Service layer - orchestration over domain logic and ports

pub mod analysis;
pub mod enrichment;
pub mod loader;
pub mod logging;
pub mod report;

pub use analysis::{
    AnalysisService, CategoryCatalogue, CategoryEntry, ComparisonBundle, GenderShare,
    OverviewBundle, ReportBundle,
};
pub use enrichment::{EnrichmentService, RegionBlurb};
pub use loader::{DataLoader, DatasetCache, LoadOutcome, RegionInfo};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use report::{charts_from_bytes, ReportService};
