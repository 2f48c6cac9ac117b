//! Core domain entities
//!
//! Records, dimension normalization, selection, aggregation, insight
//! derivation and the report document model. Pure data and computation -
//! no I/O or external services.

pub mod aggregate;
pub mod dimension;
pub mod insight;
mod record;
pub mod report;
pub mod result;
mod selection;

pub use aggregate::{aggregate, GroupKey, KeyValue, Measure, MeasureValue, Summary, SummaryRow};
pub use dimension::{Dimension, DimensionLabel, UNKNOWN_LABEL};
pub use insight::{InsightSet, MonthSeason, Peak, SalesAverage, Season, Segment};
pub use record::{RegionDataset, RegionId, TransactionRecord, YearMonth};
pub use report::{ChartImage, ImageFormat, ReportDocument, ReportSection};
pub use selection::{FilteredView, Selection, MAX_COMPARED_MINORS};
