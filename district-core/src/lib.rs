//! District Core - commercial-district card sales analytics
//!
//! Hexagonal layout:
//!
//! - **domain**: records, dimension normalization, selections, aggregation,
//!   insights and the report document model
//! - **ports**: traits for the dataset source, region describer and renderer
//! - **services**: loading/caching, analysis bundles, enrichment, reports, event log
//! - **adapters**: CSV/HTTP dataset source, chat-completion client, PDF renderer

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use adapters::{CsvDatasetSource, OpenAiDescriber};
use config::Config;
use ports::{DatasetSource, RegionDescriber};
use services::*;

pub use domain::result::{Error, OperationResult};
pub use domain::{
    FilteredView, InsightSet, RegionDataset, RegionId, Selection, Summary, TransactionRecord,
};

/// One analysis session
///
/// Owns the configuration, the dataset cache and the services. The
/// current region and category selection live here instead of in global
/// state; switching region clears the category selection but keeps
/// every region already cached.
pub struct DistrictContext {
    pub config: Config,
    loader: DataLoader,
    pub analysis: AnalysisService,
    pub enrichment: EnrichmentService,
    pub report_service: ReportService,
    region: Option<RegionId>,
    selection: Option<Selection>,
}

impl DistrictContext {
    /// Create a context from the settings in `district_dir`
    ///
    /// Text enrichment is enabled only when the API key is present in the
    /// environment.
    pub fn new(district_dir: &Path) -> Result<Self> {
        let config = Config::load(district_dir)?;
        let source: Arc<dyn DatasetSource> = Arc::new(CsvDatasetSource::new(&config)?);

        let describer: Option<Arc<dyn RegionDescriber>> = match OpenAiDescriber::from_config(&config) {
            Ok(d) => Some(Arc::new(d)),
            Err(e) => {
                debug!(reason = %e, "region descriptions disabled");
                None
            }
        };

        Ok(Self::with_parts(config, source, describer))
    }

    /// Assemble a context from explicit collaborators
    pub fn with_parts(
        config: Config,
        source: Arc<dyn DatasetSource>,
        describer: Option<Arc<dyn RegionDescriber>>,
    ) -> Self {
        let report_service = ReportService::new(config.font_path.clone());
        Self {
            loader: DataLoader::new(source),
            analysis: AnalysisService::new(),
            enrichment: EnrichmentService::new(describer),
            report_service,
            config,
            region: None,
            selection: None,
        }
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    /// Region keys the dataset source can enumerate
    pub fn available_regions(&self) -> domain::result::Result<Vec<String>> {
        self.loader.source().available_regions()
    }

    /// Make `raw` the current region and load it
    ///
    /// A malformed handle is an error; a handle that does not resolve
    /// yields an outcome with an empty dataset and the failure.
    pub fn select_region(&mut self, raw: &str) -> domain::result::Result<LoadOutcome> {
        let region = RegionId::parse(raw)?;
        if self.region.as_ref() != Some(&region) {
            self.selection = None;
        }
        let outcome = self.loader.load(&region);
        self.region = Some(region);
        Ok(outcome)
    }

    /// Dataset of the current region
    pub fn dataset(&self) -> domain::result::Result<Arc<RegionDataset>> {
        let region = self
            .region
            .as_ref()
            .ok_or_else(|| Error::precondition("No region selected. Select a region first."))?;
        let dataset = self.loader.cache().get(region).ok_or_else(|| {
            Error::precondition(format!("No dataset loaded for region '{}'", region))
        })?;
        Ok(dataset)
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// View of the current region for the current selection
    pub fn current_view(&self) -> domain::result::Result<FilteredView> {
        let selection = self
            .selection
            .clone()
            .ok_or_else(|| Error::precondition("No business category selected."))?;
        self.view(selection)
    }

    /// View of the current region for an explicit selection
    pub fn view(&self, selection: Selection) -> domain::result::Result<FilteredView> {
        Ok(FilteredView::new(self.dataset()?, selection))
    }

    pub fn categories(&self) -> domain::result::Result<CategoryCatalogue> {
        let dataset = self.dataset()?;
        self.analysis.categories(&dataset)
    }

    /// Title-page sentences: insights, then the region blurb if any
    pub fn report_sentences(&self, insights: &InsightSet, blurb: Option<&RegionBlurb>) -> Vec<String> {
        let mut sentences = insights.sentences();
        if let Some(blurb) = blurb {
            sentences.push(blurb.sentence());
        }
        sentences
    }
}
