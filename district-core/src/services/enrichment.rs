//! Enrichment service - region blurbs that never fail the caller
//!
//! Any describer failure, or a missing describer, is turned into
//! placeholder text flagged as degraded.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::result::Error;
use crate::ports::RegionDescriber;

/// Placeholder shown when no API key is configured
pub const UNAVAILABLE_TEXT: &str = "지역 정보를 사용할 수 없습니다 (API 키가 설정되지 않았습니다).";

/// Descriptive text for a region, possibly a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionBlurb {
    pub region: String,
    pub text: String,
    /// True when `text` is a placeholder rather than a description
    pub degraded: bool,
    #[serde(skip)]
    pub failure: Option<String>,
}

impl RegionBlurb {
    /// Sentence used on the report title page
    pub fn sentence(&self) -> String {
        format!("{}: {}", self.region, self.text)
    }
}

pub fn failure_placeholder(error: &Error) -> String {
    format!("정보를 가져오는 데 실패했습니다: {}", error)
}

pub struct EnrichmentService {
    describer: Option<Arc<dyn RegionDescriber>>,
}

impl EnrichmentService {
    pub fn new(describer: Option<Arc<dyn RegionDescriber>>) -> Self {
        Self { describer }
    }

    pub fn is_available(&self) -> bool {
        self.describer.is_some()
    }

    /// Describe a region, degrading every failure to placeholder text
    pub fn describe_or_placeholder(&self, region_name: &str) -> RegionBlurb {
        let Some(describer) = &self.describer else {
            return RegionBlurb {
                region: region_name.to_string(),
                text: UNAVAILABLE_TEXT.to_string(),
                degraded: true,
                failure: Some("no API key configured".to_string()),
            };
        };

        let started = Instant::now();
        match describer.describe(region_name) {
            Ok(text) => {
                info!(
                    describer = describer.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "region description received"
                );
                RegionBlurb {
                    region: region_name.to_string(),
                    text,
                    degraded: false,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(describer = describer.name(), error = %e, "region description failed");
                RegionBlurb {
                    region: region_name.to_string(),
                    text: failure_placeholder(&e),
                    degraded: true,
                    failure: Some(e.to_string()),
                }
            }
        }
    }

    /// Blurbs for several regions, in input order
    pub fn describe_all(&self, region_names: &[String]) -> Vec<RegionBlurb> {
        region_names
            .iter()
            .map(|name| self.describe_or_placeholder(name))
            .collect()
    }
}
