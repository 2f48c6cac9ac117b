//! Configuration management
//!
//! Settings live in `settings.json` inside the district directory:
//! ```json
//! {
//!   "dataDir": "/srv/district/data",
//!   "columnMappings": { "date": "ta_ymd", "amount": "amt", ... },
//!   "sample": { "rows": 50000, "seed": 42 },
//!   "report": { "fontPath": "fonts/NotoSansKR-Regular.ttf" },
//!   "enrichment": { "model": "gpt-4o", "timeoutSecs": 30 }
//! }
//! ```
//!
//! The text-service credential is never stored here; it comes from
//! `OPENAI_API_KEY` in the process environment.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the report font path
pub const FONT_PATH_ENV: &str = "DISTRICT_FONT_PATH";

/// Environment variable holding the text-service API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    column_mappings: Option<ColumnMappings>,
    #[serde(default)]
    sample: Option<SampleConfig>,
    #[serde(default)]
    report: ReportSettings,
    #[serde(default)]
    enrichment: Option<EnrichmentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportSettings {
    #[serde(default)]
    font_path: Option<PathBuf>,
}

/// District configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub column_mappings: ColumnMappings,
    pub sample: Option<SampleConfig>,
    pub font_path: PathBuf,
    pub enrichment: EnrichmentConfig,
}

impl Config {
    /// Defaults relative to a district directory
    pub fn defaults_for(district_dir: &Path) -> Self {
        Self {
            data_dir: district_dir.join("data"),
            column_mappings: ColumnMappings::default(),
            sample: None,
            font_path: district_dir.join("fonts").join("NotoSansKR-Regular.ttf"),
            enrichment: EnrichmentConfig::default(),
        }
    }

    /// Load config from the district directory
    ///
    /// Relative paths in the file are resolved against the directory.
    /// `DISTRICT_FONT_PATH` overrides the configured font.
    pub fn load(district_dir: &Path) -> Result<Self> {
        let settings_path = district_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)?
        } else {
            SettingsFile::default()
        };

        let defaults = Self::defaults_for(district_dir);
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                district_dir.join(p)
            }
        };

        let font_path = match std::env::var(FONT_PATH_ENV).ok().filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => raw
                .report
                .font_path
                .as_deref()
                .map(resolve)
                .unwrap_or(defaults.font_path),
        };

        Ok(Self {
            data_dir: raw.data_dir.as_deref().map(resolve).unwrap_or(defaults.data_dir),
            column_mappings: raw.column_mappings.unwrap_or_default(),
            sample: raw.sample,
            font_path,
            enrichment: raw.enrichment.unwrap_or_default(),
        })
    }

    /// API key for the text service, if present in the environment
    pub fn api_key() -> Option<String> {
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
    }
}

/// Source column names of the card dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMappings {
    pub date: String,
    pub region: String,
    pub major_category: String,
    pub minor_category: String,
    pub gender: String,
    pub age: String,
    pub weekday: String,
    pub hour: String,
    pub amount: String,
    pub count: String,
}

impl Default for ColumnMappings {
    fn default() -> Self {
        Self {
            date: "ta_ymd".to_string(),
            region: "admi_cty_no".to_string(),
            major_category: "card_tpbuz_nm_1".to_string(),
            minor_category: "card_tpbuz_nm_2".to_string(),
            gender: "sex".to_string(),
            age: "age".to_string(),
            weekday: "day".to_string(),
            hour: "hour".to_string(),
            amount: "amt".to_string(),
            count: "cnt".to_string(),
        }
    }
}

/// Seeded row sampling applied to a combined dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub rows: usize,
    #[serde(default)]
    pub seed: u64,
}

/// Text enrichment service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.data_dir, dir.path().join("data"));
        assert_eq!(config.column_mappings.amount, "amt");
        assert_eq!(config.enrichment.model, "gpt-4o");
        assert!(config.sample.is_none());
    }

    #[test]
    fn test_relative_paths_and_partial_sections() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{
                "dataDir": "samples",
                "sample": { "rows": 10 },
                "enrichment": { "timeoutSecs": 5 },
                "theme": "dark"
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.data_dir, dir.path().join("samples"));
        assert_eq!(config.sample, Some(SampleConfig { rows: 10, seed: 0 }));
        assert_eq!(config.enrichment.timeout_secs, 5);
        assert_eq!(config.enrichment.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_malformed_settings_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
