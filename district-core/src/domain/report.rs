//! Report document model
//!
//! A report is an ordered list of sections: one title page holding the
//! title and every insight bullet, then one page per chart image.
//! Rendering to bytes is done by a [`crate::ports::DocumentRenderer`].

use serde::Serialize;

use super::result::{Error, Result};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect the format from the leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }
}

/// An already-rendered chart image
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub caption: Option<String>,
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ChartImage {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::sniff(&bytes).ok_or_else(|| {
            Error::validation("Chart image must be a PNG or JPEG file")
        })?;
        Ok(Self {
            caption: None,
            bytes,
            format,
        })
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportSection {
    TitlePage { title: String, insights: Vec<String> },
    Chart(ChartImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn build(title: &str, insights: Vec<String>, charts: Vec<ChartImage>) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::validation("Report title cannot be empty"));
        }

        let mut sections = Vec::with_capacity(charts.len() + 1);
        sections.push(ReportSection::TitlePage {
            title: title.to_string(),
            insights,
        });
        sections.extend(charts.into_iter().map(ReportSection::Chart));

        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn title(&self) -> &str {
        match self.sections.first() {
            Some(ReportSection::TitlePage { title, .. }) => title,
            _ => "",
        }
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartImage> {
        self.sections.iter().filter_map(|s| match s {
            ReportSection::Chart(c) => Some(c),
            _ => None,
        })
    }

    /// Every piece of text the renderer will draw
    pub fn text(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for section in &self.sections {
            match section {
                ReportSection::TitlePage { title, insights } => {
                    out.push(title.as_str());
                    out.extend(insights.iter().map(String::as_str));
                }
                ReportSection::Chart(chart) => {
                    if let Some(caption) = &chart.caption {
                        out.push(caption.as_str());
                    }
                }
            }
        }
        out
    }
}
