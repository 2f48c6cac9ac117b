//! Report service - assembles and renders the PDF report
//!
//! At most one report is built at a time per service. A second request
//! while one is in flight is refused with `Error::ReportInProgress`
//! instead of waiting.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::adapters::PdfRenderer;
use crate::domain::result::{Error, Result};
use crate::domain::{ChartImage, ReportDocument, Selection};
use crate::ports::DocumentRenderer;

/// Clears the in-flight flag when the build ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::ReportInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wrap raw image buffers, rejecting anything that is not PNG or JPEG
pub fn charts_from_bytes(buffers: Vec<Vec<u8>>) -> Result<Vec<ChartImage>> {
    buffers
        .into_iter()
        .enumerate()
        .map(|(i, bytes)| {
            ChartImage::new(bytes)
                .map_err(|e| Error::validation(format!("Chart {}: {}", i + 1, e)))
        })
        .collect()
}

pub struct ReportService {
    font_path: PathBuf,
    in_flight: AtomicBool,
}

impl ReportService {
    pub fn new(font_path: PathBuf) -> Self {
        Self {
            font_path,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Title used for a subcategory report
    pub fn default_title(selection: &Selection) -> String {
        format!("{} 업종 창업 보고서", selection.describe())
    }

    /// Build the PDF with the configured embedded font
    ///
    /// The font is loaded per build, so a missing font fails this report
    /// only.
    pub fn build(&self, title: &str, insights: Vec<String>, charts: Vec<ChartImage>) -> Result<Vec<u8>> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let renderer = PdfRenderer::from_font_path(&self.font_path)?;
        Self::render(&renderer, title, insights, charts)
    }

    /// Build with a caller-supplied renderer
    pub fn build_with(
        &self,
        renderer: &dyn DocumentRenderer,
        title: &str,
        insights: Vec<String>,
        charts: Vec<ChartImage>,
    ) -> Result<Vec<u8>> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        Self::render(renderer, title, insights, charts)
    }

    fn render(
        renderer: &dyn DocumentRenderer,
        title: &str,
        insights: Vec<String>,
        charts: Vec<ChartImage>,
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        let document = ReportDocument::build(title, insights, charts)?;
        debug!(sections = document.sections().len(), "report document assembled");

        let bytes = renderer.render(&document)?;
        info!(
            format = renderer.extension(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report rendered"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportSection;
    use std::sync::{Arc, Barrier};
    use tempfile::tempdir;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    /// Writes one line per section
    struct TextRenderer;

    impl DocumentRenderer for TextRenderer {
        fn extension(&self) -> &str {
            "txt"
        }

        fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
            let lines: Vec<String> = document
                .sections()
                .iter()
                .map(|s| match s {
                    ReportSection::TitlePage { title, insights } => {
                        format!("{} [{}]", title, insights.join("; "))
                    }
                    ReportSection::Chart(c) => format!("chart {:?}", c.format()),
                })
                .collect();
            Ok(lines.join("\n").into_bytes())
        }
    }

    /// Blocks inside render until released
    struct BlockingRenderer(Arc<Barrier>);

    impl DocumentRenderer for BlockingRenderer {
        fn extension(&self) -> &str {
            "txt"
        }

        fn render(&self, _document: &ReportDocument) -> Result<Vec<u8>> {
            self.0.wait();
            self.0.wait();
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_page_order() {
        let service = ReportService::new(PathBuf::from("unused.ttf"));
        let charts = charts_from_bytes(vec![PNG.to_vec(), PNG.to_vec()]).unwrap();
        let bytes = service
            .build_with(&TextRenderer, "보고서", vec!["총 매출: 400 원".to_string()], charts)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["보고서 [총 매출: 400 원]", "chart Png", "chart Png"]);
        assert!(!service.is_busy());
    }

    #[test]
    fn test_invalid_chart_is_rejected() {
        let err = charts_from_bytes(vec![PNG.to_vec(), b"GIF89a".to_vec()]).unwrap_err();
        assert!(err.to_string().contains("Chart 2"));
    }

    #[test]
    fn test_missing_font_fails_fast() {
        let dir = tempdir().unwrap();
        let service = ReportService::new(dir.path().join("missing.ttf"));
        let err = service.build("보고서", Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
        // The failed build releases the guard
        assert!(!service.is_busy());
    }

    #[test]
    fn test_second_build_while_in_flight_is_refused() {
        let service = Arc::new(ReportService::new(PathBuf::from("unused.ttf")));
        let barrier = Arc::new(Barrier::new(2));

        let worker = {
            let service = service.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                service.build_with(&BlockingRenderer(barrier), "보고서", Vec::new(), Vec::new())
            })
        };

        // Wait until the worker is inside render
        barrier.wait();
        assert!(service.is_busy());
        let err = service
            .build_with(&TextRenderer, "보고서", Vec::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::ReportInProgress));
        barrier.wait();

        assert!(worker.join().unwrap().is_ok());
        assert!(!service.is_busy());
    }

    #[test]
    fn test_default_title() {
        let selection = Selection::single("음식", "한식").unwrap();
        assert_eq!(ReportService::default_title(&selection), "음식 > 한식 업종 창업 보고서");
    }
}
