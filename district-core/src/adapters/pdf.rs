//! PDF report renderer
//!
//! A4 portrait pages. The first page carries the title and every insight
//! line, wrapped to the content width; text shrinks step by step until it
//! fits that page, down to `MIN_BODY_SIZE_PT`. Each chart image gets a page
//! of its own, scaled to fit.
//!
//! Text is drawn with an embedded TrueType font that must cover every
//! character of the document; the renderer checks coverage up front and
//! refuses to produce a PDF with missing glyphs.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{ChartImage, ImageFormat, ReportDocument, ReportSection};
use crate::ports::DocumentRenderer;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const TITLE_SIZE_PT: f32 = 20.0;
const BODY_SIZE_PT: f32 = 12.0;
const MIN_BODY_SIZE_PT: f32 = 6.0;
const SIZE_STEP_PT: f32 = 0.5;
const CAPTION_SIZE_PT: f32 = 14.0;
const LINE_SPACING: f32 = 1.5;
const IMAGE_DPI: f32 = 300.0;
const MM_PER_PT: f32 = 0.352_778;
const MM_PER_INCH: f32 = 25.4;
const BULLET: &str = "- ";
const CONTINUATION: &str = "  ";

fn content_width() -> f32 {
    PAGE_WIDTH_MM - 2.0 * MARGIN_MM
}

fn line_height(size_pt: f32) -> f32 {
    size_pt * MM_PER_PT * LINE_SPACING
}

/// A TrueType/OpenType font file loaded into memory
#[derive(Debug, Clone)]
pub struct FontResource {
    path: PathBuf,
    data: Vec<u8>,
}

impl FontResource {
    /// Load and validate a font file
    ///
    /// A missing, empty or unparsable file is a resource error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::resource(format!(
                "Font file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read(path).map_err(|e| {
            Error::resource(format!("Cannot read font file {}: {}", path.display(), e))
        })?;
        Self::from_bytes(path.to_path_buf(), data)
    }

    pub fn from_bytes(path: PathBuf, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::resource(format!("Font file is empty: {}", path.display())));
        }
        ttf_parser::Face::parse(&data, 0).map_err(|e| {
            Error::resource(format!("Invalid font file {}: {}", path.display(), e))
        })?;
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the font tables once for measuring and glyph lookups
    pub fn metrics(&self) -> Result<FontMetrics<'_>> {
        let face = ttf_parser::Face::parse(&self.data, 0).map_err(|e| {
            Error::resource(format!("Invalid font file {}: {}", self.path.display(), e))
        })?;
        Ok(FontMetrics {
            units_per_em: f32::from(face.units_per_em().max(1)),
            face,
        })
    }
}

/// Parsed tables of a [`FontResource`]
pub struct FontMetrics<'a> {
    face: ttf_parser::Face<'a>,
    units_per_em: f32,
}

impl FontMetrics<'_> {
    /// Distinct printable characters the font has no glyph for
    pub fn missing_glyphs<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> Vec<char> {
        let mut missing: Vec<char> = texts
            .into_iter()
            .flat_map(str::chars)
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .filter(|c| self.face.glyph_index(*c).is_none())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Rendered width of `text` in millimetres
    pub fn text_width(&self, text: &str, size_pt: f32) -> f32 {
        let units: f32 = text
            .chars()
            .map(|c| {
                self.face
                    .glyph_index(c)
                    .and_then(|g| self.face.glyph_hor_advance(g))
                    .map(f32::from)
                    .unwrap_or(self.units_per_em / 2.0)
            })
            .sum();
        units / self.units_per_em * size_pt * MM_PER_PT
    }
}

/// Greedy word wrap; words wider than the line are broken by character
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if measure(word) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if !current.is_empty() && measure(&next) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                } else {
                    current = next;
                }
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Title-page lines at the sizes that fit them on one page
#[derive(Debug, Clone, PartialEq)]
struct TitleLayout {
    title_size: f32,
    body_size: f32,
    title_lines: Vec<String>,
    body_lines: Vec<String>,
}

impl TitleLayout {
    /// Largest body size whose layout fits the page, never below the minimum
    ///
    /// `measure(text, size_pt)` returns a width in millimetres. The title
    /// shrinks in proportion to the body text.
    fn fit<F>(title: &str, insights: &[String], measure: F) -> Self
    where
        F: Fn(&str, f32) -> f32,
    {
        let available = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
        let mut body_size = BODY_SIZE_PT;
        loop {
            let layout = Self::at_size(title, insights, body_size, &measure);
            if layout.height() <= available || body_size <= MIN_BODY_SIZE_PT {
                return layout;
            }
            body_size = (body_size - SIZE_STEP_PT).max(MIN_BODY_SIZE_PT);
        }
    }

    fn at_size<F>(title: &str, insights: &[String], body_size: f32, measure: &F) -> Self
    where
        F: Fn(&str, f32) -> f32,
    {
        let title_size = body_size * TITLE_SIZE_PT / BODY_SIZE_PT;
        let title_lines = wrap_text(title, content_width(), |s| measure(s, title_size));

        let available = content_width() - measure(BULLET, body_size);
        let mut body_lines = Vec::new();
        for insight in insights {
            let wrapped = wrap_text(insight, available, |s| measure(s, body_size));
            for (i, line) in wrapped.into_iter().enumerate() {
                let prefix = if i == 0 { BULLET } else { CONTINUATION };
                body_lines.push(format!("{}{}", prefix, line));
            }
        }

        Self {
            title_size,
            body_size,
            title_lines,
            body_lines,
        }
    }

    fn height(&self) -> f32 {
        self.title_lines.len() as f32 * line_height(self.title_size)
            + (self.body_lines.len() + 1) as f32 * line_height(self.body_size)
    }
}

/// Renders a [`ReportDocument`] to PDF bytes
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font: FontResource,
}

/// Page cursor for the title page
///
/// Only a layout already at the minimum size can still overflow; those
/// lines continue on an extra page.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    font: &'a IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, font: &'a IndirectFontRef, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            font,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn write_line(&mut self, text: &str, size_pt: f32) {
        let height = line_height(size_pt);
        if self.y - height < MARGIN_MM - 0.01 {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.y -= height;
        self.layer
            .use_text(text, size_pt, Mm(MARGIN_MM), Mm(self.y), self.font);
    }

    fn skip(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn draw(&mut self, layout: &TitleLayout) {
        for line in &layout.title_lines {
            self.write_line(line, layout.title_size);
        }
        self.skip(line_height(layout.body_size));
        for line in &layout.body_lines {
            self.write_line(line, layout.body_size);
        }
    }
}

impl PdfRenderer {
    pub fn new(font: FontResource) -> Self {
        Self { font }
    }

    /// Load the font at `path` and build a renderer
    pub fn from_font_path(path: &Path) -> Result<Self> {
        Ok(Self::new(FontResource::load(path)?))
    }

    fn draw_chart(
        &self,
        doc: &PdfDocumentReference,
        font: &IndirectFontRef,
        chart: &ChartImage,
    ) -> Result<()> {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let mut top = PAGE_HEIGHT_MM - MARGIN_MM;
        if let Some(caption) = &chart.caption {
            top -= line_height(CAPTION_SIZE_PT);
            layer.use_text(caption.as_str(), CAPTION_SIZE_PT, Mm(MARGIN_MM), Mm(top), font);
            top -= line_height(BODY_SIZE_PT) / 2.0;
        }

        let image = decode_image(chart)?;
        let width_px = image.image.width.0 as f32;
        let height_px = image.image.height.0 as f32;
        if width_px <= 0.0 || height_px <= 0.0 {
            return Err(Error::validation("Chart image has no pixels"));
        }

        // Native size at IMAGE_DPI, shrunk (never enlarged) to the content box
        let native_w = width_px / IMAGE_DPI * MM_PER_INCH;
        let native_h = height_px / IMAGE_DPI * MM_PER_INCH;
        let box_h = top - MARGIN_MM;
        let scale = (content_width() / native_w).min(box_h / native_h).min(1.0);

        let x = MARGIN_MM + (content_width() - native_w * scale) / 2.0;
        let y = top - native_h * scale;

        image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }
}

fn decode_image(chart: &ChartImage) -> Result<Image> {
    let cursor = Cursor::new(chart.bytes());
    let decoded = match chart.format() {
        ImageFormat::Png => PngDecoder::new(cursor).and_then(Image::try_from),
        ImageFormat::Jpeg => JpegDecoder::new(cursor).and_then(Image::try_from),
    };
    decoded.map_err(|e| Error::validation(format!("Cannot decode chart image: {}", e)))
}

impl DocumentRenderer for PdfRenderer {
    fn extension(&self) -> &str {
        "pdf"
    }

    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        let metrics = self.font.metrics()?;
        let missing = metrics.missing_glyphs(document.text());
        if !missing.is_empty() {
            let chars: String = missing.iter().collect();
            return Err(Error::resource(format!(
                "Font {} has no glyphs for: {}",
                self.font.path().display(),
                chars
            )));
        }

        let (doc, page, layer) = PdfDocument::new(
            document.title(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = doc
            .add_external_font(Cursor::new(self.font.data.as_slice()))
            .map_err(|e| Error::resource(format!("Cannot embed font: {}", e)))?;

        for section in document.sections() {
            match section {
                ReportSection::TitlePage { title, insights } => {
                    let layout =
                        TitleLayout::fit(title, insights, |s, size| metrics.text_width(s, size));
                    if layout.body_size < BODY_SIZE_PT {
                        debug!(body_size = layout.body_size, "title page text shrunk to fit");
                    }
                    let mut writer =
                        PageWriter::new(&doc, &font, doc.get_page(page).get_layer(layer));
                    writer.draw(&layout);
                }
                ReportSection::Chart(chart) => self.draw_chart(&doc, &font, chart)?,
            }
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| Error::Other(format!("Failed to write PDF: {}", e)))?;
        debug!(bytes = bytes.len(), sections = document.sections().len(), "rendered report");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn char_width(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn test_wrap_by_words() {
        let lines = wrap_text("총 매출: 1,000 원 입니다", 8.0, char_width);
        assert_eq!(lines, vec!["총 매출:", "1,000 원", "입니다"]);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let lines = wrap_text("가나다라마바사", 3.0, char_width);
        assert_eq!(lines, vec!["가나다", "라마바", "사"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_text("   ", 10.0, char_width).is_empty());
    }

    #[test]
    fn test_missing_font_is_resource_error() {
        let dir = tempdir().unwrap();
        let err = FontResource::load(&dir.path().join("none.ttf")).unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
    }

    #[test]
    fn test_empty_or_corrupt_font_is_resource_error() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.ttf");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(FontResource::load(&empty), Err(Error::Resource(_))));

        let junk = dir.path().join("junk.ttf");
        std::fs::write(&junk, b"definitely not a font").unwrap();
        assert!(matches!(FontResource::load(&junk), Err(Error::Resource(_))));
    }

    fn fixture_renderer() -> PdfRenderer {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("fonts")
            .join("RobotoMedium.ttf");
        PdfRenderer::from_font_path(&path).unwrap()
    }

    fn png_chart(width: u32, height: u32, caption: &str) -> ChartImage {
        use printpdf::image_crate::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

        let image = RgbImage::from_pixel(width, height, Rgb([40, 110, 190]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        ChartImage::new(bytes).unwrap().with_caption(caption)
    }

    /// Page count from the document's page tree
    fn page_count(pdf: &[u8]) -> usize {
        let marker = b"/Type/Pages/Count ";
        let start = pdf
            .windows(marker.len())
            .position(|w| w == marker)
            .expect("page tree")
            + marker.len();
        pdf[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .map(|&b| b as char)
            .collect::<String>()
            .parse()
            .unwrap()
    }

    fn width_per_char(s: &str, size_pt: f32) -> f32 {
        s.chars().count() as f32 * size_pt * MM_PER_PT * 0.5
    }

    #[test]
    fn test_metrics_measure_and_find_missing_glyphs() {
        let renderer = fixture_renderer();
        let metrics = renderer.font.metrics().unwrap();

        let narrow = metrics.text_width("iii", BODY_SIZE_PT);
        let wide = metrics.text_width("WWW", BODY_SIZE_PT);
        assert!(narrow > 0.0 && narrow < wide);
        assert!((metrics.text_width("WWW", 24.0) - wide * 2.0).abs() < 1e-4);

        assert!(metrics.missing_glyphs(["Total sales: 400"]).is_empty());
        assert_eq!(metrics.missing_glyphs(["매출 매출", "Sales"]), vec!['매', '출']);
    }

    #[test]
    fn test_render_title_page_and_one_page_per_chart() {
        let renderer = fixture_renderer();
        let doc = ReportDocument::build(
            "Food > Korean startup report",
            vec![
                "Total sales: 80,000 KRW".to_string(),
                "Peak hour: 11:00 ~ 12:59".to_string(),
            ],
            vec![png_chart(600, 400, "weekday"), png_chart(400, 900, "hourly")],
        )
        .unwrap();

        let bytes = renderer.render(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&bytes), 3);
    }

    #[test]
    fn test_long_insight_list_stays_on_title_page() {
        let renderer = fixture_renderer();
        let insights = vec!["Average sales per transaction: 20,000 KRW".to_string(); 60];
        let doc = ReportDocument::build("Food > Korean startup report", insights, Vec::new()).unwrap();

        let bytes = renderer.render(&doc).unwrap();
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_uncovered_characters_fail_before_rendering() {
        let renderer = fixture_renderer();
        let doc = ReportDocument::build("음식 > 한식 업종 창업 보고서", Vec::new(), Vec::new()).unwrap();

        let err = renderer.render(&doc).unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
        assert!(err.to_string().contains("has no glyphs"));
    }

    #[test]
    fn test_layout_keeps_default_size_when_it_fits() {
        let insights = vec!["Total sales: 400".to_string(); 3];
        let layout = TitleLayout::fit("Report", &insights, width_per_char);
        assert_eq!(layout.body_size, BODY_SIZE_PT);
        assert_eq!(layout.title_size, TITLE_SIZE_PT);
        assert_eq!(layout.title_lines, vec!["Report"]);
        assert_eq!(layout.body_lines.len(), 3);
        assert!(layout.body_lines.iter().all(|l| l.starts_with(BULLET)));
    }

    #[test]
    fn test_layout_shrinks_until_one_page() {
        let insights = vec!["an insight sentence long enough to fill most of one line at body size".to_string(); 40];
        let layout = TitleLayout::fit("Report", &insights, width_per_char);

        assert!(layout.body_size < BODY_SIZE_PT);
        assert!(layout.body_size >= MIN_BODY_SIZE_PT);
        assert!(layout.height() <= PAGE_HEIGHT_MM - 2.0 * MARGIN_MM);
        assert!((layout.title_size / layout.body_size - TITLE_SIZE_PT / BODY_SIZE_PT).abs() < 1e-4);

        let step_up = layout.body_size + SIZE_STEP_PT;
        let larger = TitleLayout::at_size("Report", &insights, step_up, &width_per_char);
        assert!(larger.height() > PAGE_HEIGHT_MM - 2.0 * MARGIN_MM);
    }

    #[test]
    fn test_layout_stops_at_minimum_size() {
        let insights = vec!["line".to_string(); 1000];
        let layout = TitleLayout::fit("Report", &insights, width_per_char);
        assert_eq!(layout.body_size, MIN_BODY_SIZE_PT);
        assert_eq!(layout.body_lines.len(), 1000);
    }
}
