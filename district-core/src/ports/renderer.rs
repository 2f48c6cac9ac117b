//! Document rendering port

use crate::domain::result::Result;
use crate::domain::ReportDocument;

/// Serializes a report document into a paginated file
pub trait DocumentRenderer {
    /// File extension of the produced bytes (e.g., "pdf")
    fn extension(&self) -> &str;

    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>>;
}
