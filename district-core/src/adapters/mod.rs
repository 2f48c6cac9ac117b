//! Adapters implementing the port traits

pub mod csv_source;
pub mod openai;
pub mod pdf;

#[cfg(test)]
pub mod mock_server;

pub use csv_source::CsvDatasetSource;
pub use openai::OpenAiDescriber;
pub use pdf::{FontMetrics, FontResource, PdfRenderer};
