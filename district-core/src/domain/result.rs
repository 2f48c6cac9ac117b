//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// Variants follow how a failure is surfaced to the user:
/// precondition and empty-selection failures stop the current view,
/// enrichment failures are degraded into placeholder text, resource
/// failures abort only the report being generated.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("No data for this selection: {0}")]
    EmptySelection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Load error: {0}")]
    Load(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("A report is already being generated")]
    ReportInProgress,

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create an empty selection error
    pub fn empty_selection(msg: impl Into<String>) -> Self {
        Self::EmptySelection(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a resource error
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Whether this failure is shown to the user as a message rather than a fault
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Precondition(_) | Self::EmptySelection(_) | Self::NotFound(_)
        )
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
