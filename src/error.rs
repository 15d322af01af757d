// Error types module

use serde::{Deserialize, Serialize};

/// Machine-readable error codes surfaced to callers
pub mod codes {
    pub const INVALID_PDF: &str = "INVALID_PDF";
    pub const EMPTY_PDF: &str = "EMPTY_PDF";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const INVALID_DPI: &str = "INVALID_DPI";
    pub const PAGE_PROCESSING_ERROR: &str = "PAGE_PROCESSING_ERROR";
    pub const ENCODING_ERROR: &str = "ENCODING_ERROR";
    pub const RASTERIZER_UNAVAILABLE: &str = "RASTERIZER_UNAVAILABLE";
}

/// Fatal errors for a document job
///
/// Watermark failures are not represented here: the compositor absorbs
/// them and returns the page unwatermarked.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobError {
    /// Unreadable or empty document, zero pages, or bad job parameters
    #[error("{message}")]
    InvalidInput { code: &'static str, message: String },

    /// Rasterizing one page failed
    #[error("Failed to render page {page}: {message}")]
    PageRender { page: u32, message: String },

    /// Encoding one page failed
    #[error("Failed to encode page {page}: {message}")]
    Encoding { page: u32, message: String },

    /// The PDF rasterizer backend could not be initialized
    #[error("PDF rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),
}

impl JobError {
    pub fn invalid_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code,
            message: message.into(),
        }
    }

    /// Machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            JobError::InvalidInput { code, .. } => *code,
            JobError::PageRender { .. } => codes::PAGE_PROCESSING_ERROR,
            JobError::Encoding { .. } => codes::ENCODING_ERROR,
            JobError::RasterizerUnavailable(_) => codes::RASTERIZER_UNAVAILABLE,
        }
    }

    /// Maps job errors to HTTP status codes
    ///
    /// - InvalidInput → 400 (Bad Request)
    /// - PageRender → 422 (Unprocessable Entity)
    /// - Encoding → 500 (Internal Server Error)
    /// - RasterizerUnavailable → 503 (Service Unavailable)
    pub fn to_http_status(&self) -> u16 {
        match self {
            JobError::InvalidInput { .. } => 400,
            JobError::PageRender { .. } => 422,
            JobError::Encoding { .. } => 500,
            JobError::RasterizerUnavailable(_) => 503,
        }
    }

    /// Caller-facing message without backend detail
    ///
    /// Underlying causes can carry file paths or library internals, so only
    /// the error kind and page number are exposed. The full error is logged.
    pub fn public_message(&self) -> String {
        match self {
            JobError::InvalidInput { message, .. } => message.clone(),
            JobError::PageRender { page, .. } => format!("Failed to process page {}", page),
            JobError::Encoding { page, .. } => format!("Failed to encode page {}", page),
            JobError::RasterizerUnavailable(_) => {
                "PDF rendering is not available on this server".to_string()
            }
        }
    }

    /// Structured error response for the job boundary
    pub fn to_response(&self, job_id: &str) -> ErrorResponse {
        ErrorResponse {
            status: "error".to_string(),
            job_id: job_id.to_string(),
            error: self.public_message(),
            error_code: self.error_code().to_string(),
        }
    }
}

/// Error body returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub job_id: String,
    pub error: String,
    pub error_code: String,
}
