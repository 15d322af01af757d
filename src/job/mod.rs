// Job module - validates a document request and runs it to completion
//
// This is the request/response boundary used by the CLI's `--json` mode. A job
// collects every page of the stream into a single response; callers that want
// pages one at a time use the pipeline directly.

use crate::constants::{MAX_DPI, MIN_DPI, PDF_MAGIC};
use crate::error::{codes, JobError};
use crate::pipeline::{process_document, PipelineOptions};
use crate::render::{Rasterizer, RenderError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// A document to process plus optional per-job overrides
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: String,
    pub document: Vec<u8>,
    pub dpi: Option<u32>,
    pub format: Option<String>,
}

impl JobRequest {
    /// Create a request with a generated job ID
    pub fn new(document: Vec<u8>) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            document,
            dpi: None,
            format: None,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Check the payload and merge overrides into `defaults`
    pub fn resolve(&self, defaults: &PipelineOptions) -> Result<PipelineOptions, JobError> {
        if self.document.is_empty() {
            return Err(JobError::invalid_input(
                codes::INVALID_PDF,
                "Document is empty",
            ));
        }
        if !self.document.starts_with(PDF_MAGIC) {
            return Err(JobError::invalid_input(
                codes::INVALID_PDF,
                "Document is not a PDF",
            ));
        }

        let mut options = defaults.clone();

        if let Some(format) = &self.format {
            options.format = format.parse().map_err(|_| {
                JobError::invalid_input(
                    codes::INVALID_FORMAT,
                    format!("Unsupported output format '{}', expected png or jpeg", format),
                )
            })?;
        }

        if let Some(dpi) = self.dpi {
            if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
                return Err(JobError::invalid_input(
                    codes::INVALID_DPI,
                    format!("DPI must be between {} and {}, got {}", MIN_DPI, MAX_DPI, dpi),
                ));
            }
            options.dpi = dpi;
        }

        Ok(options)
    }
}

/// One encoded page in a job response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub page_num: u32,
    pub image_base64: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

/// Successful job response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub status: String,
    pub job_id: String,
    pub total_pages: u32,
    pub pages: Vec<PageResponse>,
    pub skipped_pages: Vec<u32>,
    pub processing_time_ms: u64,
}

/// Run a job to completion.
///
/// # Errors
///
/// - `InvalidInput` for a bad payload, format or DPI, an unreadable
///   document, or a document with no pages
/// - `PageRender` / `Encoding` when a page fails under the abort policy
/// - `RasterizerUnavailable` if the backend cannot render at all
pub fn run_job<R: Rasterizer>(
    rasterizer: &R,
    request: &JobRequest,
    defaults: &PipelineOptions,
) -> Result<JobResponse, JobError> {
    let started = Instant::now();
    let options = request.resolve(defaults)?;

    tracing::info!(
        job_id = %request.job_id,
        size_bytes = request.document.len(),
        dpi = options.dpi,
        format = %options.format,
        "Job started"
    );

    let document = rasterizer
        .open(&request.document)
        .map_err(|e| open_error(&request.job_id, e))?;

    let mut stream = process_document(document, options)?;
    let total_pages = stream.page_count();

    let mut pages = Vec::with_capacity(total_pages as usize);
    for result in stream.by_ref() {
        let page = result?;
        pages.push(PageResponse {
            page_num: page.page_number,
            image_base64: STANDARD.encode(&page.data),
            format: page.format.as_str().to_string(),
            width: page.width,
            height: page.height,
            size_bytes: page.size_bytes,
        });
    }
    let skipped_pages = stream.skipped_pages().to_vec();
    drop(stream);

    let processing_time_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        job_id = %request.job_id,
        total_pages = total_pages,
        pages = pages.len(),
        skipped = skipped_pages.len(),
        processing_time_ms = processing_time_ms,
        "Job completed"
    );

    Ok(JobResponse {
        status: "success".to_string(),
        job_id: request.job_id.clone(),
        total_pages,
        pages,
        skipped_pages,
        processing_time_ms,
    })
}

/// Validate the request, then bind a rasterizer and run the job.
///
/// Request errors are reported before the backend is touched, so a bad
/// payload is never masked by an unavailable rasterizer.
pub fn bind_and_run_job<R, F>(
    bind: F,
    request: &JobRequest,
    defaults: &PipelineOptions,
) -> Result<JobResponse, JobError>
where
    R: Rasterizer,
    F: FnOnce() -> Result<R, JobError>,
{
    request.resolve(defaults)?;
    let rasterizer = bind()?;
    run_job(&rasterizer, request, defaults)
}

fn open_error(job_id: &str, error: RenderError) -> JobError {
    tracing::warn!(job_id = %job_id, error = %error, "Failed to open document");
    match error {
        RenderError::Unavailable(message) => JobError::RasterizerUnavailable(message),
        RenderError::Open(_) => {
            JobError::invalid_input(codes::INVALID_PDF, "Document could not be opened")
        }
        RenderError::Page { index, message } => JobError::PageRender {
            page: index + 1,
            message,
        },
    }
}
