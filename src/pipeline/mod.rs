// Page pipeline module - renders, watermarks and encodes pages on demand
//
// A `PageStream` owns the open document and a single compositor. Each call to
// `next()` processes exactly one page, so at most one page bitmap is resident
// at a time. The document is dropped as soon as the stream finishes, aborts,
// or is itself dropped.

use crate::constants::DEFAULT_DPI;
use crate::encoder::{EncoderFactory, ImageEncoder, OutputFormat};
use crate::error::{codes, JobError};
use crate::render::RasterDocument;
use crate::watermark::{Compositor, LogoResource, WatermarkConfig};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::str::FromStr;

/// What to do when a single page fails to render or encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Yield the error and end the stream
    #[default]
    Abort,
    /// Log the error, drop the page and continue
    Skip,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown page error policy '{}', expected abort or skip",
                other
            )),
        }
    }
}

/// Settings for processing one document
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub dpi: u32,
    pub format: OutputFormat,
    pub failure_policy: FailurePolicy,
    pub watermark: WatermarkConfig,
    pub logo: LogoResource,
}

impl PipelineOptions {
    pub fn new(logo: LogoResource) -> Self {
        Self {
            dpi: DEFAULT_DPI,
            format: OutputFormat::default(),
            failure_policy: FailurePolicy::default(),
            watermark: WatermarkConfig::default(),
            logo,
        }
    }
}

/// One processed page
#[derive(Debug, Clone)]
pub struct PageResult {
    /// 1-based page number
    pub page_number: u32,
    /// Watermarked page, or the rendered page if watermarking was skipped
    pub image: DynamicImage,
    /// Encoded page bytes
    pub data: Vec<u8>,
    pub size_bytes: usize,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Start processing a document.
///
/// Loads the logo once and returns a lazy stream of pages. Fails with
/// `InvalidInput` (`EMPTY_PDF`) before producing anything if the document
/// has no pages.
pub fn process_document<D: RasterDocument>(
    document: D,
    options: PipelineOptions,
) -> Result<PageStream<D>, JobError> {
    if document.page_count() == 0 {
        return Err(JobError::invalid_input(
            codes::EMPTY_PDF,
            "PDF has no pages",
        ));
    }

    let compositor = Compositor::from_resource(&options.logo, options.watermark);
    Ok(PageStream::new(document, &options, compositor))
}

/// Start processing a document with an already built compositor.
///
/// Same contract as [`process_document`]; the logo is not reloaded.
pub fn process_document_with<D: RasterDocument>(
    document: D,
    options: &PipelineOptions,
    compositor: Compositor,
) -> Result<PageStream<D>, JobError> {
    if document.page_count() == 0 {
        return Err(JobError::invalid_input(
            codes::EMPTY_PDF,
            "PDF has no pages",
        ));
    }

    Ok(PageStream::new(document, options, compositor))
}

/// Lazy, forward-only sequence of processed pages
pub struct PageStream<D: RasterDocument> {
    document: Option<D>,
    compositor: Compositor,
    encoder: Box<dyn ImageEncoder>,
    dpi: u32,
    failure_policy: FailurePolicy,
    page_count: u32,
    next_index: u32,
    skipped: Vec<u32>,
}

impl<D: RasterDocument> PageStream<D> {
    fn new(document: D, options: &PipelineOptions, compositor: Compositor) -> Self {
        let page_count = document.page_count();

        tracing::info!(
            page_count = page_count,
            dpi = options.dpi,
            format = %options.format,
            watermark = compositor.is_active(),
            on_page_error = options.failure_policy.as_str(),
            "Processing document"
        );

        Self {
            document: Some(document),
            compositor,
            encoder: EncoderFactory::create(options.format),
            dpi: options.dpi,
            failure_policy: options.failure_policy,
            page_count,
            next_index: 0,
            skipped: Vec::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// 1-based numbers of pages dropped under [`FailurePolicy::Skip`]
    pub fn skipped_pages(&self) -> &[u32] {
        &self.skipped
    }

    /// Whether the stream has released its document
    pub fn is_finished(&self) -> bool {
        self.document.is_none()
    }

    fn finish(&mut self) {
        if self.document.take().is_some() {
            tracing::debug!(
                pages_processed = self.next_index,
                skipped = self.skipped.len(),
                "Document released"
            );
        }
    }

    fn process_page(&mut self, index: u32) -> Result<PageResult, JobError> {
        let page_number = index + 1;
        let document = self
            .document
            .as_mut()
            .ok_or_else(|| JobError::PageRender {
                page: page_number,
                message: "document already released".to_string(),
            })?;

        let rendered = document
            .render_page(index, self.dpi)
            .map_err(|e| JobError::PageRender {
                page: page_number,
                message: e.to_string(),
            })?;

        let image = self.compositor.apply(rendered);

        let encoded = match image.as_rgb8() {
            Some(rgb) => self.encoder.encode(rgb),
            None => self.encoder.encode(&image.to_rgb8()),
        }
        .map_err(|e| JobError::Encoding {
            page: page_number,
            message: e.to_string(),
        })?;

        tracing::debug!(
            page = page_number,
            width = image.width(),
            height = image.height(),
            size_bytes = encoded.len(),
            "Page processed"
        );

        Ok(PageResult {
            page_number,
            width: image.width(),
            height: image.height(),
            size_bytes: encoded.len(),
            format: encoded.format,
            data: encoded.data,
            image,
        })
    }
}

impl<D: RasterDocument> Iterator for PageStream<D> {
    type Item = Result<PageResult, JobError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.document.is_some() && self.next_index < self.page_count {
            let index = self.next_index;
            self.next_index += 1;

            match self.process_page(index) {
                Ok(page) => {
                    if self.next_index == self.page_count {
                        self.finish();
                    }
                    return Some(Ok(page));
                }
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        tracing::error!(
                            page = index + 1,
                            error = %e,
                            "Page failed, aborting document"
                        );
                        self.finish();
                        return Some(Err(e));
                    }
                    FailurePolicy::Skip => {
                        tracing::warn!(
                            page = index + 1,
                            error = %e,
                            "Page failed, skipping"
                        );
                        self.skipped.push(index + 1);
                    }
                },
            }
        }

        self.finish();
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.document.is_none() {
            return (0, Some(0));
        }
        let remaining = (self.page_count - self.next_index) as usize;
        match self.failure_policy {
            FailurePolicy::Abort => (remaining.min(1), Some(remaining)),
            FailurePolicy::Skip => (0, Some(remaining)),
        }
    }
}

impl<D: RasterDocument> FusedIterator for PageStream<D> {}

impl<D: RasterDocument> std::fmt::Debug for PageStream<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStream")
            .field("page_count", &self.page_count)
            .field("next_index", &self.next_index)
            .field("finished", &self.document.is_none())
            .field("skipped", &self.skipped)
            .finish()
    }
}
