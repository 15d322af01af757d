// Job boundary tests: request validation, response and error bodies

use image::{DynamicImage, Rgb, RgbImage};
use pagemark::error::{ErrorResponse, JobError};
use pagemark::job::*;
use pagemark::pipeline::{FailurePolicy, PipelineOptions};
use pagemark::render::{RasterDocument, Rasterizer, RenderError};
use pagemark::watermark::LogoResource;

const LOGO_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="40">
  <rect width="120" height="40" rx="8" fill="#333333"/>
</svg>"##;

/// Rasterizer whose documents fail on the listed 0-based pages
struct FakeRasterizer {
    pages: u32,
    failing: Vec<u32>,
}

struct FakeDocument<'a> {
    pages: u32,
    failing: &'a [u32],
}

impl RasterDocument for FakeDocument<'_> {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn render_page(&mut self, index: u32, dpi: u32) -> Result<DynamicImage, RenderError> {
        if self.failing.contains(&index) {
            return Err(RenderError::Page {
                index,
                message: "/tmp/upload.pdf: broken object 12 0 R".to_string(),
            });
        }
        let side = dpi * 2;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            side,
            side,
            Rgb([240, 240, 240]),
        )))
    }
}

impl Rasterizer for FakeRasterizer {
    type Document<'a> = FakeDocument<'a>;

    fn open<'a>(&'a self, _bytes: &'a [u8]) -> Result<Self::Document<'a>, RenderError> {
        Ok(FakeDocument {
            pages: self.pages,
            failing: &self.failing,
        })
    }
}

fn defaults() -> PipelineOptions {
    PipelineOptions::new(LogoResource::bytes(LOGO_SVG))
}

fn request() -> JobRequest {
    JobRequest::new(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec())
        .with_job_id("invoice-2024-001")
        .with_dpi(72)
}

#[test]
fn test_successful_job() {
    let rasterizer = FakeRasterizer {
        pages: 3,
        failing: vec![],
    };
    let response = run_job(&rasterizer, &request(), &defaults()).unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(response.job_id, "invoice-2024-001");
    assert_eq!(response.total_pages, 3);
    let numbers: Vec<u32> = response.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(response
        .pages
        .iter()
        .all(|p| p.width == 144 && p.height == 144 && p.format == "png"));
}

#[test]
fn test_abort_returns_page_error() {
    let rasterizer = FakeRasterizer {
        pages: 3,
        failing: vec![1],
    };
    let err = run_job(&rasterizer, &request(), &defaults()).unwrap_err();
    assert!(matches!(err, JobError::PageRender { page: 2, .. }));

    let body = err.to_response("invoice-2024-001");
    assert_eq!(
        body,
        ErrorResponse {
            status: "error".to_string(),
            job_id: "invoice-2024-001".to_string(),
            error: "Failed to process page 2".to_string(),
            error_code: "PAGE_PROCESSING_ERROR".to_string(),
        }
    );
}

#[test]
fn test_skip_lists_skipped_pages() {
    let rasterizer = FakeRasterizer {
        pages: 4,
        failing: vec![0, 3],
    };
    let options = PipelineOptions {
        failure_policy: FailurePolicy::Skip,
        ..defaults()
    };
    let response = run_job(&rasterizer, &request(), &options).unwrap();

    assert_eq!(response.total_pages, 4);
    assert_eq!(response.pages.len(), 2);
    assert_eq!(response.skipped_pages, vec![1, 4]);
}

#[test]
fn test_invalid_request_never_opens_document() {
    struct PanickingRasterizer;

    impl Rasterizer for PanickingRasterizer {
        type Document<'a> = FakeDocument<'a>;

        fn open<'a>(&'a self, _bytes: &'a [u8]) -> Result<Self::Document<'a>, RenderError> {
            panic!("document must not be opened for an invalid request")
        }
    }

    let bad = request().with_format("bmp");
    let err = run_job(&PanickingRasterizer, &bad, &defaults()).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_FORMAT");

    let bad = JobRequest::new(Vec::new());
    let err = run_job(&PanickingRasterizer, &bad, &defaults()).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_PDF");
}

#[test]
fn test_error_body_json() {
    let err = JobError::invalid_input("EMPTY_PDF", "PDF has no pages");
    let json = serde_json::to_string(&err.to_response("abc")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["status"], "error");
    assert_eq!(value["job_id"], "abc");
    assert_eq!(value["error"], "PDF has no pages");
    assert_eq!(value["error_code"], "EMPTY_PDF");
}

#[test]
fn test_response_round_trips_through_json() {
    let rasterizer = FakeRasterizer {
        pages: 1,
        failing: vec![],
    };
    let response = run_job(&rasterizer, &request(), &defaults()).unwrap();
    let json = serde_json::to_string(&response).unwrap();
    let parsed: JobResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}
