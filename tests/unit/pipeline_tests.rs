// Page pipeline tests with an on-disk logo and closure-backed documents

use image::{DynamicImage, Rgb, RgbImage};
use pagemark::encoder::OutputFormat;
use pagemark::pipeline::*;
use pagemark::render::{PageSource, RenderError};
use pagemark::watermark::LogoResource;
use std::io::Write;
use tempfile::NamedTempFile;

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100">
  <circle cx="50" cy="50" r="40" fill="#1a4f9c"/>
  <rect x="100" y="20" width="90" height="60" fill="#1a4f9c"/>
</svg>"##;

fn logo_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(LOGO_SVG.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn blank_page(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([255, 255, 255])))
}

fn options(logo: &NamedTempFile) -> PipelineOptions {
    PipelineOptions::new(LogoResource::path(logo.path()))
}

#[test]
fn test_pages_are_watermarked() {
    let logo = logo_file();
    let source = PageSource::new(2, |_| Ok(blank_page(1000, 1400)));

    let pages: Vec<PageResult> = process_document(source, options(&logo))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(pages.len(), 2);
    for page in &pages {
        assert_eq!((page.width, page.height), (1000, 1400));
        assert_ne!(page.image, blank_page(1000, 1400));

        let decoded = image::load_from_memory(&page.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1000, 1400));
    }

    // Same input, same config: identical pages
    assert_eq!(pages[0].data, pages[1].data);
}

#[test]
fn test_encoded_output_is_deterministic() {
    let logo = logo_file();
    let run = || -> Vec<u8> {
        let source = PageSource::new(1, |_| Ok(blank_page(400, 300)));
        process_document(source, options(&logo))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .data
    };
    assert_eq!(run(), run());
}

#[test]
fn test_missing_logo_is_not_an_error() {
    let source = PageSource::new(3, |index| Ok(blank_page(100 + index, 200)));
    let options = PipelineOptions::new(LogoResource::path("/nonexistent/logo.svg"));

    let mut count = 0;
    for result in process_document(source, options).unwrap() {
        let page = result.unwrap();
        assert_eq!(page.image, blank_page(100 + count, 200));
        count += 1;
    }
    assert_eq!(count, 3);
}

#[test]
fn test_zero_page_document_fails_before_any_page() {
    let logo = logo_file();
    let source = PageSource::new(0, |_| -> Result<DynamicImage, RenderError> {
        panic!("no page should be rendered")
    });
    let err = process_document(source, options(&logo)).unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_PDF");
}

#[test]
fn test_render_dpi_is_passed_through() {
    use pagemark::render::RasterDocument;

    struct DpiDocument;

    impl RasterDocument for DpiDocument {
        fn page_count(&self) -> u32 {
            1
        }

        fn render_page(&mut self, _index: u32, dpi: u32) -> Result<DynamicImage, RenderError> {
            Ok(blank_page(dpi, dpi))
        }
    }

    let options = PipelineOptions {
        dpi: 144,
        ..PipelineOptions::new(LogoResource::path("/nonexistent/logo.svg"))
    };
    let page = process_document(DpiDocument, options)
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!((page.width, page.height), (144, 144));
}

#[test]
fn test_skip_policy_reports_skipped_pages() {
    let logo = logo_file();
    let source = PageSource::new(3, |index| {
        if index == 0 {
            Err(RenderError::Page {
                index,
                message: "unsupported shading".to_string(),
            })
        } else {
            Ok(blank_page(64, 64))
        }
    });
    let options = PipelineOptions {
        failure_policy: FailurePolicy::Skip,
        format: OutputFormat::Jpeg,
        ..options(&logo)
    };

    let mut stream = process_document(source, options).unwrap();
    let produced: Vec<u32> = stream
        .by_ref()
        .map(|r| r.unwrap().page_number)
        .collect();

    assert_eq!(produced, vec![2, 3]);
    assert_eq!(stream.skipped_pages(), &[1]);
    assert!(stream.is_finished());
}

#[test]
fn test_abort_policy_yields_error_then_ends() {
    let logo = logo_file();
    let source = PageSource::new(3, |index| {
        if index == 2 {
            Err(RenderError::Page {
                index,
                message: "truncated stream".to_string(),
            })
        } else {
            Ok(blank_page(64, 64))
        }
    });

    let results: Vec<_> = process_document(source, options(&logo)).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());

    let err = results[2].as_ref().unwrap_err();
    assert_eq!(err.error_code(), "PAGE_PROCESSING_ERROR");
    assert_eq!(err.public_message(), "Failed to process page 3");
}

#[test]
fn test_size_hint_bounds() {
    let source = PageSource::new(4, |_| Ok(blank_page(8, 8)));
    let options = PipelineOptions::new(LogoResource::path("/nonexistent/logo.svg"));
    let mut stream = process_document(source, options).unwrap();

    assert_eq!(stream.size_hint(), (1, Some(4)));
    stream.next();
    assert_eq!(stream.size_hint(), (1, Some(3)));
    stream.by_ref().for_each(drop);
    assert_eq!(stream.size_hint(), (0, Some(0)));
}
