//! PDFium-backed rasterizer.
//!
//! Binds the PDFium shared library at runtime. An explicit library directory
//! is tried first, then the system library search path.

use super::{scale_for_dpi, RasterDocument, Rasterizer, RenderError};
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use std::path::Path;

/// Rasterizer holding a bound PDFium library
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl std::fmt::Debug for PdfiumRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfiumRasterizer").finish_non_exhaustive()
    }
}

impl PdfiumRasterizer {
    /// Bind PDFium, optionally from a specific directory
    pub fn bind(library_dir: Option<&Path>) -> Result<Self, RenderError> {
        let bindings = match library_dir {
            Some(dir) => {
                let dir_name = dir.to_string_lossy();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&*dir_name))
                    .or_else(|e| {
                        tracing::warn!(
                            library_dir = %dir.display(),
                            error = %e,
                            "PDFium not found in configured directory, trying system library"
                        );
                        Pdfium::bind_to_system_library()
                    })
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        tracing::debug!("PDFium library bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    type Document<'a> = PdfiumDocument<'a>;

    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Document<'a>, RenderError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| RenderError::Open(e.to_string()))?;
        let page_count = document.pages().len() as u32;

        Ok(PdfiumDocument {
            document,
            page_count,
        })
    }
}

/// An open PDFium document; closed when dropped
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    page_count: u32,
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&mut self, index: u32, dpi: u32) -> Result<DynamicImage, RenderError> {
        let page_error = |message: String| RenderError::Page { index, message };

        let page_index = PdfPageIndex::try_from(index)
            .map_err(|_| page_error("page index exceeds PDFium range".to_string()))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| page_error(e.to_string()))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale_for_dpi(dpi));
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| page_error(e.to_string()))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
            .ok_or_else(|| page_error(format!("bitmap buffer does not match {}x{}", width, height)))?;

        Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()))
    }
}
