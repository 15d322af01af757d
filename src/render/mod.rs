// Rasterizer module - turns PDF pages into bitmaps

pub mod pdfium;

pub use pdfium::{PdfiumDocument, PdfiumRasterizer};

use image::DynamicImage;

/// Errors raised by a rasterizer backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    /// The backend library could not be bound
    #[error("rasterizer unavailable: {0}")]
    Unavailable(String),

    /// The document could not be opened
    #[error("failed to open document: {0}")]
    Open(String),

    /// A single page failed to render (0-based index)
    #[error("failed to render page index {index}: {message}")]
    Page { index: u32, message: String },
}

/// An open, page-addressable document
///
/// Indices are 0-based. Rendering at `dpi` produces a bitmap of
/// `page_size_in_points * dpi / 72` pixels.
pub trait RasterDocument {
    /// Number of pages; 0 for an empty document
    fn page_count(&self) -> u32;

    /// Rasterize one page at the requested resolution
    fn render_page(&mut self, index: u32, dpi: u32) -> Result<DynamicImage, RenderError>;
}

impl<T: RasterDocument + ?Sized> RasterDocument for Box<T> {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn render_page(&mut self, index: u32, dpi: u32) -> Result<DynamicImage, RenderError> {
        (**self).render_page(index, dpi)
    }
}

/// Opens documents from raw bytes
///
/// The returned document borrows both the backend and the input bytes, so
/// it cannot outlive either.
pub trait Rasterizer {
    type Document<'a>: RasterDocument
    where
        Self: 'a;

    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Document<'a>, RenderError>;
}

/// Closure-backed document
///
/// Adapts a page count and a `render(index) -> image` function into a
/// [`RasterDocument`]. The closure ignores the requested dpi; callers that
/// care capture it themselves.
///
/// ```
/// use image::{DynamicImage, RgbImage};
/// use pagemark::render::{PageSource, RasterDocument};
///
/// let mut source = PageSource::new(3, |_index| {
///     Ok(DynamicImage::ImageRgb8(RgbImage::new(10, 10)))
/// });
/// assert_eq!(source.page_count(), 3);
/// assert!(source.render_page(0, 200).is_ok());
/// ```
pub struct PageSource<F> {
    page_count: u32,
    render: F,
}

impl<F> PageSource<F>
where
    F: FnMut(u32) -> Result<DynamicImage, RenderError>,
{
    pub fn new(page_count: u32, render: F) -> Self {
        Self { page_count, render }
    }
}

impl<F> RasterDocument for PageSource<F>
where
    F: FnMut(u32) -> Result<DynamicImage, RenderError>,
{
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&mut self, index: u32, _dpi: u32) -> Result<DynamicImage, RenderError> {
        if index >= self.page_count {
            return Err(RenderError::Page {
                index,
                message: format!("page index out of range (document has {} pages)", self.page_count),
            });
        }
        (self.render)(index)
    }
}

impl<F> std::fmt::Debug for PageSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSource")
            .field("page_count", &self.page_count)
            .finish()
    }
}

/// Zoom factor from PDF points to pixels at `dpi`
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / crate::constants::PDF_POINTS_PER_INCH
}
