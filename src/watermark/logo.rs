//! Watermark logo loading.
//!
//! Logos are usually SVG files and are rasterized with `resvg` at their
//! natural size (user units at the usvg default of 96 DPI). Raster logos
//! (PNG/JPEG) are decoded with the `image` crate instead.

use super::WatermarkError;
use image::RgbaImage;
use resvg::{tiny_skia, usvg};
use std::path::PathBuf;
use std::sync::Arc;

/// Where the watermark logo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoResource {
    /// Logo file on disk
    Path(PathBuf),
    /// Logo file contents already in memory
    Bytes(Vec<u8>),
}

impl LogoResource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Short description for log fields.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(data) => format!("<{} bytes>", data.len()),
        }
    }

    /// Read and rasterize the logo.
    ///
    /// # Errors
    ///
    /// - `ResourceError` if the file cannot be read
    /// - `DecodeError` if the data is neither a renderable SVG nor a
    ///   decodable raster image
    pub fn load(&self) -> Result<LogoBitmap, WatermarkError> {
        match self {
            Self::Path(path) => {
                let data = std::fs::read(path)
                    .map_err(|e| WatermarkError::ResourceError(e.to_string()))?;
                LogoBitmap::decode(&data)
            }
            Self::Bytes(data) => LogoBitmap::decode(data),
        }
    }
}

/// A rasterized logo in straight (non-premultiplied) RGBA.
#[derive(Clone)]
pub struct LogoBitmap {
    image: Arc<RgbaImage>,
}

impl std::fmt::Debug for LogoBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoBitmap")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .finish()
    }
}

impl LogoBitmap {
    /// Wrap an already rasterized logo.
    pub fn from_rgba(image: RgbaImage) -> Result<Self, WatermarkError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(WatermarkError::DecodeError(
                "logo has zero width or height".to_string(),
            ));
        }
        Ok(Self {
            image: Arc::new(image),
        })
    }

    /// Decode logo bytes, trying SVG first when the data looks like XML.
    pub fn decode(data: &[u8]) -> Result<Self, WatermarkError> {
        if data.is_empty() {
            return Err(WatermarkError::DecodeError("logo data is empty".to_string()));
        }

        if looks_like_svg(data) {
            return Self::from_rgba(rasterize_svg(data)?);
        }

        let decoded = image::load_from_memory(data)
            .map_err(|e| WatermarkError::DecodeError(e.to_string()))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    // gzip magic: svgz
    if data.starts_with(&[0x1f, 0x8b]) {
        return true;
    }
    let head = &data[..data.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with("<?xml") || trimmed.starts_with("<svg") || trimmed.contains("<svg")
}

/// Render an SVG document to straight RGBA at its natural size.
fn rasterize_svg(data: &[u8]) -> Result<RgbaImage, WatermarkError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(data, &options)
        .map_err(|e| WatermarkError::DecodeError(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        WatermarkError::DecodeError(format!(
            "cannot allocate {}x{} logo canvas",
            size.width(),
            size.height()
        ))
    })?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    RgbaImage::from_raw(size.width(), size.height(), rgba).ok_or_else(|| {
        WatermarkError::DecodeError("rasterized logo buffer has unexpected size".to_string())
    })
}
