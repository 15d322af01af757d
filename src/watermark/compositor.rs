//! Watermark compositor for tiling a logo across page images.
//!
//! The logo is scaled relative to the page's shorter side, rotated, faded,
//! pasted onto a transparent overlay at every tile position, and the overlay
//! is alpha-composited over the page. The result is always flat RGB with the
//! page's exact dimensions.
//!
//! Watermarking is best-effort: any failure returns the page unchanged.
//!
//! # Example
//!
//! ```ignore
//! use pagemark::watermark::{Compositor, LogoResource, WatermarkConfig};
//!
//! let mut compositor = Compositor::from_resource(&LogoResource::path("logo.svg"), WatermarkConfig::default());
//! let watermarked = compositor.apply(page_image);
//! ```

use super::logo::{LogoBitmap, LogoResource};
use super::position::{
    centered_position, is_visible, scaled_height, target_width, tile_positions, ImageDimensions,
    PlacementPosition, WatermarkDimensions,
};
use super::transform::{apply_opacity, resize_lanczos, rotate_expand};
use super::{WatermarkConfig, WatermarkError};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use std::sync::Arc;

/// Everything needed to stamp one page size.
#[derive(Clone)]
pub struct WatermarkPlan {
    /// Logo width before rotation.
    pub target_width: u32,
    /// Scaled, rotated and faded logo.
    pub stamp: Arc<RgbaImage>,
    /// Paste positions, row by row.
    pub tiles: Vec<PlacementPosition>,
    /// Centered emphasis logo, when enabled.
    pub emphasis: Option<(Arc<RgbaImage>, PlacementPosition)>,
}

impl std::fmt::Debug for WatermarkPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkPlan")
            .field("target_width", &self.target_width)
            .field("stamp", &(self.stamp.width(), self.stamp.height()))
            .field("tiles", &self.tiles.len())
            .field("emphasis", &self.emphasis.as_ref().map(|(_, pos)| pos))
            .finish()
    }
}

/// Stamps prepared for one target width, reused across pages.
#[derive(Clone)]
struct PreparedStamps {
    target_width: u32,
    stamp: Arc<RgbaImage>,
    emphasis_width: Option<u32>,
    emphasis: Option<Arc<RgbaImage>>,
}

/// Compositor bound to one logo and one configuration.
///
/// Prepared stamps are cached by target width, so consecutive pages of the
/// same size reuse the scaled and rotated bitmap.
pub struct Compositor {
    logo: Option<LogoBitmap>,
    config: WatermarkConfig,
    cache: Option<PreparedStamps>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("logo", &self.logo)
            .field("config", &self.config)
            .field("cached_width", &self.cache.as_ref().map(|c| c.target_width))
            .finish()
    }
}

impl Compositor {
    /// Create a compositor from an already loaded logo.
    pub fn new(logo: LogoBitmap, config: WatermarkConfig) -> Self {
        Self {
            logo: Some(logo),
            config,
            cache: None,
        }
    }

    /// Create a compositor that leaves every page untouched.
    pub fn disabled(config: WatermarkConfig) -> Self {
        Self {
            logo: None,
            config,
            cache: None,
        }
    }

    /// Load the logo and create a compositor.
    ///
    /// A logo that cannot be loaded is logged and yields a disabled
    /// compositor rather than an error.
    pub fn from_resource(resource: &LogoResource, config: WatermarkConfig) -> Self {
        match resource.load() {
            Ok(logo) => {
                tracing::debug!(
                    logo = %resource.describe(),
                    width = logo.width(),
                    height = logo.height(),
                    "Watermark logo rasterized"
                );
                Self::new(logo, config)
            }
            Err(e) => {
                tracing::warn!(
                    logo = %resource.describe(),
                    error = %e,
                    "Watermark logo unavailable, pages will not be watermarked"
                );
                Self::disabled(config)
            }
        }
    }

    /// Whether a logo is loaded.
    pub fn is_active(&self) -> bool {
        self.logo.is_some()
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// Compute stamps and tile positions for a page size.
    pub fn plan(&mut self, page: ImageDimensions) -> Result<WatermarkPlan, WatermarkError> {
        if page.width == 0 || page.height == 0 {
            return Err(WatermarkError::CompositeError(format!(
                "page image is empty ({}x{})",
                page.width, page.height
            )));
        }
        self.config.validate().map_err(WatermarkError::ConfigError)?;

        let prepared = self.prepared_for(&page)?;
        let stamp_dims = WatermarkDimensions {
            width: prepared.stamp.width(),
            height: prepared.stamp.height(),
        };

        let tiles = tile_positions(&page, self.config.spacing, self.config.tile_origin)
            .into_iter()
            .filter(|pos| is_visible(pos, &page, &stamp_dims))
            .collect();

        let emphasis = prepared.emphasis.map(|image| {
            let dims = WatermarkDimensions {
                width: image.width(),
                height: image.height(),
            };
            let pos = centered_position(&page, &dims);
            (image, pos)
        });

        Ok(WatermarkPlan {
            target_width: prepared.target_width,
            stamp: prepared.stamp,
            tiles,
            emphasis,
        })
    }

    /// Render the transparent overlay for a page size.
    pub fn overlay(&mut self, page: ImageDimensions) -> Result<RgbaImage, WatermarkError> {
        let plan = self.plan(page)?;
        Ok(render_overlay(&plan, page))
    }

    /// Watermark a page, returning it unchanged if anything fails.
    pub fn apply(&mut self, page: DynamicImage) -> DynamicImage {
        if self.logo.is_none() {
            return page;
        }

        match self.try_apply(&page) {
            Ok(watermarked) => DynamicImage::ImageRgb8(watermarked),
            Err(e) => {
                tracing::warn!(
                    width = page.width(),
                    height = page.height(),
                    error = %e,
                    "Skipping watermark for page"
                );
                page
            }
        }
    }

    /// Watermark a page, reporting failures instead of swallowing them.
    pub fn try_apply(&mut self, page: &DynamicImage) -> Result<RgbImage, WatermarkError> {
        let dims = ImageDimensions {
            width: page.width(),
            height: page.height(),
        };
        let plan = self.plan(dims)?;
        let overlay = render_overlay(&plan, dims);

        tracing::debug!(
            width = dims.width,
            height = dims.height,
            target_width = plan.target_width,
            tile_count = plan.tiles.len(),
            emphasis = plan.emphasis.is_some(),
            "Compositing watermark"
        );

        flatten_over(page, &overlay)
    }

    fn prepared_for(&mut self, page: &ImageDimensions) -> Result<PreparedStamps, WatermarkError> {
        let logo = self
            .logo
            .as_ref()
            .ok_or_else(|| WatermarkError::ResourceError("no logo loaded".to_string()))?;

        let width = target_width(page, self.config.scale_fraction);
        let emphasis_width = self
            .config
            .center_emphasis
            .then(|| target_width(page, self.config.effective_center_scale()));

        if let Some(cached) = &self.cache {
            if cached.target_width == width && cached.emphasis_width == emphasis_width {
                return Ok(cached.clone());
            }
        }

        let stamp = Arc::new(prepare_stamp(logo, width, &self.config)?);
        let emphasis = emphasis_width
            .and_then(|w| emphasis_or_skip(prepare_stamp(logo, w, &self.config), w));

        let prepared = PreparedStamps {
            target_width: width,
            stamp,
            emphasis_width,
            emphasis,
        };
        self.cache = Some(prepared.clone());
        Ok(prepared)
    }
}

/// Keep the tiles when only the emphasis stamp fails.
fn emphasis_or_skip(
    result: Result<RgbaImage, WatermarkError>,
    target_width: u32,
) -> Option<Arc<RgbaImage>> {
    match result {
        Ok(image) => Some(Arc::new(image)),
        Err(e) => {
            tracing::warn!(
                target_width = target_width,
                error = %e,
                "Center emphasis skipped"
            );
            None
        }
    }
}

/// Watermark one page with a logo resource.
///
/// Loads the logo on every call; use [`Compositor`] to reuse it across pages.
/// Returns `page` unchanged when the logo cannot be resolved or compositing
/// fails.
pub fn composite(
    page: &DynamicImage,
    logo: &LogoResource,
    config: &WatermarkConfig,
) -> DynamicImage {
    Compositor::from_resource(logo, *config).apply(page.clone())
}

/// Scale, rotate and fade the logo into a stamp.
///
/// The stamp is exactly `target_width` wide before rotation.
pub fn prepare_stamp(
    logo: &LogoBitmap,
    target_width: u32,
    config: &WatermarkConfig,
) -> Result<RgbaImage, WatermarkError> {
    let natural = WatermarkDimensions {
        width: logo.width(),
        height: logo.height(),
    };
    let height = scaled_height(&natural, target_width);

    let resized = resize_lanczos(logo.image(), target_width, height)?;
    let mut rotated = rotate_expand(&resized, config.angle)?;
    apply_opacity(&mut rotated, config.opacity);
    Ok(rotated)
}

/// Paste every planned stamp onto a transparent canvas of the page's size.
pub fn render_overlay(plan: &WatermarkPlan, page: ImageDimensions) -> RgbaImage {
    let mut overlay = RgbaImage::from_pixel(page.width, page.height, Rgba([0, 0, 0, 0]));

    for pos in &plan.tiles {
        paste_over(&mut overlay, &plan.stamp, *pos);
    }
    if let Some((image, pos)) = &plan.emphasis {
        paste_over(&mut overlay, image, *pos);
    }

    overlay
}

/// Source-over paste of `stamp` onto `target` at `pos`, clipped to bounds.
pub fn paste_over(target: &mut RgbaImage, stamp: &RgbaImage, pos: PlacementPosition) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let x0 = pos.x as i64;
    let y0 = pos.y as i64;

    // Calculate the visible region (clamp to target bounds)
    let x_start = x0.max(0);
    let y_start = y0.max(0);
    let x_end = (x0 + stamp.width() as i64).min(target_width);
    let y_end = (y0 + stamp.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let sx = (tx - x0) as u32;
            let sy = (ty - y0) as u32;

            let fg = *stamp.get_pixel(sx, sy);
            if fg[3] == 0 {
                continue;
            }
            let bg = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(bg, fg));
        }
    }
}

/// Composite `overlay` over `base` and drop the alpha channel.
pub fn flatten_over(base: &DynamicImage, overlay: &RgbaImage) -> Result<RgbImage, WatermarkError> {
    if base.width() != overlay.width() || base.height() != overlay.height() {
        return Err(WatermarkError::CompositeError(format!(
            "overlay is {}x{} but page is {}x{}",
            overlay.width(),
            overlay.height(),
            base.width(),
            base.height()
        )));
    }

    let base = base.to_rgba8();
    let mut out = RgbImage::new(base.width(), base.height());

    for ((dst, bg), fg) in out.pixels_mut().zip(base.pixels()).zip(overlay.pixels()) {
        let blended = blend_pixels(*bg, *fg);
        *dst = image::Rgb([blended[0], blended[1], blended[2]]);
    }

    Ok(out)
}

/// Blend two straight-alpha pixels with the Porter-Duff "over" operator.
///
/// `result = fg * fg_alpha + bg * bg_alpha * (1 - fg_alpha)`, normalized by
/// the output alpha.
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result =
            (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
