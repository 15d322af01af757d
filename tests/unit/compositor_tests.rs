// Watermark compositor tests against the public API

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use pagemark::watermark::*;
use rstest::rstest;

const RED_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="200">
  <rect width="400" height="200" fill="#c00000"/>
</svg>"##;

fn svg_logo() -> LogoResource {
    LogoResource::bytes(RED_SVG.as_bytes())
}

fn white_page(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([255, 255, 255])))
}

fn dims(w: u32, h: u32) -> ImageDimensions {
    ImageDimensions {
        width: w,
        height: h,
    }
}

fn alpha_sum(overlay: &RgbaImage) -> u64 {
    overlay.pixels().map(|p| p[3] as u64).sum()
}

#[test]
fn test_end_to_end_letter_page() {
    let mut compositor = Compositor::from_resource(&svg_logo(), WatermarkConfig::default());
    assert!(compositor.is_active());

    let plan = compositor.plan(dims(1000, 1400)).unwrap();
    assert_eq!(plan.target_width, 250);
    assert_eq!(plan.stamp.width(), 250);
    assert_eq!(plan.stamp.height(), 125);
    assert_eq!(plan.tiles.len(), 16);
    assert_eq!(plan.tiles[0], PlacementPosition::new(0, 0));

    let out = compositor.apply(white_page(1000, 1400));
    assert_eq!((out.width(), out.height()), (1000, 1400));
    let rgb = out.as_rgb8().expect("watermarked output is RGB");

    // Tile at origin is tinted red at 65% opacity over white
    let tinted = rgb.get_pixel(100, 60);
    assert!(tinted[0] > 200 && tinted[1] < 130, "{:?}", tinted);

    // Gap between columns stays white
    assert_eq!(rgb.get_pixel(300, 60).0, [255, 255, 255]);
}

#[test]
fn test_output_is_deterministic() {
    let config = WatermarkConfig {
        angle: 30.0,
        ..Default::default()
    };
    let page = DynamicImage::ImageRgb8(RgbImage::from_fn(300, 420, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    }));

    let first = composite(&page, &svg_logo(), &config);
    let second = composite(&page, &svg_logo(), &config);
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[rstest]
#[case(DynamicImage::ImageRgb8(RgbImage::new(640, 480)))]
#[case(DynamicImage::ImageRgba8(RgbaImage::new(333, 777)))]
#[case(DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 20, Luma([200]))))]
#[case(DynamicImage::ImageRgb8(RgbImage::new(1, 1)))]
fn test_dimensions_preserved(#[case] page: DynamicImage) {
    let (w, h) = (page.width(), page.height());
    for origin in [TileOriginMode::Raw, TileOriginMode::MarginCentered] {
        let config = WatermarkConfig {
            angle: 45.0,
            tile_origin: origin,
            center_emphasis: true,
            ..Default::default()
        };
        let out = composite(&page, &svg_logo(), &config);
        assert_eq!((out.width(), out.height()), (w, h));
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }
}

#[test]
fn test_missing_logo_returns_page_unchanged() {
    let page = DynamicImage::ImageRgba8(RgbaImage::from_pixel(80, 60, Rgba([1, 2, 3, 4])));
    let out = composite(
        &page,
        &LogoResource::path("/nonexistent/brand/logo.svg"),
        &WatermarkConfig::default(),
    );
    assert_eq!(out, page);
}

#[test]
fn test_undecodable_logo_returns_page_unchanged() {
    let page = white_page(40, 40);
    let out = composite(
        &page,
        &LogoResource::bytes(b"definitely not an image".to_vec()),
        &WatermarkConfig::default(),
    );
    assert_eq!(out, page);
}

#[rstest]
#[case(40, 40)]
#[case(100, 127)]
#[case(127, 2000)]
fn test_watermark_width_floor(#[case] w: u32, #[case] h: u32) {
    let mut compositor = Compositor::from_resource(&svg_logo(), WatermarkConfig::default());
    let plan = compositor.plan(dims(w, h)).unwrap();
    assert_eq!(plan.target_width, 32);
    assert_eq!(plan.stamp.width(), 32);
}

#[rstest]
#[case(1000, 1400, 320, 380)]
#[case(2000, 3000, 320, 380)]
#[case(500, 500, 100, 150)]
fn test_tile_count_matches_grid(
    #[case] w: u32,
    #[case] h: u32,
    #[case] sx: u32,
    #[case] sy: u32,
) {
    let config = WatermarkConfig {
        spacing: TileSpacing::new(sx, sy),
        ..Default::default()
    };
    let mut compositor = Compositor::from_resource(&svg_logo(), config);
    let plan = compositor.plan(dims(w, h)).unwrap();

    let expected = (w.div_ceil(sx) * h.div_ceil(sy)) as usize;
    assert_eq!(plan.tiles.len(), expected);
    assert_eq!(
        tile_count(&dims(w, h), config.spacing, TileOriginMode::Raw),
        expected
    );
}

#[test]
fn test_opacity_is_monotonic() {
    let mut previous = None;
    for opacity in [0.0, 0.2, 0.4, 0.65, 0.8, 1.0] {
        let config = WatermarkConfig {
            opacity,
            ..Default::default()
        };
        let mut compositor = Compositor::from_resource(&svg_logo(), config);
        let sum = alpha_sum(&compositor.overlay(dims(600, 800)).unwrap());

        if let Some(prev) = previous {
            assert!(sum >= prev, "opacity {} gave {} < {}", opacity, sum, prev);
        }
        previous = Some(sum);
    }
}

#[test]
fn test_zero_opacity_leaves_page_visually_unchanged() {
    let config = WatermarkConfig {
        opacity: 0.0,
        ..Default::default()
    };
    let page = white_page(200, 200);
    let out = composite(&page, &svg_logo(), &config);
    assert_eq!(out.to_rgb8(), page.to_rgb8());
}

#[test]
fn test_rotation_expands_stamp() {
    let config = WatermarkConfig {
        angle: 45.0,
        ..Default::default()
    };
    let mut compositor = Compositor::from_resource(&svg_logo(), config);
    let plan = compositor.plan(dims(1000, 1400)).unwrap();

    // 250x125 rotated by 45 degrees
    let (ew, eh) = rotated_extent(250, 125, 45.0);
    assert_eq!(plan.stamp.dimensions(), (ew, eh));
    assert!(ew > 250 && eh > 125);
}

#[test]
fn test_quarter_turn_swaps_axes() {
    let config = WatermarkConfig {
        angle: 90.0,
        ..Default::default()
    };
    let mut compositor = Compositor::from_resource(&svg_logo(), config);
    let plan = compositor.plan(dims(1000, 1400)).unwrap();
    assert_eq!(plan.stamp.dimensions(), (125, 250));
}

#[test]
fn test_center_emphasis_adds_larger_logo() {
    let config = WatermarkConfig {
        center_emphasis: true,
        center_scale: 0.9,
        ..Default::default()
    };
    let mut compositor = Compositor::from_resource(&svg_logo(), config);
    let plan = compositor.plan(dims(1000, 1400)).unwrap();

    // center_scale clamps to 0.5
    let (image, pos) = plan.emphasis.expect("emphasis planned");
    assert_eq!(image.dimensions(), (500, 250));
    assert_eq!(pos, PlacementPosition::new(250, 575));
}
