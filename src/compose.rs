//! QR overlay composition.
//!
//! Builds the publishable image: decodes the source photo, downscales it to
//! fit the configured bound, renders a QR code for the channel link, and
//! composites the code onto the bottom-right corner on a white backing
//! plate. Pure function of its inputs aside from logging.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Luma, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};

use crate::config::ComposeConfig;
use crate::error::ComposeError;

/// Smallest QR side that stays reliably scannable; wins over the
/// percentage-derived size.
pub const MIN_QR_SIDE: u32 = 50;

/// White margin drawn around the QR code on each side, in pixels.
const PLATE_MARGIN: u32 = 5;

/// Computes the QR side length for a source image of the given dimensions.
///
/// `floor(min(width, height) × pct / 100)`, clamped up to [`MIN_QR_SIDE`].
pub fn qr_target_side(width: u32, height: u32, pct: f64) -> u32 {
    let raw = (f64::from(width.min(height)) * pct / 100.0).floor() as u32;
    raw.max(MIN_QR_SIDE)
}

/// Overlays a QR code encoding `link_payload` onto `source_bytes`.
///
/// Returns the composed image encoded as JPEG.
///
/// # Errors
///
/// - `ComposeError::Validation` if the image payload is empty or the link
///   payload is blank.
/// - `ComposeError::Decode` / `ComposeError::Encode` on codec failure.
/// - `ComposeError::Qr` if the payload cannot be encoded as a QR code.
pub fn compose(
    source_bytes: &[u8],
    link_payload: &str,
    config: &ComposeConfig,
) -> Result<Vec<u8>, ComposeError> {
    if source_bytes.is_empty() {
        return Err(ComposeError::Validation(
            "source image payload is empty".to_string(),
        ));
    }
    if link_payload.trim().is_empty() {
        return Err(ComposeError::Validation(
            "link payload is blank".to_string(),
        ));
    }

    let pct = config.effective_qr_percentage();

    let mut source = image::load_from_memory(source_bytes)
        .map_err(|e| ComposeError::Decode(e.to_string()))?;

    // Fit within the configured bound, preserving aspect ratio. Never
    // upscale: resize only when a dimension exceeds the bound.
    let max = config.max_image_dimension;
    if source.width() > max || source.height() > max {
        tracing::debug!(
            width = source.width(),
            height = source.height(),
            max,
            "Downscaling source image to fit bound"
        );
        source = source.resize(max, max, FilterType::Lanczos3);
    }

    let (width, height) = (source.width(), source.height());
    let side = qr_target_side(width, height, pct);

    let qr = render_qr(link_payload, config.qr_module_pixel_size)?;
    let qr = qr.resize_exact(side, side, FilterType::Nearest);

    // White backing plate with a uniform margin for scanner contrast.
    let plate_side = side + 2 * PLATE_MARGIN;
    let mut plate = RgbaImage::from_pixel(plate_side, plate_side, Rgba([255, 255, 255, 255]));
    imageops::overlay(
        &mut plate,
        &qr.to_rgba8(),
        i64::from(PLATE_MARGIN),
        i64::from(PLATE_MARGIN),
    );

    // Anchor bottom-right, offset inward by the configured padding. Clamp
    // to the origin so the code stays visible on tiny sources.
    let x = (i64::from(width) - i64::from(plate_side) - i64::from(config.qr_padding)).max(0);
    let y = (i64::from(height) - i64::from(plate_side) - i64::from(config.qr_padding)).max(0);

    tracing::debug!(x, y, side, "Overlaying QR plate onto source image");

    let mut canvas = source.to_rgba8();
    imageops::overlay(&mut canvas, &plate, x, y);

    let composed = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(composed)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| ComposeError::Encode(e.to_string()))?;

    Ok(buf)
}

/// Renders a QR code for the payload at error-correction level Q.
fn render_qr(payload: &str, module_pixel_size: u32) -> Result<DynamicImage, ComposeError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::Q)
        .map_err(|e| ComposeError::Qr(e.to_string()))?;

    let bitmap = code
        .render::<Luma<u8>>()
        .module_dimensions(module_pixel_size, module_pixel_size)
        .build();

    Ok(DynamicImage::ImageLuma8(bitmap))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a flat gray test image of the given size as JPEG bytes.
    fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 90, 90]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .expect("test image should encode");
        buf
    }

    #[test]
    fn test_qr_target_side_percentage() {
        // min(1000, 800) * 0.20 = 160, above the readability floor
        assert_eq!(qr_target_side(1000, 800, 20.0), 160);
    }

    #[test]
    fn test_qr_target_side_floor_wins() {
        // min(1000, 800) * 0.05 = 40, below the 50px floor
        assert_eq!(qr_target_side(1000, 800, 5.0), 50);
    }

    #[test]
    fn test_qr_target_side_floors_fraction() {
        // min(333, 500) * 0.20 = 66.6 -> 66
        assert_eq!(qr_target_side(333, 500, 20.0), 66);
    }

    #[test]
    fn test_compose_rejects_empty_image() {
        let err = compose(&[], "https://t.me/test", &ComposeConfig::default())
            .expect_err("empty payload should fail");
        assert!(matches!(err, ComposeError::Validation(_)));
    }

    #[test]
    fn test_compose_rejects_blank_payload() {
        let err = compose(&test_jpeg(100, 100), "   ", &ComposeConfig::default())
            .expect_err("blank payload should fail");
        assert!(matches!(err, ComposeError::Validation(_)));
    }

    #[test]
    fn test_compose_rejects_undecodable_bytes() {
        let err = compose(
            &[0xDE, 0xAD, 0xBE, 0xEF],
            "https://t.me/test",
            &ComposeConfig::default(),
        )
        .expect_err("garbage bytes should fail");
        assert!(matches!(err, ComposeError::Decode(_)));
    }

    #[test]
    fn test_compose_preserves_dimensions_within_bound() {
        let bytes = test_jpeg(400, 300);
        let out = compose(&bytes, "https://t.me/test", &ComposeConfig::default())
            .expect("compose should succeed");

        let composed = image::load_from_memory(&out).expect("output should decode");
        assert_eq!(composed.width(), 400);
        assert_eq!(composed.height(), 300);
    }

    #[test]
    fn test_compose_downscales_oversized_source() {
        let config = ComposeConfig {
            max_image_dimension: 200,
            ..ComposeConfig::default()
        };
        let bytes = test_jpeg(400, 200);
        let out = compose(&bytes, "https://t.me/test", &config)
            .expect("compose should succeed");

        let composed = image::load_from_memory(&out).expect("output should decode");
        assert_eq!(composed.width(), 200);
        assert_eq!(composed.height(), 100);
    }

    #[test]
    fn test_compose_places_white_plate_bottom_right() {
        let config = ComposeConfig::default();
        let bytes = test_jpeg(500, 500);
        let out = compose(&bytes, "https://t.me/test", &config)
            .expect("compose should succeed");

        let composed = image::load_from_memory(&out)
            .expect("output should decode")
            .to_rgb8();

        // side = 500 * 0.20 = 100, plate = 110, padding = 20; the plate's
        // top-left corner pixel sits inside the white margin.
        let px = composed.get_pixel(500 - 110 - 20 + 2, 500 - 110 - 20 + 2);
        assert!(
            px.0.iter().all(|&c| c > 230),
            "expected near-white plate pixel, got {:?}",
            px
        );

        // Well outside the plate the source gray survives.
        let bg = composed.get_pixel(10, 10);
        assert!(bg.0.iter().all(|&c| c < 150), "expected gray background");
    }

    #[test]
    fn test_compose_output_is_jpeg() {
        let bytes = test_jpeg(120, 120);
        let out = compose(&bytes, "https://t.me/test", &ComposeConfig::default())
            .expect("compose should succeed");

        let format = image::guess_format(&out).expect("format should be detectable");
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_compose_uses_default_for_out_of_range_percentage() {
        // pct = 80 resets to 20: the plate footprint must match the
        // 20% sizing, not 80%.
        let config = ComposeConfig {
            qr_max_size_percentage: 80.0,
            ..ComposeConfig::default()
        };
        let bytes = test_jpeg(500, 500);
        let out = compose(&bytes, "https://t.me/test", &config)
            .expect("compose should succeed");
        let composed = image::load_from_memory(&out)
            .expect("output should decode")
            .to_rgb8();

        // At 80% the plate would cover this pixel; at 20% it must not.
        let px = composed.get_pixel(150, 150);
        assert!(px.0.iter().all(|&c| c < 150), "expected gray background");
    }
}
