use crate::domain::directive::ResizeDirective;
use crate::domain::error::TransformError;
use crate::domain::error::TransformError::{Encode, Resize, UnsupportedFormat};
use crate::domain::server_timing::{timing::Timing, ServerTiming};
use crate::domain::{TransformedImage, JPEG_CONTENT_TYPE, WEBP_CONTENT_TYPE};
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, instrument};

const JPEG_QUALITY: u8 = 80;

/// What decoding learns about the source before any pixel work.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

/// Decode, validate, orient, resize and re-encode a source JPEG.
///
/// Orientation is baked into the pixels before encoding because the encoder
/// drops the EXIF block.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn transform(
    bytes: &[u8],
    directive: &ResizeDirective,
) -> Result<TransformedImage, TransformError> {
    let mut server_timing = ServerTiming::new(Vec::with_capacity(4));

    let decoding_timer = Instant::now();
    let (mut image, metadata) = decode(bytes)?;
    debug!(
        "Decoded {}x{} {:?}, orientation {:?}",
        metadata.width, metadata.height, metadata.format, metadata.orientation
    );
    image.apply_orientation(metadata.orientation);
    server_timing.push(Timing::new("dec", decoding_timer.elapsed(), None));

    let resizing_timer = Instant::now();
    let (width, height) = fit_within(image.width(), image.height(), directive);
    let image = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        resize_image(&image, width, height)?
    };
    server_timing.push(Timing::new("res", resizing_timer.elapsed(), None));

    let encoding_timer = Instant::now();
    let bytes = encode_image(&image, directive.webp)?;
    server_timing.push(Timing::new("enc", encoding_timer.elapsed(), None));

    debug!("Encoded {width}x{height}, {} bytes", bytes.len());
    Ok(TransformedImage {
        bytes,
        content_type: if directive.webp {
            WEBP_CONTENT_TYPE
        } else {
            JPEG_CONTENT_TYPE
        },
        transcoded: directive.webp,
        width,
        height,
        server_timing,
    })
}

/// Reject anything that is not a JPEG by its magic bytes, then decode.
fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageMetadata), TransformError> {
    let format = image::guess_format(bytes).ok();
    if format != Some(ImageFormat::Jpeg) {
        return Err(UnsupportedFormat {
            format: format_name(format),
        });
    }

    let mut decoder =
        ImageReader::with_format(Cursor::new(bytes), ImageFormat::Jpeg).into_decoder()?;
    let (width, height) = decoder.dimensions();
    let orientation = decoder.orientation()?;
    let image = DynamicImage::from_decoder(decoder)?;

    Ok((
        image,
        ImageMetadata {
            format: ImageFormat::Jpeg,
            width,
            height,
            orientation,
        },
    ))
}

fn format_name(format: Option<ImageFormat>) -> String {
    format
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("unknown")
        .to_string()
}

/// Largest size that fits inside the requested box without upscaling or
/// changing the aspect ratio. A missing limit leaves that axis free.
pub fn fit_within(src_width: u32, src_height: u32, directive: &ResizeDirective) -> (u32, u32) {
    if directive.is_unconstrained() {
        return (src_width, src_height);
    }
    let max_width = directive.width.map_or(src_width, |w| w.min(src_width));
    let max_height = directive.height.map_or(src_height, |h| h.min(src_height));

    let scale = f64::min(
        max_width as f64 / src_width as f64,
        max_height as f64 / src_height as f64,
    );
    if scale >= 1.0 {
        return (src_width, src_height);
    }

    let width = ((src_width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let height = ((src_height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (width, height)
}

/// Resize with a Lanczos3 convolution into a fresh image of the same color type.
fn resize_image(
    src_image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, TransformError> {
    let mut dst_image = DynamicImage::new(width, height, src_image.color());
    let mut resizer = Resizer::new();
    resizer
        .resize(
            src_image,
            &mut dst_image,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
        )
        .map_err(|e| Resize(e.to_string()))?;
    Ok(dst_image)
}

fn encode_image(image: &DynamicImage, webp: bool) -> Result<Vec<u8>, TransformError> {
    let mut buffer: Vec<u8> = Vec::new();
    let written = if webp {
        image.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))
    } else {
        image.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
    };
    written.map_err(|e| Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Jpeg)
            .unwrap();
        buffer.into_inner()
    }

    pub(crate) fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    /// Splice a big-endian EXIF APP1 segment holding only an Orientation tag
    /// right after the SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff: Vec<u8> = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut app1: Vec<u8> = b"Exif\x00\x00".to_vec();
        app1.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn directive(width: Option<u32>, height: Option<u32>, webp: bool) -> ResizeDirective {
        ResizeDirective {
            width,
            height,
            webp,
        }
    }

    #[test]
    fn shrinks_to_requested_width() {
        let jpeg = create_test_jpeg(400, 300);
        let out = transform(&jpeg, &directive(Some(200), None, false)).unwrap();

        assert_eq!((out.width, out.height), (200, 150));
        assert_eq!(out.content_type, "image/jpeg");
        assert!(!out.transcoded);

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn never_upscales() {
        let jpeg = create_test_jpeg(120, 80);
        let out = transform(&jpeg, &directive(Some(500), Some(500), false)).unwrap();
        assert_eq!((out.width, out.height), (120, 80));
    }

    #[test]
    fn fits_inside_both_limits() {
        let jpeg = create_test_jpeg(400, 300);
        let out = transform(&jpeg, &directive(Some(300), Some(100), false)).unwrap();
        assert_eq!((out.width, out.height), (133, 100));
    }

    #[test]
    fn transcodes_to_webp() {
        let jpeg = create_test_jpeg(64, 48);
        let out = transform(&jpeg, &directive(None, None, true)).unwrap();

        assert_eq!(out.content_type, "image/webp");
        assert!(out.transcoded);
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::WebP);
        assert_eq!((out.width, out.height), (64, 48));
    }

    #[test]
    fn rejects_png() {
        let png = create_test_png(10, 10);
        let err = transform(&png, &ResizeDirective::default()).unwrap_err();
        assert_eq!(err.to_string(), "file format is not jpeg but: png");
    }

    #[test]
    fn rejects_unknown_bytes() {
        let err = transform(b"definitely not an image", &ResizeDirective::default()).unwrap_err();
        assert!(err.to_string().contains("is not jpeg"));
    }

    #[test]
    fn truncated_jpeg_fails_to_decode() {
        let jpeg = create_test_jpeg(64, 64);
        let err = transform(&jpeg[..20], &ResizeDirective::default()).unwrap_err();
        assert!(matches!(err, TransformError::Decode(_)));
    }

    #[test]
    fn applies_exif_orientation_before_resizing() {
        let jpeg = with_exif_orientation(&create_test_jpeg(40, 20), 6);
        let out = transform(&jpeg, &directive(None, Some(20), false)).unwrap();

        // rotated to 20x40 first, then bounded by the 20px height
        assert_eq!((out.width, out.height), (10, 20));
    }

    #[test]
    fn fit_within_unconstrained_keeps_size() {
        assert_eq!(fit_within(800, 600, &ResizeDirective::default()), (800, 600));
    }

    #[test]
    fn fit_within_height_only() {
        assert_eq!(fit_within(800, 600, &directive(None, Some(300), false)), (400, 300));
    }

    #[test]
    fn fit_within_never_collapses_to_zero() {
        assert_eq!(fit_within(1000, 2, &directive(Some(10), None, false)), (10, 1));
    }
}
