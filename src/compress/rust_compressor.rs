//! Pure Rust compressor built on the `image` crate.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode JPEG | `JpegEncoder::new_with_quality`, walking the quality ladder |
//! | Encode PNG | `PngEncoder` with `CompressionType::Best` |
//! | Encode WebP | `WebPEncoder::new_lossless` (the only WebP encoder in `image`) |
//!
//! The output keeps the input's media type. When no candidate meets the byte
//! budget, dimensions shrink by 15% per pass; if the budget is never met the
//! smallest candidate wins.

use super::calculations::{fit_within, shrink};
use super::compressor::{Compression, CompressionError, Compressor};
use super::params::{CompressionTargets, Quality};
use crate::types::{ImageAsset, MediaType};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError};

/// Scale applied to both edges on each extra pass.
const SHRINK_FACTOR: f64 = 0.85;
/// Extra passes after the first, each at smaller dimensions.
const MAX_SHRINK_PASSES: usize = 8;

/// Compressor backed by the `image` crate.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustCompressor;

impl RustCompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCompressor {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(asset: &ImageAsset) -> Result<DynamicImage, CompressionError> {
    image::load_from_memory_with_format(&asset.bytes, asset.media_type.image_format()).map_err(
        |e| CompressionError::Decode {
            filename: asset.filename.clone(),
            reason: e.to_string(),
        },
    )
}

/// Encode `img` in `media_type`. `quality` only affects JPEG.
fn encode(img: &DynamicImage, media_type: MediaType, quality: Quality) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    match media_type {
        MediaType::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.value()))?;
        }
        MediaType::Png => {
            img.write_with_encoder(PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                PngFilter::Adaptive,
            ))?;
        }
        MediaType::Webp => {
            let frame = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            frame.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
        }
    }
    Ok(buf)
}

impl Compressor for RustCompressor {
    fn compress(
        &self,
        asset: &ImageAsset,
        targets: &CompressionTargets,
    ) -> Result<Compression, CompressionError> {
        let img = decode(asset)?;
        let original_dims = img.dimensions();
        let mut dims = fit_within(original_dims, targets.max_dimension_px);
        let must_resize = dims != original_dims;

        let ladder = match asset.media_type {
            MediaType::Jpeg => targets.quality_ladder(),
            MediaType::Png | MediaType::Webp => vec![targets.initial_quality],
        };

        let mut best: Option<Vec<u8>> = None;
        'passes: for _ in 0..=MAX_SHRINK_PASSES {
            let resized;
            let frame = if dims == original_dims {
                &img
            } else {
                resized = img.resize_exact(dims.0, dims.1, FilterType::Lanczos3);
                &resized
            };

            for &quality in &ladder {
                let encoded = encode(frame, asset.media_type, quality).map_err(|e| {
                    CompressionError::Encode {
                        filename: asset.filename.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let fits = encoded.len() as u64 <= targets.max_bytes;
                if best.as_ref().is_none_or(|b| encoded.len() < b.len()) {
                    best = Some(encoded);
                }
                if fits {
                    tracing::debug!(
                        file = %asset.filename,
                        width = dims.0,
                        height = dims.1,
                        quality = quality.value(),
                        "met size budget"
                    );
                    break 'passes;
                }
            }

            match shrink(dims, SHRINK_FACTOR) {
                Some(next) => dims = next,
                None => break,
            }
        }

        match best {
            Some(bytes) if must_resize || bytes.len() < asset.len() => {
                Ok(Compression::Reencoded(asset.with_bytes(bytes)))
            }
            _ => Ok(Compression::Unchanged),
        }
    }
}
