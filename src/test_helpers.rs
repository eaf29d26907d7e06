//! Shared test utilities for the gallery-ingest test suite.
//!
//! Generates small real images in memory so compression tests exercise the
//! actual codecs without fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let original = asset("photo.jpg", MediaType::Jpeg, noise_jpeg_bytes(800, 600, 95));
//! let file = candidate("photo.jpg", png_bytes(10, 10));
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use crate::types::{CandidateFile, ImageAsset, MediaType};

// =========================================================================
// Pixel sources
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Deterministic per-pixel jitter, so encoders can't collapse the image.
fn jitter(x: u32, y: u32) -> u8 {
    let mut h = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    (h % 32) as u8
}

fn noisy(width: u32, height: u32) -> RgbImage {
    let mut img = gradient(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let j = jitter(x, y);
        for c in px.0.iter_mut() {
            *c = c.saturating_add(j);
        }
    }
    img
}

// =========================================================================
// Encoded bytes
// =========================================================================

fn encode_jpeg(img: RgbImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .unwrap();
    buf
}

/// Smooth gradient JPEG.
pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    encode_jpeg(gradient(width, height), quality)
}

/// Gradient JPEG with mild noise; compresses like a photo rather than a flat fill.
pub fn noise_jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    encode_jpeg(noisy(width, height), quality)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(PngEncoder::new(&mut buf))
        .unwrap();
    buf
}

pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        .unwrap();
    buf
}

// =========================================================================
// Pipeline values
// =========================================================================

/// Accepted asset with `declared_size` equal to the byte length.
pub fn asset(filename: &str, media_type: MediaType, bytes: Vec<u8>) -> ImageAsset {
    ImageAsset {
        filename: filename.to_string(),
        declared_size: bytes.len() as u64,
        media_type,
        bytes,
    }
}

/// Candidate with no MIME type and `declared_size` equal to the byte length.
pub fn candidate(filename: &str, bytes: Vec<u8>) -> CandidateFile {
    CandidateFile::from_bytes(filename, bytes)
}
