//! Shared types passed between pipeline stages.
//!
//! A [`CandidateFile`] is what the operator selected. The validator turns the
//! ones it accepts into [`ImageAsset`]s, which carry a resolved [`MediaType`]
//! and are what the compressor and uploader work on.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats the pipeline knows how to decode, re-encode, and upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Jpeg, MediaType::Png, MediaType::Webp];

    /// Resolve a filename extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "webp" => Some(MediaType::Webp),
            _ => None,
        }
    }

    /// Resolve a declared MIME type. Parameters (`; charset=…`) are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "image/webp" => Some(MediaType::Webp),
            _ => None,
        }
    }

    /// Every extension that maps to this type.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaType::Jpeg => &["jpeg", "jpg"],
            MediaType::Png => &["png"],
            MediaType::Webp => &["webp"],
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            MediaType::Jpeg => ImageFormat::Jpeg,
            MediaType::Png => ImageFormat::Png,
            MediaType::Webp => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::Jpeg => "JPEG",
            MediaType::Png => "PNG",
            MediaType::Webp => "WebP",
        };
        f.write_str(name)
    }
}

/// A file as the operator selected it, before any policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub filename: String,
    /// Size reported by the selection surface; this is what the size policy checks.
    pub declared_size: u64,
    /// MIME type reported by the selection surface, if any.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    /// Candidate whose declared size is its byte length and which has no MIME type.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            declared_size: bytes.len() as u64,
            mime: None,
            bytes,
        }
    }

    /// Lowercased extension of the filename, if it has one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// An accepted image moving through compression and upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub filename: String,
    pub declared_size: u64,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    /// Same file identity with new contents (used by compressors).
    pub fn with_bytes(&self, bytes: Vec<u8>) -> Self {
        Self {
            filename: self.filename.clone(),
            declared_size: bytes.len() as u64,
            media_type: self.media_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
