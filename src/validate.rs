//! Pre-flight validation of a batch.
//!
//! Pure: no I/O and no side effects. Each file is judged on its own, so one
//! bad file never disqualifies the rest of the batch. Accepted and rejected
//! files both keep the order they were submitted in.

use crate::config::ValidationConfig;
use crate::types::{CandidateFile, ImageAsset, MediaType};
use thiserror::Error;

/// Why a file was refused before any compression or upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file too large ({size} bytes, max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
    #[error("invalid file type ({found}); allowed: {allowed}")]
    InvalidType { found: String, allowed: String },
}

/// Size and type policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub max_bytes: u64,
    /// Lowercase extensions without the dot.
    pub allowed_types: Vec<String>,
}

impl ValidationPolicy {
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            max_bytes: config.max_file_bytes,
            allowed_types: config
                .allowed_types
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_types.iter().any(|t| t == ext)
    }

    fn allows(&self, media_type: MediaType) -> bool {
        media_type
            .extensions()
            .iter()
            .any(|ext| self.allows_extension(ext))
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

/// A refused file and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub filename: String,
    pub error: ValidationError,
}

/// Result of validating a batch.
#[derive(Debug, Default)]
pub struct Partition {
    pub accepted: Vec<ImageAsset>,
    pub rejected: Vec<Rejection>,
}

/// Check one file against the policy, resolving its media type.
///
/// The extension is consulted first; the declared MIME type is only used when
/// the extension is missing or not an image extension we know. Type is
/// checked before size.
pub fn check_file(file: &CandidateFile, policy: &ValidationPolicy) -> Result<MediaType, ValidationError> {
    let media_type = resolve_type(file, policy)?;
    if file.declared_size > policy.max_bytes {
        return Err(ValidationError::TooLarge {
            size: file.declared_size,
            max: policy.max_bytes,
        });
    }
    Ok(media_type)
}

fn resolve_type(file: &CandidateFile, policy: &ValidationPolicy) -> Result<MediaType, ValidationError> {
    let ext = file.extension();
    let from_ext = ext.as_deref().and_then(MediaType::from_extension);

    let resolved = match (from_ext, ext.as_deref()) {
        (Some(media_type), Some(ext)) => policy.allows_extension(ext).then_some(media_type),
        _ => file
            .mime
            .as_deref()
            .and_then(MediaType::from_mime)
            .filter(|media_type| policy.allows(*media_type)),
    };

    resolved.ok_or_else(|| ValidationError::InvalidType {
        found: describe_type(file, ext.as_deref()),
        allowed: policy.allowed_types.join(", "),
    })
}

fn describe_type(file: &CandidateFile, ext: Option<&str>) -> String {
    match (ext, file.mime.as_deref()) {
        (Some(ext), _) => format!(".{ext}"),
        (None, Some(mime)) => mime.to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Split a batch into accepted assets and rejections.
pub fn partition(files: Vec<CandidateFile>, policy: &ValidationPolicy) -> Partition {
    let mut out = Partition::default();
    for file in files {
        match check_file(&file, policy) {
            Ok(media_type) => out.accepted.push(ImageAsset {
                filename: file.filename,
                declared_size: file.declared_size,
                media_type,
                bytes: file.bytes,
            }),
            Err(error) => out.rejected.push(Rejection {
                filename: file.filename,
                error,
            }),
        }
    }
    out
}
