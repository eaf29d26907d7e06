//! CLI output formatting for every command.
//!
//! # Display Contract
//!
//! Every file follows the same two-level pattern: a header line with the
//! filename, then indented context lines for what happened to it. Gallery
//! listings lead with the 1-based position, since position is what decides
//! which image is primary.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Ingesting 2 file(s), 1 rejected
//! huge.jpg
//!     rejected: file too large (8.0 MB, max 5.0 MB)
//! front.jpg
//!     compressed: 2.0 MB → 480.0 KB
//!     uploaded: https://res.cloudinary.com/shop/image/upload/front.jpg
//! back.png
//!     compression failed, uploading original: failed to decode back.png: …
//!     upload failed: network error: connection reset
//!
//! Uploaded 1 image(s), 2 failed
//! Failures
//!     huge.jpg: file too large (8388608 bytes, max 5242880 bytes)
//!     back.png: network error: connection reset
//! ```
//!
//! ## Gallery
//!
//! ```text
//! Gallery (2 images)
//!     001 https://…/front.jpg (primary)
//!     002 https://…/back.jpg
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 front.jpg: JPEG, 2.0 MB
//! 002 notes.txt: invalid file type (.txt); allowed: jpeg, jpg, png, webp
//!
//! 1 accepted, 1 rejected
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::gallery::Gallery;
use crate::ingest::{CompressionStatus, Failure, IngestEvent, IngestOutcome};
use crate::validate::{Partition, ValidationError};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count, base 1024.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn rejection_reason(error: &ValidationError) -> String {
    match error {
        ValidationError::TooLarge { size, max } => format!(
            "file too large ({}, max {})",
            format_size(*size),
            format_size(*max)
        ),
        other => other.to_string(),
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Format a single ingest progress event as display lines.
pub fn format_ingest_event(event: &IngestEvent) -> Vec<String> {
    match event {
        IngestEvent::BatchStarted { accepted, rejected } => match rejected {
            0 => vec![format!("Ingesting {} file(s)", accepted)],
            n => vec![format!("Ingesting {} file(s), {} rejected", accepted, n)],
        },
        IngestEvent::Rejected { filename, reason } => vec![
            filename.clone(),
            format!("    rejected: {}", rejection_reason(reason)),
        ],
        IngestEvent::FileProcessed {
            filename,
            compression,
            upload,
        } => {
            let mut lines = vec![filename.clone()];
            lines.push(match compression {
                CompressionStatus::Compressed {
                    from_bytes,
                    to_bytes,
                } => format!(
                    "    compressed: {} \u{2192} {}",
                    format_size(*from_bytes),
                    format_size(*to_bytes)
                ),
                CompressionStatus::Unchanged { bytes } => {
                    format!("    kept original: {}", format_size(*bytes))
                }
                CompressionStatus::Failed { reason } => {
                    format!("    compression failed, uploading original: {}", reason)
                }
            });
            lines.push(match upload {
                Ok(url) => format!("    uploaded: {}", url),
                Err(err) => format!("    upload failed: {}", err),
            });
            lines
        }
    }
}

/// Format the end-of-run summary: counts, then one line per failure.
pub fn format_ingest_summary(outcome: &IngestOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "Uploaded {} image(s), {} failed",
        outcome.uploaded,
        outcome.failures.len()
    )];
    if !outcome.failures.is_empty() {
        lines.push("Failures".to_string());
        lines.extend(outcome.failures.iter().map(failure_line));
    }
    lines
}

fn failure_line(failure: &Failure) -> String {
    format!("    {}: {}", failure.filename, failure.reason)
}

pub fn print_ingest_summary(outcome: &IngestOutcome) {
    for line in format_ingest_summary(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format a gallery listing. An empty gallery shows the placeholder that
/// listings fall back to.
pub fn format_gallery(gallery: &Gallery, placeholder: &str) -> Vec<String> {
    if gallery.is_empty() {
        return vec![
            "Gallery (empty)".to_string(),
            format!("    primary: {} (placeholder)", placeholder),
        ];
    }

    let mut lines = vec![format!("Gallery ({} images)", gallery.len())];
    for (i, url) in gallery.urls().iter().enumerate() {
        if i == 0 {
            lines.push(format!("    {} {} (primary)", format_index(i + 1), url));
        } else {
            lines.push(format!("    {} {}", format_index(i + 1), url));
        }
    }
    lines
}

pub fn print_gallery(gallery: &Gallery, placeholder: &str) {
    for line in format_gallery(gallery, placeholder) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format a validation-only pass. Accepted files come first, then rejections,
/// each in submission order.
pub fn format_check_output(split: &Partition) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pos = 0;
    for asset in &split.accepted {
        pos += 1;
        lines.push(format!(
            "{} {}: {}, {}",
            format_index(pos),
            asset.filename,
            asset.media_type,
            format_size(asset.declared_size)
        ));
    }
    for rejection in &split.rejected {
        pos += 1;
        lines.push(format!(
            "{} {}: {}",
            format_index(pos),
            rejection.filename,
            rejection_reason(&rejection.error)
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "{} accepted, {} rejected",
        split.accepted.len(),
        split.rejected.len()
    ));
    lines
}

pub fn print_check_output(split: &Partition) {
    for line in format_check_output(split) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
