//! Batch ingestion: validate → compress → upload → merge.
//!
//! One run takes the current gallery and a batch of candidate files and
//! returns a new gallery plus the per-file failures. The caller owns the
//! gallery and persists the result; this module never touches shared state.
//!
//! ## Steps
//!
//! 1. **Validate** the whole batch. Rejections become failures immediately
//!    and are never compressed or uploaded.
//! 2. **Compress, then upload** each accepted file. A compression problem
//!    uploads the original instead; an upload problem is recorded and the
//!    batch moves on.
//! 3. **Merge** as `current ++ uploaded`, in submission order.
//!
//! ## Parallel Processing
//!
//! Per-file work runs on the [rayon](https://docs.rs/rayon) pool, so its
//! size (see [`effective_threads`](crate::config::effective_threads)) bounds
//! how many files are in flight. Each result is tagged with its submission
//! index and sorted back before merging, so the merged order never depends on
//! which upload finished first.
//!
//! Runs against the same product must be serialized by the caller: the merge
//! appends to the snapshot it was given.

use crate::compress::{
    CompressionOutcome, CompressionTargets, Compressor, PassThrough, RustCompressor,
    compress_or_passthrough,
};
use crate::config::{ConfigError, IngestConfig};
use crate::gallery::Gallery;
use crate::types::{CandidateFile, ImageAsset};
use crate::upload::{CloudinaryUploader, UploadError, Uploader, UploaderSetupError};
use crate::validate::{ValidationError, ValidationPolicy, partition};
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Uploader setup failed: {0}")]
    Setup(#[from] UploaderSetupError),
}

/// Policy and budget for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub policy: ValidationPolicy,
    pub targets: CompressionTargets,
}

impl PipelineConfig {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            policy: ValidationPolicy::from_config(&config.validation),
            targets: CompressionTargets::from_config(&config.compression),
        }
    }
}

/// Why a file did not make it into the gallery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// One file that did not make it into the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub filename: String,
    pub reason: FailureReason,
}

/// What happened to a file during compression, for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionStatus {
    Compressed { from_bytes: u64, to_bytes: u64 },
    Unchanged { bytes: u64 },
    Failed { reason: String },
}

impl CompressionStatus {
    fn of(outcome: &CompressionOutcome) -> Self {
        match outcome {
            CompressionOutcome::Compressed {
                asset,
                original_bytes,
            } => CompressionStatus::Compressed {
                from_bytes: *original_bytes,
                to_bytes: asset.len() as u64,
            },
            CompressionOutcome::Original {
                asset,
                reason: PassThrough::Unchanged,
            } => CompressionStatus::Unchanged {
                bytes: asset.len() as u64,
            },
            CompressionOutcome::Original {
                reason: PassThrough::Failed(err),
                ..
            } => CompressionStatus::Failed {
                reason: err.to_string(),
            },
        }
    }
}

/// Progress events, sent as they happen (completion order, not file order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    BatchStarted { accepted: usize, rejected: usize },
    Rejected { filename: String, reason: ValidationError },
    FileProcessed {
        filename: String,
        compression: CompressionStatus,
        upload: Result<String, UploadError>,
    },
}

/// Newly uploaded URLs (submission order) and failures of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub uploaded: Vec<String>,
    pub failures: Vec<Failure>,
}

/// Result of [`ingest_with`]: the merged gallery and what went wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub gallery: Gallery,
    pub failures: Vec<Failure>,
    /// How many URLs were appended.
    pub uploaded: usize,
}

fn emit(events: Option<&Sender<IngestEvent>>, event: IngestEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is watching progress.
        let _ = tx.send(event);
    }
}

fn process_file(
    compressor: &impl Compressor,
    uploader: &impl Uploader,
    targets: &CompressionTargets,
    asset: ImageAsset,
    events: Option<&Sender<IngestEvent>>,
) -> Result<String, UploadError> {
    let filename = asset.filename.clone();
    let outcome = compress_or_passthrough(compressor, asset, targets);
    let compression = CompressionStatus::of(&outcome);

    let upload = uploader.upload(outcome.asset());
    if let Err(err) = &upload {
        tracing::warn!(file = %filename, error = %err, "upload failed");
    }

    emit(
        events,
        IngestEvent::FileProcessed {
            filename,
            compression,
            upload: upload.clone(),
        },
    );
    upload
}

/// Validate, compress and upload a batch without merging.
pub fn run_batch(
    compressor: &impl Compressor,
    uploader: &impl Uploader,
    pipeline: &PipelineConfig,
    files: Vec<CandidateFile>,
    events: Option<&Sender<IngestEvent>>,
) -> BatchOutcome {
    let split = partition(files, &pipeline.policy);
    tracing::debug!(
        accepted = split.accepted.len(),
        rejected = split.rejected.len(),
        "batch validated"
    );
    emit(
        events,
        IngestEvent::BatchStarted {
            accepted: split.accepted.len(),
            rejected: split.rejected.len(),
        },
    );

    let mut failures: Vec<Failure> = split
        .rejected
        .into_iter()
        .map(|rejection| {
            emit(
                events,
                IngestEvent::Rejected {
                    filename: rejection.filename.clone(),
                    reason: rejection.error.clone(),
                },
            );
            Failure {
                filename: rejection.filename,
                reason: FailureReason::Rejected(rejection.error),
            }
        })
        .collect();

    let mut results: Vec<(usize, String, Result<String, UploadError>)> = split
        .accepted
        .into_par_iter()
        .enumerate()
        .map(|(index, asset)| {
            let filename = asset.filename.clone();
            let result = process_file(compressor, uploader, &pipeline.targets, asset, events);
            (index, filename, result)
        })
        .collect();
    results.sort_by_key(|(index, _, _)| *index);

    let mut uploaded = Vec::new();
    for (_, filename, result) in results {
        match result {
            Ok(url) => uploaded.push(url),
            Err(err) => failures.push(Failure {
                filename,
                reason: FailureReason::Upload(err),
            }),
        }
    }

    BatchOutcome { uploaded, failures }
}

/// Ingest a batch using the given backends (allows testing with mocks).
///
/// Never fails as a whole: an empty or entirely failed batch returns
/// `current` unchanged.
pub fn ingest_with(
    compressor: &impl Compressor,
    uploader: &impl Uploader,
    pipeline: &PipelineConfig,
    current: &Gallery,
    files: Vec<CandidateFile>,
    events: Option<&Sender<IngestEvent>>,
) -> IngestOutcome {
    if files.is_empty() {
        return IngestOutcome {
            gallery: current.clone(),
            failures: Vec::new(),
            uploaded: 0,
        };
    }

    let batch = run_batch(compressor, uploader, pipeline, files, events);
    let uploaded = batch.uploaded.len();
    IngestOutcome {
        gallery: current.appended(batch.uploaded),
        failures: batch.failures,
        uploaded,
    }
}

/// Ingest with the production compressor and uploader built from `config`.
///
/// Errors only when the uploader can't be set up; per-file problems are
/// reported in [`IngestOutcome::failures`]. An empty batch never touches the
/// config or the uploader, so it succeeds even without credentials.
pub fn ingest(
    config: &IngestConfig,
    current: &Gallery,
    files: Vec<CandidateFile>,
    events: Option<&Sender<IngestEvent>>,
) -> Result<IngestOutcome, IngestError> {
    if files.is_empty() {
        return Ok(IngestOutcome {
            gallery: current.clone(),
            ..Default::default()
        });
    }
    config.validate()?;
    let uploader = CloudinaryUploader::new(&config.upload)?;
    let compressor = RustCompressor::new();
    Ok(ingest_with(
        &compressor,
        &uploader,
        &PipelineConfig::from_config(config),
        current,
        files,
        events,
    ))
}
