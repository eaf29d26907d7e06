//! Compressor trait and the pass-through contract.
//!
//! A [`Compressor`] either re-encodes an image or fails. Callers never see the
//! failure as an error: [`compress_or_passthrough`] turns every result into a
//! [`CompressionOutcome`], and both of its variants hand the next stage an
//! uploadable [`ImageAsset`]. The fallback is an explicit branch, not a
//! catch-all.

use super::params::CompressionTargets;
use crate::types::ImageAsset;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    #[error("failed to decode {filename}: {reason}")]
    Decode { filename: String, reason: String },
    #[error("failed to encode {filename}: {reason}")]
    Encode { filename: String, reason: String },
}

/// What a compressor produced for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compression {
    /// A smaller (or resized) encoding of the same image.
    Reencoded(ImageAsset),
    /// The original is already as good as anything the compressor could make.
    Unchanged,
}

/// Trait for compression backends.
///
/// `Sync` because files are compressed in parallel on the rayon pool.
pub trait Compressor: Sync {
    fn compress(
        &self,
        asset: &ImageAsset,
        targets: &CompressionTargets,
    ) -> Result<Compression, CompressionError>;
}

/// Why the original file is being uploaded as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassThrough {
    Unchanged,
    Failed(CompressionError),
}

/// The two ways compression can end. Both carry an uploadable asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    Compressed {
        asset: ImageAsset,
        original_bytes: u64,
    },
    Original {
        asset: ImageAsset,
        reason: PassThrough,
    },
}

impl CompressionOutcome {
    pub fn asset(&self) -> &ImageAsset {
        match self {
            CompressionOutcome::Compressed { asset, .. } => asset,
            CompressionOutcome::Original { asset, .. } => asset,
        }
    }

    pub fn into_asset(self) -> ImageAsset {
        match self {
            CompressionOutcome::Compressed { asset, .. } => asset,
            CompressionOutcome::Original { asset, .. } => asset,
        }
    }
}

/// Run `compressor`, falling back to the original asset on any failure.
pub fn compress_or_passthrough(
    compressor: &impl Compressor,
    asset: ImageAsset,
    targets: &CompressionTargets,
) -> CompressionOutcome {
    match compressor.compress(&asset, targets) {
        Ok(Compression::Reencoded(compressed)) => CompressionOutcome::Compressed {
            original_bytes: asset.len() as u64,
            asset: compressed,
        },
        Ok(Compression::Unchanged) => CompressionOutcome::Original {
            asset,
            reason: PassThrough::Unchanged,
        },
        Err(err) => {
            tracing::warn!(file = %asset.filename, error = %err, "compression failed, uploading original");
            CompressionOutcome::Original {
                asset,
                reason: PassThrough::Failed(err),
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::types::MediaType;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock compressor that halves files and records calls.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockCompressor {
        /// Filenames whose compression fails.
        pub failing: HashSet<String>,
        /// Filenames reported as already optimal.
        pub unchanged: HashSet<String>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockCompressor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn get_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Compressor for MockCompressor {
        fn compress(
            &self,
            asset: &ImageAsset,
            _targets: &CompressionTargets,
        ) -> Result<Compression, CompressionError> {
            self.calls.lock().unwrap().push(asset.filename.clone());
            if self.failing.contains(&asset.filename) {
                return Err(CompressionError::Decode {
                    filename: asset.filename.clone(),
                    reason: "mock decode failure".into(),
                });
            }
            if self.unchanged.contains(&asset.filename) {
                return Ok(Compression::Unchanged);
            }
            let half = asset.bytes[..asset.bytes.len() / 2].to_vec();
            Ok(Compression::Reencoded(asset.with_bytes(half)))
        }
    }

    fn asset(name: &str, len: usize) -> ImageAsset {
        ImageAsset {
            filename: name.to_string(),
            declared_size: len as u64,
            media_type: MediaType::Jpeg,
            bytes: vec![7; len],
        }
    }

    #[test]
    fn reencoded_becomes_compressed() {
        let mock = MockCompressor::new();
        let outcome = compress_or_passthrough(&mock, asset("a.jpg", 100), &CompressionTargets::default());

        match &outcome {
            CompressionOutcome::Compressed {
                asset,
                original_bytes,
            } => {
                assert_eq!(*original_bytes, 100);
                assert_eq!(asset.len(), 50);
            }
            other => panic!("expected Compressed, got {other:?}"),
        }
        assert_eq!(outcome.into_asset().filename, "a.jpg");
    }

    #[test]
    fn failure_passes_original_through() {
        let mock = MockCompressor::failing_on(&["corrupt.jpg"]);
        let original = asset("corrupt.jpg", 64);
        let outcome = compress_or_passthrough(&mock, original.clone(), &CompressionTargets::default());

        assert!(matches!(
            &outcome,
            CompressionOutcome::Original {
                reason: PassThrough::Failed(CompressionError::Decode { .. }),
                ..
            }
        ));
        assert_eq!(outcome.into_asset(), original);
    }

    #[test]
    fn unchanged_passes_original_through() {
        let mut mock = MockCompressor::new();
        mock.unchanged.insert("tiny.jpg".into());
        let original = asset("tiny.jpg", 10);
        let outcome = compress_or_passthrough(&mock, original.clone(), &CompressionTargets::default());

        assert_eq!(
            outcome,
            CompressionOutcome::Original {
                asset: original,
                reason: PassThrough::Unchanged
            }
        );
        assert_eq!(mock.get_calls(), vec!["tiny.jpg"]);
    }
}
