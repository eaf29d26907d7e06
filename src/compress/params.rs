//! Compression budget types.
//!
//! - [`Quality`] : lossy encoding quality (1–100). Clamped on construction.
//! - [`CompressionTargets`] : byte and dimension budget plus the JPEG quality
//!   ladder bounds, built from [`CompressionConfig`].

use crate::config::CompressionConfig;

/// Step between rungs of the JPEG quality ladder.
pub const QUALITY_STEP: u8 = 10;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// What a compressor should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionTargets {
    pub max_bytes: u64,
    /// Longer-edge bound in pixels.
    pub max_dimension_px: u32,
    pub initial_quality: Quality,
    pub min_quality: Quality,
}

impl CompressionTargets {
    pub fn from_config(config: &CompressionConfig) -> Self {
        Self {
            max_bytes: config.max_size_bytes,
            max_dimension_px: config.max_dimension_px,
            initial_quality: Quality::new(config.initial_quality),
            min_quality: Quality::new(config.min_quality),
        }
    }

    /// Qualities to try, highest first, always ending at `min_quality`.
    pub fn quality_ladder(&self) -> Vec<Quality> {
        let floor = self.min_quality.min(self.initial_quality).value();
        let mut ladder = Vec::new();
        let mut q = self.initial_quality.value();
        while q > floor {
            ladder.push(Quality::new(q));
            q = q.saturating_sub(QUALITY_STEP).max(floor);
        }
        ladder.push(Quality::new(floor));
        ladder
    }
}

impl Default for CompressionTargets {
    fn default() -> Self {
        Self::from_config(&CompressionConfig::default())
    }
}
