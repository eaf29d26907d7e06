//! Image compression in pure Rust, no system libraries.
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (unit testable)
//! - **Parameters**: the byte/dimension budget and quality ladder
//! - **Compressor**: [`Compressor`] trait and the pass-through contract
//! - **RustCompressor**: the `image`-crate implementation
//!
//! Compression never fails a file. Anything that goes wrong inside a
//! compressor turns into [`CompressionOutcome::Original`] and the original
//! bytes are uploaded instead.

mod calculations;
pub mod compressor;
mod params;
pub mod rust_compressor;

pub use calculations::{fit_within, shrink};
pub use compressor::{
    Compression, CompressionError, CompressionOutcome, Compressor, PassThrough,
    compress_or_passthrough,
};
pub use params::{CompressionTargets, QUALITY_STEP, Quality};
pub use rust_compressor::RustCompressor;
