//! # Gallery Ingest
//!
//! Media ingestion for product catalogs. Takes the images an operator selects
//! for a product, checks them against a size and type policy, compresses them
//! to a byte and dimension budget, uploads them to a remote asset host, and
//! merges the resulting URLs into the product's ordered gallery.
//!
//! # Architecture: Per-File Pipeline
//!
//! ```text
//! 1. Validate   batch     →  accepted + rejections   (pure policy check)
//! 2. Compress   accepted  →  smaller asset | original (never fails a file)
//! 3. Upload     asset     →  durable URL | failure    (one file at a time, in parallel)
//! 4. Merge      gallery   →  gallery ++ new URLs      (submission order)
//! ```
//!
//! Every stage isolates failures per file: one bad file never sinks the
//! batch, and a batch where everything fails still returns the gallery
//! unchanged rather than an error.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Media types, candidate files, accepted image assets |
//! | [`validate`] | Stage 1: size and type policy, batch partitioning |
//! | [`compress`] | Stage 2: resize/re-encode to budget with pass-through fallback |
//! | [`upload`] | Stage 3: `Uploader` trait and the Cloudinary-style HTTP uploader |
//! | [`gallery`] | Ordered URL lists, legacy single-image normalization, removal |
//! | [`ingest`] | The orchestrator tying stages together, with progress events |
//! | [`candidates`] | Command-line paths → candidate files |
//! | [`config`] | `gallery-ingest.toml` loading, env credential overlay, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Galleries Are Values
//!
//! [`gallery::Gallery`] operations return new galleries. The orchestrator
//! takes a snapshot and hands back the merged result; persisting it is the
//! caller's job. Concurrent runs against the same product must be serialized
//! by the caller, since each appends to the snapshot it was given.
//!
//! ## Order Is Submission Order
//!
//! Uploads run in parallel and finish in any order. Results are tagged with
//! their submission index and sorted back before merging, so a gallery never
//! depends on network timing.
//!
//! ## Pure-Rust Compression
//!
//! Compression uses the `image` crate only: no system libraries, no
//! external processes. The output keeps the input's format, so a PNG with
//! transparency stays a PNG.
//!
//! ## Legacy Records
//!
//! Older products carry a single `image` field. Reading always goes through
//! [`gallery::Gallery::normalize`], and writing always mirrors `images[0]`
//! back into `image`, so old and new readers agree on the primary image.

pub mod candidates;
pub mod compress;
pub mod config;
pub mod gallery;
pub mod ingest;
pub mod output;
pub mod types;
pub mod upload;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
