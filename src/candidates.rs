//! Turning command-line paths into a batch of [`CandidateFile`]s.
//!
//! Files are taken as given. Directories are walked recursively in file-name
//! order, skipping hidden entries, so a folder of product shots becomes a
//! batch in a predictable order. Nothing is filtered out here: every file
//! goes to validation, which is where unsupported files get reported.
//!
//! Contents are only read for files that can pass the policy. A file that is
//! too large or of the wrong type is collected with its metadata size and no
//! bytes, so a stray multi-gigabyte file in a product folder costs a `stat`.

use crate::types::CandidateFile;
use crate::validate::{ValidationPolicy, check_file};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum CandidateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn read_candidate(path: &Path, policy: &ValidationPolicy) -> Result<CandidateFile, CandidateError> {
    let io_err = |source| CandidateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let declared_size = fs::metadata(path).map_err(io_err)?.len();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut candidate = CandidateFile {
        filename,
        declared_size,
        mime: None,
        bytes: Vec::new(),
    };
    if check_file(&candidate, policy).is_ok() {
        candidate.bytes = fs::read(path).map_err(io_err)?;
    } else {
        tracing::debug!(file = %candidate.filename, size = declared_size, "will be rejected, not reading");
    }
    Ok(candidate)
}

/// Expand `paths` into candidates, in argument order.
///
/// Files that `policy` would reject come back without contents.
pub fn collect_candidates<P: AsRef<Path>>(
    paths: &[P],
    policy: &ValidationPolicy,
) -> Result<Vec<CandidateFile>, CandidateError> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(read_candidate(path, policy)?);
            continue;
        }
        let walker = WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(read_candidate(entry.path(), policy)?);
            }
        }
    }
    tracing::debug!(count = files.len(), "collected candidates");
    Ok(files)
}
