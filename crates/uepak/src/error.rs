//! Error types for the pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while processing an archive entry.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the entry from the archive failed.
    #[error(transparent)]
    Archive(#[from] uepak_archive::Error),

    /// Decoding the package failed.
    #[error(transparent)]
    Asset(#[from] uepak_asset::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An entry that could not be decoded, with enough identity to locate it.
#[derive(Debug)]
pub struct EntryFailure {
    /// Path (or label) of the archive holding the entry.
    pub archive: PathBuf,
    /// Mount-relative entry name.
    pub entry: String,
    pub error: Error,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.archive.display(), self.entry, self.error)
    }
}

impl std::error::Error for EntryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
