//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when working with pak archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] uepak_common::Error),

    /// The trailing footer could not be located or is not a pak footer.
    #[error("not a pak archive: {0}")]
    NotAnArchive(String),

    /// The footer names a version this reader does not handle.
    #[error("unsupported pak version: {0}")]
    UnsupportedVersion(u32),

    /// The directory is inconsistent with the archive's contents.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Entry data is inconsistent with its directory record.
    #[error("corrupt entry {name}: {reason}")]
    CorruptEntry { name: String, reason: String },

    /// Unsupported compression method.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(String),

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Decryption error, including a missing key.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

impl Error {
    pub(crate) fn corrupt_entry(name: &str, reason: impl Into<String>) -> Self {
        Error::CorruptEntry {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
