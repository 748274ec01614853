//! Error types for package decoding.

use thiserror::Error;

/// Errors that can occur when decoding a package.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (truncated input, bad strings).
    #[error("{0}")]
    Common(#[from] uepak_common::Error),

    /// The summary tag or version is not one this decoder understands.
    #[error("unsupported asset version: {0}")]
    UnsupportedAssetVersion(String),

    /// Declared offsets, counts or sizes are inconsistent with the data.
    #[error("corrupt asset: {0}")]
    CorruptAsset(String),

    /// An array, set or map element count that its payload cannot hold.
    #[error("corrupt element count: {0}")]
    CorruptCount(String),

    /// A package index points past the end of its table.
    #[error("package index {index} out of range ({table} table has {len} entries)")]
    PackageIndexOutOfRange {
        index: i32,
        table: &'static str,
        len: usize,
    },

    /// A property type this decoder has no payload layout for.
    #[error("unknown property type: {0}")]
    UnknownPropertyType(String),

    /// Nested structs exceed the configured depth.
    #[error("struct nesting exceeds {0} levels")]
    RecursionLimit(usize),

    /// Building the compact projection failed.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error invalidates the enclosing export rather than only
    /// the property payload it occurred in.
    ///
    /// Everything else raised inside a payload leaves the payload opaque.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::CorruptCount(_) | Error::PackageIndexOutOfRange { .. } | Error::RecursionLimit(_)
        )
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Error::CorruptAsset(reason.into())
    }
}

/// Result type for package decoding.
pub type Result<T> = std::result::Result<T, Error>;
