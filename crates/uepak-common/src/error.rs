//! Error types for uepak-common.

use thiserror::Error;

/// Common error type for uepak operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A length prefix that cannot describe a valid string.
    #[error("invalid string length {0}")]
    InvalidStringLength(i32),

    /// Invalid GUID format.
    #[error("invalid GUID format: {0}")]
    InvalidGuid(String),
}

impl Error {
    /// Whether this error means the input ran out before a value was complete.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::UnexpectedEof { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
