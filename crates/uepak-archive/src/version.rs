//! Pak format versions.

use crate::{Error, Result};

/// Pak archive format version, as stored in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum PakVersion {
    /// Entries carry a timestamp.
    Initial = 1,
    NoTimestamps = 2,
    /// Entries gain compression blocks, an encrypted flag and a block size.
    CompressionEncryption = 3,
    /// The footer gains an encrypted-index flag.
    IndexEncryption = 4,
    /// Compression block offsets become relative to the entry.
    RelativeChunkOffsets = 5,
    DeleteRecords = 6,
    /// The footer gains the encryption key GUID.
    EncryptionKeyGuid = 7,
    /// Compression methods are named in the footer.
    FNameBasedCompressionMethod = 8,
    FrozenIndex = 9,
    /// Primary index with encoded entries and separate directory indices.
    PathHashIndex = 10,
    Fnv64BugFix = 11,
}

impl PakVersion {
    /// Newest version this reader understands.
    pub const LATEST: PakVersion = PakVersion::Fnv64BugFix;

    /// Whether entries in this version use the v10+ primary index layout.
    #[inline]
    pub fn has_path_hash_index(self) -> bool {
        self >= PakVersion::PathHashIndex
    }
}

impl TryFrom<u32> for PakVersion {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            1 => Self::Initial,
            2 => Self::NoTimestamps,
            3 => Self::CompressionEncryption,
            4 => Self::IndexEncryption,
            5 => Self::RelativeChunkOffsets,
            6 => Self::DeleteRecords,
            7 => Self::EncryptionKeyGuid,
            8 => Self::FNameBasedCompressionMethod,
            9 => Self::FrozenIndex,
            10 => Self::PathHashIndex,
            11 => Self::Fnv64BugFix,
            other => return Err(Error::UnsupportedVersion(other)),
        })
    }
}
