//! Pak footer (trailing record) parsing.
//!
//! The footer grows with the format version: an encryption key GUID and an
//! encrypted-index flag precede the magic in later versions, and named
//! compression methods follow the index hash from version 8 on. The magic is
//! located first, then every layout the version allows is checked against
//! the number of bytes that actually follow it.

use uepak_common::{search, BinaryReader, Guid};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::version::PakVersion;
use crate::{Error, Result};

/// Footer magic.
pub const PAK_MAGIC: u32 = 0x5A6F12E1;

/// Width of one compression method name slot.
const METHOD_NAME_SLOT: usize = 32;

/// How far from the end of the file the magic is searched for.
const TAIL_WINDOW: usize = 512;

/// Fixed part of the footer, starting at the magic.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FooterCore {
    /// Always [`PAK_MAGIC`]
    pub magic: u32,
    /// Format version
    pub version: u32,
    /// Offset of the primary index
    pub index_offset: u64,
    /// Size of the primary index
    pub index_size: u64,
    /// SHA-1 of the primary index
    pub index_hash: [u8; 20],
}

impl FooterCore {
    /// Serialized size of the fixed part.
    pub const SIZE: usize = std::mem::size_of::<FooterCore>();
}

/// Parsed pak footer.
#[derive(Debug, Clone)]
pub struct Footer {
    /// Format version.
    pub version: PakVersion,
    /// Version 8 archives written with four method slots use a one-byte
    /// method index in their entries.
    pub narrow_method_index: bool,
    /// Encryption key GUID (version 7+).
    pub encryption_key_guid: Option<Guid>,
    /// Whether the index itself is encrypted (version 4+).
    pub index_encrypted: bool,
    /// Offset of the primary index.
    pub index_offset: u64,
    /// Size of the primary index.
    pub index_size: u64,
    /// SHA-1 of the primary index.
    pub index_hash: [u8; 20],
    /// Names of the compression methods, indexed from 1 by entries (version 8+).
    pub compression_names: Vec<String>,
    /// Absolute offset where the footer starts.
    pub offset: u64,
}

impl Footer {
    /// Locate and parse the footer at the end of `data`.
    pub fn locate(data: &[u8]) -> Result<Self> {
        let hits = search::rfind_all_u32_in_tail(PAK_MAGIC, data, TAIL_WINDOW);
        if hits.is_empty() {
            return Err(Error::NotAnArchive(
                "pak magic not found in trailing bytes".into(),
            ));
        }

        let mut last_error = None;
        for magic_offset in hits {
            match Self::parse_at(data, magic_offset) {
                Ok(Some(footer)) => return Ok(footer),
                Ok(None) => {}
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::NotAnArchive("no footer layout matches the trailing bytes".into())
        }))
    }

    /// Try to parse a footer whose magic sits at `magic_offset`.
    ///
    /// Returns `Ok(None)` when no layout for the version fits exactly.
    fn parse_at(data: &[u8], magic_offset: usize) -> Result<Option<Self>> {
        let core_end = magic_offset + FooterCore::SIZE;
        let Some(core_bytes) = data.get(magic_offset..core_end) else {
            return Ok(None);
        };
        let core = FooterCore::read_from_bytes(core_bytes)
            .map_err(|_| Error::NotAnArchive("footer truncated".into()))?;

        let version = PakVersion::try_from(core.version)?;
        let trailing = data.len() - core_end;
        let frozen_flag = usize::from(version == PakVersion::FrozenIndex);
        let slot_counts: &[usize] = if version >= PakVersion::FNameBasedCompressionMethod {
            &[5, 4]
        } else {
            &[0]
        };

        let mut prefix = 0;
        if version >= PakVersion::IndexEncryption {
            prefix += 1;
        }
        if version >= PakVersion::EncryptionKeyGuid {
            prefix += 16;
        }
        if magic_offset < prefix {
            return Ok(None);
        }

        for &slots in slot_counts {
            if trailing != frozen_flag + slots * METHOD_NAME_SLOT {
                continue;
            }

            let start = magic_offset - prefix;
            let mut reader = BinaryReader::new_at(data, start);

            let encryption_key_guid = if version >= PakVersion::EncryptionKeyGuid {
                Some(reader.read_guid()?)
            } else {
                None
            };
            let index_encrypted = version >= PakVersion::IndexEncryption && reader.read_bool()?;
            reader.advance(FooterCore::SIZE);

            if version == PakVersion::FrozenIndex && reader.read_bool()? {
                return Err(Error::NotAnArchive("frozen indices are not supported".into()));
            }

            let mut compression_names = Vec::with_capacity(slots);
            for _ in 0..slots {
                let slot = reader.read_bytes(METHOD_NAME_SLOT)?;
                let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
                compression_names.push(String::from_utf8_lossy(&slot[..end]).into_owned());
            }

            let index_offset = core.index_offset;
            let index_size = core.index_size;
            if index_offset.checked_add(index_size).map_or(true, |end| end > start as u64) {
                return Err(Error::CorruptIndex(format!(
                    "index range {}+{} overlaps the footer at {}",
                    index_offset, index_size, start
                )));
            }

            return Ok(Some(Footer {
                version,
                narrow_method_index: version == PakVersion::FNameBasedCompressionMethod
                    && slots == 4,
                encryption_key_guid,
                index_encrypted,
                index_offset,
                index_size,
                index_hash: core.index_hash,
                compression_names,
                offset: start as u64,
            }));
        }

        Ok(None)
    }
}
