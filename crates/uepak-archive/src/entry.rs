//! Pak archive entry records.

use std::fmt;
use std::path::Path;

use uepak_common::BinaryReader;

use crate::footer::Footer;
use crate::version::PakVersion;
use crate::{Error, Result};

/// Compression methods used by pak entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored as-is.
    None,
    Zlib,
    Gzip,
    Oodle,
    Zstd,
    Lz4,
    /// A method named in the footer that this crate does not know.
    Other(String),
}

impl CompressionMethod {
    /// Map a footer method name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "None" => Self::None,
            n if n.eq_ignore_ascii_case("zlib") => Self::Zlib,
            n if n.eq_ignore_ascii_case("gzip") => Self::Gzip,
            n if n.eq_ignore_ascii_case("oodle") => Self::Oodle,
            n if n.eq_ignore_ascii_case("zstd") => Self::Zstd,
            n if n.eq_ignore_ascii_case("lz4") => Self::Lz4,
            other => Self::Other(other.to_string()),
        }
    }

    /// Map the compression flags used before version 8.
    pub fn from_legacy_flags(flags: u32) -> Self {
        match flags {
            0 => Self::None,
            f if f & 0x01 != 0 => Self::Zlib,
            f if f & 0x02 != 0 => Self::Gzip,
            f if f & 0x04 != 0 => Self::Oodle,
            f => Self::Other(format!("flags {:#x}", f)),
        }
    }

    /// Check whether the data is stored uncompressed.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Display name of the method.
    pub fn name(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Zlib => "Zlib",
            Self::Gzip => "Gzip",
            Self::Oodle => "Oodle",
            Self::Zstd => "Zstd",
            Self::Lz4 => "LZ4",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compressed block, as an absolute byte range in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionBlock {
    pub start: u64,
    pub end: u64,
}

impl CompressionBlock {
    /// Size of the block as stored (before encryption padding).
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An entry (file) within a pak archive.
///
/// This contains metadata about the file, not the file data itself.
/// Use [`PakArchive::read_entry`](crate::PakArchive::read_entry) to get the
/// actual file contents.
#[derive(Debug, Clone)]
pub struct ArchiveEntryRecord {
    /// File name/path within the archive, relative to the mount point.
    name: String,
    /// Offset of the entry's in-data header.
    offset: u64,
    /// Size of the in-data header that precedes the payload.
    header_size: u64,
    /// Compressed size in bytes.
    compressed_size: u64,
    /// Uncompressed size in bytes.
    uncompressed_size: u64,
    /// Compression method used.
    compression_method: CompressionMethod,
    /// SHA-1 of the stored data.
    hash: [u8; 20],
    /// Whether the entry is encrypted.
    is_encrypted: bool,
    /// Compressed blocks, absolute ranges.
    blocks: Vec<CompressionBlock>,
    /// Uncompressed size of each block.
    compression_block_size: u32,
}

impl ArchiveEntryRecord {
    /// Get the file name/path.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the offset of the entry's in-data header.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Get the absolute offset of the first payload byte.
    #[inline]
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size
    }

    /// Get the compressed size in bytes.
    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Get the uncompressed size in bytes.
    #[inline]
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Get the compression method.
    #[inline]
    pub fn compression_method(&self) -> &CompressionMethod {
        &self.compression_method
    }

    /// Get the content hash.
    #[inline]
    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    /// Get the content hash as lowercase hex.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Check if the entry is encrypted.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    /// Get the compression blocks.
    #[inline]
    pub fn blocks(&self) -> &[CompressionBlock] {
        &self.blocks
    }

    /// Get the uncompressed size of each compression block.
    #[inline]
    pub fn compression_block_size(&self) -> u32 {
        self.compression_block_size
    }

    /// Absolute byte range occupied by the stored payload.
    ///
    /// Saturates at `u64::MAX` for records whose sizes cannot be stored.
    pub fn stored_range(&self) -> (u64, u64) {
        let stored = |len: u64| {
            if self.is_encrypted {
                align16(len).unwrap_or(u64::MAX)
            } else {
                len
            }
        };
        let start = self.data_offset();
        let end = start.saturating_add(stored(self.compressed_size));
        let blocks_end = self
            .blocks
            .iter()
            .map(|b| b.start.saturating_add(stored(b.len())))
            .max()
            .unwrap_or(end);
        (start, end.max(blocks_end))
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
    }

    /// Name with the extension removed.
    pub fn stem_path(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) if !self.name[dot..].contains('/') => &self.name[..dot],
            _ => &self.name,
        }
    }
}

/// Round up to the AES block size. `None` if the result does not fit.
#[inline]
pub(crate) fn align16(value: u64) -> Option<u64> {
    value.checked_add(15).map(|v| v & !15)
}

/// `a + b`, or a corrupt-index error naming `what`.
fn offset_sum(a: u64, b: u64, what: &str) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| Error::CorruptIndex(format!("{} overflows: {} + {}", what, a, b)))
}

/// An entry as decoded from the index, before it has a name.
#[derive(Debug, Clone)]
pub(crate) struct RawEntry {
    pub offset: u64,
    pub header_size: u64,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: CompressionMethod,
    pub hash: [u8; 20],
    pub is_encrypted: bool,
    pub is_deleted: bool,
    pub blocks: Vec<CompressionBlock>,
    pub compression_block_size: u32,
}

impl RawEntry {
    pub(crate) fn named(self, name: String) -> ArchiveEntryRecord {
        ArchiveEntryRecord {
            name,
            offset: self.offset,
            header_size: self.header_size,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            compression_method: self.compression_method,
            hash: self.hash,
            is_encrypted: self.is_encrypted,
            blocks: self.blocks,
            compression_block_size: self.compression_block_size,
        }
    }

    /// Read a full (non-encoded) entry record.
    pub(crate) fn read(reader: &mut BinaryReader, footer: &Footer) -> Result<Self> {
        let version = footer.version;
        let offset = reader.read_u64()?;
        let compressed_size = reader.read_u64()?;
        let uncompressed_size = reader.read_u64()?;

        let compression_method = if version >= PakVersion::FNameBasedCompressionMethod {
            let index = if footer.narrow_method_index {
                reader.read_u8()? as u32
            } else {
                reader.read_u32()?
            };
            method_from_index(footer, index)?
        } else {
            CompressionMethod::from_legacy_flags(reader.read_u32()?)
        };

        if version == PakVersion::Initial {
            let _timestamp = reader.read_u64()?;
        }

        let hash = reader.read_array_bytes::<20>()?;

        let mut blocks = Vec::new();
        let mut is_encrypted = false;
        let mut is_deleted = false;
        let mut compression_block_size = 0;

        if version >= PakVersion::CompressionEncryption {
            if !compression_method.is_none() {
                let count = reader.read_u32()? as usize;
                blocks = reader.read_array(count, 16, |r| {
                    Ok(CompressionBlock {
                        start: r.read_u64()?,
                        end: r.read_u64()?,
                    })
                })?;
            }
            let flags = reader.read_u8()?;
            is_encrypted = flags & 0x01 != 0;
            is_deleted = flags & 0x02 != 0;
            compression_block_size = reader.read_u32()?;
        }

        if version >= PakVersion::RelativeChunkOffsets {
            for block in &mut blocks {
                block.start = offset_sum(block.start, offset, "compression block start")?;
                block.end = offset_sum(block.end, offset, "compression block end")?;
            }
        }

        let header_size = serialized_size(footer, &compression_method, blocks.len() as u32);
        offset_sum(offset, header_size, "entry data offset")?;

        Ok(Self {
            offset,
            header_size,
            compressed_size,
            uncompressed_size,
            compression_method,
            hash,
            is_encrypted,
            is_deleted,
            blocks,
            compression_block_size,
        })
    }

    /// Read a bit-packed entry from the v10+ encoded entry blob.
    ///
    /// Layout of the leading u32:
    /// - bits 0-5: block size in 2 KiB units (`0x3f` = explicit u32 follows)
    /// - bits 6-21: block count
    /// - bit 22: encrypted
    /// - bits 23-28: compression method index
    /// - bit 29/30/31: compressed size / uncompressed size / offset fit in u32
    pub(crate) fn read_encoded(reader: &mut BinaryReader, footer: &Footer) -> Result<Self> {
        let bits = reader.read_u32()?;

        let method_index = (bits >> 23) & 0x3f;
        let compression_method = method_from_index(footer, method_index)?;
        let is_encrypted = bits & (1 << 22) != 0;
        let block_count = (bits >> 6) & 0xffff;

        let mut compression_block_size = bits & 0x3f;
        if compression_block_size == 0x3f {
            compression_block_size = reader.read_u32()?;
        } else {
            compression_block_size <<= 11;
        }

        let mut var_int = |bit: u32| -> Result<u64> {
            Ok(if bits & (1 << bit) != 0 {
                reader.read_u32()? as u64
            } else {
                reader.read_u64()?
            })
        };

        let offset = var_int(31)?;
        let uncompressed_size = var_int(30)?;
        let compressed_size = if compression_method.is_none() {
            uncompressed_size
        } else {
            var_int(29)?
        };

        let header_size = serialized_size(footer, &compression_method, block_count);

        let data_offset = offset_sum(offset, header_size, "entry data offset")?;
        let blocks = if block_count == 1 && !is_encrypted {
            vec![CompressionBlock {
                start: data_offset,
                end: offset_sum(data_offset, compressed_size, "compression block end")?,
            }]
        } else {
            let mut blocks = Vec::with_capacity((block_count as usize).min(reader.remaining() / 4));
            let mut cursor = data_offset;
            for _ in 0..block_count {
                let size = reader.read_u32()? as u64;
                let end = offset_sum(cursor, size, "compression block end")?;
                blocks.push(CompressionBlock { start: cursor, end });
                cursor = if is_encrypted {
                    let padded = align16(size).ok_or_else(|| Error::CorruptIndex("block size overflows".into()))?;
                    offset_sum(cursor, padded, "compression block start")?
                } else {
                    end
                };
            }
            blocks
        };

        Ok(Self {
            offset,
            header_size,
            compressed_size,
            uncompressed_size,
            compression_method,
            hash: [0; 20],
            is_encrypted,
            is_deleted: false,
            blocks,
            compression_block_size,
        })
    }
}

fn method_from_index(footer: &Footer, index: u32) -> Result<CompressionMethod> {
    if index == 0 {
        return Ok(CompressionMethod::None);
    }
    footer
        .compression_names
        .get(index as usize - 1)
        .filter(|name| !name.is_empty())
        .map(|name| CompressionMethod::from_name(name))
        .ok_or_else(|| Error::CorruptIndex(format!("compression method index {} has no name", index)))
}

/// Size of the entry header that is repeated in front of each payload.
pub(crate) fn serialized_size(footer: &Footer, method: &CompressionMethod, block_count: u32) -> u64 {
    let version = footer.version;
    let mut size = 8 + 8 + 8; // offset, compressed, uncompressed
    size += if footer.narrow_method_index { 1 } else { 4 };
    if version == PakVersion::Initial {
        size += 8; // timestamp
    }
    size += 20; // hash
    if version >= PakVersion::CompressionEncryption {
        if !method.is_none() {
            size += 4 + 16 * block_count as u64;
        }
        size += 1 + 4; // flags, block size
    }
    size
}
