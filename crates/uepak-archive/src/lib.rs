//! Unreal Engine pak archive reader.
//!
//! A pak archive is a flat container of named, optionally compressed and
//! encrypted files, followed by a directory (the index) and a fixed footer.
//! This crate supports:
//!
//! - Footer versions 1 through 11, including the 4- and 5-slot variants of
//!   version 8
//! - Legacy indices and the version 10+ primary index with bit-packed entries
//! - Encrypted indices and entries (AES-256-ECB)
//! - Per-block decompression through a pluggable [`EntryTransform`]
//!   (zlib, gzip and Zstandard out of the box)
//! - Zero-copy memory-mapped file access
//!
//! # Example
//!
//! ```no_run
//! use uepak_archive::{PakArchive, StandardTransform};
//!
//! let transform = StandardTransform::with_hex_key(
//!     "0x0000000000000000000000000000000000000000000000000000000000000000",
//! )?;
//! let archive = PakArchive::open_with("Game-WindowsNoEditor.pak", transform)?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name(), entry.uncompressed_size());
//! }
//!
//! let data = archive.read_by_name("Game/Content/Maps/Entry.umap")?;
//! # Ok::<(), uepak_archive::Error>(())
//! ```

mod archive;
mod crypto;
mod decompress;
mod entry;
mod error;
mod footer;
mod index;
mod transform;
mod version;

#[cfg(test)]
mod test_pak;

pub use archive::PakArchive;
pub use crypto::AesKey;
pub use entry::{ArchiveEntryRecord, CompressionBlock, CompressionMethod};
pub use error::{Error, Result};
pub use footer::{Footer, PAK_MAGIC};
pub use transform::{EntryTransform, StandardTransform};
pub use version::PakVersion;
