//! Pak archive reader.
//!
//! The archive is memory-mapped (or held in memory) for its whole lifetime,
//! so entry reads are slice borrows and the handle can be shared between
//! threads without locking.

use std::fs::File;
use std::hash::BuildHasherDefault;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use hashbrown::HashMap as FastHashMap;
use memmap2::Mmap;
use rustc_hash::FxHasher;
use tracing::{debug, warn};

use crate::entry::{align16, ArchiveEntryRecord, CompressionMethod};
use crate::footer::Footer;
use crate::index::{read_index, Index};
use crate::transform::{EntryTransform, StandardTransform};
use crate::version::PakVersion;
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Upper bound on the output buffer reserved from a record's declared size.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Backing bytes of an archive.
enum Storage {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Mapped(mmap) => mmap.as_ref(),
            Storage::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// An open pak archive.
///
/// The directory is parsed once when the archive is opened. Reads go through
/// the [`EntryTransform`] the archive was opened with.
pub struct PakArchive {
    storage: Storage,
    path: PathBuf,
    name: String,
    footer: Footer,
    index: Index,
    lookup: FxHashMap<String, usize>,
    transform: Box<dyn EntryTransform>,
}

impl PakArchive {
    /// Open a pak archive with the default transform (no encryption key).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, StandardTransform::new())
    }

    /// Open a pak archive with a custom decompression/decryption capability.
    pub fn open_with<P, T>(path: P, transform: T) -> Result<Self>
    where
        P: AsRef<Path>,
        T: EntryTransform + 'static,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        Self::from_storage(path.to_path_buf(), Storage::Mapped(mmap), Box::new(transform))
    }

    /// Read a pak archive held in memory. `label` stands in for the path.
    pub fn from_bytes(label: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(label, bytes, StandardTransform::new())
    }

    /// Read a pak archive held in memory with a custom transform.
    pub fn from_bytes_with<T>(label: impl Into<PathBuf>, bytes: Vec<u8>, transform: T) -> Result<Self>
    where
        T: EntryTransform + 'static,
    {
        Self::from_storage(label.into(), Storage::Owned(bytes), Box::new(transform))
    }

    fn from_storage(path: PathBuf, storage: Storage, transform: Box<dyn EntryTransform>) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let footer = Footer::locate(&storage)?;
        let index = read_index(&storage, &footer, transform.as_ref())?;

        let mut lookup = FxHashMap::with_capacity_and_hasher(index.records.len(), Default::default());
        for (position, record) in index.records.iter().enumerate() {
            if lookup.insert(record.name().to_string(), position).is_some() {
                warn!(archive = %name, entry = record.name(), "duplicate entry name, keeping the last record");
            }
        }

        debug!(
            archive = %name,
            version = ?footer.version,
            entries = index.records.len(),
            mount_point = %index.mount_point,
            "opened pak archive"
        );

        Ok(Self {
            storage,
            path,
            name,
            footer,
            index,
            lookup,
            transform,
        })
    }

    /// Get the archive path (or the label given to [`from_bytes`](Self::from_bytes)).
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the archive file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the format version.
    #[inline]
    pub fn version(&self) -> PakVersion {
        self.footer.version
    }

    /// Get the parsed footer.
    #[inline]
    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Get the mount point entry names are relative to.
    #[inline]
    pub fn mount_point(&self) -> &str {
        &self.index.mount_point
    }

    /// Get the path hash seed (version 10+).
    #[inline]
    pub fn path_hash_seed(&self) -> Option<u64> {
        self.index.path_hash_seed
    }

    /// Get the entries in directory order.
    #[inline]
    pub fn entries(&self) -> &[ArchiveEntryRecord] {
        &self.index.records
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.index.records.len()
    }

    /// Iterate over the entries.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ArchiveEntryRecord> + '_ {
        self.index.records.iter()
    }

    /// Find an entry by its mount-relative name.
    ///
    /// A leading `/` or a leading copy of the mount point is ignored.
    pub fn find(&self, name: &str) -> Option<&ArchiveEntryRecord> {
        let relative = name
            .strip_prefix(self.index.mount_point.as_str())
            .filter(|_| !self.index.mount_point.is_empty())
            .unwrap_or(name);
        let relative = relative.strip_prefix('/').unwrap_or(relative);

        self.lookup
            .get(name)
            .or_else(|| self.lookup.get(relative))
            .map(|&position| &self.index.records[position])
    }

    /// Check whether an entry exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Get the transform used for reads.
    #[inline]
    pub fn transform(&self) -> &dyn EntryTransform {
        self.transform.as_ref()
    }

    /// Read an entry by name.
    pub fn read_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let record = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read_entry(record)
    }

    /// Read entry contents, decrypting and decompressing as needed.
    pub fn read_entry(&self, record: &ArchiveEntryRecord) -> Result<Vec<u8>> {
        let size = usize::try_from(record.uncompressed_size()).map_err(|_| {
            Error::corrupt_entry(
                record.name(),
                format!("uncompressed size {} is not addressable", record.uncompressed_size()),
            )
        })?;
        if size == 0 {
            return Ok(Vec::new());
        }

        let method = record.compression_method();
        let encrypted = record.is_encrypted();
        let mut output = Vec::with_capacity(size.min(MAX_PREALLOCATION));

        if record.blocks().is_empty() {
            let raw = self.stored_span(record, record.data_offset(), record.compressed_size())?;
            output = self.transform.transform(method, encrypted, raw)?;
        } else {
            for block in record.blocks() {
                let raw = self.stored_span(record, block.start, block.len())?;
                let plain = self.transform.transform(method, encrypted, raw)?;
                output.extend_from_slice(&plain);
            }
        }

        if encrypted && *method == CompressionMethod::None && output.len() > size {
            output.truncate(size);
        }

        if output.len() != size {
            return Err(Error::corrupt_entry(
                record.name(),
                format!("expected {} bytes after decoding, got {}", size, output.len()),
            ));
        }

        Ok(output)
    }

    /// Borrow `len` stored bytes at `start`, widened to the AES block size
    /// for encrypted entries.
    fn stored_span(&self, record: &ArchiveEntryRecord, start: u64, len: u64) -> Result<&[u8]> {
        let stored = if record.is_encrypted() { align16(len) } else { Some(len) };
        let limit = self.footer.offset;

        stored
            .and_then(|stored| start.checked_add(stored))
            .filter(|&end| end <= limit)
            .map(|end| &self.storage[start as usize..end as usize])
            .ok_or_else(|| {
                Error::corrupt_entry(
                    record.name(),
                    format!("stored range {}+{} exceeds archive data ending at {}", start, len, limit),
                )
            })
    }
}

impl std::fmt::Debug for PakArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PakArchive")
            .field("name", &self.name)
            .field("version", &self.footer.version)
            .field("entries", &self.index.records.len())
            .finish()
    }
}
