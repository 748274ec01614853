//! Pak directory (index) parsing.
//!
//! Archives up to version 9 store a flat list of `(name, entry)` records.
//! From version 10 the primary index holds bit-packed entries, and names
//! come from a separate full directory index that maps each file to a
//! location in the encoded blob (or, for negative locations, to a full
//! record in the primary index).

use std::borrow::Cow;

use tracing::debug;
use uepak_common::BinaryReader;

use crate::entry::{align16, ArchiveEntryRecord, CompressionMethod, RawEntry};
use crate::footer::Footer;
use crate::transform::EntryTransform;
use crate::{Error, Result};

/// Smallest possible serialized legacy entry (v2+, uncompressed).
const MIN_ENTRY_SIZE: usize = 8 + 8 + 8 + 4 + 20;

/// A decoded archive directory.
#[derive(Debug)]
pub(crate) struct Index {
    pub mount_point: String,
    pub path_hash_seed: Option<u64>,
    pub records: Vec<ArchiveEntryRecord>,
}

/// Parse the directory described by `footer`.
pub(crate) fn read_index(data: &[u8], footer: &Footer, transform: &dyn EntryTransform) -> Result<Index> {
    let primary = load_span(
        data,
        footer.index_offset,
        footer.index_size,
        footer.index_encrypted,
        transform,
        "primary index",
    )?;
    let mut reader = BinaryReader::new(&primary);

    if footer.version.has_path_hash_index() {
        read_path_hash_index(data, footer, transform, &mut reader)
    } else {
        read_legacy_index(footer, &mut reader)
    }
}

fn read_legacy_index(footer: &Footer, reader: &mut BinaryReader) -> Result<Index> {
    let mount_point = reader.read_fstring()?;
    let count = reader.read_u32()? as usize;

    let mut records = Vec::with_capacity(count.min(reader.remaining() / MIN_ENTRY_SIZE));
    for _ in 0..count {
        let name = reader.read_fstring()?;
        let entry = RawEntry::read(reader, footer)?;
        if entry.is_deleted {
            debug!(name = %name, "skipping delete record");
            continue;
        }
        records.push(entry.named(name));
    }

    Ok(Index {
        mount_point,
        path_hash_seed: None,
        records,
    })
}

/// Location of a secondary index within the archive.
struct SecondaryIndex {
    offset: u64,
    size: u64,
}

fn read_secondary(reader: &mut BinaryReader) -> Result<Option<SecondaryIndex>> {
    if !reader.read_ubool()? {
        return Ok(None);
    }
    let offset = reader.read_u64()?;
    let size = reader.read_u64()?;
    let _hash = reader.read_array_bytes::<20>()?;
    Ok(Some(SecondaryIndex { offset, size }))
}

fn read_path_hash_index(
    data: &[u8],
    footer: &Footer,
    transform: &dyn EntryTransform,
    reader: &mut BinaryReader,
) -> Result<Index> {
    let mount_point = reader.read_fstring()?;
    let count = reader.read_u32()? as usize;
    let path_hash_seed = reader.read_u64()?;

    // The path hash index only maps hashes to locations; names need the
    // full directory index.
    let _path_hash_index = read_secondary(reader)?;
    let full_directory = read_secondary(reader)?.ok_or_else(|| {
        Error::NotAnArchive("archive has no full directory index, entry names are unavailable".into())
    })?;

    let encoded_size = reader.read_u32()? as usize;
    let encoded = reader.read_bytes(encoded_size)?;

    let file_count = reader.read_u32()? as usize;
    if file_count > reader.remaining() / MIN_ENTRY_SIZE {
        return Err(Error::CorruptIndex(format!(
            "{} full entry records cannot fit in the {} remaining index bytes",
            file_count,
            reader.remaining()
        )));
    }
    let mut files = Vec::with_capacity(file_count);
    for _ in 0..file_count {
        files.push(RawEntry::read(reader, footer)?);
    }

    let directory = load_span(
        data,
        full_directory.offset,
        full_directory.size,
        footer.index_encrypted,
        transform,
        "full directory index",
    )?;
    let mut dir_reader = BinaryReader::new(&directory);

    let mut records = Vec::with_capacity(count);
    let dir_count = dir_reader.read_u32()? as usize;
    for _ in 0..dir_count {
        let dir_name = dir_reader.read_fstring()?;
        let file_count = dir_reader.read_u32()? as usize;

        for _ in 0..file_count {
            let file_name = dir_reader.read_fstring()?;
            let location = dir_reader.read_i32()?;

            let path = join_path(&dir_name, &file_name);
            let entry = match location {
                i32::MIN => {
                    debug!(name = %path, "skipping entry with invalid location");
                    continue;
                }
                loc if loc >= 0 => {
                    let loc = loc as usize;
                    if loc >= encoded.len() {
                        return Err(Error::CorruptIndex(format!(
                            "encoded entry location {} for {} is outside the {} byte entry blob",
                            loc,
                            path,
                            encoded.len()
                        )));
                    }
                    let mut entry_reader = BinaryReader::new_at(encoded, loc);
                    RawEntry::read_encoded(&mut entry_reader, footer)?
                }
                loc => {
                    let slot = (-(loc as i64) - 1) as usize;
                    files.get(slot).cloned().ok_or_else(|| {
                        Error::CorruptIndex(format!(
                            "file record {} for {} is outside the {} non-encoded records",
                            slot,
                            path,
                            files.len()
                        ))
                    })?
                }
            };
            records.push(entry.named(path));
        }
    }

    if records.len() != count {
        debug!(declared = count, found = records.len(), "directory entry count differs from primary index");
    }

    Ok(Index {
        mount_point,
        path_hash_seed: Some(path_hash_seed),
        records,
    })
}

/// Join a directory index name (`/`, `/Game/Maps/`) and a file name into a
/// mount-relative path.
fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.strip_prefix('/').unwrap_or(dir);
    let mut path = String::with_capacity(dir.len() + file.len());
    path.push_str(dir);
    path.push_str(file);
    path
}

/// Borrow an index span, decrypting it when needed.
fn load_span<'a>(
    data: &'a [u8],
    offset: u64,
    size: u64,
    encrypted: bool,
    transform: &dyn EntryTransform,
    what: &str,
) -> Result<Cow<'a, [u8]>> {
    let stored_size = if encrypted { align16(size).unwrap_or(u64::MAX) } else { size };
    let span = offset
        .checked_add(stored_size)
        .filter(|&end| end <= data.len() as u64)
        .map(|end| &data[offset as usize..end as usize])
        .ok_or_else(|| {
            Error::CorruptIndex(format!(
                "{} at {}+{} is outside the {} byte archive",
                what,
                offset,
                stored_size,
                data.len()
            ))
        })?;

    if encrypted {
        let plain = transform.transform(&CompressionMethod::None, true, span)?;
        Ok(Cow::Owned(plain))
    } else {
        Ok(Cow::Borrowed(span))
    }
}
