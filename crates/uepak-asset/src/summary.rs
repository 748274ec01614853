//! Package file summary (the header at the start of every `.uasset`).
//!
//! The summary identifies the package, pins the object version every later
//! record is gated on, and locates the name, import and export tables.

use uepak_common::{BinaryReader, Guid};

use crate::versions::{self as ver, PKG_FILTER_EDITOR_ONLY};
use crate::{Error, Result};

/// Summary tag at offset 0.
pub const PACKAGE_FILE_TAG: u32 = 0x9E2A83C1;

/// Oldest legacy file version this decoder reads.
pub const OLDEST_LEGACY_FILE_VERSION: i32 = -7;

/// A versioned sub-format registered by the engine or a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CustomVersion {
    pub key: Guid,
    pub version: i32,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub friendly_name: Option<String>,
}

/// Export and name counts of an earlier save of the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GenerationInfo {
    pub export_count: i32,
    pub name_count: i32,
}

/// Engine version that saved (or can load) a package.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EngineVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub changelist: u32,
    pub branch: String,
}

impl EngineVersion {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            major: reader.read_u16()?,
            minor: reader.read_u16()?,
            patch: reader.read_u16()?,
            changelist: reader.read_u32()?,
            branch: reader.read_fstring()?,
        })
    }
}

impl std::fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}-{}", self.major, self.minor, self.patch, self.changelist)?;
        if !self.branch.is_empty() {
            write!(f, "+{}", self.branch)?;
        }
        Ok(())
    }
}

/// Offset and count of one table in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableDescriptor {
    pub count: i32,
    pub offset: i32,
}

impl TableDescriptor {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            count: reader.read_i32()?,
            offset: reader.read_i32()?,
        })
    }

    /// Validate against the package size and return `(count, offset)`.
    pub(crate) fn checked(&self, what: &str, data_len: usize, min_record: usize) -> Result<(usize, usize)> {
        if self.count < 0 || self.offset < 0 {
            return Err(Error::corrupt(format!(
                "{} table has negative count {} or offset {}",
                what, self.count, self.offset
            )));
        }
        let (count, offset) = (self.count as usize, self.offset as usize);
        if count > 0 && offset.saturating_add(count.saturating_mul(min_record)) > data_len {
            return Err(Error::corrupt(format!(
                "{} table of {} records at {} exceeds the {} byte header",
                what, count, offset, data_len
            )));
        }
        Ok((count, offset))
    }
}

/// A decoded package summary.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetSummary {
    pub legacy_file_version: i32,
    pub legacy_ue3_version: Option<i32>,
    pub file_version_ue4: i32,
    pub file_version_licensee_ue4: i32,
    pub custom_versions: Vec<CustomVersion>,
    pub total_header_size: i32,
    pub folder_name: String,
    pub package_flags: u32,
    pub names: TableDescriptor,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub localization_id: Option<String>,
    pub gatherable_text_data: TableDescriptor,
    pub exports: TableDescriptor,
    pub imports: TableDescriptor,
    pub depends_offset: i32,
    pub soft_package_references: TableDescriptor,
    pub searchable_names_offset: i32,
    pub thumbnail_table_offset: i32,
    pub guid: Guid,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub persistent_guid: Option<Guid>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub owner_persistent_guid: Option<Guid>,
    pub generations: Vec<GenerationInfo>,
    pub saved_by_engine_version: EngineVersion,
    pub compatible_with_engine_version: EngineVersion,
    pub compression_flags: u32,
    pub package_source: u32,
    pub additional_packages_to_cook: Vec<String>,
    pub asset_registry_data_offset: i32,
    pub bulk_data_start_offset: i64,
    pub world_tile_info_data_offset: i32,
    pub chunk_ids: Vec<i32>,
    pub preload_dependencies: TableDescriptor,
}

impl AssetSummary {
    /// Decode the summary at the reader's position, leaving the reader just
    /// past it.
    pub fn decode(reader: &mut BinaryReader) -> Result<Self> {
        let tag = reader.read_u32()?;
        if tag != PACKAGE_FILE_TAG {
            return Err(Error::UnsupportedAssetVersion(format!(
                "package tag {:#010X}, expected {:#010X}",
                tag, PACKAGE_FILE_TAG
            )));
        }

        let legacy_file_version = reader.read_i32()?;
        if legacy_file_version >= 0 {
            return Err(Error::UnsupportedAssetVersion(format!(
                "legacy file version {} predates UE4",
                legacy_file_version
            )));
        }
        if legacy_file_version < OLDEST_LEGACY_FILE_VERSION {
            return Err(Error::UnsupportedAssetVersion(format!(
                "legacy file version {} (UE5 packages are not supported)",
                legacy_file_version
            )));
        }

        let legacy_ue3_version = if legacy_file_version != -4 {
            Some(reader.read_i32()?)
        } else {
            None
        };
        let file_version_ue4 = reader.read_i32()?;
        let file_version_licensee_ue4 = reader.read_i32()?;
        let custom_versions = if legacy_file_version <= -2 {
            read_custom_versions(reader, legacy_file_version)?
        } else {
            Vec::new()
        };

        if file_version_ue4 == 0 && file_version_licensee_ue4 == 0 && custom_versions.is_empty() {
            return Err(Error::UnsupportedAssetVersion(
                "unversioned package (versions are only known to the engine that cooked it)".into(),
            ));
        }
        if file_version_ue4 < ver::OLDEST_LOADABLE_PACKAGE {
            return Err(Error::UnsupportedAssetVersion(format!(
                "file version {} is older than {}",
                file_version_ue4,
                ver::OLDEST_LOADABLE_PACKAGE
            )));
        }
        let v = file_version_ue4;

        let total_header_size = reader.read_i32()?;
        let folder_name = reader.read_fstring()?;
        let package_flags = reader.read_u32()?;
        let filter_editor_only = package_flags & PKG_FILTER_EDITOR_ONLY != 0;

        let names = TableDescriptor::read(reader)?;
        let localization_id = if !filter_editor_only && v >= ver::ADDED_PACKAGE_SUMMARY_LOCALIZATION_ID {
            Some(reader.read_fstring()?)
        } else {
            None
        };
        let gatherable_text_data = if v >= ver::SERIALIZE_TEXT_IN_PACKAGES {
            TableDescriptor::read(reader)?
        } else {
            TableDescriptor::default()
        };

        let exports = TableDescriptor::read(reader)?;
        let imports = TableDescriptor::read(reader)?;
        let depends_offset = reader.read_i32()?;

        let soft_package_references = if v >= ver::ADD_STRING_ASSET_REFERENCES_MAP {
            TableDescriptor::read(reader)?
        } else {
            TableDescriptor::default()
        };
        let searchable_names_offset = if v >= ver::ADDED_SEARCHABLE_NAMES {
            reader.read_i32()?
        } else {
            0
        };
        let thumbnail_table_offset = reader.read_i32()?;
        let guid = reader.read_guid()?;

        let mut persistent_guid = None;
        let mut owner_persistent_guid = None;
        if !filter_editor_only && v >= ver::ADDED_PACKAGE_OWNER {
            persistent_guid = Some(reader.read_guid()?);
            if v < ver::NON_OUTER_PACKAGE_IMPORT {
                owner_persistent_guid = Some(reader.read_guid()?);
            }
        }

        let generation_count = reader.read_i32()?;
        let generations = reader.read_array(non_negative(generation_count, "generation")?, 8, |r| {
            Ok(GenerationInfo {
                export_count: r.read_i32()?,
                name_count: r.read_i32()?,
            })
        })?;

        let saved_by_engine_version = if v >= ver::ENGINE_VERSION_OBJECT {
            EngineVersion::read(reader)?
        } else {
            EngineVersion {
                changelist: reader.read_i32()? as u32,
                ..EngineVersion::default()
            }
        };
        let compatible_with_engine_version = if v >= ver::PACKAGE_SUMMARY_HAS_COMPATIBLE_ENGINE_VERSION {
            EngineVersion::read(reader)?
        } else {
            saved_by_engine_version.clone()
        };

        let compression_flags = reader.read_u32()?;
        let compressed_chunks = reader.read_i32()?;
        if compressed_chunks != 0 {
            return Err(Error::UnsupportedAssetVersion(format!(
                "package was saved with {} compressed chunks",
                compressed_chunks
            )));
        }

        let package_source = reader.read_u32()?;
        let additional_count = non_negative(reader.read_i32()?, "additional package")?;
        let additional_packages_to_cook = reader.read_array(additional_count, 4, |r| r.read_fstring())?;

        if legacy_file_version > -7 {
            let texture_allocations = reader.read_i32()?;
            if texture_allocations != 0 {
                return Err(Error::corrupt(format!(
                    "package declares {} texture allocations",
                    texture_allocations
                )));
            }
        }

        let asset_registry_data_offset = reader.read_i32()?;
        let bulk_data_start_offset = reader.read_i64()?;
        let world_tile_info_data_offset = if v >= ver::WORLD_LEVEL_INFO {
            reader.read_i32()?
        } else {
            0
        };

        let chunk_ids = if v >= ver::CHANGED_CHUNKID_TO_BE_AN_ARRAY_OF_CHUNKIDS {
            let count = non_negative(reader.read_i32()?, "chunk id")?;
            reader.read_array(count, 4, |r| r.read_i32())?
        } else if v >= ver::ADDED_CHUNKID_TO_ASSETDATA_AND_UPACKAGE {
            match reader.read_i32()? {
                id if id >= 0 => vec![id],
                _ => Vec::new(),
            }
        } else {
            Vec::new()
        };

        let preload_dependencies = if v >= ver::PRELOAD_DEPENDENCIES_IN_COOKED_EXPORTS {
            TableDescriptor::read(reader)?
        } else {
            TableDescriptor { count: -1, offset: 0 }
        };

        Ok(Self {
            legacy_file_version,
            legacy_ue3_version,
            file_version_ue4,
            file_version_licensee_ue4,
            custom_versions,
            total_header_size,
            folder_name,
            package_flags,
            names,
            localization_id,
            gatherable_text_data,
            exports,
            imports,
            depends_offset,
            soft_package_references,
            searchable_names_offset,
            thumbnail_table_offset,
            guid,
            persistent_guid,
            owner_persistent_guid,
            generations,
            saved_by_engine_version,
            compatible_with_engine_version,
            compression_flags,
            package_source,
            additional_packages_to_cook,
            asset_registry_data_offset,
            bulk_data_start_offset,
            world_tile_info_data_offset,
            chunk_ids,
            preload_dependencies,
        })
    }

    /// Whether editor-only data was stripped when the package was cooked.
    #[inline]
    pub fn is_filter_editor_only(&self) -> bool {
        self.package_flags & PKG_FILTER_EDITOR_ONLY != 0
    }
}

fn read_custom_versions(reader: &mut BinaryReader, legacy_file_version: i32) -> Result<Vec<CustomVersion>> {
    let count = non_negative(reader.read_i32()?, "custom version")?;
    let versions = match legacy_file_version {
        // Enum keyed
        -2 => reader.read_array(count, 8, |r| {
            let tag = r.read_u32()?;
            Ok(CustomVersion {
                key: Guid::new(0, 0, 0, tag),
                version: r.read_i32()?,
                friendly_name: None,
            })
        }),
        // GUID keyed with a friendly name
        -5..=-3 => reader.read_array(count, 24, |r| {
            Ok(CustomVersion {
                key: r.read_guid()?,
                version: r.read_i32()?,
                friendly_name: Some(r.read_fstring()?),
            })
        }),
        _ => reader.read_array(count, 20, |r| {
            Ok(CustomVersion {
                key: r.read_guid()?,
                version: r.read_i32()?,
                friendly_name: None,
            })
        }),
    };
    Ok(versions?)
}

pub(crate) fn non_negative(count: i32, what: &str) -> Result<usize> {
    usize::try_from(count).map_err(|_| Error::corrupt(format!("negative {} count {}", what, count)))
}

/// Read `count` records of at least `min_record` bytes each with `f`.
///
/// Counts that cannot fit in the remaining bytes are corrupt.
pub(crate) fn read_counted<'a, T, F>(
    reader: &mut BinaryReader<'a>,
    count: usize,
    min_record: usize,
    what: &str,
    mut f: F,
) -> Result<Vec<T>>
where
    F: FnMut(&mut BinaryReader<'a>) -> Result<T>,
{
    if count.saturating_mul(min_record) > reader.remaining() {
        return Err(Error::corrupt(format!(
            "{} count {} exceeds the {} bytes remaining",
            what,
            count,
            reader.remaining()
        )));
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(f(reader)?);
    }
    Ok(values)
}
