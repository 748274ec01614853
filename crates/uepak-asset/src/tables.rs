//! Import and export tables.

use uepak_common::{BinaryReader, Guid};

use crate::names::NameTable;
use crate::package_index::{check_bounds, PackageIndex};
use crate::summary::{read_counted, AssetSummary};
use crate::versions as ver;
use crate::Result;

/// An object defined in another package.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectImport {
    pub class_package: String,
    pub class_name: String,
    pub outer_index: PackageIndex,
    pub object_name: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub package_name: Option<String>,
}

impl ObjectImport {
    fn read(reader: &mut BinaryReader, names: &NameTable, summary: &AssetSummary) -> Result<Self> {
        let class_package = names.read_name(reader)?;
        let class_name = names.read_name(reader)?;
        let outer_index = PackageIndex::read(reader)?;
        let object_name = names.read_name(reader)?;
        let package_name = if summary.file_version_ue4 >= ver::NON_OUTER_PACKAGE_IMPORT
            && !summary.is_filter_editor_only()
        {
            Some(names.read_name(reader)?)
        } else {
            None
        };

        Ok(Self {
            class_package,
            class_name,
            outer_index,
            object_name,
            package_name,
        })
    }
}

/// An object defined in this package, with the location of its serialized
/// data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectExport {
    pub class_index: PackageIndex,
    pub super_index: PackageIndex,
    pub template_index: PackageIndex,
    pub outer_index: PackageIndex,
    pub object_name: String,
    pub object_flags: u32,
    pub serial_size: i64,
    pub serial_offset: i64,
    pub forced_export: bool,
    pub not_for_client: bool,
    pub not_for_server: bool,
    pub package_guid: Guid,
    pub package_flags: u32,
    pub not_always_loaded_for_editor_game: bool,
    pub is_asset: bool,
    pub first_export_dependency: i32,
    pub serialization_before_serialization_dependencies: i32,
    pub create_before_serialization_dependencies: i32,
    pub serialization_before_create_dependencies: i32,
    pub create_before_create_dependencies: i32,
}

impl ObjectExport {
    fn read(reader: &mut BinaryReader, names: &NameTable, summary: &AssetSummary) -> Result<Self> {
        let v = summary.file_version_ue4;

        let class_index = PackageIndex::read(reader)?;
        let super_index = PackageIndex::read(reader)?;
        let template_index = if v >= ver::TEMPLATE_INDEX_IN_COOKED_EXPORTS {
            PackageIndex::read(reader)?
        } else {
            PackageIndex::NULL
        };
        let outer_index = PackageIndex::read(reader)?;
        let object_name = names.read_name(reader)?;
        let object_flags = reader.read_u32()?;

        let (serial_size, serial_offset) = if v >= ver::EXPORTMAP_64BIT_SERIAL_SIZES {
            (reader.read_i64()?, reader.read_i64()?)
        } else {
            (reader.read_i32()? as i64, reader.read_i32()? as i64)
        };

        let forced_export = reader.read_ubool()?;
        let not_for_client = reader.read_ubool()?;
        let not_for_server = reader.read_ubool()?;
        let package_guid = reader.read_guid()?;
        let package_flags = reader.read_u32()?;

        let not_always_loaded_for_editor_game = v >= ver::LOAD_FOR_EDITOR_GAME && reader.read_ubool()?;
        let is_asset = v >= ver::COOKED_ASSETS_IN_EDITOR_SUPPORT && reader.read_ubool()?;

        let mut dependencies = [-1i32, 0, 0, 0, 0];
        if v >= ver::PRELOAD_DEPENDENCIES_IN_COOKED_EXPORTS {
            for slot in dependencies.iter_mut() {
                *slot = reader.read_i32()?;
            }
        }

        Ok(Self {
            class_index,
            super_index,
            template_index,
            outer_index,
            object_name,
            object_flags,
            serial_size,
            serial_offset,
            forced_export,
            not_for_client,
            not_for_server,
            package_guid,
            package_flags,
            not_always_loaded_for_editor_game,
            is_asset,
            first_export_dependency: dependencies[0],
            serialization_before_serialization_dependencies: dependencies[1],
            create_before_serialization_dependencies: dependencies[2],
            serialization_before_create_dependencies: dependencies[3],
            create_before_create_dependencies: dependencies[4],
        })
    }

    /// The four package indices an export carries, in declaration order.
    pub fn indices(&self) -> [PackageIndex; 4] {
        [self.class_index, self.super_index, self.template_index, self.outer_index]
    }
}

/// Decode the import table described by `summary`.
pub fn decode_imports(data: &[u8], summary: &AssetSummary, names: &NameTable) -> Result<Vec<ObjectImport>> {
    let (count, offset) = summary.imports.checked("import", data.len(), 28)?;
    let mut reader = BinaryReader::new_at(data, offset);
    read_counted(&mut reader, count, 28, "import", |r| ObjectImport::read(r, names, summary))
}

/// Decode the export table described by `summary`.
pub fn decode_exports(data: &[u8], summary: &AssetSummary, names: &NameTable) -> Result<Vec<ObjectExport>> {
    let (count, offset) = summary.exports.checked("export", data.len(), 56)?;
    let mut reader = BinaryReader::new_at(data, offset);
    read_counted(&mut reader, count, 56, "export", |r| ObjectExport::read(r, names, summary))
}

/// Check every package index held by the tables against the table sizes.
pub fn check_table_references(imports: &[ObjectImport], exports: &[ObjectExport]) -> Result<()> {
    let (import_count, export_count) = (imports.len(), exports.len());
    for import in imports {
        check_bounds(import.outer_index, import_count, export_count)?;
    }
    for export in exports {
        for index in export.indices() {
            check_bounds(index, import_count, export_count)?;
        }
    }
    Ok(())
}
