//! Whole-package decoding.

use std::fmt;

use tracing::{debug, warn};
use uepak_common::BinaryReader;

use crate::names::NameTable;
use crate::package_index::{resolve, ExportSlot, PackageIndex, Reference};
use crate::property::{DecodeOptions, PropertyDecoder, PropertyTag};
use crate::summary::AssetSummary;
use crate::tables::{check_table_references, decode_exports, decode_imports, ObjectExport, ObjectImport};
use crate::Result;

/// Why an export's properties could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExportFailure {
    pub message: String,
}

impl fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExportFailure {}

/// One export and its decoded properties.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PakExportSet {
    pub export: ObjectExport,
    pub properties: std::result::Result<Vec<PropertyTag>, ExportFailure>,
    /// Bytes left in the export's serial range after the property list.
    pub trailing_bytes: usize,
}

impl PakExportSet {
    pub fn is_failed(&self) -> bool {
        self.properties.is_err()
    }
}

/// Exports whose properties failed to decode resolve as broken references.
impl ExportSlot for PakExportSet {
    fn export_record(&self) -> Option<&ObjectExport> {
        self.properties.as_ref().ok().map(|_| &self.export)
    }
}

/// A decoded package.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PakEntrySet {
    pub file_name: String,
    pub summary: AssetSummary,
    pub imports: Vec<ObjectImport>,
    pub exports: Vec<PakExportSet>,
}

impl PakEntrySet {
    /// Decode a package.
    ///
    /// `header` is the `.uasset` data. `exports_data` is the sibling `.uexp`
    /// when the package was cooked split; export serial offsets then count
    /// from the end of the header.
    pub fn decode(
        file_name: impl Into<String>,
        header: &[u8],
        exports_data: Option<&[u8]>,
        options: DecodeOptions,
    ) -> Result<Self> {
        let file_name = file_name.into();

        let summary = AssetSummary::decode(&mut BinaryReader::new(header))?;
        let names = NameTable::decode(header, &summary)?;
        let imports = decode_imports(header, &summary, &names)?;
        let export_records = decode_exports(header, &summary, &names)?;
        check_table_references(&imports, &export_records)?;

        let (body, base) = match exports_data {
            Some(uexp) => (uexp, summary.total_header_size as i64),
            None => (header, 0),
        };

        let decoder = PropertyDecoder::new(&names, &summary, imports.len(), export_records.len(), options);
        let exports: Vec<PakExportSet> = export_records
            .into_iter()
            .enumerate()
            .map(|(position, export)| decode_export(&decoder, &file_name, position, export, body, base))
            .collect();

        debug!(
            file = %file_name,
            names = names.len(),
            imports = imports.len(),
            exports = exports.len(),
            failed = exports.iter().filter(|e| e.is_failed()).count(),
            "decoded package"
        );

        Ok(Self {
            file_name,
            summary,
            imports,
            exports,
        })
    }

    /// Resolve a package index against this package's tables.
    pub fn resolve(&self, index: PackageIndex) -> Result<Reference<'_>> {
        resolve(index, &self.imports, &self.exports)
    }

    /// Exports whose properties failed to decode, with their positions.
    pub fn failed_exports(&self) -> impl Iterator<Item = (usize, &PakExportSet)> {
        self.exports.iter().enumerate().filter(|(_, e)| e.is_failed())
    }

    /// Find an export by object name.
    pub fn export(&self, name: &str) -> Option<&PakExportSet> {
        self.exports.iter().find(|e| e.export.object_name == name)
    }
}

fn decode_export(
    decoder: &PropertyDecoder,
    file_name: &str,
    position: usize,
    export: ObjectExport,
    body: &[u8],
    base: i64,
) -> PakExportSet {
    let outcome = export_range(&export, body.len(), base).and_then(|(start, end)| {
        let mut reader = BinaryReader::new(&body[start..end]);
        let properties = decoder.decode_properties(&mut reader).map_err(|e| e.to_string())?;
        Ok((properties, reader.remaining()))
    });

    match outcome {
        Ok((properties, trailing_bytes)) => {
            if trailing_bytes > 0 {
                debug!(
                    file = file_name,
                    export = %export.object_name,
                    trailing_bytes,
                    "export has data after its properties"
                );
            }
            PakExportSet {
                export,
                properties: Ok(properties),
                trailing_bytes,
            }
        }
        Err(message) => {
            warn!(
                file = file_name,
                export = %export.object_name,
                position,
                error = %message,
                "failed to decode export"
            );
            PakExportSet {
                export,
                properties: Err(ExportFailure { message }),
                trailing_bytes: 0,
            }
        }
    }
}

/// The export's serial range within `body`.
fn export_range(export: &ObjectExport, body_len: usize, base: i64) -> std::result::Result<(usize, usize), String> {
    let start = export.serial_offset.checked_sub(base);
    let end = start.and_then(|start| start.checked_add(export.serial_size));
    match (start, end) {
        (Some(start), Some(end)) if start >= 0 && export.serial_size >= 0 && end as u64 <= body_len as u64 => {
            Ok((start as usize, end as usize))
        }
        _ => Err(format!(
            "serial range {}+{} (base {}) is outside the {} bytes of export data",
            export.serial_offset, export.serial_size, base, body_len
        )),
    }
}
