//! Package index: the signed cross-reference used throughout a package.
//!
//! `0` is null, `n > 0` names export `n - 1` and `n < 0` names import
//! `-n - 1`. [`PackageIndex::classify`] decodes the sign once; [`resolve`]
//! borrows the target record from its owning table.

use std::fmt;

use uepak_common::BinaryReader;

use crate::tables::{ObjectExport, ObjectImport};
use crate::{Error, Result};

/// A raw package index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct PackageIndex(pub i32);

/// What a package index points at, with table positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
    Null,
    Export(usize),
    Import(usize),
}

impl PackageIndex {
    /// The null index.
    pub const NULL: Self = Self(0);

    /// Read a package index.
    #[inline]
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self(reader.read_i32()?))
    }

    /// Index naming export table position `position`.
    #[inline]
    pub fn from_export(position: usize) -> Self {
        Self(position as i32 + 1)
    }

    /// Index naming import table position `position`.
    #[inline]
    pub fn from_import(position: usize) -> Self {
        Self(-(position as i32) - 1)
    }

    /// Decode the sign convention.
    #[inline]
    pub fn classify(self) -> ObjectRef {
        match self.0 {
            0 => ObjectRef::Null,
            n if n > 0 => ObjectRef::Export((n - 1) as usize),
            n => ObjectRef::Import((-(n as i64) - 1) as usize),
        }
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_import(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn is_export(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for PackageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.classify() {
            ObjectRef::Null => write!(f, "PackageIndex(null)"),
            ObjectRef::Export(i) => write!(f, "PackageIndex(export {})", i),
            ObjectRef::Import(i) => write!(f, "PackageIndex(import {})", i),
        }
    }
}

/// Access to the export record stored in an export table slot.
///
/// A slot without a usable record resolves to
/// [`Reference::BrokenExport`] instead of failing.
pub trait ExportSlot {
    fn export_record(&self) -> Option<&ObjectExport>;
}

impl ExportSlot for ObjectExport {
    #[inline]
    fn export_record(&self) -> Option<&ObjectExport> {
        Some(self)
    }
}

impl<T: ExportSlot> ExportSlot for Option<T> {
    #[inline]
    fn export_record(&self) -> Option<&ObjectExport> {
        self.as_ref().and_then(ExportSlot::export_record)
    }
}

/// A resolved package index, borrowing from the tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference<'a> {
    Null,
    Import(&'a ObjectImport),
    Export(&'a ObjectExport),
    /// The export slot exists but holds no usable record.
    BrokenExport(usize),
}

impl<'a> Reference<'a> {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Reference::Null)
    }

    /// Object name of the target, if there is one.
    pub fn object_name(&self) -> Option<&'a str> {
        match self {
            Reference::Import(import) => Some(&import.object_name),
            Reference::Export(export) => Some(&export.object_name),
            Reference::Null | Reference::BrokenExport(_) => None,
        }
    }
}

/// Resolve `index` against the import and export tables.
///
/// Positions past the end of either table are an error.
pub fn resolve<'a, E: ExportSlot>(
    index: PackageIndex,
    imports: &'a [ObjectImport],
    exports: &'a [E],
) -> Result<Reference<'a>> {
    match index.classify() {
        ObjectRef::Null => Ok(Reference::Null),
        ObjectRef::Import(position) => imports
            .get(position)
            .map(Reference::Import)
            .ok_or(Error::PackageIndexOutOfRange {
                index: index.0,
                table: "import",
                len: imports.len(),
            }),
        ObjectRef::Export(position) => {
            let slot = exports.get(position).ok_or(Error::PackageIndexOutOfRange {
                index: index.0,
                table: "export",
                len: exports.len(),
            })?;
            Ok(slot
                .export_record()
                .map_or(Reference::BrokenExport(position), Reference::Export))
        }
    }
}

/// Check that `index` is null or within its table.
pub fn check_bounds(index: PackageIndex, import_count: usize, export_count: usize) -> Result<()> {
    let (table, len, position) = match index.classify() {
        ObjectRef::Null => return Ok(()),
        ObjectRef::Import(position) => ("import", import_count, position),
        ObjectRef::Export(position) => ("export", export_count, position),
    };
    if position < len {
        Ok(())
    } else {
        Err(Error::PackageIndexOutOfRange {
            index: index.0,
            table,
            len,
        })
    }
}
