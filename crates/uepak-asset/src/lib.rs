//! Unreal Engine package (`.uasset`) decoder.
//!
//! A cooked package is a summary header, a name table, import and export
//! tables, and for every export a stream of tagged properties. This crate
//! decodes all of these into a [`PakEntrySet`]:
//!
//! - **Summary** ([`AssetSummary`]): UE4 package file summary, legacy file
//!   versions -2 to -7
//! - **Tables** ([`ObjectImport`], [`ObjectExport`]): cross-referenced by
//!   [`PackageIndex`], resolved with [`PakEntrySet::resolve`]
//! - **Properties** ([`PropertyTag`], [`PropertyValue`]): the tagged
//!   property format, with builtin structs decoded as raw values and
//!   unknown payloads kept as opaque bytes
//! - **Compact projection** ([`CompactEntry`], `serde` feature): a flat
//!   `{ "type", "value" }` view with references rendered as
//!   `(package, name)` pairs
//!
//! # Example
//!
//! ```no_run
//! use uepak_asset::{CompactEntry, DecodeOptions, PakEntrySet};
//!
//! let uasset = std::fs::read("M_Stone.uasset")?;
//! let uexp = std::fs::read("M_Stone.uexp")?;
//!
//! let entry = PakEntrySet::decode("M_Stone.uasset", &uasset, Some(&uexp[..]), DecodeOptions::default())?;
//! for (position, export) in entry.failed_exports() {
//!     eprintln!("export {} failed: {:?}", position, export.properties);
//! }
//!
//! let compact = CompactEntry::new(&entry)?;
//! println!("{}", serde_json::to_string_pretty(&compact)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod names;
mod package;
mod package_index;
mod summary;
mod tables;

pub mod property;
pub mod versions;

#[cfg(feature = "serde")]
mod compact;

#[cfg(test)]
mod test_asset;

pub use error::{Error, Result};
pub use names::{NameTable, NONE};
pub use package::{ExportFailure, PakEntrySet, PakExportSet};
pub use package_index::{resolve, ExportSlot, ObjectRef, PackageIndex, Reference};
pub use property::{DecodeOptions, PropertyTag, PropertyValue, StructBody, StructValue};
pub use summary::{AssetSummary, CustomVersion, EngineVersion, GenerationInfo, TableDescriptor, PACKAGE_FILE_TAG};
pub use tables::{decode_exports, decode_imports, ObjectExport, ObjectImport};

#[cfg(feature = "serde")]
pub use compact::{
    compact_reference, CompactEntry, CompactExport, CompactProperty, CompactReference, BROKEN_EXPORT,
    THIS_PACKAGE,
};
