//! Uepak - Unreal Engine pak archive and asset decoding library.
//!
//! This crate ties the uepak crates together and adds the pipeline that
//! walks an archive and decodes its packages.
//!
//! # Crates
//!
//! - [`uepak_common`] - Binary reading, GUIDs and byte search
//! - [`uepak_archive`] - Pak archive reading (footer, index, AES, zlib/gzip/Zstd)
//! - [`uepak_asset`] - Package summary, tables, tagged properties and the
//!   compact projection
//!
//! # Example
//!
//! ```no_run
//! use uepak::prelude::*;
//!
//! let archive = PakArchive::open_with("Game-WindowsNoEditor.pak", StandardTransform::new())?;
//!
//! let report = PakProcessor::new(&archive).process(
//!     |name| name.ends_with(".uasset"),
//!     |name, result, _| match result {
//!         Ok(entry) => println!("{}: {} exports", name, entry.exports.len()),
//!         Err(failure) => eprintln!("{}", failure),
//!     },
//! );
//! println!("{} decoded, {} failed", report.processed, report.failed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod process;

#[cfg(test)]
mod test_pak;

pub use uepak_archive as archive;
pub use uepak_asset as asset;
pub use uepak_common as common;

pub use error::{EntryFailure, Error, Result};
pub use process::{is_companion, PakProcessor, ProcessOptions, ProcessReport, COMPANION_EXTENSIONS};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{EntryFailure, PakProcessor, ProcessOptions, ProcessReport};
    pub use uepak_archive::{ArchiveEntryRecord, PakArchive, StandardTransform};
    #[cfg(feature = "serde")]
    pub use uepak_asset::CompactEntry;
    pub use uepak_asset::{DecodeOptions, PackageIndex, PakEntrySet, PakExportSet, PropertyValue};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
