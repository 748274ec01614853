//! Name table and `FName` references.

use uepak_common::BinaryReader;

use crate::summary::AssetSummary;
use crate::versions as ver;
use crate::{Error, Result};

/// The sentinel name that terminates property lists.
pub const NONE: &str = "None";

/// The package's name table. Every name elsewhere in the package is an index
/// into it plus an instance number.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    /// Decode the name table described by `summary` from the header bytes.
    pub fn decode(data: &[u8], summary: &AssetSummary) -> Result<Self> {
        let (count, offset) = summary.names.checked("name", data.len(), 5)?;
        let with_hashes = summary.file_version_ue4 >= ver::NAME_HASHES_SERIALIZED;

        let mut reader = BinaryReader::new_at(data, offset);
        let names = reader.read_array(count, if with_hashes { 8 } else { 4 }, |r| {
            let name = r.read_fstring()?;
            if with_hashes {
                let _non_case_preserving_hash = r.read_u16()?;
                let _case_preserving_hash = r.read_u16()?;
            }
            Ok(name)
        })?;

        Ok(Self { names })
    }

    /// Build a table from existing names.
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Number of names.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a name by table index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All names in table order.
    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// Read an `FName` (table index + instance number) and render it.
    ///
    /// A non-zero number `n` renders as `Name_{n-1}`.
    pub fn read_name(&self, reader: &mut BinaryReader) -> Result<String> {
        let index = reader.read_i32()?;
        let number = reader.read_i32()?;

        let base = usize::try_from(index)
            .ok()
            .and_then(|i| self.get(i))
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "name index {} out of range ({} names)",
                    index,
                    self.names.len()
                ))
            })?;

        if number > 0 {
            Ok(format!("{}_{}", base, number - 1))
        } else {
            Ok(base.to_string())
        }
    }
}
