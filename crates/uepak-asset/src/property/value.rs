//! Decoded property values.
//!
//! [`PropertyValue`] is a closed tree: every payload the decoder understands
//! has its own variant, and everything else is kept as [`PropertyValue::Opaque`]
//! with the raw payload bytes.

use uepak_common::{BinaryReader, Guid};

use crate::names::NameTable;
use crate::package_index::PackageIndex;
use crate::property::simple::SimpleStruct;
use crate::property::tag::PropertyTag;
use crate::{Error, Result};

/// A decoded property payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PropertyValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int(i32),
    Int64(i64),
    Byte(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Name(String),
    Str(String),
    Text(TextValue),
    Enum { enum_type: String, value: String },
    Object(PackageIndex),
    LazyObject(Guid),
    SoftObject(SoftObjectPath),
    Delegate(Delegate),
    MulticastDelegate(Vec<Delegate>),
    Struct(StructValue),
    Array(Vec<PropertyValue>),
    Set(Vec<PropertyValue>),
    Map(Vec<MapEntry>),
    /// A payload whose type has no known layout, or that failed to decode.
    Opaque {
        type_tag: String,
        #[cfg_attr(feature = "serde", serde(with = "hex_bytes"))]
        raw: Vec<u8>,
    },
}

impl PropertyValue {
    /// Nested property list of a complex struct value.
    pub fn as_properties(&self) -> Option<&[PropertyTag]> {
        match self {
            PropertyValue::Struct(StructValue {
                body: StructBody::Complex(tags),
                ..
            }) => Some(tags),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, PropertyValue::Opaque { .. })
    }
}

/// A struct payload: either a raw builtin value or a nested property list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructValue {
    pub struct_type: String,
    pub body: StructBody,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StructBody {
    Simple(SimpleStruct),
    Complex(Vec<PropertyTag>),
}

/// Asset path plus sub-object path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoftObjectPath {
    pub asset_path: String,
    pub sub_path: String,
}

impl SoftObjectPath {
    pub(crate) fn read(reader: &mut BinaryReader, names: &NameTable) -> Result<Self> {
        Ok(Self {
            asset_path: names.read_name(reader)?,
            sub_path: reader.read_fstring()?,
        })
    }
}

/// A bound delegate: target object and function name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Delegate {
    pub object: PackageIndex,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapEntry {
    pub key: PropertyValue,
    pub value: PropertyValue,
}

/// Localized text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextValue {
    pub flags: u32,
    pub history: TextHistory,
}

/// How a text value was produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TextHistory {
    None {
        culture_invariant: Option<String>,
    },
    Base {
        namespace: String,
        key: String,
        source_string: String,
    },
    StringTableEntry {
        table_id: String,
        key: String,
    },
}

impl TextValue {
    pub(crate) fn read(reader: &mut BinaryReader, names: &NameTable) -> Result<Self> {
        let flags = reader.read_u32()?;
        let history_type = reader.read_i8()?;
        let history = match history_type {
            -1 => TextHistory::None {
                culture_invariant: if reader.read_ubool()? {
                    Some(reader.read_fstring()?)
                } else {
                    None
                },
            },
            0 => TextHistory::Base {
                namespace: reader.read_fstring()?,
                key: reader.read_fstring()?,
                source_string: reader.read_fstring()?,
            },
            11 => TextHistory::StringTableEntry {
                table_id: names.read_name(reader)?,
                key: reader.read_fstring()?,
            },
            other => {
                return Err(Error::UnknownPropertyType(format!("text history {}", other)));
            }
        };
        Ok(Self { flags, history })
    }

    /// The displayable string, where the history carries one.
    pub fn display_string(&self) -> Option<&str> {
        match &self.history {
            TextHistory::None { culture_invariant } => culture_invariant.as_deref(),
            TextHistory::Base { source_string, .. } => Some(source_string),
            TextHistory::StringTableEntry { .. } => None,
        }
    }
}

#[cfg(feature = "serde")]
mod hex_bytes {
    pub fn serialize<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}
