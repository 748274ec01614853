//! Property tag headers.

use uepak_common::{BinaryReader, Guid};

use crate::names::{NameTable, NONE};
use crate::property::value::PropertyValue;
use crate::versions as ver;
use crate::Result;

/// Type-specific metadata carried in a tag header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(tag = "kind"))]
pub enum TagData {
    None,
    /// Bool properties store their value in the header.
    Bool { value: bool },
    /// `"None"` for plain bytes.
    Byte { enum_name: String },
    Enum { enum_name: String },
    Struct {
        struct_name: String,
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        struct_guid: Option<Guid>,
    },
    Array {
        inner_type: String,
        /// Shared header of struct elements, read from the payload.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        inner_tag: Option<Box<InnerTag>>,
    },
    Set { inner_type: String },
    Map { key_type: String, value_type: String },
}

impl TagData {
    pub fn is_none(&self) -> bool {
        matches!(self, TagData::None)
    }

    /// Struct type name for struct tags.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            TagData::Struct { struct_name, .. } => Some(struct_name),
            _ => None,
        }
    }

    /// Enum type name for enum and byte tags.
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            TagData::Enum { enum_name } | TagData::Byte { enum_name } => Some(enum_name),
            _ => None,
        }
    }
}

/// The single tag header an array of structs carries ahead of its elements.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InnerTag {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: String,
    /// Combined size of all elements.
    pub size: i32,
    pub data: TagData,
}

/// One decoded property: header fields plus the decoded payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertyTag {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: String,
    pub size: i32,
    pub array_index: i32,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "TagData::is_none"))]
    pub data: TagData,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub property_guid: Option<Guid>,
    pub value: PropertyValue,
}

impl PropertyTag {
    /// Key this property is known by within its owner: the name, with the
    /// index appended for elements of static arrays.
    pub fn key(&self) -> String {
        if self.array_index == 0 {
            self.name.clone()
        } else {
            format!("{}[{}]", self.name, self.array_index)
        }
    }

    pub(crate) fn from_header(header: TagHeader, value: PropertyValue) -> Self {
        Self {
            name: header.name,
            type_name: header.type_name,
            size: header.size,
            array_index: header.array_index,
            data: header.data,
            property_guid: header.property_guid,
            value,
        }
    }
}

/// A tag header as read from the stream, before its payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagHeader {
    pub name: String,
    pub type_name: String,
    pub size: i32,
    pub array_index: i32,
    pub data: TagData,
    pub property_guid: Option<Guid>,
}

impl TagHeader {
    /// Read a header. Returns `None` at the terminating `None` name.
    pub fn read(reader: &mut BinaryReader, names: &NameTable, file_version: i32) -> Result<Option<Self>> {
        let name = names.read_name(reader)?;
        if name == NONE {
            return Ok(None);
        }

        let type_name = names.read_name(reader)?;
        let size = reader.read_i32()?;
        let array_index = reader.read_i32()?;

        let data = match type_name.as_str() {
            "StructProperty" => TagData::Struct {
                struct_name: names.read_name(reader)?,
                struct_guid: if file_version >= ver::STRUCT_GUID_IN_PROPERTY_TAG {
                    Some(reader.read_guid()?)
                } else {
                    None
                },
            },
            "BoolProperty" => TagData::Bool {
                value: reader.read_u8()? != 0,
            },
            "ByteProperty" => TagData::Byte {
                enum_name: names.read_name(reader)?,
            },
            "EnumProperty" => TagData::Enum {
                enum_name: names.read_name(reader)?,
            },
            "ArrayProperty" if file_version >= ver::ARRAY_PROPERTY_INNER_TAGS => TagData::Array {
                inner_type: names.read_name(reader)?,
                inner_tag: None,
            },
            "SetProperty" if file_version >= ver::PROPERTY_TAG_SET_MAP_SUPPORT => TagData::Set {
                inner_type: names.read_name(reader)?,
            },
            "MapProperty" if file_version >= ver::PROPERTY_TAG_SET_MAP_SUPPORT => TagData::Map {
                key_type: names.read_name(reader)?,
                value_type: names.read_name(reader)?,
            },
            _ => TagData::None,
        };

        let property_guid = if file_version >= ver::PROPERTY_GUID_IN_PROPERTY_TAG && reader.read_u8()? != 0 {
            Some(reader.read_guid()?)
        } else {
            None
        };

        Ok(Some(Self {
            name,
            type_name,
            size,
            array_index,
            data,
            property_guid,
        }))
    }
}
