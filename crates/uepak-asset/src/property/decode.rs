//! Tagged property stream decoder.
//!
//! A stream is a sequence of tag headers, each followed by a payload of the
//! declared size, terminated by a tag named `None`. Payloads are decoded
//! through a reader bounded to their declared size, so a payload that is
//! misunderstood can never desynchronise the stream:
//!
//! - an unknown type, or a payload that fails to decode, becomes
//!   [`PropertyValue::Opaque`] holding the raw bytes;
//! - a payload decoded short of its size is accepted and the rest skipped;
//! - structural failures (array, set and map counts the payload cannot hold,
//!   out-of-range package indices, nesting past [`DecodeOptions::max_depth`])
//!   fail the whole stream, as do truncated or corrupt headers of the
//!   stream itself.

use tracing::warn;
use uepak_common::BinaryReader;

use crate::names::NameTable;
use crate::package_index::{check_bounds, PackageIndex};
use crate::property::simple::{is_simple_struct, SimpleStruct};
use crate::property::tag::{InnerTag, PropertyTag, TagData, TagHeader};
use crate::property::value::{
    Delegate, MapEntry, PropertyValue, SoftObjectPath, StructBody, StructValue, TextValue,
};
use crate::summary::{non_negative, read_counted, AssetSummary};
use crate::versions as ver;
use crate::{Error, Result};

/// Default limit on nested struct depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for property decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting of struct values within one export.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Struct type assumed for struct elements of sets and map keys, whose type
/// is not recorded in the stream.
const UNTYPED_KEY_STRUCT: &str = "Guid";

/// Struct type assumed for struct values of maps.
const UNTYPED_VALUE_STRUCT: &str = "Struct";

/// Decodes tagged property streams for one package.
pub struct PropertyDecoder<'p> {
    names: &'p NameTable,
    file_version: i32,
    import_count: usize,
    export_count: usize,
    options: DecodeOptions,
}

impl<'p> PropertyDecoder<'p> {
    pub fn new(
        names: &'p NameTable,
        summary: &AssetSummary,
        import_count: usize,
        export_count: usize,
        options: DecodeOptions,
    ) -> Self {
        Self {
            names,
            file_version: summary.file_version_ue4,
            import_count,
            export_count,
            options,
        }
    }

    /// Decode properties until the `None` sentinel. The reader is left just
    /// past the sentinel.
    pub fn decode_properties(&self, reader: &mut BinaryReader) -> Result<Vec<PropertyTag>> {
        self.read_properties(reader, 0)
    }

    fn read_properties(&self, reader: &mut BinaryReader, depth: usize) -> Result<Vec<PropertyTag>> {
        let mut tags = Vec::new();
        while let Some(mut header) = TagHeader::read(reader, self.names, self.file_version)? {
            let size = usize::try_from(header.size)
                .map_err(|_| Error::corrupt(format!("property {} has negative size {}", header.name, header.size)))?;
            let payload = reader.sub_reader(size)?;
            let value = self.read_tag_value(&mut header, payload, depth)?;
            tags.push(PropertyTag::from_header(header, value));
        }
        Ok(tags)
    }

    /// Decode one payload, applying the tolerant policy.
    fn read_tag_value(&self, header: &mut TagHeader, mut reader: BinaryReader, depth: usize) -> Result<PropertyValue> {
        let payload = reader.peek_bytes(reader.remaining())?;
        match self.read_payload(header, &mut reader, depth) {
            Ok(value) => {
                if !reader.is_empty() {
                    warn!(
                        property = %header.name,
                        property_type = %header.type_name,
                        unread = reader.remaining(),
                        "property payload not fully consumed, skipping remainder"
                    );
                }
                Ok(value)
            }
            Err(e) if e.is_structural() => Err(e),
            Err(e) => {
                warn!(
                    property = %header.name,
                    property_type = %header.type_name,
                    size = payload.len(),
                    error = %e,
                    "keeping property payload as opaque bytes"
                );
                Ok(PropertyValue::Opaque {
                    type_tag: header.type_name.clone(),
                    raw: payload.to_vec(),
                })
            }
        }
    }

    fn read_payload(&self, header: &mut TagHeader, reader: &mut BinaryReader, depth: usize) -> Result<PropertyValue> {
        match (header.type_name.as_str(), &mut header.data) {
            ("BoolProperty", TagData::Bool { value }) => Ok(PropertyValue::Bool(*value)),
            ("ByteProperty", TagData::Byte { enum_name }) => {
                if header.size == 1 {
                    Ok(PropertyValue::Byte(reader.read_u8()?))
                } else {
                    Ok(PropertyValue::Enum {
                        enum_type: enum_name.clone(),
                        value: self.names.read_name(reader)?,
                    })
                }
            }
            ("EnumProperty", TagData::Enum { enum_name }) => Ok(PropertyValue::Enum {
                enum_type: enum_name.clone(),
                value: self.names.read_name(reader)?,
            }),
            ("StructProperty", TagData::Struct { struct_name, .. }) => {
                Ok(PropertyValue::Struct(self.read_struct(struct_name, reader, depth + 1)?))
            }
            ("ArrayProperty", TagData::Array { inner_type, inner_tag }) => {
                let (value, inner) = self.read_array(inner_type, header.size, reader, depth)?;
                *inner_tag = inner.map(Box::new);
                Ok(value)
            }
            ("SetProperty", TagData::Set { inner_type }) => {
                let _removed = self.read_elements(inner_type, UNTYPED_KEY_STRUCT, reader, depth)?;
                Ok(PropertyValue::Set(self.read_elements(inner_type, UNTYPED_KEY_STRUCT, reader, depth)?))
            }
            ("MapProperty", TagData::Map { key_type, value_type }) => {
                self.read_map(key_type, value_type, reader, depth)
            }
            (type_name, _) => self.read_element(type_name, None, reader, depth),
        }
    }

    /// Read a payload that has no tag metadata of its own: array, set and map
    /// elements, and scalar properties.
    fn read_element(
        &self,
        type_name: &str,
        struct_hint: Option<&str>,
        reader: &mut BinaryReader,
        depth: usize,
    ) -> Result<PropertyValue> {
        Ok(match type_name {
            "BoolProperty" => PropertyValue::Bool(reader.read_u8()? != 0),
            "Int8Property" => PropertyValue::Int8(reader.read_i8()?),
            "Int16Property" => PropertyValue::Int16(reader.read_i16()?),
            "IntProperty" => PropertyValue::Int(reader.read_i32()?),
            "Int64Property" => PropertyValue::Int64(reader.read_i64()?),
            "ByteProperty" => PropertyValue::Byte(reader.read_u8()?),
            "UInt16Property" => PropertyValue::UInt16(reader.read_u16()?),
            "UInt32Property" => PropertyValue::UInt32(reader.read_u32()?),
            "UInt64Property" => PropertyValue::UInt64(reader.read_u64()?),
            "FloatProperty" => PropertyValue::Float(reader.read_f32()?),
            "DoubleProperty" => PropertyValue::Double(reader.read_f64()?),
            "NameProperty" => PropertyValue::Name(self.names.read_name(reader)?),
            "EnumProperty" => PropertyValue::Name(self.names.read_name(reader)?),
            "StrProperty" => PropertyValue::Str(reader.read_fstring()?),
            "TextProperty" => PropertyValue::Text(TextValue::read(reader, self.names)?),
            "ObjectProperty" | "ClassProperty" | "InterfaceProperty" | "WeakObjectProperty" => {
                PropertyValue::Object(self.read_package_index(reader)?)
            }
            "LazyObjectProperty" => PropertyValue::LazyObject(reader.read_guid()?),
            "SoftObjectProperty" | "SoftClassProperty" | "AssetObjectProperty" | "AssetClassProperty" => {
                PropertyValue::SoftObject(SoftObjectPath::read(reader, self.names)?)
            }
            "DelegateProperty" => PropertyValue::Delegate(self.read_delegate(reader)?),
            "MulticastDelegateProperty"
            | "MulticastInlineDelegateProperty"
            | "MulticastSparseDelegateProperty" => {
                let count = non_negative(reader.read_i32()?, "delegate")?;
                PropertyValue::MulticastDelegate(read_counted(reader, count, 12, "delegate", |r| {
                    self.read_delegate(r)
                })?)
            }
            "StructProperty" => {
                let struct_type = struct_hint.unwrap_or(UNTYPED_KEY_STRUCT);
                PropertyValue::Struct(self.read_struct(struct_type, reader, depth + 1)?)
            }
            other => return Err(Error::UnknownPropertyType(other.to_string())),
        })
    }

    fn read_struct(&self, struct_type: &str, reader: &mut BinaryReader, depth: usize) -> Result<StructValue> {
        if depth > self.options.max_depth {
            return Err(Error::RecursionLimit(self.options.max_depth));
        }
        let body = if is_simple_struct(struct_type) {
            StructBody::Simple(SimpleStruct::read(struct_type, reader, self.names)?)
        } else {
            StructBody::Complex(self.read_properties(reader, depth)?)
        };
        Ok(StructValue {
            struct_type: struct_type.to_string(),
            body,
        })
    }

    /// Read array elements, and the shared inner tag of struct arrays.
    fn read_array(
        &self,
        inner_type: &str,
        size: i32,
        reader: &mut BinaryReader,
        depth: usize,
    ) -> Result<(PropertyValue, Option<InnerTag>)> {
        let count = read_count(reader, "array element")?;

        let (values, inner_tag) = match inner_type {
            "StructProperty" if self.file_version >= ver::ARRAY_PROPERTY_INNER_TAGS => {
                let inner = TagHeader::read(reader, self.names, self.file_version)?
                    .ok_or_else(|| Error::corrupt("array of structs without an inner tag"))?;
                let struct_type = inner
                    .data
                    .struct_name()
                    .ok_or_else(|| Error::corrupt(format!("array inner tag has type {}", inner.type_name)))?;
                let min_element = if is_simple_struct(struct_type) { 1 } else { 8 };
                check_count(reader, count, min_element, "array element")?;
                let values = read_counted(reader, count, min_element, "array element", |r| {
                    Ok(PropertyValue::Struct(self.read_struct(struct_type, r, depth + 1)?))
                })?;
                let inner_tag = InnerTag {
                    name: inner.name,
                    type_name: inner.type_name,
                    size: inner.size,
                    data: inner.data,
                };
                (values, Some(inner_tag))
            }
            // Byte arrays are raw unless their elements are enum names
            "ByteProperty" if size as i64 - 4 != count as i64 => {
                check_count(reader, count, 8, "array element")?;
                let values = read_counted(reader, count, 8, "array element", |r| {
                    Ok(PropertyValue::Name(self.names.read_name(r)?))
                })?;
                (values, None)
            }
            _ => {
                let min_element = min_element_size(inner_type);
                check_count(reader, count, min_element, "array element")?;
                let values = read_counted(reader, count, min_element, "array element", |r| {
                    self.read_element(inner_type, None, r, depth)
                })?;
                (values, None)
            }
        };
        Ok((PropertyValue::Array(values), inner_tag))
    }

    fn read_elements(
        &self,
        inner_type: &str,
        struct_hint: &str,
        reader: &mut BinaryReader,
        depth: usize,
    ) -> Result<Vec<PropertyValue>> {
        let count = read_count(reader, "set element")?;
        check_count(reader, count, min_element_size(inner_type), "set element")?;
        read_counted(reader, count, min_element_size(inner_type), "set element", |r| {
            self.read_element(inner_type, Some(struct_hint), r, depth)
        })
    }

    fn read_map(
        &self,
        key_type: &str,
        value_type: &str,
        reader: &mut BinaryReader,
        depth: usize,
    ) -> Result<PropertyValue> {
        let _removed = self.read_elements(key_type, UNTYPED_KEY_STRUCT, reader, depth)?;

        let count = read_count(reader, "map entry")?;
        let min_entry = min_element_size(key_type) + min_element_size(value_type);
        check_count(reader, count, min_entry, "map entry")?;
        let entries = read_counted(reader, count, min_entry, "map entry", |r| {
            Ok(MapEntry {
                key: self.read_element(key_type, Some(UNTYPED_KEY_STRUCT), r, depth)?,
                value: self.read_element(value_type, Some(UNTYPED_VALUE_STRUCT), r, depth)?,
            })
        })?;
        Ok(PropertyValue::Map(entries))
    }

    fn read_delegate(&self, reader: &mut BinaryReader) -> Result<Delegate> {
        Ok(Delegate {
            object: self.read_package_index(reader)?,
            function: self.names.read_name(reader)?,
        })
    }

    fn read_package_index(&self, reader: &mut BinaryReader) -> Result<PackageIndex> {
        let index = PackageIndex::read(reader)?;
        check_bounds(index, self.import_count, self.export_count)?;
        Ok(index)
    }
}

/// Read an array, set or map element count.
fn read_count(reader: &mut BinaryReader, what: &str) -> Result<usize> {
    let count = reader.read_i32()?;
    usize::try_from(count).map_err(|_| Error::CorruptCount(format!("negative {} count {}", what, count)))
}

/// Fail with [`Error::CorruptCount`] when `count` elements of at least
/// `min_element` bytes cannot fit in the rest of the payload.
fn check_count(reader: &BinaryReader, count: usize, min_element: usize, what: &str) -> Result<()> {
    if count.saturating_mul(min_element) > reader.remaining() {
        return Err(Error::CorruptCount(format!(
            "{} count {} exceeds the {} payload bytes remaining",
            what,
            count,
            reader.remaining()
        )));
    }
    Ok(())
}

/// Smallest encoding of one bare element of `type_name`.
fn min_element_size(type_name: &str) -> usize {
    match type_name {
        "Int16Property" | "UInt16Property" => 2,
        "IntProperty" | "UInt32Property" | "FloatProperty" | "StrProperty" | "ObjectProperty"
        | "ClassProperty" | "InterfaceProperty" | "WeakObjectProperty" => 4,
        "Int64Property" | "UInt64Property" | "DoubleProperty" | "NameProperty" | "EnumProperty" => 8,
        "SoftObjectProperty" | "SoftClassProperty" | "StructProperty" => 8,
        "TextProperty" => 5,
        "LazyObjectProperty" => 16,
        _ => 1,
    }
}
