//! Compact projection of a decoded package.
//!
//! Package indices become `(package, name)` pairs and properties become
//! `{ "type", "value" }` objects keyed by property name. The compact shape is
//! output only: it is serialized, never read back or compacted again.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;
use uepak_common::Guid;

use crate::package::{PakEntrySet, PakExportSet};
use crate::package_index::{PackageIndex, Reference};
use crate::property::{PropertyTag, PropertyValue, StructBody, StructValue};
use crate::Result;

/// Package name used for references to exports of the same package.
pub const THIS_PACKAGE: &str = "{{THIS PACKAGE}}";

/// Object name used for references to exports that failed to decode.
pub const BROKEN_EXPORT: &str = "{{BROKEN/MISSING EXPORT}}";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactEntry {
    pub file_name: String,
    pub guid: Guid,
    pub exports: Vec<CompactExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactExport {
    pub name: String,
    pub class: Option<CompactReference>,
    #[serde(rename = "super")]
    pub super_: Option<CompactReference>,
    pub template: Option<CompactReference>,
    pub outer: Option<CompactReference>,
    pub properties: BTreeMap<String, CompactProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactReference {
    pub package: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactProperty {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

impl CompactEntry {
    /// Project a decoded package.
    pub fn new(entry: &PakEntrySet) -> Result<Self> {
        let exports = entry
            .exports
            .iter()
            .map(|export| compact_export(entry, export))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            file_name: entry.file_name.clone(),
            guid: entry.summary.guid,
            exports,
        })
    }
}

fn compact_export(entry: &PakEntrySet, set: &PakExportSet) -> Result<CompactExport> {
    let export = &set.export;
    let (properties, error) = match &set.properties {
        Ok(tags) => (property_map(entry, tags)?, None),
        Err(failure) => (BTreeMap::new(), Some(failure.message.clone())),
    };

    Ok(CompactExport {
        name: export.object_name.clone(),
        class: compact_reference(entry, export.class_index)?,
        super_: compact_reference(entry, export.super_index)?,
        template: compact_reference(entry, export.template_index)?,
        outer: compact_reference(entry, export.outer_index)?,
        properties,
        error,
    })
}

/// Compact a package index. Null compacts to `None`.
pub fn compact_reference(entry: &PakEntrySet, index: PackageIndex) -> Result<Option<CompactReference>> {
    Ok(match entry.resolve(index)? {
        Reference::Null => None,
        Reference::Import(import) => {
            let package = match entry.resolve(import.outer_index)? {
                Reference::Import(outer) => outer.object_name.clone(),
                _ => import.class_package.clone(),
            };
            Some(CompactReference {
                package,
                name: import.object_name.clone(),
            })
        }
        Reference::Export(export) => Some(CompactReference {
            package: THIS_PACKAGE.to_string(),
            name: export.object_name.clone(),
        }),
        Reference::BrokenExport(_) => Some(CompactReference {
            package: THIS_PACKAGE.to_string(),
            name: BROKEN_EXPORT.to_string(),
        }),
    })
}

/// Compact a property list. A repeated key keeps the last value.
fn property_map(entry: &PakEntrySet, tags: &[PropertyTag]) -> Result<BTreeMap<String, CompactProperty>> {
    let mut map = BTreeMap::new();
    for tag in tags {
        let key = tag.key();
        let property = compact_property(entry, tag)?;
        if map.insert(key, property).is_some() {
            warn!(file = %entry.file_name, property = %tag.key(), "duplicate property, keeping the last value");
        }
    }
    Ok(map)
}

fn compact_property(entry: &PakEntrySet, tag: &PropertyTag) -> Result<CompactProperty> {
    Ok(match &tag.value {
        PropertyValue::Struct(value) => compact_struct(entry, value)?,
        PropertyValue::Enum { enum_type, value } => CompactProperty {
            type_name: enum_type.clone(),
            value: Value::String(value.clone()),
        },
        PropertyValue::Opaque { type_tag, raw } => CompactProperty {
            type_name: type_tag.clone(),
            value: Value::String(hex::encode(raw)),
        },
        other => CompactProperty {
            type_name: tag.type_name.clone(),
            value: compact_value(entry, other)?,
        },
    })
}

fn compact_struct(entry: &PakEntrySet, value: &StructValue) -> Result<CompactProperty> {
    let inner = match &value.body {
        StructBody::Simple(simple) => serde_json::to_value(simple)?,
        StructBody::Complex(tags) => serde_json::to_value(property_map(entry, tags)?)?,
    };
    Ok(CompactProperty {
        type_name: value.struct_type.clone(),
        value: inner,
    })
}

/// Compact a value appearing inside an array, set or map, or as a plain
/// scalar property.
fn compact_value(entry: &PakEntrySet, value: &PropertyValue) -> Result<Value> {
    Ok(match value {
        PropertyValue::Object(index) => serde_json::to_value(compact_reference(entry, *index)?)?,
        PropertyValue::Struct(value) => serde_json::to_value(compact_struct(entry, value)?)?,
        PropertyValue::Array(values) | PropertyValue::Set(values) => Value::Array(
            values
                .iter()
                .map(|v| compact_value(entry, v))
                .collect::<Result<Vec<_>>>()?,
        ),
        PropertyValue::Map(entries) => Value::Array(
            entries
                .iter()
                .map(|e| -> Result<Value> {
                    Ok(json!({
                        "key": compact_value(entry, &e.key)?,
                        "value": compact_value(entry, &e.value)?,
                    }))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        PropertyValue::Enum { value, .. } => Value::String(value.clone()),
        PropertyValue::Opaque { raw, .. } => Value::String(hex::encode(raw)),
        PropertyValue::Delegate(delegate) => json!({
            "object": compact_reference(entry, delegate.object)?,
            "function": delegate.function,
        }),
        PropertyValue::MulticastDelegate(delegates) => Value::Array(
            delegates
                .iter()
                .map(|d| -> Result<Value> {
                    Ok(json!({
                        "object": compact_reference(entry, d.object)?,
                        "function": d.function,
                    }))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        other => serde_json::to_value(ScalarValue(other))?,
    })
}

/// Serializes scalar payloads without the variant wrapper.
struct ScalarValue<'a>(&'a PropertyValue);

impl Serialize for ScalarValue<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            PropertyValue::Bool(v) => v.serialize(serializer),
            PropertyValue::Int8(v) => v.serialize(serializer),
            PropertyValue::Int16(v) => v.serialize(serializer),
            PropertyValue::Int(v) => v.serialize(serializer),
            PropertyValue::Int64(v) => v.serialize(serializer),
            PropertyValue::Byte(v) => v.serialize(serializer),
            PropertyValue::UInt16(v) => v.serialize(serializer),
            PropertyValue::UInt32(v) => v.serialize(serializer),
            PropertyValue::UInt64(v) => v.serialize(serializer),
            PropertyValue::Float(v) => v.serialize(serializer),
            PropertyValue::Double(v) => v.serialize(serializer),
            PropertyValue::Name(v) | PropertyValue::Str(v) => v.serialize(serializer),
            PropertyValue::Text(v) => v.serialize(serializer),
            PropertyValue::LazyObject(v) => v.serialize(serializer),
            PropertyValue::SoftObject(v) => v.serialize(serializer),
            other => other.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::DecodeOptions;
    use crate::test_asset::{ExportSpec, PackageBuilder};

    fn decode(builder: PackageBuilder) -> PakEntrySet {
        let bytes = builder.build();
        PakEntrySet::decode("Game/Test.uasset", &bytes, None, DecodeOptions::default()).unwrap()
    }

    #[test]
    fn test_bool_property() {
        let mut builder = PackageBuilder::new();
        let data = builder.stream(|w| w.bool("bEnabled", true));
        builder.export(ExportSpec::new("Config").data(data));
        let compact = CompactEntry::new(&decode(builder)).unwrap();

        let properties = serde_json::to_value(&compact.exports[0].properties).unwrap();
        assert_eq!(
            properties,
            json!({ "bEnabled": { "type": "BoolProperty", "value": true } })
        );
        assert_eq!(compact.file_name, "Game/Test.uasset");
        assert_eq!(compact.guid, crate::test_asset::TEST_GUID);
    }

    #[test]
    fn test_import_reference() {
        let mut builder = PackageBuilder::new();
        let engine = builder.import("/Script/CoreUObject", "Package", "/Script/Engine", PackageIndex::NULL);
        let material = builder.import("/Script/Engine", "Class", "Material", engine);
        builder.export(ExportSpec::new("M_Stone").class(material).outer(material));
        let compact = CompactEntry::new(&decode(builder)).unwrap();

        let export = &compact.exports[0];
        assert_eq!(
            serde_json::to_value(&export.outer).unwrap(),
            json!({ "package": "/Script/Engine", "name": "Material" })
        );
        assert!(export.super_.is_none());
        assert!(export.template.is_none());

        let json = serde_json::to_value(export).unwrap();
        assert_eq!(json["super"], Value::Null);
    }

    #[test]
    fn test_root_import_uses_class_package() {
        let mut builder = PackageBuilder::new();
        let engine = builder.import("/Script/CoreUObject", "Package", "/Script/Engine", PackageIndex::NULL);
        builder.export(ExportSpec::new("Thing").class(engine));
        let compact = CompactEntry::new(&decode(builder)).unwrap();

        assert_eq!(
            compact.exports[0].class,
            Some(CompactReference {
                package: "/Script/CoreUObject".into(),
                name: "/Script/Engine".into()
            })
        );
    }

    #[test]
    fn test_export_and_broken_references() {
        let mut builder = PackageBuilder::new();
        builder.export(ExportSpec::new("Broken").data(vec![0xFF; 6]));
        builder.export(ExportSpec::new("Parent"));
        builder.export(ExportSpec::new("Child").outer(PackageIndex(2)).template(PackageIndex(1)));
        let compact = CompactEntry::new(&decode(builder)).unwrap();

        assert!(compact.exports[0].error.is_some());
        assert!(compact.exports[0].properties.is_empty());

        let child = &compact.exports[2];
        assert_eq!(
            child.outer,
            Some(CompactReference {
                package: THIS_PACKAGE.into(),
                name: "Parent".into()
            })
        );
        assert_eq!(
            child.template,
            Some(CompactReference {
                package: THIS_PACKAGE.into(),
                name: BROKEN_EXPORT.into()
            })
        );
    }

    #[test]
    fn test_structs_enums_and_arrays() {
        let mut builder = PackageBuilder::new();
        let engine = builder.import("/Script/CoreUObject", "Package", "/Script/Engine", PackageIndex::NULL);
        let texture = builder.import("/Script/Engine", "Texture2D", "T_Rock", engine);
        let data = builder.stream(|w| {
            w.vector("Location", [1.0, 2.0, 3.0]);
            w.enum_value("Mode", "EMode", "EMode::Fast");
            w.struct_value("Settings", "MySettings", |s| s.int("Width", 640));
            w.int_array("Ids", &[4, 5]);
            w.struct_array("Rows", "Row", 1, |row, _| row.float("Weight", 0.5));
            w.object("Texture", texture);
        });
        builder.export(ExportSpec::new("Thing").data(data));
        let compact = CompactEntry::new(&decode(builder)).unwrap();

        let properties = serde_json::to_value(&compact.exports[0].properties).unwrap();
        assert_eq!(
            properties["Location"],
            json!({ "type": "Vector", "value": { "x": 1.0, "y": 2.0, "z": 3.0 } })
        );
        assert_eq!(properties["Mode"], json!({ "type": "EMode", "value": "EMode::Fast" }));
        assert_eq!(
            properties["Settings"],
            json!({ "type": "MySettings", "value": { "Width": { "type": "IntProperty", "value": 640 } } })
        );
        assert_eq!(properties["Ids"], json!({ "type": "ArrayProperty", "value": [4, 5] }));
        assert_eq!(
            properties["Rows"],
            json!({
                "type": "ArrayProperty",
                "value": [{ "type": "Row", "value": { "Weight": { "type": "FloatProperty", "value": 0.5 } } }]
            })
        );
        assert_eq!(
            properties["Texture"],
            json!({ "type": "ObjectProperty", "value": { "package": "/Script/Engine", "name": "T_Rock" } })
        );
    }

    #[test]
    fn test_duplicate_names_keep_last() {
        let mut builder = PackageBuilder::new();
        let data = builder.stream(|w| {
            w.int("Value", 1);
            w.int("Value", 2);
        });
        builder.export(ExportSpec::new("Thing").data(data));
        let compact = CompactEntry::new(&decode(builder)).unwrap();

        let properties = &compact.exports[0].properties;
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["Value"].value, json!(2));
    }
}
