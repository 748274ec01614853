//! Builtin structs serialized as raw values instead of property lists.

use uepak_common::{BinaryReader, Guid};

use crate::names::NameTable;
use crate::property::value::SoftObjectPath;
use crate::summary::{non_negative, read_counted};
use crate::{Error, Result};

/// Struct type names with a fixed binary layout.
pub const SIMPLE_STRUCTS: &[&str] = &[
    "Vector",
    "Vector2D",
    "Vector4",
    "Plane",
    "Quat",
    "Rotator",
    "IntPoint",
    "IntVector",
    "Color",
    "LinearColor",
    "Box",
    "Box2D",
    "Guid",
    "DateTime",
    "Timespan",
    "FrameNumber",
    "SoftObjectPath",
    "SoftClassPath",
    "PerPlatformFloat",
    "PerPlatformInt",
    "GameplayTagContainer",
];

/// Whether `struct_type` is serialized as a raw value.
#[inline]
pub fn is_simple_struct(struct_type: &str) -> bool {
    SIMPLE_STRUCTS.contains(&struct_type)
}

/// A decoded builtin struct value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum SimpleStruct {
    Vector { x: f32, y: f32, z: f32 },
    Vector2D { x: f32, y: f32 },
    /// Vector4, Plane and Quat.
    Vector4 { x: f32, y: f32, z: f32, w: f32 },
    Rotator { pitch: f32, yaw: f32, roll: f32 },
    IntPoint { x: i32, y: i32 },
    IntVector { x: i32, y: i32, z: i32 },
    Color { r: u8, g: u8, b: u8, a: u8 },
    LinearColor { r: f32, g: f32, b: f32, a: f32 },
    Box { min: [f32; 3], max: [f32; 3], is_valid: bool },
    Box2D { min: [f32; 2], max: [f32; 2], is_valid: bool },
    Guid(Guid),
    /// DateTime and Timespan ticks.
    Ticks(i64),
    FrameNumber(i32),
    SoftObjectPath(SoftObjectPath),
    PerPlatformFloat {
        cooked: bool,
        default: f32,
        per_platform: Vec<(String, f32)>,
    },
    PerPlatformInt {
        cooked: bool,
        default: i32,
        per_platform: Vec<(String, i32)>,
    },
    GameplayTagContainer(Vec<String>),
}

impl SimpleStruct {
    /// Read a builtin struct of type `struct_type`.
    pub(crate) fn read(struct_type: &str, reader: &mut BinaryReader, names: &NameTable) -> Result<Self> {
        Ok(match struct_type {
            "Vector" => SimpleStruct::Vector {
                x: reader.read_f32()?,
                y: reader.read_f32()?,
                z: reader.read_f32()?,
            },
            "Vector2D" => SimpleStruct::Vector2D {
                x: reader.read_f32()?,
                y: reader.read_f32()?,
            },
            "Vector4" | "Plane" | "Quat" => SimpleStruct::Vector4 {
                x: reader.read_f32()?,
                y: reader.read_f32()?,
                z: reader.read_f32()?,
                w: reader.read_f32()?,
            },
            "Rotator" => SimpleStruct::Rotator {
                pitch: reader.read_f32()?,
                yaw: reader.read_f32()?,
                roll: reader.read_f32()?,
            },
            "IntPoint" => SimpleStruct::IntPoint {
                x: reader.read_i32()?,
                y: reader.read_i32()?,
            },
            "IntVector" => SimpleStruct::IntVector {
                x: reader.read_i32()?,
                y: reader.read_i32()?,
                z: reader.read_i32()?,
            },
            // Stored BGRA
            "Color" => {
                let [b, g, r, a] = reader.read_array_bytes::<4>()?;
                SimpleStruct::Color { r, g, b, a }
            }
            "LinearColor" => SimpleStruct::LinearColor {
                r: reader.read_f32()?,
                g: reader.read_f32()?,
                b: reader.read_f32()?,
                a: reader.read_f32()?,
            },
            "Box" => SimpleStruct::Box {
                min: read_floats(reader)?,
                max: read_floats(reader)?,
                is_valid: reader.read_u8()? != 0,
            },
            "Box2D" => SimpleStruct::Box2D {
                min: read_floats(reader)?,
                max: read_floats(reader)?,
                is_valid: reader.read_u8()? != 0,
            },
            "Guid" => SimpleStruct::Guid(reader.read_guid()?),
            "DateTime" | "Timespan" => SimpleStruct::Ticks(reader.read_i64()?),
            "FrameNumber" => SimpleStruct::FrameNumber(reader.read_i32()?),
            "SoftObjectPath" | "SoftClassPath" => {
                SimpleStruct::SoftObjectPath(SoftObjectPath::read(reader, names)?)
            }
            "PerPlatformFloat" => {
                let cooked = reader.read_ubool()?;
                let default = reader.read_f32()?;
                let per_platform = if cooked {
                    Vec::new()
                } else {
                    read_platform_map(reader, names, |r| Ok(r.read_f32()?))?
                };
                SimpleStruct::PerPlatformFloat {
                    cooked,
                    default,
                    per_platform,
                }
            }
            "PerPlatformInt" => {
                let cooked = reader.read_ubool()?;
                let default = reader.read_i32()?;
                let per_platform = if cooked {
                    Vec::new()
                } else {
                    read_platform_map(reader, names, |r| Ok(r.read_i32()?))?
                };
                SimpleStruct::PerPlatformInt {
                    cooked,
                    default,
                    per_platform,
                }
            }
            "GameplayTagContainer" => {
                let count = non_negative(reader.read_i32()?, "gameplay tag")?;
                SimpleStruct::GameplayTagContainer(read_counted(reader, count, 8, "gameplay tag", |r| {
                    names.read_name(r)
                })?)
            }
            other => return Err(Error::UnknownPropertyType(format!("struct {}", other))),
        })
    }
}

fn read_floats<const N: usize>(reader: &mut BinaryReader) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for value in out.iter_mut() {
        *value = reader.read_f32()?;
    }
    Ok(out)
}

fn read_platform_map<'a, T>(
    reader: &mut BinaryReader<'a>,
    names: &NameTable,
    mut value: impl FnMut(&mut BinaryReader<'a>) -> Result<T>,
) -> Result<Vec<(String, T)>> {
    let count = non_negative(reader.read_i32()?, "per-platform value")?;
    read_counted(reader, count, 12, "per-platform value", |r| {
        Ok((names.read_name(r)?, value(r)?))
    })
}
