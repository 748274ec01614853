//! Tagged property decoding.

mod decode;
mod simple;
mod tag;
mod value;

pub use decode::{DecodeOptions, PropertyDecoder, DEFAULT_MAX_DEPTH};
pub use simple::{is_simple_struct, SimpleStruct, SIMPLE_STRUCTS};
pub use tag::{InnerTag, PropertyTag, TagData};
pub use value::{
    Delegate, MapEntry, PropertyValue, SoftObjectPath, StructBody, StructValue, TextHistory, TextValue,
};
