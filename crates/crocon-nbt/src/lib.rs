//! Little-endian named binary tag codec.
//!
//! The conversion engine speaks the Bedrock flavour of NBT: a tree of named
//! values with little-endian numbers and `u16` length-prefixed strings. This
//! crate provides:
//! - [`Tag`]: One node of the tree
//! - [`Compound`]: A named-value map, kept in sorted key order
//! - [`to_bytes`] / [`from_bytes`]: The binary encoder and decoder
//!
//! Compounds are `BTreeMap`s, so encoding is canonical: two trees with the
//! same contents produce the same bytes regardless of insertion order.

mod decode;
mod encode;
mod error;

use std::collections::BTreeMap;

use serde::Serialize;

pub use decode::from_bytes;
pub use encode::to_bytes;
pub use error::NbtError;

/// A named-value map.
pub type Compound = BTreeMap<String, Tag>;

/// Maximum nesting depth accepted by the encoder and decoder.
pub const MAX_DEPTH: usize = 512;

pub(crate) const TAG_END: u8 = 0;
pub(crate) const TAG_BYTE: u8 = 1;
pub(crate) const TAG_SHORT: u8 = 2;
pub(crate) const TAG_INT: u8 = 3;
pub(crate) const TAG_LONG: u8 = 4;
pub(crate) const TAG_FLOAT: u8 = 5;
pub(crate) const TAG_DOUBLE: u8 = 6;
pub(crate) const TAG_BYTE_ARRAY: u8 = 7;
pub(crate) const TAG_STRING: u8 = 8;
pub(crate) const TAG_LIST: u8 = 9;
pub(crate) const TAG_COMPOUND: u8 = 10;
pub(crate) const TAG_INT_ARRAY: u8 = 11;
pub(crate) const TAG_LONG_ARRAY: u8 = 12;

/// A single value in a named binary tag tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    /// A homogeneous list. Mixed element types are rejected at encode time.
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    /// The wire type id of this tag.
    pub fn id(&self) -> u8 {
        match self {
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        type_name(self.id())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Tag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// Read any integral tag that fits in an `i32`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Byte(v) => Some(i32::from(*v)),
            Tag::Short(v) => Some(i32::from(*v)),
            Tag::Int(v) => Some(*v),
            Tag::Long(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_compound(self) -> Option<Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }
}

pub(crate) fn type_name(id: u8) -> &'static str {
    match id {
        TAG_END => "end",
        TAG_BYTE => "byte",
        TAG_SHORT => "short",
        TAG_INT => "int",
        TAG_LONG => "long",
        TAG_FLOAT => "float",
        TAG_DOUBLE => "double",
        TAG_BYTE_ARRAY => "byte_array",
        TAG_STRING => "string",
        TAG_LIST => "list",
        TAG_COMPOUND => "compound",
        TAG_INT_ARRAY => "int_array",
        TAG_LONG_ARRAY => "long_array",
        _ => "unknown",
    }
}

impl From<i8> for Tag {
    fn from(v: i8) -> Self {
        Tag::Byte(v)
    }
}

impl From<bool> for Tag {
    fn from(v: bool) -> Self {
        Tag::Byte(i8::from(v))
    }
}

impl From<i16> for Tag {
    fn from(v: i16) -> Self {
        Tag::Short(v)
    }
}

impl From<i32> for Tag {
    fn from(v: i32) -> Self {
        Tag::Int(v)
    }
}

impl From<i64> for Tag {
    fn from(v: i64) -> Self {
        Tag::Long(v)
    }
}

impl From<f32> for Tag {
    fn from(v: f32) -> Self {
        Tag::Float(v)
    }
}

impl From<f64> for Tag {
    fn from(v: f64) -> Self {
        Tag::Double(v)
    }
}

impl From<String> for Tag {
    fn from(v: String) -> Self {
        Tag::String(v)
    }
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::String(v.to_string())
    }
}

impl From<Compound> for Tag {
    fn from(v: Compound) -> Self {
        Tag::Compound(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ids() {
        assert_eq!(Tag::Byte(0).id(), 1);
        assert_eq!(Tag::String(String::new()).id(), 8);
        assert_eq!(Tag::Compound(Compound::new()).id(), 10);
        assert_eq!(Tag::LongArray(vec![]).id(), 12);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Tag::from("stone").as_str(), Some("stone"));
        assert_eq!(Tag::from(true).as_byte(), Some(1));
        assert_eq!(Tag::Short(7).as_i32(), Some(7));
        assert_eq!(Tag::Long(i64::MAX).as_i32(), None);
        assert!(Tag::Int(1).as_compound().is_none());
    }

    #[test]
    fn test_serialize_json() {
        let mut compound = Compound::new();
        compound.insert("id".into(), Tag::from("minecraft:stone"));
        compound.insert("count".into(), Tag::Byte(3));

        let json = serde_json::to_string(&Tag::Compound(compound)).unwrap();
        assert_eq!(json, r#"{"count":3,"id":"minecraft:stone"}"#);
    }
}
