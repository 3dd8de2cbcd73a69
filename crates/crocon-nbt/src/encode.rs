use bytes::BufMut;

use crate::{Compound, MAX_DEPTH, NbtError, TAG_COMPOUND, TAG_END, Tag, type_name};

/// Encode `root` as an unnamed little-endian root compound.
///
/// # Errors
///
/// Returns an error if a string exceeds the `u16` length prefix, a list mixes
/// element types, or the tree nests deeper than [`MAX_DEPTH`].
pub fn to_bytes(root: &Compound) -> Result<Vec<u8>, NbtError> {
    let mut buf = Vec::with_capacity(128);
    buf.put_u8(TAG_COMPOUND);
    write_string(&mut buf, "")?;
    write_compound(&mut buf, root, 0)?;
    Ok(buf)
}

fn write_compound(buf: &mut Vec<u8>, compound: &Compound, depth: usize) -> Result<(), NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::DepthExceeded { max: MAX_DEPTH });
    }
    for (name, tag) in compound {
        buf.put_u8(tag.id());
        write_string(buf, name)?;
        write_payload(buf, tag, depth + 1)?;
    }
    buf.put_u8(TAG_END);
    Ok(())
}

fn write_payload(buf: &mut Vec<u8>, tag: &Tag, depth: usize) -> Result<(), NbtError> {
    match tag {
        Tag::Byte(v) => buf.put_i8(*v),
        Tag::Short(v) => buf.put_i16_le(*v),
        Tag::Int(v) => buf.put_i32_le(*v),
        Tag::Long(v) => buf.put_i64_le(*v),
        Tag::Float(v) => buf.put_f32_le(*v),
        Tag::Double(v) => buf.put_f64_le(*v),
        Tag::ByteArray(values) => {
            write_len(buf, values.len())?;
            for v in values {
                buf.put_i8(*v);
            }
        }
        Tag::String(s) => write_string(buf, s)?,
        Tag::List(items) => write_list(buf, items, depth)?,
        Tag::Compound(compound) => write_compound(buf, compound, depth)?,
        Tag::IntArray(values) => {
            write_len(buf, values.len())?;
            for v in values {
                buf.put_i32_le(*v);
            }
        }
        Tag::LongArray(values) => {
            write_len(buf, values.len())?;
            for v in values {
                buf.put_i64_le(*v);
            }
        }
    }
    Ok(())
}

fn write_list(buf: &mut Vec<u8>, items: &[Tag], depth: usize) -> Result<(), NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::DepthExceeded { max: MAX_DEPTH });
    }
    let element = items.first().map_or(TAG_END, Tag::id);
    if let Some(other) = items.iter().find(|t| t.id() != element) {
        return Err(NbtError::HeterogeneousList {
            first: type_name(element),
            other: other.type_name(),
        });
    }

    buf.put_u8(element);
    write_len(buf, items.len())?;
    for item in items {
        write_payload(buf, item, depth + 1)?;
    }
    Ok(())
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<(), NbtError> {
    let len = u16::try_from(s.len()).map_err(|_| NbtError::StringTooLong { len: s.len() })?;
    buf.put_u16_le(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> Result<(), NbtError> {
    let len = i32::try_from(len).map_err(|_| NbtError::LengthOverflow { len })?;
    buf.put_i32_le(len);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_root() {
        let bytes = to_bytes(&Compound::new()).unwrap();
        // compound id, empty name, end
        assert_eq!(bytes, vec![0x0a, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_little_endian_int() {
        let mut root = Compound::new();
        root.insert("id".into(), Tag::Int(0x0102_0304));

        let bytes = to_bytes(&root).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x0a, 0x00, 0x00, // root
                0x03, 0x02, 0x00, b'i', b'd', // int "id"
                0x04, 0x03, 0x02, 0x01, // payload, little-endian
                0x00, // end
            ]
        );
    }

    #[test]
    fn test_canonical_field_order() {
        let mut a = Compound::new();
        a.insert("toVersion".into(), Tag::from("1.20.80"));
        a.insert("fromVersion".into(), Tag::from("1.20.4"));

        let mut b = Compound::new();
        b.insert("fromVersion".into(), Tag::from("1.20.4"));
        b.insert("toVersion".into(), Tag::from("1.20.80"));

        assert_eq!(to_bytes(&a).unwrap(), to_bytes(&b).unwrap());
    }

    #[test]
    fn test_string_too_long() {
        let mut root = Compound::new();
        root.insert("name".into(), Tag::String("x".repeat(70_000)));

        let result = to_bytes(&root);
        assert_eq!(result, Err(NbtError::StringTooLong { len: 70_000 }));
    }

    #[test]
    fn test_heterogeneous_list() {
        let mut root = Compound::new();
        root.insert("mixed".into(), Tag::List(vec![Tag::Int(1), Tag::from("two")]));

        let result = to_bytes(&root);
        assert_eq!(
            result,
            Err(NbtError::HeterogeneousList {
                first: "int",
                other: "string"
            })
        );
    }

    #[test]
    fn test_empty_list_uses_end_element() {
        let mut root = Compound::new();
        root.insert("l".into(), Tag::List(vec![]));

        let bytes = to_bytes(&root).unwrap();
        assert_eq!(
            &bytes[3..],
            &[0x09, 0x01, 0x00, b'l', 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }
}
