use bytes::Buf;

use crate::{
    Compound, MAX_DEPTH, NbtError, TAG_BYTE, TAG_BYTE_ARRAY, TAG_COMPOUND, TAG_DOUBLE, TAG_END,
    TAG_FLOAT, TAG_INT, TAG_INT_ARRAY, TAG_LIST, TAG_LONG, TAG_LONG_ARRAY, TAG_SHORT, TAG_STRING,
    Tag, type_name,
};

/// Decode a little-endian document whose root is a compound.
///
/// The root name is read and discarded.
///
/// # Errors
///
/// Returns an error if the input is truncated, malformed, not rooted at a
/// compound, or followed by trailing bytes.
pub fn from_bytes(mut input: &[u8]) -> Result<Compound, NbtError> {
    let buf = &mut input;
    let id = read_u8(buf)?;
    if id != TAG_COMPOUND {
        return Err(NbtError::RootNotCompound {
            found: type_name(id),
        });
    }
    read_string(buf)?;
    let root = read_compound(buf, 0)?;

    if buf.has_remaining() {
        return Err(NbtError::TrailingBytes {
            count: buf.remaining(),
        });
    }
    Ok(root)
}

fn read_compound(buf: &mut &[u8], depth: usize) -> Result<Compound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::DepthExceeded { max: MAX_DEPTH });
    }
    let mut compound = Compound::new();
    loop {
        let id = read_u8(buf)?;
        if id == TAG_END {
            return Ok(compound);
        }
        let name = read_string(buf)?;
        let tag = read_payload(buf, id, depth + 1)?;
        compound.insert(name, tag);
    }
}

fn read_payload(buf: &mut &[u8], id: u8, depth: usize) -> Result<Tag, NbtError> {
    let tag = match id {
        TAG_BYTE => {
            ensure(buf, 1)?;
            Tag::Byte(buf.get_i8())
        }
        TAG_SHORT => {
            ensure(buf, 2)?;
            Tag::Short(buf.get_i16_le())
        }
        TAG_INT => {
            ensure(buf, 4)?;
            Tag::Int(buf.get_i32_le())
        }
        TAG_LONG => {
            ensure(buf, 8)?;
            Tag::Long(buf.get_i64_le())
        }
        TAG_FLOAT => {
            ensure(buf, 4)?;
            Tag::Float(buf.get_f32_le())
        }
        TAG_DOUBLE => {
            ensure(buf, 8)?;
            Tag::Double(buf.get_f64_le())
        }
        TAG_BYTE_ARRAY => {
            let len = read_len(buf, 1)?;
            Tag::ByteArray((0..len).map(|_| buf.get_i8()).collect())
        }
        TAG_STRING => Tag::String(read_string(buf)?),
        TAG_LIST => Tag::List(read_list(buf, depth)?),
        TAG_COMPOUND => Tag::Compound(read_compound(buf, depth)?),
        TAG_INT_ARRAY => {
            let len = read_len(buf, 4)?;
            Tag::IntArray((0..len).map(|_| buf.get_i32_le()).collect())
        }
        TAG_LONG_ARRAY => {
            let len = read_len(buf, 8)?;
            Tag::LongArray((0..len).map(|_| buf.get_i64_le()).collect())
        }
        other => return Err(NbtError::InvalidTagType { id: other }),
    };
    Ok(tag)
}

fn read_list(buf: &mut &[u8], depth: usize) -> Result<Vec<Tag>, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::DepthExceeded { max: MAX_DEPTH });
    }
    let element = read_u8(buf)?;
    // Every element occupies at least one byte, except for `end` lists which must be empty.
    let len = read_len(buf, usize::from(element != TAG_END))?;
    if element == TAG_END {
        return if len == 0 {
            Ok(Vec::new())
        } else {
            Err(NbtError::InvalidTagType { id: TAG_END })
        };
    }

    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(read_payload(buf, element, depth + 1)?);
    }
    Ok(items)
}

fn read_string(buf: &mut &[u8]) -> Result<String, NbtError> {
    ensure(buf, 2)?;
    let len = usize::from(buf.get_u16_le());
    ensure(buf, len)?;
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec()).map_err(|_| NbtError::InvalidUtf8)
}

/// Read an `i32` length and check that `len * element_size` bytes remain.
fn read_len(buf: &mut &[u8], element_size: usize) -> Result<usize, NbtError> {
    ensure(buf, 4)?;
    let raw = buf.get_i32_le();
    let len = usize::try_from(raw).map_err(|_| NbtError::NegativeLength { len: raw })?;
    ensure(buf, len.saturating_mul(element_size))?;
    Ok(len)
}

fn read_u8(buf: &mut &[u8]) -> Result<u8, NbtError> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

fn ensure(buf: &&[u8], needed: usize) -> Result<(), NbtError> {
    if buf.remaining() < needed {
        Err(NbtError::UnexpectedEof)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_bytes;

    fn sample() -> Compound {
        let mut states = Compound::new();
        states.insert("stone_brick_type".into(), Tag::from("mossy"));
        states.insert("facing".into(), Tag::Int(2));

        let mut root = Compound::new();
        root.insert("id".into(), Tag::from("minecraft:stone_bricks"));
        root.insert("states".into(), Tag::Compound(states));
        root.insert("lore".into(), Tag::List(vec![Tag::from("a"), Tag::from("b")]));
        root.insert("heights".into(), Tag::LongArray(vec![-1, 0, i64::MAX]));
        root.insert("scale".into(), Tag::Double(0.5));
        root
    }

    #[test]
    fn test_decode_encoded_tree() {
        let root = sample();
        let bytes = to_bytes(&root).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), root);
    }

    #[test]
    fn test_truncated_input() {
        let bytes = to_bytes(&sample()).unwrap();
        let result = from_bytes(&bytes[..bytes.len() - 3]);
        assert_eq!(result, Err(NbtError::UnexpectedEof));
    }

    #[test]
    fn test_root_not_compound() {
        let result = from_bytes(&[0x08, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(result, Err(NbtError::RootNotCompound { found: "string" }));
    }

    #[test]
    fn test_invalid_tag_type() {
        // root, then a field with type 0x42
        let result = from_bytes(&[0x0a, 0x00, 0x00, 0x42, 0x01, 0x00, b'x']);
        assert_eq!(result, Err(NbtError::InvalidTagType { id: 0x42 }));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = to_bytes(&Compound::new()).unwrap();
        bytes.push(0xff);
        assert_eq!(
            from_bytes(&bytes),
            Err(NbtError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn test_oversized_array_length_is_rejected() {
        // int array claiming i32::MAX elements with nothing behind it
        let mut bytes = vec![0x0a, 0x00, 0x00, 0x0b, 0x01, 0x00, b'a'];
        bytes.extend_from_slice(&i32::MAX.to_le_bytes());
        assert_eq!(from_bytes(&bytes), Err(NbtError::UnexpectedEof));
    }

    #[test]
    fn test_negative_length() {
        let mut bytes = vec![0x0a, 0x00, 0x00, 0x07, 0x01, 0x00, b'a'];
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(from_bytes(&bytes), Err(NbtError::NegativeLength { len: -1 }));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [0x0a, 0x00, 0x00, 0x08, 0x01, 0x00, b's', 0x01, 0x00, 0xff, 0x00];
        assert_eq!(from_bytes(&bytes), Err(NbtError::InvalidUtf8));
    }
}
