use thiserror::Error;

/// Errors produced while encoding or decoding a tag tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NbtError {
    /// The input ended in the middle of a value.
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// An unknown tag type id was read.
    #[error("Invalid tag type: {id}")]
    InvalidTagType { id: u8 },

    /// The root of the document was not a compound.
    #[error("Root tag must be a compound, found {found}")]
    RootNotCompound { found: &'static str },

    /// A string was not valid UTF-8.
    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,

    /// A string does not fit the `u16` length prefix.
    #[error("String of {len} bytes exceeds the 65535 byte limit")]
    StringTooLong { len: usize },

    /// An array or list does not fit the `i32` length prefix.
    #[error("Length {len} exceeds the i32 limit")]
    LengthOverflow { len: usize },

    /// A negative array or list length was read.
    #[error("Negative length: {len}")]
    NegativeLength { len: i32 },

    /// A list mixed element types.
    #[error("List mixes {first} and {other} elements")]
    HeterogeneousList {
        first: &'static str,
        other: &'static str,
    },

    /// Nesting went deeper than [`crate::MAX_DEPTH`].
    #[error("Nesting depth exceeds {max}")]
    DepthExceeded { max: usize },

    /// Bytes were left over after the root compound.
    #[error("{count} trailing bytes after root compound")]
    TrailingBytes { count: usize },
}
