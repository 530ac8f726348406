use core::fmt;

/// Errors surfaced while decoding protobuf-encoded bytes.
///
/// Decode failures are ordinary recoverable errors: callers of generated
/// `unmarshal_protobuf` methods get one of these by value and decide what to
/// do with the partially-filled receiver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A varint ran past its maximum length or overflowed.
    InvalidVarint,
    /// A field key carried a wire type outside the defined range.
    InvalidWireType { value: u8 },
    /// A field key carried a tag of zero.
    TagOutOfRange { tag: u32 },
    /// The buffer ended in the middle of a value.
    UnexpectedEndOfBuffer,
    /// Proto2 group encoding, which this runtime does not support.
    DeprecatedGroupEncoding,
    /// A length prefix exceeds the platform's addressable memory.
    LengthOverflow { value: u64 },
    /// A generated decoder could not read a field it knows about, usually
    /// because the wire type did not match the declared type.
    Field {
        message: &'static str,
        field: &'static str,
    },
}

impl DecodeError {
    /// Shorthand used by generated decoders.
    pub const fn field(message: &'static str, field: &'static str) -> Self {
        DecodeError::Field { message, field }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidVarint => {
                write!(f, "invalid leb128 varint")
            }
            DecodeError::InvalidWireType { value } => {
                write!(f, "invalid 'wire type' value: {value}")
            }
            DecodeError::TagOutOfRange { tag } => {
                write!(f, "field tag {tag} out of range")
            }
            DecodeError::UnexpectedEndOfBuffer => {
                write!(f, "unexpected end of buffer")
            }
            DecodeError::DeprecatedGroupEncoding => {
                write!(f, "deprecated group encoding not supported")
            }
            DecodeError::LengthOverflow { value } => {
                write!(
                    f,
                    "length prefix {value} exceeds platform addressable memory"
                )
            }
            DecodeError::Field { message, field } => {
                write!(f, "cannot read field {message}.{field}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
