//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).

use bytes::BufMut;

use crate::error::DecodeError;
use crate::leb128::LebCodec;

/// Minimum value of a protobuf tag.
pub const MINIMUM_TAG_VAL: u32 = 1;
/// Maximum value of a protobuf tag.
pub const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;

/// Denotes the type of a field in an encoded protobuf message.
///
/// Protobuf messages are a series of key-value pairs. When encoded each pair
/// becomes a record consisting of a field number, a [`WireType`], and a
/// payload whose size the [`WireType`] determines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`,
    /// `bool`, `enum`.
    Varint = 0,
    /// 64-bit integer.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Variable length field.
    ///
    /// Used for: `string`, `bytes`, `message`, packed `repeated` fields.
    Len = 2,
    /// Group start (deprecated).
    SGroup = 3,
    /// Group end (deprecated).
    EGroup = 4,
    /// 32-bit integer.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

impl WireType {
    /// Try to decode a [`WireType`] from the provided raw value.
    #[inline]
    fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            _ => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    #[inline]
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

/// Encodes the provided tag and wire type as a protobuf field key.
///
/// Follows the "Message Structure" section of
/// <https://protobuf.dev/programming-guides/encoding>.
#[inline]
pub fn encode_key<B: BufMut>(wire_type: WireType, tag: u32, buf: &mut B) {
    let key = (tag << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// Returns the encoded length of a field key (tag + wire type).
#[inline]
pub fn encoded_key_len(tag: u32) -> usize {
    // The wire type only occupies the low three bits and never changes the
    // encoded length.
    (tag << 3).encoded_leb128_len()
}

/// Decodes a field key from the front of `data`.
///
/// Returns the wire type, the tag, and the number of bytes consumed.
#[inline]
pub fn decode_key(data: &[u8]) -> Result<(WireType, u32, usize), DecodeError> {
    // Keys always fit in u32: the max tag value is `2^29 - 1`, so the max key
    // is `(2^29 - 1) << 3 | 7` which is `u32::MAX`.
    let (key, read) = u32::decode_leb128(data)?;
    let wire_type = WireType::try_from_val((key & 0b111) as u8)?;
    let tag = key >> 3;
    if tag < MINIMUM_TAG_VAL {
        return Err(DecodeError::TagOutOfRange { tag });
    }
    Ok((wire_type, tag, read))
}

/// Decodes the length prefix for a length-delimited field.
///
/// Returns the length and the number of bytes consumed.
#[inline]
pub fn decode_len(data: &[u8]) -> Result<(usize, usize), DecodeError> {
    let (len, read) = u64::decode_leb128(data)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })?;
    Ok((len, read))
}

/// Protobuf `sint32`/`sint64` zigzag transform.
#[inline]
pub(crate) const fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub(crate) const fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

#[inline]
pub(crate) const fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub(crate) const fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn proptest_key_roundtrips() {
        fn arb_tag() -> impl Strategy<Value = u32> {
            MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL
        }

        fn arb_wiretype() -> impl Strategy<Value = WireType> {
            (0..=5u8).prop_map(|val| WireType::try_from_val(val).expect("known valid"))
        }

        proptest!(|((tag, wire_type) in (arb_tag(), arb_wiretype()))| {
            let mut buf = Vec::with_capacity(8);
            encode_key(wire_type, tag, &mut buf);
            let (rnd_wire_type, rnd_tag, read) = decode_key(&buf).unwrap();

            prop_assert_eq!(tag, rnd_tag);
            prop_assert_eq!(wire_type, rnd_wire_type);
            prop_assert_eq!(read, buf.len());
        });
    }

    #[test]
    fn test_all_wire_type_values() {
        for i in u8::MIN..=u8::MAX {
            let wire_type = WireType::try_from_val(i);
            match (i, wire_type) {
                (0, Ok(WireType::Varint))
                | (1, Ok(WireType::I64))
                | (2, Ok(WireType::Len))
                | (3, Ok(WireType::SGroup))
                | (4, Ok(WireType::EGroup))
                | (5, Ok(WireType::I32)) => (),
                (6.., Err(_)) => (),
                other => panic!("unexpected value {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_key_rejects_zero_tag() {
        let mut buf = Vec::new();
        // Tag zero, wire type varint.
        0u32.encode_leb128(&mut buf);
        assert_eq!(
            decode_key(&buf),
            Err(DecodeError::TagOutOfRange { tag: 0 })
        );
    }

    #[test]
    fn test_decode_len() {
        assert_eq!(decode_len(&[0]).unwrap(), (0, 1));
        assert_eq!(decode_len(&[127]).unwrap(), (127, 1));
        assert_eq!(decode_len(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_len(&[0xac, 0x02]).unwrap(), (300, 2));
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode_32(0), 0);
        assert_eq!(zigzag_encode_32(-1), 1);
        assert_eq!(zigzag_encode_32(1), 2);
        assert_eq!(zigzag_encode_32(-2), 3);
        assert_eq!(zigzag_decode_64(zigzag_encode_64(i64::MIN)), i64::MIN);
        assert_eq!(zigzag_decode_64(zigzag_encode_64(i64::MAX)), i64::MAX);

        proptest!(|(value: i32)| {
            prop_assert_eq!(zigzag_decode_32(zigzag_encode_32(value)), value);
        });
    }
}
