//! Tagged-fragment reader used by generated decoders.

use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::wire::{self, WireType};

/// One decoded wire fragment: a field number plus a view of its payload.
///
/// Read methods return `None` when the fragment's wire type does not match
/// the requested scalar, which lets generated decoders surface a per-field
/// error (or, for packed repeated fields, fall back to the other read path).
#[derive(Debug, Copy, Clone)]
pub struct FieldContext<'a> {
    pub field_num: u32,
    data: FieldData<'a>,
}

#[derive(Debug, Copy, Clone)]
enum FieldData<'a> {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Len(&'a [u8]),
}

impl<'a> FieldContext<'a> {
    /// Parses the next tagged fragment from `src`, returning the fragment and
    /// the remaining bytes.
    pub fn next_field(src: &'a [u8]) -> Result<(Self, &'a [u8]), DecodeError> {
        let (wire_type, field_num, read) = wire::decode_key(src)?;
        let src = &src[read..];
        let (data, rest) = match wire_type {
            WireType::Varint => {
                let (value, read) = u64::decode_leb128(src)?;
                (FieldData::Varint(value), &src[read..])
            }
            WireType::I64 => {
                if src.len() < 8 {
                    return Err(DecodeError::UnexpectedEndOfBuffer);
                }
                let mut bits = [0u8; 8];
                bits.copy_from_slice(&src[..8]);
                (FieldData::Fixed64(u64::from_le_bytes(bits)), &src[8..])
            }
            WireType::I32 => {
                if src.len() < 4 {
                    return Err(DecodeError::UnexpectedEndOfBuffer);
                }
                let mut bits = [0u8; 4];
                bits.copy_from_slice(&src[..4]);
                (FieldData::Fixed32(u32::from_le_bytes(bits)), &src[4..])
            }
            WireType::Len => {
                let (len, read) = wire::decode_len(src)?;
                let src = &src[read..];
                if src.len() < len {
                    return Err(DecodeError::UnexpectedEndOfBuffer);
                }
                let (data, rest) = src.split_at(len);
                (FieldData::Len(data), rest)
            }
            WireType::SGroup | WireType::EGroup => {
                return Err(DecodeError::DeprecatedGroupEncoding);
            }
        };
        Ok((Self { field_num, data }, rest))
    }

    fn varint(&self) -> Option<u64> {
        match self.data {
            FieldData::Varint(value) => Some(value),
            _ => None,
        }
    }

    pub fn int32(&self) -> Option<i32> {
        // int32 is sign-extended to 64 bits on the wire.
        self.varint().map(|v| v as i64 as i32)
    }

    pub fn int64(&self) -> Option<i64> {
        self.varint().map(|v| v as i64)
    }

    pub fn uint32(&self) -> Option<u32> {
        self.varint().map(|v| v as u32)
    }

    pub fn uint64(&self) -> Option<u64> {
        self.varint()
    }

    pub fn sint32(&self) -> Option<i32> {
        self.varint().map(|v| wire::zigzag_decode_32(v as u32))
    }

    pub fn sint64(&self) -> Option<i64> {
        self.varint().map(wire::zigzag_decode_64)
    }

    pub fn bool(&self) -> Option<bool> {
        self.varint().map(|v| v != 0)
    }

    pub fn fixed32(&self) -> Option<u32> {
        match self.data {
            FieldData::Fixed32(value) => Some(value),
            _ => None,
        }
    }

    pub fn sfixed32(&self) -> Option<i32> {
        self.fixed32().map(|v| v as i32)
    }

    pub fn float(&self) -> Option<f32> {
        self.fixed32().map(f32::from_bits)
    }

    pub fn fixed64(&self) -> Option<u64> {
        match self.data {
            FieldData::Fixed64(value) => Some(value),
            _ => None,
        }
    }

    pub fn sfixed64(&self) -> Option<i64> {
        self.fixed64().map(|v| v as i64)
    }

    pub fn double(&self) -> Option<f64> {
        self.fixed64().map(f64::from_bits)
    }

    pub fn string(&self) -> Option<&'a str> {
        match self.data {
            FieldData::Len(data) => core::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&'a [u8]> {
        match self.data {
            FieldData::Len(data) => Some(data),
            _ => None,
        }
    }

    /// Payload of a nested message fragment, for recursive decoding.
    pub fn message_data(&self) -> Option<&'a [u8]> {
        self.bytes()
    }

    fn unpack_varints<T>(&self, dst: &mut Vec<T>, f: impl Fn(u64) -> T) -> Option<()> {
        let mut data = self.bytes()?;
        while !data.is_empty() {
            let (value, read) = u64::decode_leb128(data).ok()?;
            dst.push(f(value));
            data = &data[read..];
        }
        Some(())
    }

    fn unpack_fixed<T, const N: usize>(
        &self,
        dst: &mut Vec<T>,
        f: impl Fn([u8; N]) -> T,
    ) -> Option<()> {
        let data = self.bytes()?;
        if data.len() % N != 0 {
            return None;
        }
        for chunk in data.chunks_exact(N) {
            let mut bits = [0u8; N];
            bits.copy_from_slice(chunk);
            dst.push(f(bits));
        }
        Some(())
    }

    pub fn unpack_int32s(&self, dst: &mut Vec<i32>) -> Option<()> {
        self.unpack_varints(dst, |v| v as i64 as i32)
    }

    pub fn unpack_int64s(&self, dst: &mut Vec<i64>) -> Option<()> {
        self.unpack_varints(dst, |v| v as i64)
    }

    pub fn unpack_uint32s(&self, dst: &mut Vec<u32>) -> Option<()> {
        self.unpack_varints(dst, |v| v as u32)
    }

    pub fn unpack_uint64s(&self, dst: &mut Vec<u64>) -> Option<()> {
        self.unpack_varints(dst, |v| v)
    }

    pub fn unpack_sint32s(&self, dst: &mut Vec<i32>) -> Option<()> {
        self.unpack_varints(dst, |v| wire::zigzag_decode_32(v as u32))
    }

    pub fn unpack_sint64s(&self, dst: &mut Vec<i64>) -> Option<()> {
        self.unpack_varints(dst, wire::zigzag_decode_64)
    }

    pub fn unpack_bools(&self, dst: &mut Vec<bool>) -> Option<()> {
        self.unpack_varints(dst, |v| v != 0)
    }

    pub fn unpack_fixed32s(&self, dst: &mut Vec<u32>) -> Option<()> {
        self.unpack_fixed(dst, u32::from_le_bytes)
    }

    pub fn unpack_sfixed32s(&self, dst: &mut Vec<i32>) -> Option<()> {
        self.unpack_fixed(dst, i32::from_le_bytes)
    }

    pub fn unpack_floats(&self, dst: &mut Vec<f32>) -> Option<()> {
        self.unpack_fixed(dst, |bits| f32::from_bits(u32::from_le_bytes(bits)))
    }

    pub fn unpack_fixed64s(&self, dst: &mut Vec<u64>) -> Option<()> {
        self.unpack_fixed(dst, u64::from_le_bytes)
    }

    pub fn unpack_sfixed64s(&self, dst: &mut Vec<i64>) -> Option<()> {
        self.unpack_fixed(dst, i64::from_le_bytes)
    }

    pub fn unpack_doubles(&self, dst: &mut Vec<f64>) -> Option<()> {
        self.unpack_fixed(dst, |bits| f64::from_bits(u64::from_le_bytes(bits)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::marshal::Marshaler;

    #[test]
    fn test_iterate_fragments() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 100);
        mm.append_string(2, "Test message");
        let buf = m.marshal(Vec::new());
        assert_eq!(buf.len(), 16);

        let (fc, rest) = FieldContext::next_field(&buf).unwrap();
        assert_eq!(fc.field_num, 1);
        assert_eq!(fc.int64(), Some(100));

        let (fc, rest) = FieldContext::next_field(rest).unwrap();
        assert_eq!(fc.field_num, 2);
        assert_eq!(fc.string(), Some("Test message"));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_wire_type_mismatch_reads_none() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_string(1, "hi");
        let buf = m.marshal(Vec::new());

        let (fc, _) = FieldContext::next_field(&buf).unwrap();
        assert_eq!(fc.int64(), None);
        assert_eq!(fc.fixed32(), None);
        assert_eq!(fc.string(), Some("hi"));
    }

    #[test]
    fn test_scalar_reads() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_sint32(1, -3);
        mm.append_fixed32(2, 7);
        mm.append_double(3, 2.5);
        mm.append_bool(4, true);
        let buf = m.marshal(Vec::new());

        let (fc, rest) = FieldContext::next_field(&buf).unwrap();
        assert_eq!(fc.sint32(), Some(-3));
        let (fc, rest) = FieldContext::next_field(rest).unwrap();
        assert_eq!(fc.fixed32(), Some(7));
        let (fc, rest) = FieldContext::next_field(rest).unwrap();
        assert_eq!(fc.double(), Some(2.5));
        let (fc, rest) = FieldContext::next_field(rest).unwrap();
        assert_eq!(fc.bool(), Some(true));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_unpack_packed() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64s(1, &[3, 270, 86942]);
        let buf = m.marshal(Vec::new());

        let (fc, _) = FieldContext::next_field(&buf).unwrap();
        let mut values = Vec::new();
        assert_eq!(fc.unpack_int64s(&mut values), Some(()));
        assert_eq!(values, [3, 270, 86942]);
    }

    #[test]
    fn test_unpack_appends_across_fragments() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_uint32s(1, &[1, 2]);
        mm.append_uint32s(1, &[3]);
        let buf = m.marshal(Vec::new());

        let mut values = Vec::new();
        let (fc, rest) = FieldContext::next_field(&buf).unwrap();
        fc.unpack_uint32s(&mut values).unwrap();
        let (fc, _) = FieldContext::next_field(rest).unwrap();
        fc.unpack_uint32s(&mut values).unwrap();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn test_unpacked_fallback_path() {
        // An old-style encoder writes repeated varints as individual
        // fragments; the packed reader reports a mismatch and the scalar
        // reader picks the value up.
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 9);
        let buf = m.marshal(Vec::new());

        let (fc, _) = FieldContext::next_field(&buf).unwrap();
        let mut values: Vec<i64> = Vec::new();
        assert_eq!(fc.unpack_int64s(&mut values), None);
        values.push(fc.int64().unwrap());
        assert_eq!(values, [9]);
    }

    #[test]
    fn test_unpack_fixed_rejects_ragged_payload() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_bytes(1, &[1, 2, 3]);
        let buf = m.marshal(Vec::new());

        let (fc, _) = FieldContext::next_field(&buf).unwrap();
        let mut values: Vec<u32> = Vec::new();
        assert_eq!(fc.unpack_fixed32s(&mut values), None);
    }

    #[test]
    fn test_truncated_payload() {
        // Field 1, Len, claims 5 bytes but provides 2.
        let buf = [0x0a, 0x05, 0x01, 0x02];
        assert_eq!(
            FieldContext::next_field(&buf).unwrap_err(),
            DecodeError::UnexpectedEndOfBuffer,
        );
    }

    #[test]
    fn test_group_wire_types_rejected() {
        // Field 1 with wire type 3 (SGroup).
        let buf = [0x0b];
        assert_eq!(
            FieldContext::next_field(&buf).unwrap_err(),
            DecodeError::DeprecatedGroupEncoding,
        );
    }
}
