//! Message builder: accumulates tagged wire fragments and serializes them in
//! a single pass with computed length prefixes.

use std::sync::{Mutex, PoisonError};

use crate::leb128::LebCodec;
use crate::wire::{self, WireType};

/// Upper bound on marshalers cached by a [`MarshalerPool`].
const MAX_POOLED: usize = 16;

#[derive(Debug, Copy, Clone)]
enum Op {
    /// Pre-encoded key + payload bytes, stored in the scratch buffer.
    Raw { start: usize, end: usize },
    /// Opens a nested length-delimited message under `tag`.
    StartMessage { tag: u32 },
    /// Closes the innermost open message.
    EndMessage,
}

/// Accumulates an encoded message tree before serializing it in one pass.
///
/// Obtain one from a [`MarshalerPool`], build the message through
/// [`Marshaler::message_marshaler`], then finalize with
/// [`Marshaler::marshal`]. Scalar fragments are encoded eagerly into a
/// scratch buffer; nested message length prefixes are computed at finalize
/// time, so building never backtracks.
#[derive(Debug, Default)]
pub struct Marshaler {
    ops: Vec<Op>,
    scratch: Vec<u8>,
}

impl Marshaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root builder for the message tree.
    pub fn message_marshaler(&mut self) -> MessageMarshaler<'_> {
        MessageMarshaler { m: self }
    }

    /// Serialize all accumulated fragments, appending to `dst`.
    pub fn marshal(&mut self, mut dst: Vec<u8>) -> Vec<u8> {
        // First pass: payload size of every open message, bottom-up. A
        // message's size bubbles into its parent when it closes.
        let mut sizes = vec![0u64; self.ops.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, op) in self.ops.iter().enumerate() {
            match *op {
                Op::Raw { start, end } => {
                    if let Some(&top) = stack.last() {
                        sizes[top] += (end - start) as u64;
                    }
                }
                Op::StartMessage { .. } => stack.push(i),
                Op::EndMessage => {
                    let Some(inner) = stack.pop() else { continue };
                    if let (Some(&top), Op::StartMessage { tag }) =
                        (stack.last(), self.ops[inner])
                    {
                        sizes[top] += wire::encoded_key_len(tag) as u64
                            + sizes[inner].encoded_leb128_len() as u64
                            + sizes[inner];
                    }
                }
            }
        }

        // Second pass: write everything out in order.
        for (i, op) in self.ops.iter().enumerate() {
            match *op {
                Op::Raw { start, end } => dst.extend_from_slice(&self.scratch[start..end]),
                Op::StartMessage { tag } => {
                    wire::encode_key(WireType::Len, tag, &mut dst);
                    sizes[i].encode_leb128(&mut dst);
                }
                Op::EndMessage => {}
            }
        }
        dst
    }

    fn reset(&mut self) {
        self.ops.clear();
        self.scratch.clear();
    }
}

/// Builder for the fields of a single message.
///
/// Append methods exist for every protobuf scalar wire type, packed variants
/// for every packable type, and [`MessageMarshaler::append_message`] scopes a
/// child builder for nested messages.
#[derive(Debug)]
pub struct MessageMarshaler<'m> {
    m: &'m mut Marshaler,
}

impl MessageMarshaler<'_> {
    fn raw_op(&mut self, write: impl FnOnce(&mut Vec<u8>)) {
        let start = self.m.scratch.len();
        write(&mut self.m.scratch);
        let end = self.m.scratch.len();
        self.m.ops.push(Op::Raw { start, end });
    }

    fn append_varint(&mut self, tag: u32, value: u64) {
        self.raw_op(|buf| {
            wire::encode_key(WireType::Varint, tag, buf);
            value.encode_leb128(buf);
        });
    }

    fn append_i32_bits(&mut self, tag: u32, value: u32) {
        self.raw_op(|buf| {
            wire::encode_key(WireType::I32, tag, buf);
            buf.extend_from_slice(&value.to_le_bytes());
        });
    }

    fn append_i64_bits(&mut self, tag: u32, value: u64) {
        self.raw_op(|buf| {
            wire::encode_key(WireType::I64, tag, buf);
            buf.extend_from_slice(&value.to_le_bytes());
        });
    }

    pub fn append_int32(&mut self, tag: u32, value: i32) {
        // Negative int32 values are sign-extended to 64 bits on the wire.
        self.append_varint(tag, value as i64 as u64);
    }

    pub fn append_int64(&mut self, tag: u32, value: i64) {
        self.append_varint(tag, value as u64);
    }

    pub fn append_uint32(&mut self, tag: u32, value: u32) {
        self.append_varint(tag, u64::from(value));
    }

    pub fn append_uint64(&mut self, tag: u32, value: u64) {
        self.append_varint(tag, value);
    }

    pub fn append_sint32(&mut self, tag: u32, value: i32) {
        self.append_varint(tag, u64::from(wire::zigzag_encode_32(value)));
    }

    pub fn append_sint64(&mut self, tag: u32, value: i64) {
        self.append_varint(tag, wire::zigzag_encode_64(value));
    }

    pub fn append_bool(&mut self, tag: u32, value: bool) {
        self.append_varint(tag, u64::from(value));
    }

    pub fn append_fixed32(&mut self, tag: u32, value: u32) {
        self.append_i32_bits(tag, value);
    }

    pub fn append_sfixed32(&mut self, tag: u32, value: i32) {
        self.append_i32_bits(tag, value as u32);
    }

    pub fn append_float(&mut self, tag: u32, value: f32) {
        self.append_i32_bits(tag, value.to_bits());
    }

    pub fn append_fixed64(&mut self, tag: u32, value: u64) {
        self.append_i64_bits(tag, value);
    }

    pub fn append_sfixed64(&mut self, tag: u32, value: i64) {
        self.append_i64_bits(tag, value as u64);
    }

    pub fn append_double(&mut self, tag: u32, value: f64) {
        self.append_i64_bits(tag, value.to_bits());
    }

    pub fn append_string(&mut self, tag: u32, value: &str) {
        self.append_bytes(tag, value.as_bytes());
    }

    pub fn append_bytes(&mut self, tag: u32, value: &[u8]) {
        self.raw_op(|buf| {
            wire::encode_key(WireType::Len, tag, buf);
            (value.len() as u64).encode_leb128(buf);
            buf.extend_from_slice(value);
        });
    }

    /// Appends a nested message under `tag`, built by `f` against a child
    /// builder. The child's length prefix is filled in at finalize time.
    pub fn append_message(&mut self, tag: u32, f: impl FnOnce(&mut MessageMarshaler<'_>)) {
        self.m.ops.push(Op::StartMessage { tag });
        f(&mut MessageMarshaler { m: self.m });
        self.m.ops.push(Op::EndMessage);
    }

    fn packed_varints(
        &mut self,
        tag: u32,
        values: impl Iterator<Item = u64> + Clone,
    ) {
        let len: usize = values.clone().map(LebCodec::encoded_leb128_len).sum();
        self.raw_op(|buf| {
            wire::encode_key(WireType::Len, tag, buf);
            (len as u64).encode_leb128(buf);
            for value in values {
                value.encode_leb128(buf);
            }
        });
    }

    fn packed_fixed<const N: usize>(
        &mut self,
        tag: u32,
        values: impl Iterator<Item = [u8; N]> + ExactSizeIterator,
    ) {
        let len = values.len() * N;
        self.raw_op(|buf| {
            wire::encode_key(WireType::Len, tag, buf);
            (len as u64).encode_leb128(buf);
            for value in values {
                buf.extend_from_slice(&value);
            }
        });
    }

    pub fn append_int32s(&mut self, tag: u32, values: &[i32]) {
        self.packed_varints(tag, values.iter().map(|&v| v as i64 as u64));
    }

    pub fn append_int64s(&mut self, tag: u32, values: &[i64]) {
        self.packed_varints(tag, values.iter().map(|&v| v as u64));
    }

    pub fn append_uint32s(&mut self, tag: u32, values: &[u32]) {
        self.packed_varints(tag, values.iter().map(|&v| u64::from(v)));
    }

    pub fn append_uint64s(&mut self, tag: u32, values: &[u64]) {
        self.packed_varints(tag, values.iter().copied());
    }

    pub fn append_sint32s(&mut self, tag: u32, values: &[i32]) {
        self.packed_varints(tag, values.iter().map(|&v| u64::from(wire::zigzag_encode_32(v))));
    }

    pub fn append_sint64s(&mut self, tag: u32, values: &[i64]) {
        self.packed_varints(tag, values.iter().map(|&v| wire::zigzag_encode_64(v)));
    }

    pub fn append_bools(&mut self, tag: u32, values: &[bool]) {
        self.packed_varints(tag, values.iter().map(|&v| u64::from(v)));
    }

    pub fn append_fixed32s(&mut self, tag: u32, values: &[u32]) {
        self.packed_fixed(tag, values.iter().map(|v| v.to_le_bytes()));
    }

    pub fn append_sfixed32s(&mut self, tag: u32, values: &[i32]) {
        self.packed_fixed(tag, values.iter().map(|v| v.to_le_bytes()));
    }

    pub fn append_floats(&mut self, tag: u32, values: &[f32]) {
        self.packed_fixed(tag, values.iter().map(|v| v.to_bits().to_le_bytes()));
    }

    pub fn append_fixed64s(&mut self, tag: u32, values: &[u64]) {
        self.packed_fixed(tag, values.iter().map(|v| v.to_le_bytes()));
    }

    pub fn append_sfixed64s(&mut self, tag: u32, values: &[i64]) {
        self.packed_fixed(tag, values.iter().map(|v| v.to_le_bytes()));
    }

    pub fn append_doubles(&mut self, tag: u32, values: &[f64]) {
        self.packed_fixed(tag, values.iter().map(|v| v.to_bits().to_le_bytes()));
    }
}

/// Process-wide pool of [`Marshaler`]s reused across encode calls.
///
/// `const`-constructible so generated code can declare it as a `static`.
/// Borrow/return is safe under concurrent use; a returned marshaler is reset
/// before being cached.
#[derive(Debug)]
pub struct MarshalerPool {
    pool: Mutex<Vec<Marshaler>>,
}

impl MarshalerPool {
    pub const fn new() -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self) -> Marshaler {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        pool.pop().unwrap_or_default()
    }

    pub fn put(&self, mut m: Marshaler) {
        m.reset();
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if pool.len() < MAX_POOLED {
            pool.push(m);
        }
    }
}

impl Default for MarshalerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scalar_fragments() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 1);
        mm.append_string(2, "Hello, World!");
        let buf = m.marshal(Vec::new());

        let mut expected = vec![0x08, 0x01, 0x12, 13];
        expected.extend_from_slice(b"Hello, World!");
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_negative_int32_sign_extended() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int32(1, -1);
        let buf = m.marshal(Vec::new());

        // Key byte plus ten bytes of sign-extended varint.
        assert_eq!(buf.len(), 11);
        assert_eq!(buf[1..], [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
    }

    #[test]
    fn test_nested_message_lengths() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 42);
        mm.append_message(3, |mm| {
            mm.append_int64(1, 1);
            mm.append_string(2, "Bob");
            mm.append_message(4, |mm| {
                mm.append_bool(1, true);
            });
        });
        let buf = m.marshal(Vec::new());

        #[rustfmt::skip]
        let expected = vec![
            0x08, 42,
            0x1a, 11,             // field 3, nested payload of 11 bytes
                0x08, 0x01,
                0x12, 3, b'B', b'o', b'b',
                0x22, 2,          // field 4, nested payload of 2 bytes
                    0x08, 0x01,
        ];
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_empty_message_fragment() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_message(2, |_| {});
        let buf = m.marshal(Vec::new());
        assert_eq!(buf, [0x12, 0x00]);
    }

    #[test]
    fn test_packed_varints() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64s(5, &[3, 270, 86942]);
        let buf = m.marshal(Vec::new());

        // Canonical packed example from the protobuf encoding guide.
        assert_eq!(buf, [0x2a, 0x06, 0x03, 0x8e, 0x02, 0x9e, 0xa7, 0x05]);
    }

    #[test]
    fn test_packed_fixed() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_fixed32s(1, &[1, 2]);
        let buf = m.marshal(Vec::new());
        assert_eq!(buf, [0x0a, 8, 1, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn test_marshal_appends_to_dst() {
        let mut m = Marshaler::new();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 7);
        let buf = m.marshal(vec![0xde, 0xad]);
        assert_eq!(buf, [0xde, 0xad, 0x08, 0x07]);
    }

    #[test]
    fn test_pool_reuse_resets_state() {
        static POOL: MarshalerPool = MarshalerPool::new();

        let mut m = POOL.get();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 1);
        let first = m.marshal(Vec::new());
        POOL.put(m);

        let mut m = POOL.get();
        let mut mm = m.message_marshaler();
        mm.append_int64(1, 2);
        let second = m.marshal(Vec::new());
        POOL.put(m);

        assert_eq!(first, [0x08, 0x01]);
        assert_eq!(second, [0x08, 0x02]);
    }
}
