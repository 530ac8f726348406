//! LEB128 variable-length integer encoding/decoding.

use bytes::BufMut;

use crate::error::DecodeError;

/// Integers that round-trip through the LEB128 wire encoding.
pub trait LebCodec: Sized + Copy {
    /// Longest valid encoding of this type, in bytes.
    const MAX_LEB_BYTES: usize;

    /// Decode a value from the front of `data`.
    ///
    /// Returns the value together with the number of bytes consumed. Overlong
    /// encodings, encodings that overflow the target type, and truncated
    /// input all fail with [`DecodeError::InvalidVarint`].
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Append the encoding of `self` to `buf`, returning the number of bytes
    /// written.
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes [`LebCodec::encode_leb128`] would write.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: usize = 10;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut value = 0u64;
        for (i, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            // The tenth byte may only carry the single remaining bit.
            if i == Self::MAX_LEB_BYTES - 1 && byte > 0x01 {
                return Err(DecodeError::InvalidVarint);
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte < 0x80 {
                return Ok((value, i + 1));
            }
        }
        Err(DecodeError::InvalidVarint)
    }

    #[inline]
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 0;
        loop {
            written += 1;
            if value < 0x80 {
                buf.put_u8(value as u8);
                return written;
            }
            buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        // Seven payload bits per byte; zero still occupies one byte.
        let bits = 64 - (self | 1).leading_zeros() as usize;
        bits.div_ceil(7)
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: usize = 5;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut value = 0u32;
        for (i, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            // The fifth byte may only carry the remaining four bits.
            if i == Self::MAX_LEB_BYTES - 1 && byte > 0x0f {
                return Err(DecodeError::InvalidVarint);
            }
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte < 0x80 {
                return Ok((value, i + 1));
            }
        }
        Err(DecodeError::InvalidVarint)
    }

    #[inline]
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
        u64::from(self).encode_leb128(buf)
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        u64::from(self).encoded_leb128_len()
    }
}
