//! Building blocks of the serialized form.
//!
//! A serialized bitmap is `TypeCode(1 byte) ++ payload`, the payload layout
//! depends on the type code:
//!
//! | code | name       | payload                                                   |
//! |------|------------|-----------------------------------------------------------|
//! | 0    | `EMPTY`    | none                                                      |
//! | 1    | `SINGLE32` | u32 little endian                                         |
//! | 2    | `BITMAP32` | portable roaring bitmap                                   |
//! | 3    | `SINGLE64` | u64 little endian                                         |
//! | 4    | `BITMAP64` | varint bucket count, then (u32 LE key, portable roaring)* |
//! | 10   | `SET`      | u32 LE count, then u64 LE elements                        |
//!
//! The portable roaring format is defined at <https://github.com/RoaringBitmap/RoaringFormatSpec>.

use byteorder::{ByteOrder, LittleEndian};
use std::mem::size_of;

use crate::error::DecodeError;

/// Longest encoding of a `u64` varint.
pub const MAX_VARINT64_LEN: usize = 10;

/// The leading byte of every serialized bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    Empty = 0,
    Single32 = 1,
    Bitmap32 = 2,
    Single64 = 3,
    Bitmap64 = 4,
    Set = 10,
}

impl TypeCode {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TypeCode {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(TypeCode::Empty),
            1 => Ok(TypeCode::Single32),
            2 => Ok(TypeCode::Bitmap32),
            3 => Ok(TypeCode::Single64),
            4 => Ok(TypeCode::Bitmap64),
            10 => Ok(TypeCode::Set),
            other => Err(DecodeError::UnknownTypeCode(other)),
        }
    }
}

impl From<TypeCode> for u8 {
    fn from(code: TypeCode) -> u8 {
        code.as_u8()
    }
}

/// Number of bytes `encode_varint64` writes for `value`.
///
/// ```
/// use bitmap_value::codec::varint_length;
///
/// assert_eq!(varint_length(0), 1);
/// assert_eq!(varint_length(127), 1);
/// assert_eq!(varint_length(128), 2);
/// assert_eq!(varint_length(u64::MAX), 10);
/// ```
pub fn varint_length(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Appends `value` as a little endian base 128 varint.
pub fn encode_varint64(mut value: u64, dst: &mut Vec<u8>) {
    while value >= 0x80 {
        dst.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    dst.push(value as u8);
}

/// Writes `value` as a varint at the start of `dst`, returning the number of
/// bytes written.
///
/// # Panics
///
/// If `dst` is shorter than `varint_length(value)`.
pub fn write_varint64(mut value: u64, dst: &mut [u8]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        dst[i] = (value as u8 & 0x7f) | 0x80;
        value >>= 7;
        i += 1;
    }
    dst[i] = value as u8;
    i + 1
}

/// Decodes a varint from the start of `src`, returning the value and the
/// number of bytes consumed.
///
/// ```
/// use bitmap_value::codec::decode_varint64;
/// use bitmap_value::DecodeError;
///
/// assert_eq!(decode_varint64(&[0xac, 0x02]), Ok((300, 2)));
/// assert!(matches!(decode_varint64(&[0x80]), Err(DecodeError::Truncated { .. })));
/// assert_eq!(decode_varint64(&[0xff; 11]), Err(DecodeError::BadVarint));
/// ```
pub fn decode_varint64(src: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut result = 0u64;
    for (i, &byte) in src.iter().enumerate() {
        if i == MAX_VARINT64_LEN {
            return Err(DecodeError::BadVarint);
        }
        let bits = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        // the tenth byte only has room for the top bit of a u64
        if i == MAX_VARINT64_LEN - 1 && bits > 1 {
            return Err(DecodeError::BadVarint);
        }
        result |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    if src.len() >= MAX_VARINT64_LEN {
        return Err(DecodeError::BadVarint);
    }
    Err(DecodeError::Truncated {
        needed: src.len() + 1,
        available: src.len(),
    })
}

/// Bounds checked cursor over a serialized bitmap.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let rest = self.remaining();
        if rest.len() < len {
            return Err(DecodeError::Truncated {
                needed: len,
                available: rest.len(),
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.take(size_of::<u32>())?))
    }

    pub(crate) fn read_u64_le(&mut self) -> Result<u64, DecodeError> {
        Ok(LittleEndian::read_u64(self.take(size_of::<u64>())?))
    }

    pub(crate) fn read_varint64(&mut self) -> Result<u64, DecodeError> {
        let (value, len) = decode_varint64(self.remaining())?;
        self.pos += len;
        Ok(value)
    }
}
