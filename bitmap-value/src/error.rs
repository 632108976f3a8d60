//! Errors surfaced by decoding, parsing and cardinality queries.

use thiserror::Error;

/// Errors returned while decoding a serialized bitmap.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The leading byte is not one of the known type codes.
    #[error("unknown bitmap type code {0}")]
    UnknownTypeCode(u8),

    /// The input ends before the payload declared by its header.
    #[error("bitmap payload truncated: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required to finish the current field.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },

    /// A varint is longer than 10 bytes or overflows 64 bits.
    #[error("malformed varint in bitmap payload")]
    BadVarint,

    /// The embedded 32bit roaring payload was rejected by CRoaring.
    #[error("invalid roaring bitmap payload at offset {offset}")]
    BadRoaringPayload {
        /// Offset of the roaring payload within the input.
        offset: usize,
    },
}

/// Returned by `cardinality()` when the set holds every value of `u64`:
/// 2^64 elements do not fit in a `u64` count.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("bitmap covers the full 64-bit universe, cardinality 2^64 is not representable")]
pub struct FullUniverseOverflow;

/// Errors returned when parsing the comma separated text form of a bitmap.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseBitmapError {
    #[error("bitmap string contains invalid element '{token}'")]
    InvalidElement { token: String },
}
