use log::debug;
use rustc_hash::FxHashSet;
use std::mem::size_of;

use super::{BitmapValue, Repr};
use crate::codec::{Reader, TypeCode};
use crate::error::DecodeError;
use crate::options::{BitmapOptions, SMALL_SET_MAX};
use crate::roaring64::RoaringMap64;

impl BitmapValue {
    /// Exact number of bytes `serialize` writes.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// assert_eq!(BitmapValue::new().serialized_size(), 1);
    /// assert_eq!(BitmapValue::from_u64(7).serialized_size(), 5);
    /// assert_eq!(BitmapValue::from_u64(1 << 32).serialized_size(), 9);
    /// ```
    pub fn serialized_size(&self) -> usize {
        match &self.repr {
            Repr::Empty => 1,
            Repr::Single(value) if *value <= u64::from(u32::MAX) => 1 + size_of::<u32>(),
            Repr::Single(_) => 1 + size_of::<u64>(),
            Repr::Set(set) => 1 + size_of::<u32>() + set.len() * size_of::<u64>(),
            Repr::Bitmap(map) => map.serialized_size(),
        }
    }

    /// Writes the value at the start of `dst`, returning the number of bytes
    /// written. That is always `serialized_size()`.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than `serialized_size()`.
    pub fn serialize(&self, dst: &mut [u8]) -> usize {
        match &self.repr {
            Repr::Empty => {
                dst[0] = TypeCode::Empty.as_u8();
                1
            }
            Repr::Single(value) => match u32::try_from(*value) {
                Ok(value) => {
                    dst[0] = TypeCode::Single32.as_u8();
                    dst[1..5].copy_from_slice(&value.to_le_bytes());
                    5
                }
                Err(_) => {
                    dst[0] = TypeCode::Single64.as_u8();
                    dst[1..9].copy_from_slice(&value.to_le_bytes());
                    9
                }
            },
            Repr::Set(set) => {
                dst[0] = TypeCode::Set.as_u8();
                dst[1..5].copy_from_slice(&(set.len() as u32).to_le_bytes());
                let mut pos = 5;
                for value in set {
                    dst[pos..pos + size_of::<u64>()].copy_from_slice(&value.to_le_bytes());
                    pos += size_of::<u64>();
                }
                pos
            }
            Repr::Bitmap(map) => map.serialize_into_slice(dst),
        }
    }

    /// Appends the serialized value to `dst`.
    pub fn write_to(&self, dst: &mut Vec<u8>) {
        if let Repr::Bitmap(map) = &self.repr {
            map.write_to(dst);
            return;
        }
        let start = dst.len();
        dst.resize(start + self.serialized_size(), 0);
        self.serialize(&mut dst[start..]);
    }

    /// Serializes the value to a new buffer.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// assert_eq!(BitmapValue::new().to_bytes(), [0]);
    /// assert_eq!(BitmapValue::from_u64(1).to_bytes(), [1, 1, 0, 0, 0]);
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut dst = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut dst);
        dst
    }

    /// Decodes a value written by `serialize`, with the default options.
    ///
    /// The result is in the smallest mode that fits its elements, except that
    /// a roaring payload holding two or more elements stays `Large`. Bytes
    /// after the end of the frame are ignored.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, DecodeError, Mode};
    ///
    /// let bitmap = BitmapValue::from_bytes(&[3, 1, 0, 0, 0, 1, 0, 0, 0]).unwrap();
    /// assert_eq!(bitmap.mode(), Mode::Single);
    /// assert!(bitmap.contains((1 << 32) | 1));
    ///
    /// assert_eq!(BitmapValue::from_bytes(&[5]), Err(DecodeError::UnknownTypeCode(5)));
    /// ```
    pub fn from_bytes(src: &[u8]) -> Result<BitmapValue, DecodeError> {
        Self::from_bytes_with_options(src, BitmapOptions::default())
    }

    pub fn from_bytes_with_options(
        src: &[u8],
        options: BitmapOptions,
    ) -> Result<BitmapValue, DecodeError> {
        match decode(src, options) {
            Ok(repr) => Ok(BitmapValue { repr, options }),
            Err(e) => {
                debug!(
                    "failed to decode bitmap value of {} bytes, type code {:?}: {}",
                    src.len(),
                    src.first(),
                    e
                );
                Err(e)
            }
        }
    }
}

fn decode(src: &[u8], options: BitmapOptions) -> Result<Repr, DecodeError> {
    let mut reader = Reader::new(src);
    let repr = match TypeCode::try_from(reader.read_u8()?)? {
        TypeCode::Empty => Repr::Empty,
        TypeCode::Single32 => Repr::Single(u64::from(reader.read_u32_le()?)),
        TypeCode::Single64 => Repr::Single(reader.read_u64_le()?),
        TypeCode::Bitmap32 => Repr::from_map(RoaringMap64::read_bitmap32(&mut reader)?),
        TypeCode::Bitmap64 => Repr::from_map(RoaringMap64::read_bitmap64(&mut reader)?),
        TypeCode::Set => decode_set(&mut reader, options)?,
    };
    Ok(repr)
}

fn decode_set(reader: &mut Reader<'_>, options: BitmapOptions) -> Result<Repr, DecodeError> {
    let count = reader.read_u32_le()? as usize;
    let available = reader.remaining().len();
    let needed = count.saturating_mul(size_of::<u64>());
    if needed > available {
        return Err(DecodeError::Truncated { needed, available });
    }

    if count > SMALL_SET_MAX {
        let mut map = RoaringMap64::new();
        for _ in 0..count {
            map.add(reader.read_u64_le()?);
        }
        return Ok(Repr::from_map(map));
    }

    let mut set = FxHashSet::with_capacity_and_hasher(count, Default::default());
    for _ in 0..count {
        set.insert(reader.read_u64_le()?);
    }
    Ok(Repr::from_set(set, options))
}
