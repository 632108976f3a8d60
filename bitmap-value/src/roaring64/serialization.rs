use croaring::{Bitmap, Portable};
use std::mem::size_of;

use super::RoaringMap64;
use crate::codec::{encode_varint64, varint_length, write_varint64, Reader, TypeCode};
use crate::error::DecodeError;

/// Every portable roaring payload starts with a 4 byte cookie.
const ROARING_COOKIE_LEN: usize = 4;
/// Smallest possible `(key, roaring)` entry of a `BITMAP64` payload.
const MIN_BUCKET_ENTRY_LEN: usize = size_of::<u32>() + 2 * ROARING_COOKIE_LEN;

/// Serialization of a map as a typed frame.
///
/// Maps whose values all fit in 32 bits are written as `BITMAP32` followed by
/// the portable roaring format of bucket 0. Other maps are written as
/// `BITMAP64`: a varint bucket count, then every non empty bucket as its
/// little endian key followed by its portable roaring bitmap, ascending by key.
impl RoaringMap64 {
    /// How many bytes `serialize` produces, type code included.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// for i in 100..1000 {
    ///     map.add(i);
    /// }
    /// assert_eq!(map.serialized_size(), map.serialize().len());
    ///
    /// map.add(u64::MAX);
    /// assert_eq!(map.serialized_size(), map.serialize().len());
    /// ```
    pub fn serialized_size(&self) -> usize {
        if self.is_32_bits_enough() {
            let payload = match self.bucket(0) {
                Some(bitmap) => bitmap.get_serialized_size_in_bytes::<Portable>(),
                None => Bitmap::new().get_serialized_size_in_bytes::<Portable>(),
            };
            return 1 + payload;
        }
        let (count, buckets_len) = self.buckets().fold((0usize, 0usize), |(n, len), (_, bitmap)| {
            (
                n + 1,
                len + size_of::<u32>() + bitmap.get_serialized_size_in_bytes::<Portable>(),
            )
        });
        1 + varint_length(count as u64) + buckets_len
    }

    /// Serializes the map to a new buffer.
    pub fn serialize(&self) -> Vec<u8> {
        let mut dst = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut dst);
        dst
    }

    /// Appends the serialized map to `dst`.
    pub fn write_to(&self, dst: &mut Vec<u8>) {
        if self.is_32_bits_enough() {
            dst.push(TypeCode::Bitmap32.as_u8());
            let payload = match self.bucket(0) {
                Some(bitmap) => bitmap.serialize::<Portable>(),
                None => Bitmap::new().serialize::<Portable>(),
            };
            dst.extend_from_slice(&payload);
            return;
        }

        dst.push(TypeCode::Bitmap64.as_u8());
        encode_varint64(self.buckets().count() as u64, dst);
        for (key, bitmap) in self.buckets() {
            dst.extend_from_slice(&key.to_le_bytes());
            dst.extend_from_slice(&bitmap.serialize::<Portable>());
        }
    }

    /// Writes the serialized map at the start of `dst` and returns the number
    /// of bytes written, which is `serialized_size()`.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than `serialized_size()`.
    pub fn serialize_into_slice(&self, dst: &mut [u8]) -> usize {
        if self.is_32_bits_enough() {
            dst[0] = TypeCode::Bitmap32.as_u8();
            let payload = match self.bucket(0) {
                Some(bitmap) => bitmap.serialize::<Portable>(),
                None => Bitmap::new().serialize::<Portable>(),
            };
            dst[1..1 + payload.len()].copy_from_slice(&payload);
            return 1 + payload.len();
        }

        dst[0] = TypeCode::Bitmap64.as_u8();
        let mut pos = 1;
        pos += write_varint64(self.buckets().count() as u64, &mut dst[pos..]);
        for (key, bitmap) in self.buckets() {
            dst[pos..pos + size_of::<u32>()].copy_from_slice(&key.to_le_bytes());
            pos += size_of::<u32>();
            let payload = bitmap.serialize::<Portable>();
            dst[pos..pos + payload.len()].copy_from_slice(&payload);
            pos += payload.len();
        }
        pos
    }

    /// Reads a `BITMAP32` or `BITMAP64` frame from the start of `buffer`.
    ///
    /// Returns the map and the number of bytes consumed. Any other type code
    /// is reported as `UnknownTypeCode`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::{DecodeError, RoaringMap64};
    ///
    /// let map = RoaringMap64::of(&[1, 2, 1 << 40]);
    /// let buffer = map.serialize();
    ///
    /// let (decoded, consumed) = RoaringMap64::deserialize(&buffer).unwrap();
    /// assert_eq!(decoded, map);
    /// assert_eq!(consumed, buffer.len());
    ///
    /// assert_eq!(RoaringMap64::deserialize(&[7]), Err(DecodeError::UnknownTypeCode(7)));
    /// ```
    pub fn deserialize(buffer: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut reader = Reader::new(buffer);
        let code = reader.read_u8()?;
        let map = match TypeCode::try_from(code)? {
            TypeCode::Bitmap32 => Self::read_bitmap32(&mut reader)?,
            TypeCode::Bitmap64 => Self::read_bitmap64(&mut reader)?,
            _ => return Err(DecodeError::UnknownTypeCode(code)),
        };
        Ok((map, reader.position()))
    }

    pub(crate) fn read_bitmap32(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(RoaringMap64::from_bitmap(read_roaring(reader)?))
    }

    pub(crate) fn read_bitmap64(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_varint64()?;
        let available = reader.remaining().len();
        let needed = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(MIN_BUCKET_ENTRY_LEN))
            .unwrap_or(usize::MAX);
        if needed > available {
            return Err(DecodeError::Truncated { needed, available });
        }

        let mut map = RoaringMap64::new();
        for _ in 0..count {
            let key = reader.read_u32_le()?;
            let bitmap = read_roaring(reader)?;
            map.merge_bucket(key, bitmap);
        }
        Ok(map)
    }
}

fn read_roaring(reader: &mut Reader<'_>) -> Result<Bitmap, DecodeError> {
    let offset = reader.position();
    let available = reader.remaining().len();
    if available < ROARING_COOKIE_LEN {
        return Err(DecodeError::Truncated {
            needed: ROARING_COOKIE_LEN,
            available,
        });
    }
    let bitmap = Bitmap::try_deserialize::<Portable>(reader.remaining())
        .ok_or(DecodeError::BadRoaringPayload { offset })?;
    reader.skip(bitmap.get_serialized_size_in_bytes::<Portable>())?;
    Ok(bitmap)
}
