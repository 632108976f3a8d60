//! `RoaringMap64` is a set of 64bit unsigned integers built from 32bit
//! CRoaring bitmaps. Every element is split in two halves: the high 32 bits
//! select a bucket in an ordered map, the low 32 bits are stored in that
//! bucket's `croaring::Bitmap`.
//!
//! C++ counterpart - https://github.com/RoaringBitmap/CRoaring/blob/master/cpp/roaring64map.hh
//!
//! # Example
//!
//! ```rust
//! use bitmap_value::RoaringMap64;
//!
//! let mut map = RoaringMap64::new();
//! map.add(3);
//! assert!(map.contains(3));
//! map.add(u64::from(u32::MAX));
//! assert!(map.contains(u64::from(u32::MAX)));
//! map.add(u64::from(u32::MAX) + 1);
//! assert!(map.contains(u64::from(u32::MAX) + 1));
//! assert_eq!(map.cardinality(), Ok(3));
//! assert!(!map.is_32_bits_enough());
//! ```
use croaring::Bitmap;
use std::collections::BTreeMap;

mod imp;
mod iter;
mod ops;
mod serialization;
mod util;

pub use self::iter::RoaringMap64Iterator;

#[derive(Clone)]
pub struct RoaringMap64 {
    map: BTreeMap<u32, Bitmap>,
}
