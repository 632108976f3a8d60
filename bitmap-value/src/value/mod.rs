//! `BitmapValue` is a set of `u64` tuned for two workloads: columns where most
//! values hold zero or one element, and aggregations that union many values
//! into very large sets.
//!
//! A value is in exactly one [`Mode`]:
//!
//! * `Empty` holds nothing.
//! * `Single` holds one element inline.
//! * `SmallSet` holds 2 to [`SMALL_SET_MAX`](crate::SMALL_SET_MAX) elements in
//!   a hash set. Only reachable when
//!   [`BitmapOptions::small_set_enabled`](crate::BitmapOptions) is set.
//! * `Large` holds a shared [`RoaringMap64`]. Clones share the map until one
//!   of them writes to it.
//!
//! Adding elements promotes a value to a larger mode. Intersection,
//! difference, symmetric difference and decoding convert a `Large` value
//! holding at most one element back to `Single` or `Empty`; adding, union and
//! `remove` never demote a `Large` value.
//!
//! # Example
//!
//! ```rust
//! use bitmap_value::{BitmapValue, Mode};
//!
//! let mut a = BitmapValue::new();
//! a.add(1);
//! assert_eq!(a.mode(), Mode::Single);
//! a.add(1 << 40);
//! assert_eq!(a.mode(), Mode::Large);
//!
//! let b = BitmapValue::from_u64(1 << 40);
//! a &= &b;
//! assert_eq!(a.mode(), Mode::Single);
//! assert_eq!(a.to_string(), "1099511627776");
//!
//! let decoded = BitmapValue::from_bytes(&a.to_bytes()).unwrap();
//! assert_eq!(decoded, b);
//! ```

use rustc_hash::FxHashSet;
use std::sync::Arc;

use crate::options::BitmapOptions;
use crate::roaring64::RoaringMap64;

mod fmt;
mod imp;
mod iter;
mod ops;
mod serialization;

pub use self::iter::Iter;

/// The representation currently used by a [`BitmapValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Empty,
    Single,
    SmallSet,
    Large,
}

#[derive(Clone)]
pub struct BitmapValue {
    repr: Repr,
    options: BitmapOptions,
}

#[derive(Clone)]
enum Repr {
    Empty,
    Single(u64),
    Set(FxHashSet<u64>),
    Bitmap(Arc<RoaringMap64>),
}
