//! A compact set of `u64` for use as a column value.
//!
//! [`BitmapValue`] switches between an empty, single element, small hash set
//! and roaring representation as elements come and go, and serializes to a
//! type-coded binary format (see [`codec`]) whose codes never change.
//! [`RoaringMap64`] is the 64bit roaring map backing large values.

pub mod codec;
mod error;
mod options;
pub mod roaring64;
mod value;

pub use codec::TypeCode;
pub use error::{DecodeError, FullUniverseOverflow, ParseBitmapError};
pub use options::{BitmapOptions, SMALL_SET_MAX};
pub use roaring64::RoaringMap64;
pub use value::{BitmapValue, Iter, Mode};
