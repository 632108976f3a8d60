use std::collections::hash_set;
use std::iter::FromIterator;

use super::{BitmapValue, Repr};
use crate::roaring64::RoaringMap64Iterator;

/// Iterator over the elements of a [`BitmapValue`].
///
/// `Large` values yield ascending elements; a small set yields its elements
/// in hash order.
pub struct Iter<'a> {
    inner: IterInner<'a>,
}

enum IterInner<'a> {
    Single(Option<u64>),
    Set(hash_set::Iter<'a, u64>),
    Large(RoaringMap64Iterator<'a>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match &mut self.inner {
            IterInner::Single(value) => value.take(),
            IterInner::Set(iter) => iter.next().copied(),
            IterInner::Large(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Single(value) => {
                let n = usize::from(value.is_some());
                (n, Some(n))
            }
            IterInner::Set(iter) => iter.size_hint(),
            IterInner::Large(iter) => iter.size_hint(),
        }
    }
}

impl BitmapValue {
    /// Returns an iterator over the elements.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// let bitmap = BitmapValue::from_slice(&[3, u64::MAX, 1]);
    /// let mut iter = bitmap.iter();
    /// assert_eq!(iter.next(), Some(1));
    /// assert_eq!(iter.next(), Some(3));
    /// assert_eq!(iter.next(), Some(u64::MAX));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        let inner = match &self.repr {
            Repr::Empty => IterInner::Single(None),
            Repr::Single(value) => IterInner::Single(Some(*value)),
            Repr::Set(set) => IterInner::Set(set.iter()),
            Repr::Bitmap(map) => IterInner::Large(map.iter()),
        };
        Iter { inner }
    }

    /// Appends every element to `out` as a signed 64bit integer, the way
    /// they are handed to a signed column. Elements above `i64::MAX` wrap.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// let mut out = vec![-1];
    /// BitmapValue::from_slice(&[2, 1]).to_vec(&mut out);
    /// assert_eq!(out, [-1, 1, 2]);
    /// ```
    pub fn to_vec(&self, out: &mut Vec<i64>) {
        if let Ok(cardinality) = self.cardinality() {
            out.reserve(usize::try_from(cardinality).unwrap_or(0));
        }
        out.extend(self.iter().map(|value| value as i64));
    }
}

impl<'a> IntoIterator for &'a BitmapValue {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<u64> for BitmapValue {
    /// Collects into a value with the default options.
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut result = Self::new();
        result.extend(iter);
        result
    }
}

impl Extend<u64> for BitmapValue {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        for item in iter {
            self.add(item);
        }
    }
}
