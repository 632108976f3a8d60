use super::util;
use super::RoaringMap64;
use croaring::bitmap::BitmapIterator;
use croaring::Bitmap;
use std::collections::btree_map;
use std::iter::FromIterator;

/// Ascending iterator over the values of a [`RoaringMap64`].
pub struct RoaringMap64Iterator<'a> {
    buckets: btree_map::Iter<'a, u32, Bitmap>,
    current: Option<(u32, BitmapIterator<'a>)>,
}

impl<'a> RoaringMap64Iterator<'a> {
    fn new(map: &'a RoaringMap64) -> Self {
        RoaringMap64Iterator {
            buckets: map.map.iter(),
            current: None,
        }
    }
}

impl<'a> Iterator for RoaringMap64Iterator<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        loop {
            if let Some((key, iter)) = &mut self.current {
                if let Some(low) = iter.next() {
                    return Some(util::unite(*key, low));
                }
            }
            let (&key, bitmap) = self.buckets.next()?;
            self.current = Some((key, bitmap.iter()));
        }
    }
}

impl RoaringMap64 {
    /// Returns an iterator over each value stored in the map, in ascending
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add(4);
    /// map.add(3);
    /// map.add(2);
    /// map.add(2);
    /// map.add(u64::MAX);
    /// let mut iterator = map.iter();
    ///
    /// assert_eq!(iterator.next(), Some(2));
    /// assert_eq!(iterator.next(), Some(3));
    /// assert_eq!(iterator.next(), Some(4));
    /// assert_eq!(iterator.next(), Some(u64::MAX));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> RoaringMap64Iterator<'_> {
        RoaringMap64Iterator::new(self)
    }
}

impl<'a> IntoIterator for &'a RoaringMap64 {
    type Item = u64;
    type IntoIter = RoaringMap64Iterator<'a>;

    fn into_iter(self) -> RoaringMap64Iterator<'a> {
        self.iter()
    }
}

impl FromIterator<u64> for RoaringMap64 {
    /// Convenience method for creating a map from an iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let boundary = u64::from(u32::MAX);
    /// let map: RoaringMap64 = (1..3).chain(boundary + 1..boundary + 10).collect();
    ///
    /// assert!(map.contains(1));
    /// assert!(map.contains(boundary + 5));
    /// assert_eq!(map.cardinality(), Ok(11));
    /// ```
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut result = Self::new();
        result.extend(iter);
        result
    }
}

impl Extend<u64> for RoaringMap64 {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        for item in iter {
            self.add(item);
        }
    }
}
