use croaring::Bitmap;

use super::util;
use super::RoaringMap64;
use crate::error::FullUniverseOverflow;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};

/// Number of buckets a map covering every `u64` holds.
const FULL_BUCKET_COUNT: u64 = 1 << 32;
/// Cardinality of a saturated bucket.
const FULL_BUCKET_CARDINALITY: u64 = 1 << 32;

impl RoaringMap64 {
    /// Creates an empty `RoaringMap64`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmap_value::RoaringMap64;
    /// let map = RoaringMap64::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        RoaringMap64 {
            map: BTreeMap::new(),
        }
    }

    /// Creates a `RoaringMap64` holding the values of a 32bit `Bitmap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmap_value::RoaringMap64;
    /// use croaring::Bitmap;
    ///
    /// let map = RoaringMap64::from_bitmap(Bitmap::of(&[1, 2, 3]));
    /// assert_eq!(map.cardinality(), Ok(3));
    /// assert!(map.is_32_bits_enough());
    /// ```
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        let mut map = BTreeMap::new();
        if !bitmap.is_empty() {
            map.insert(0, bitmap);
        }
        RoaringMap64 { map }
    }

    /// Creates a map from a slice of u64 integers.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let elements = vec![1, 2, u64::MAX];
    /// let map = RoaringMap64::of(&elements);
    ///
    /// let mut map2 = RoaringMap64::new();
    /// for element in &elements {
    ///     map2.add(*element);
    /// }
    ///
    /// assert!(map.contains(1));
    /// assert!(map.contains(u64::MAX));
    /// assert!(!map.contains(3));
    /// assert_eq!(map, map2);
    /// ```
    pub fn of(elements: &[u64]) -> Self {
        let mut map = RoaringMap64::new();
        map.add_many(elements);
        map
    }

    /// Adds `value` to the bucket keyed by its high 32 bits. Adding a value
    /// twice has no effect.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add(3);
    /// map.add(3);
    /// map.add(u64::from(u32::MAX) + 1);
    /// assert_eq!(map.cardinality(), Ok(2));
    /// assert_eq!(map.bucket_count(), 2);
    /// ```
    pub fn add(&mut self, value: u64) {
        let (hi, lo) = util::high_low(value);
        self.bucket_mut(hi).add(lo);
    }

    /// Adds `value`, returning true if it was not present before.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// assert!(map.add_checked(1));
    /// assert!(!map.add_checked(1));
    /// ```
    pub fn add_checked(&mut self, value: u64) -> bool {
        let (hi, lo) = util::high_low(value);
        self.bucket_mut(hi).add_checked(lo)
    }

    /// Adds every element of `elements`. Same result as calling `add` for
    /// each, but consecutive elements sharing a bucket are inserted in one
    /// batch.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add_many(&[5, 1, 1 << 40, 3, (1 << 40) + 1]);
    /// assert_eq!(map.to_vec(), [1, 3, 5, 1 << 40, (1 << 40) + 1]);
    /// ```
    pub fn add_many(&mut self, elements: &[u64]) {
        let mut lows: Vec<u32> = Vec::new();
        let mut start = 0;
        while start < elements.len() {
            let (high, low) = util::high_low(elements[start]);
            let mut end = start + 1;
            while end < elements.len() && util::high_low(elements[end]).0 == high {
                end += 1;
            }
            let bucket = self.bucket_mut(high);
            if end - start == 1 {
                bucket.add(low);
            } else {
                lows.clear();
                lows.extend(elements[start..end].iter().map(|&v| util::high_low(v).1));
                bucket.add_many(&lows);
            }
            start = end;
        }
    }

    /// Add all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add_range(1..3);
    /// assert!(map.contains(1));
    /// assert!(map.contains(2));
    /// assert!(!map.contains(3));
    ///
    /// let mut map2 = RoaringMap64::new();
    /// map2.add_range(u64::from(u32::MAX)..=u64::from(u32::MAX) + 1);
    /// assert_eq!(map2.cardinality(), Ok(2));
    /// assert_eq!(map2.bucket_count(), 2);
    /// ```
    pub fn add_range<R: RangeBounds<u64>>(&mut self, range: R) {
        if let Some((start, end)) = range_to_inclusive(range) {
            self.add_range_inclusive(start, end);
        }
    }

    fn add_range_inclusive(&mut self, start: u64, end: u64) {
        let (start_high, start_low) = util::high_low(start);
        let (end_high, end_low) = util::high_low(end);
        if start_high == end_high {
            self.bucket_mut(start_high).add_range(start_low..=end_low);
            return;
        }

        // First bucket from start_low up, the buckets in between entirely,
        // the last bucket up to end_low.
        self.bucket_mut(start_high).add_range(start_low..=u32::MAX);
        for high in start_high + 1..end_high {
            self.map.insert(high, Bitmap::from_range(..));
        }
        self.bucket_mut(end_high).add_range(..=end_low);
    }

    /// Returns true if `value` is in the map.
    pub fn contains(&self, value: u64) -> bool {
        let (hi, lo) = util::high_low(value);
        match self.map.get(&hi) {
            None => false,
            Some(bitmap) => bitmap.contains(lo),
        }
    }

    /// Returns true if the map holds no value.
    pub fn is_empty(&self) -> bool {
        self.map.values().all(Bitmap::is_empty)
    }

    /// Returns true if the map holds every `u64`.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map = RoaringMap64::of(&[0, u64::MAX]);
    /// assert!(!map.is_full());
    /// ```
    pub fn is_full(&self) -> bool {
        // only bother to check if every bucket key is in use
        if self.map.len() as u64 != FULL_BUCKET_COUNT {
            return false;
        }
        self.map
            .values()
            .all(|bitmap| bitmap.cardinality() == FULL_BUCKET_CARDINALITY)
    }

    /// Return true if all the elements of `self` are in `other`.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map1: RoaringMap64 = (5..10).collect();
    /// let map2: RoaringMap64 = (5..8).collect();
    /// let map3: RoaringMap64 = (9..11).collect();
    ///
    /// assert!(map2.is_subset(&map1));
    /// assert!(!map3.is_subset(&map1));
    /// ```
    pub fn is_subset(&self, other: &RoaringMap64) -> bool {
        self.map.iter().all(|(key, lhs)| {
            lhs.is_empty() || other.map.get(key).map_or(false, |rhs| lhs.is_subset(rhs))
        })
    }

    /// Negates the values in `range`: values in the range are removed if
    /// present and added if absent. Values outside the range are unchanged.
    ///
    /// `flip(lo..hi)` flips the half open interval `[lo, hi)`; the range may
    /// span several buckets.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add_range(1..5);
    /// map.flip(2..10);
    /// assert_eq!(map.to_vec(), [1, 5, 6, 7, 8, 9]);
    ///
    /// let boundary = u64::from(u32::MAX);
    /// let mut map = RoaringMap64::new();
    /// map.flip(boundary..boundary + 2);
    /// assert_eq!(map.to_vec(), [boundary, boundary + 1]);
    /// ```
    pub fn flip<R: RangeBounds<u64>>(&mut self, range: R) {
        if let Some((start, end)) = range_to_inclusive(range) {
            self.flip_inclusive(start, end);
        }
    }

    fn flip_inclusive(&mut self, start: u64, end: u64) {
        let (start_high, start_low) = util::high_low(start);
        let (end_high, end_low) = util::high_low(end);

        if start_high == end_high {
            self.flip_bucket(start_high, start_low, end_low);
            return;
        }
        self.flip_bucket(start_high, start_low, u32::MAX);
        for high in start_high + 1..end_high {
            self.flip_bucket(high, 0, u32::MAX);
        }
        self.flip_bucket(end_high, 0, end_low);
    }

    fn flip_bucket(&mut self, high: u32, start_low: u32, end_low: u32) {
        match self.map.entry(high) {
            Entry::Vacant(e) => {
                e.insert(Bitmap::from_range(start_low..=end_low));
            }
            Entry::Occupied(mut e) => {
                e.get_mut().flip_inplace(start_low..=end_low);
                if e.get().is_empty() {
                    e.remove();
                }
            }
        }
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Removes `value`; does nothing if it is absent.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add(u64::MAX);
    /// map.remove(u64::MAX);
    /// map.remove(7);
    /// assert!(map.is_empty());
    /// assert_eq!(map.bucket_count(), 0);
    /// ```
    pub fn remove(&mut self, value: u64) {
        self.remove_checked(value);
    }

    /// Removes `value`, returning true if it was present.
    pub fn remove_checked(&mut self, value: u64) -> bool {
        let (hi, lo) = util::high_low(value);
        match self.map.entry(hi) {
            Entry::Vacant(_) => false,
            Entry::Occupied(mut bitmap) => {
                let removed = bitmap.get_mut().remove_checked(lo);
                if bitmap.get().is_empty() {
                    bitmap.remove();
                }
                removed
            }
        }
    }

    /// Remove all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add_range(0..=10);
    /// map.add(1 << 33);
    /// map.remove_range(5..=(1 << 33));
    /// assert_eq!(map.cardinality(), Ok(5));
    /// ```
    pub fn remove_range<R: RangeBounds<u64>>(&mut self, range: R) {
        if let Some((start, end)) = range_to_inclusive(range) {
            self.remove_range_inclusive(start, end);
        }
    }

    fn remove_range_inclusive(&mut self, start: u64, end: u64) {
        let (start_high, start_low) = util::high_low(start);
        let (end_high, end_low) = util::high_low(end);

        let mut keys_to_remove = Vec::new();
        for (&high, bitmap) in self.map.range_mut(start_high..=end_high) {
            let low_start = if high == start_high { start_low } else { 0 };
            let low_end = if high == end_high { end_low } else { u32::MAX };
            bitmap.remove_range(low_start..=low_end);
            if bitmap.is_empty() {
                keys_to_remove.push(high);
            }
        }
        for key in &keys_to_remove {
            self.map.remove(key);
        }
    }

    /// Drops empty buckets and releases unused memory of the remaining ones.
    /// Returns the number of bytes released by the bucket bitmaps.
    pub fn shrink_to_fit(&mut self) -> usize {
        self.map.retain(|_, bitmap| !bitmap.is_empty());
        self.map
            .values_mut()
            .map(|bitmap| bitmap.shrink_to_fit())
            .sum()
    }

    /// Compresses the bucket bitmaps with run containers where that is
    /// smaller. Returns true if any bucket changed.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map: RoaringMap64 = (100..1000).collect();
    /// let before = map.serialized_size();
    /// assert!(map.run_optimize());
    /// assert!(map.serialized_size() < before);
    /// assert_eq!(map.cardinality(), Ok(900));
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        self.map
            .values_mut()
            .fold(false, |changed, bitmap| bitmap.run_optimize() || changed)
    }

    /// Returns the value at index `rank`, the smallest value being at index 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add_range(10..=20);
    /// map.add(1 << 40);
    /// assert_eq!(map.select(0), Some(10));
    /// assert_eq!(map.select(10), Some(20));
    /// assert_eq!(map.select(11), Some(1 << 40));
    /// assert_eq!(map.select(12), None);
    /// ```
    pub fn select(&self, mut rank: u64) -> Option<u64> {
        for (&key, bitmap) in &self.map {
            let sub_cardinality = bitmap.cardinality();
            if rank < sub_cardinality {
                // sub_cardinality <= 2^32, so rank fits in a u32
                let low = bitmap.select(rank as u32)?;
                return Some(util::unite(key, low));
            }
            rank -= sub_cardinality;
        }
        None
    }

    /// Returns the number of values that are smaller or equal to `value`.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map = RoaringMap64::of(&[1, 5, 1 << 32, u64::MAX]);
    /// assert_eq!(map.rank(0), 0);
    /// assert_eq!(map.rank(5), 2);
    /// assert_eq!(map.rank(1 << 32), 3);
    /// assert_eq!(map.rank(u64::MAX), 4);
    /// ```
    pub fn rank(&self, value: u64) -> u64 {
        let (hi, lo) = util::high_low(value);
        let mut range = self.map.range(..=hi);
        let mut rank = 0;
        if let Some((&key, bitmap)) = range.next_back() {
            rank += if key == hi {
                bitmap.rank(lo)
            } else {
                bitmap.cardinality()
            };
        }
        for (_, bitmap) in range {
            rank += bitmap.cardinality();
        }
        rank
    }

    /// Returns the number of values in the map.
    ///
    /// Fails only when the map holds all 2^64 values.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map = RoaringMap64::new();
    /// map.add(1);
    /// assert_eq!(map.cardinality(), Ok(1));
    /// map.add(u64::MAX);
    /// assert_eq!(map.cardinality(), Ok(2));
    /// ```
    pub fn cardinality(&self) -> Result<u64, FullUniverseOverflow> {
        if self.is_full() {
            return Err(FullUniverseOverflow);
        }
        Ok(self.map.values().map(Bitmap::cardinality).sum())
    }

    /// Returns the smallest value, or `u64::MAX` if the map is empty.
    ///
    /// Check `is_empty` first: a map holding only `u64::MAX` gives the same
    /// answer.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map = RoaringMap64::of(&[1000, 120]);
    /// assert_eq!(map.minimum(), 120);
    /// assert_eq!(RoaringMap64::new().minimum(), u64::MAX);
    /// ```
    pub fn minimum(&self) -> u64 {
        self.map
            .iter()
            .find_map(|(&k, bitmap)| bitmap.minimum().map(|low| util::unite(k, low)))
            .unwrap_or(u64::MAX)
    }

    /// Returns the greatest value, or `0` if the map is empty.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map = RoaringMap64::of(&[1000, 120]);
    /// assert_eq!(map.maximum(), 1000);
    /// assert_eq!(RoaringMap64::new().maximum(), 0);
    /// ```
    pub fn maximum(&self) -> u64 {
        self.map
            .iter()
            .rev()
            .find_map(|(&k, bitmap)| bitmap.maximum().map(|low| util::unite(k, low)))
            .unwrap_or(0)
    }

    /// Computes the intersection of two maps as a new map.
    pub fn and(&self, other: &Self) -> Self {
        let mut map = BTreeMap::new();
        for (key, bitmap) in &self.map {
            if let Some(other_bitmap) = other.map.get(key) {
                let result = bitmap.and(other_bitmap);
                if !result.is_empty() {
                    map.insert(*key, result);
                }
            }
        }
        RoaringMap64 { map }
    }

    /// Intersects `self` with `other` bucket by bucket. A bucket missing from
    /// `other` empties the matching bucket of `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map1 = RoaringMap64::of(&[25, u64::MAX]);
    /// let map2 = RoaringMap64::of(&[u64::MAX, 1 << 40]);
    ///
    /// map1.and_inplace(&map2);
    /// assert_eq!(map1.to_vec(), [u64::MAX]);
    ///
    /// map1.and_inplace(&RoaringMap64::new());
    /// assert!(map1.is_empty());
    /// ```
    pub fn and_inplace(&mut self, other: &Self) {
        self.map.retain(|key, bitmap| match other.map.get(key) {
            None => false,
            Some(other_bitmap) => {
                bitmap.and_inplace(other_bitmap);
                !bitmap.is_empty()
            }
        });
    }

    /// Computes the union of two maps as a new map.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map1 = RoaringMap64::of(&[u64::MAX]);
    /// let map2 = RoaringMap64::of(&[25]);
    /// let map3 = map1.or(&map2);
    /// assert_eq!(map3.to_vec(), [25, u64::MAX]);
    /// ```
    pub fn or(&self, other: &Self) -> Self {
        let mut map = self.clone();
        map.or_inplace(other);
        map
    }

    /// Adds every value of `other` to `self`.
    pub fn or_inplace(&mut self, other: &Self) {
        for (key, other_bitmap) in &other.map {
            match self.map.entry(*key) {
                Entry::Vacant(e) => {
                    if !other_bitmap.is_empty() {
                        e.insert(other_bitmap.clone());
                    }
                }
                Entry::Occupied(mut e) => {
                    e.get_mut().or_inplace(other_bitmap);
                }
            };
        }
    }

    /// Computes the symmetric difference (xor) of two maps as a new map.
    pub fn xor(&self, other: &Self) -> Self {
        let mut map = self.clone();
        map.xor_inplace(other);
        map
    }

    /// Keeps the values present in exactly one of `self` and `other`.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map1 = RoaringMap64::of(&[15, 25]);
    /// let map2 = RoaringMap64::of(&[25, 35]);
    /// map1.xor_inplace(&map2);
    /// assert_eq!(map1.to_vec(), [15, 35]);
    /// ```
    pub fn xor_inplace(&mut self, other: &Self) {
        for (key, other_bitmap) in &other.map {
            match self.map.entry(*key) {
                Entry::Vacant(e) => {
                    if !other_bitmap.is_empty() {
                        e.insert(other_bitmap.clone());
                    }
                }
                Entry::Occupied(mut e) => {
                    e.get_mut().xor_inplace(other_bitmap);
                    if e.get().is_empty() {
                        e.remove();
                    }
                }
            };
        }
    }

    /// Computes the difference `self - other` as a new map.
    pub fn andnot(&self, other: &Self) -> Self {
        let mut map = self.clone();
        map.andnot_inplace(other);
        map
    }

    /// Removes every value of `other` from `self`.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let mut map1 = RoaringMap64::of(&[15, 25, u64::MAX - 10]);
    /// let map2 = RoaringMap64::of(&[25, 35]);
    /// map1.andnot_inplace(&map2);
    /// assert_eq!(map1.to_vec(), [15, u64::MAX - 10]);
    /// ```
    pub fn andnot_inplace(&mut self, other: &Self) {
        self.map.retain(|key, bitmap| {
            if let Some(other_bitmap) = other.map.get(key) {
                bitmap.andnot_inplace(other_bitmap);
            }
            !bitmap.is_empty()
        });
    }

    /// Computes the union of many maps at once.
    ///
    /// Buckets sharing a key are merged with a single `Bitmap::fast_or`.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let a = RoaringMap64::of(&[1, 1 << 33]);
    /// let b = RoaringMap64::of(&[2]);
    /// let c = RoaringMap64::of(&[1 << 33, u64::MAX]);
    /// let all = RoaringMap64::fast_union(&[&a, &b, &c]);
    /// assert_eq!(all.to_vec(), [1, 2, 1 << 33, u64::MAX]);
    /// ```
    pub fn fast_union(maps: &[&RoaringMap64]) -> Self {
        let mut grouped: BTreeMap<u32, Vec<&Bitmap>> = BTreeMap::new();
        for map in maps {
            for (&key, bitmap) in &map.map {
                grouped.entry(key).or_default().push(bitmap);
            }
        }
        let map = grouped
            .into_iter()
            .map(|(key, bitmaps)| (key, Bitmap::fast_or(&bitmaps)))
            .filter(|(_, bitmap)| !bitmap.is_empty())
            .collect();
        RoaringMap64 { map }
    }

    /// Returns all values in ascending order.
    ///
    /// ```
    /// use bitmap_value::RoaringMap64;
    ///
    /// let map = RoaringMap64::of(&[25, 15, u64::MAX]);
    /// assert_eq!(map.to_vec(), [15, 25, u64::MAX]);
    /// ```
    pub fn to_vec(&self) -> Vec<u64> {
        let mut result: Vec<u64> = Vec::new();
        let mut buffer = [0u32; 1024];

        for (&key, bitmap) in &self.map {
            let mut iter = bitmap.iter();
            loop {
                let n = iter.next_many(&mut buffer);
                if n == 0 {
                    break;
                }
                result.extend(buffer[..n].iter().map(|&low| util::unite(key, low)));
            }
        }

        result
    }

    /// Returns true if every value fits in 32 bits, which allows the compact
    /// `BITMAP32` encoding. An empty map qualifies.
    pub fn is_32_bits_enough(&self) -> bool {
        self.maximum() <= u64::from(u32::MAX)
    }

    /// Number of buckets (distinct high 32 bit words) in use.
    pub fn bucket_count(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn buckets(&self) -> impl Iterator<Item = (u32, &Bitmap)> + '_ {
        self.map
            .iter()
            .filter(|(_, bitmap)| !bitmap.is_empty())
            .map(|(&key, bitmap)| (key, bitmap))
    }

    pub(crate) fn bucket(&self, key: u32) -> Option<&Bitmap> {
        self.map.get(&key)
    }

    /// Merges `bitmap` into bucket `key`.
    pub(crate) fn merge_bucket(&mut self, key: u32, bitmap: Bitmap) {
        if bitmap.is_empty() {
            return;
        }
        match self.map.entry(key) {
            Entry::Vacant(e) => {
                e.insert(bitmap);
            }
            Entry::Occupied(mut e) => e.get_mut().or_inplace(&bitmap),
        }
    }

    fn bucket_mut(&mut self, key: u32) -> &mut Bitmap {
        self.map.entry(key).or_default()
    }
}

impl PartialEq for RoaringMap64 {
    fn eq(&self, other: &Self) -> bool {
        self.buckets().eq(other.buckets())
    }
}

impl Eq for RoaringMap64 {}

/// Converts `range` to inclusive bounds, `None` if it is empty.
fn range_to_inclusive<R: RangeBounds<u64>>(range: R) -> Option<(u64, u64)> {
    let start = match range.start_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.checked_sub(1)?,
        Bound::Unbounded => u64::MAX,
    };
    if start > end {
        return None;
    }
    Some((start, end))
}
