use rustc_hash::FxHashSet;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};
use std::sync::Arc;

use super::{BitmapValue, Repr};
use crate::roaring64::RoaringMap64;

/// Set algebra. Every operation keeps the options of `self`.
impl BitmapValue {
    /// Adds every element of `rhs` to `self`.
    ///
    /// A `Large` operand makes the result `Large`; when `self` holds at most
    /// one element the result shares `rhs`'s map until either side writes.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, Mode};
    ///
    /// let mut a = BitmapValue::from_u64(1);
    /// a.union_with(&BitmapValue::from_slice(&[2, 3]));
    /// assert_eq!(a.to_string(), "1,2,3");
    /// assert_eq!(a.mode(), Mode::Large);
    /// ```
    pub fn union_with(&mut self, rhs: &BitmapValue) {
        match &rhs.repr {
            Repr::Empty => {}
            Repr::Single(value) => self.add(*value),
            Repr::Set(set) => {
                if let Repr::Bitmap(map) = &mut self.repr {
                    let map = Arc::make_mut(map);
                    for &value in set {
                        map.add(value);
                    }
                } else {
                    for &value in set {
                        self.add(value);
                    }
                }
            }
            Repr::Bitmap(other) => self.update(|lhs, _| match lhs {
                Repr::Empty => Repr::Bitmap(Arc::clone(other)),
                Repr::Single(value) => {
                    let mut map = Arc::clone(other);
                    Arc::make_mut(&mut map).add(value);
                    Repr::Bitmap(map)
                }
                Repr::Set(set) => {
                    let mut map = RoaringMap64::clone(other);
                    map.extend(set);
                    Repr::Bitmap(Arc::new(map))
                }
                Repr::Bitmap(mut map) => {
                    Arc::make_mut(&mut map).or_inplace(other);
                    Repr::Bitmap(map)
                }
            }),
        }
    }

    /// Keeps only the elements also in `rhs`.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, Mode};
    ///
    /// let mut a = BitmapValue::from_slice(&[1, 2, 3]);
    /// a.intersect_with(&BitmapValue::from_slice(&[3, 4]));
    /// assert_eq!(a.mode(), Mode::Single);
    /// assert!(a.contains(3));
    /// ```
    pub fn intersect_with(&mut self, rhs: &BitmapValue) {
        self.update(|lhs, options| match (lhs, &rhs.repr) {
            (Repr::Empty, _) | (_, Repr::Empty) => Repr::Empty,
            (Repr::Single(value), _) => {
                if rhs.contains(value) {
                    Repr::Single(value)
                } else {
                    Repr::Empty
                }
            }
            (Repr::Set(mut set), _) => {
                set.retain(|&value| rhs.contains(value));
                Repr::from_set(set, options)
            }
            (Repr::Bitmap(map), Repr::Single(value)) => {
                if map.contains(*value) {
                    Repr::Single(*value)
                } else {
                    Repr::Empty
                }
            }
            (Repr::Bitmap(map), Repr::Set(set)) => {
                let set = set.iter().copied().filter(|&value| map.contains(value)).collect();
                Repr::from_set(set, options)
            }
            (Repr::Bitmap(mut map), Repr::Bitmap(other)) => {
                Arc::make_mut(&mut map).and_inplace(other);
                Repr::from_shared_map(map)
            }
        });
    }

    /// Removes every element of `rhs` from `self`.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, Mode};
    ///
    /// let mut a = BitmapValue::from_slice(&[1, 2, 3]);
    /// a.difference_with(&BitmapValue::from_slice(&[1, 2]));
    /// assert_eq!(a.mode(), Mode::Single);
    /// assert!(a.contains(3));
    /// ```
    pub fn difference_with(&mut self, rhs: &BitmapValue) {
        self.update(|lhs, options| match (lhs, &rhs.repr) {
            (Repr::Empty, _) => Repr::Empty,
            (Repr::Single(value), _) => {
                if rhs.contains(value) {
                    Repr::Empty
                } else {
                    Repr::Single(value)
                }
            }
            (Repr::Set(mut set), _) => {
                set.retain(|&value| !rhs.contains(value));
                Repr::from_set(set, options)
            }
            (Repr::Bitmap(mut map), other) => {
                match other {
                    Repr::Empty => {}
                    Repr::Single(value) => {
                        if map.contains(*value) {
                            Arc::make_mut(&mut map).remove(*value);
                        }
                    }
                    Repr::Set(set) => {
                        for &value in set {
                            if map.contains(value) {
                                Arc::make_mut(&mut map).remove(value);
                            }
                        }
                    }
                    Repr::Bitmap(other) => Arc::make_mut(&mut map).andnot_inplace(other),
                }
                Repr::from_shared_map(map)
            }
        });
    }

    /// Keeps the elements in exactly one of `self` and `rhs`.
    ///
    /// When `rhs` is `Large` and `self` is not, the roaring map of `rhs` is
    /// moved into `self` and `rhs` is left empty.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// let mut a = BitmapValue::from_slice(&[1, 2, 3]);
    /// let mut b = BitmapValue::from_slice(&[3, 4]);
    /// a.symmetric_difference_with(&mut b);
    /// assert_eq!(a.to_string(), "1,2,4");
    /// ```
    pub fn symmetric_difference_with(&mut self, rhs: &mut BitmapValue) {
        self.update(|lhs, options| match lhs {
            Repr::Bitmap(mut map) => {
                match &rhs.repr {
                    Repr::Empty => {}
                    Repr::Single(value) => toggle_map(&mut map, *value),
                    Repr::Set(set) => {
                        for &value in set {
                            toggle_map(&mut map, value);
                        }
                    }
                    Repr::Bitmap(other) => Arc::make_mut(&mut map).xor_inplace(other),
                }
                Repr::from_shared_map(map)
            }
            lhs => {
                let mut set: FxHashSet<u64> = match &mut rhs.repr {
                    Repr::Empty => FxHashSet::default(),
                    Repr::Single(value) => std::iter::once(*value).collect(),
                    Repr::Set(set) => set.clone(),
                    Repr::Bitmap(map) => {
                        let mut map = std::mem::take(map);
                        rhs.repr = Repr::Empty;
                        for value in small_values(lhs) {
                            toggle_map(&mut map, value);
                        }
                        return Repr::from_shared_map(map);
                    }
                };
                for value in small_values(lhs) {
                    if !set.remove(&value) {
                        set.insert(value);
                    }
                }
                Repr::from_set(set, options)
            }
        });
    }

    /// Returns the union of `self` and `rhs`.
    pub fn union(&self, rhs: &BitmapValue) -> BitmapValue {
        let mut result = self.clone();
        result.union_with(rhs);
        result
    }

    /// Returns the intersection of `self` and `rhs`.
    pub fn intersection(&self, rhs: &BitmapValue) -> BitmapValue {
        let mut result = self.clone();
        result.intersect_with(rhs);
        result
    }

    /// Returns the elements of `self` not in `rhs`.
    pub fn difference(&self, rhs: &BitmapValue) -> BitmapValue {
        let mut result = self.clone();
        result.difference_with(rhs);
        result
    }

    /// Returns the elements in exactly one of `self` and `rhs`. Neither
    /// operand is modified.
    pub fn symmetric_difference(&self, rhs: &BitmapValue) -> BitmapValue {
        let mut result = self.clone();
        let mut rhs = rhs.clone();
        result.symmetric_difference_with(&mut rhs);
        result
    }

    /// Unions every value of `values` into `self`.
    ///
    /// The roaring maps of `Large` inputs are merged in a single pass, which
    /// is faster than a chain of `union_with` when many inputs are large.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// let a = BitmapValue::from_slice(&[1, 2]);
    /// let b = BitmapValue::from_u64(3);
    /// let c = BitmapValue::from_slice(&[2, 1 << 40]);
    ///
    /// let mut all = BitmapValue::new();
    /// all.union_many(&[&a, &b, &c]);
    /// assert_eq!(all.to_string(), "1,2,3,1099511627776");
    /// ```
    pub fn union_many(&mut self, values: &[&BitmapValue]) {
        let maps: Vec<&RoaringMap64> = values.iter().filter_map(|value| value.as_map()).collect();
        if maps.len() < 2 {
            for value in values {
                self.union_with(value);
            }
            return;
        }

        let mut merged = RoaringMap64::fast_union(&maps);
        for value in values {
            match &value.repr {
                Repr::Single(single) => merged.add(*single),
                Repr::Set(set) => merged.extend(set.iter().copied()),
                Repr::Empty | Repr::Bitmap(_) => {}
            }
        }
        let merged = BitmapValue {
            repr: Repr::Bitmap(Arc::new(merged)),
            options: self.options,
        };
        self.union_with(&merged);
    }
}

/// Elements of a value that is not `Large`.
fn small_values(repr: Repr) -> Vec<u64> {
    match repr {
        Repr::Empty | Repr::Bitmap(_) => Vec::new(),
        Repr::Single(value) => vec![value],
        Repr::Set(set) => set.into_iter().collect(),
    }
}

fn toggle_map(map: &mut Arc<RoaringMap64>, value: u64) {
    let map = Arc::make_mut(map);
    if !map.remove_checked(value) {
        map.add(value);
    }
}

impl PartialEq for BitmapValue {
    /// Two values are equal when they hold the same elements, whatever their
    /// mode or options.
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Bitmap(a), Repr::Bitmap(b)) => a == b,
            _ => self.cardinality() == other.cardinality() && self.iter().all(|v| other.contains(v)),
        }
    }
}

impl Eq for BitmapValue {}

macro_rules! impl_binop {
    ($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:ident, $op_inplace:ident) => {
        impl<'a, 'b> $trait<&'a BitmapValue> for &'b BitmapValue {
            type Output = BitmapValue;

            #[inline]
            fn $fn(self, other: &'a BitmapValue) -> BitmapValue {
                self.$op(other)
            }
        }

        impl<'a> $trait<&'a BitmapValue> for BitmapValue {
            type Output = BitmapValue;

            #[inline]
            fn $fn(mut self, other: &'a BitmapValue) -> BitmapValue {
                self.$op_inplace(other);
                self
            }
        }

        impl<'a> $assign_trait<&'a BitmapValue> for BitmapValue {
            #[inline]
            fn $assign_fn(&mut self, other: &'a BitmapValue) {
                self.$op_inplace(other);
            }
        }
    };
}

impl_binop!(BitOr, bitor, BitOrAssign, bitor_assign, union, union_with);
impl_binop!(BitAnd, bitand, BitAndAssign, bitand_assign, intersection, intersect_with);
impl_binop!(Sub, sub, SubAssign, sub_assign, difference, difference_with);

impl<'a, 'b> BitXor<&'a BitmapValue> for &'b BitmapValue {
    type Output = BitmapValue;

    #[inline]
    fn bitxor(self, other: &'a BitmapValue) -> BitmapValue {
        self.symmetric_difference(other)
    }
}

impl BitXor for BitmapValue {
    type Output = BitmapValue;

    #[inline]
    fn bitxor(mut self, mut other: BitmapValue) -> BitmapValue {
        self.symmetric_difference_with(&mut other);
        self
    }
}

impl<'a> BitXorAssign<&'a mut BitmapValue> for BitmapValue {
    /// Same as `symmetric_difference_with`: a `Large` right hand side may be
    /// left empty.
    #[inline]
    fn bitxor_assign(&mut self, other: &'a mut BitmapValue) {
        self.symmetric_difference_with(other);
    }
}

impl BitXorAssign for BitmapValue {
    #[inline]
    fn bitxor_assign(&mut self, mut other: BitmapValue) {
        self.symmetric_difference_with(&mut other);
    }
}
