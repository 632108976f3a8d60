use log::trace;
use rustc_hash::FxHashSet;
use std::sync::Arc;

use super::{BitmapValue, Mode, Repr};
use crate::error::FullUniverseOverflow;
use crate::options::{BitmapOptions, SMALL_SET_MAX};
use crate::roaring64::RoaringMap64;

impl Repr {
    pub(super) fn mode(&self) -> Mode {
        match self {
            Repr::Empty => Mode::Empty,
            Repr::Single(_) => Mode::Single,
            Repr::Set(_) => Mode::SmallSet,
            Repr::Bitmap(_) => Mode::Large,
        }
    }

    /// Smallest representation of `set` allowed by `options`.
    pub(super) fn from_set(set: FxHashSet<u64>, options: BitmapOptions) -> Repr {
        match set.len() {
            0 => Repr::Empty,
            1 => set.into_iter().next().map_or(Repr::Empty, Repr::Single),
            n if n <= SMALL_SET_MAX && options.small_set_enabled => Repr::Set(set),
            _ => Repr::Bitmap(Arc::new(set.into_iter().collect())),
        }
    }

    /// Keeps `map` unless it holds fewer than two elements.
    pub(super) fn from_map(map: RoaringMap64) -> Repr {
        small_map_repr(&map).unwrap_or_else(|| Repr::Bitmap(Arc::new(map)))
    }

    pub(super) fn from_shared_map(map: Arc<RoaringMap64>) -> Repr {
        small_map_repr(&map).unwrap_or(Repr::Bitmap(map))
    }
}

fn small_map_repr(map: &RoaringMap64) -> Option<Repr> {
    if map.is_empty() {
        return Some(Repr::Empty);
    }
    let minimum = map.minimum();
    if minimum == map.maximum() {
        Some(Repr::Single(minimum))
    } else {
        None
    }
}

impl BitmapValue {
    /// Creates an empty value with the default options.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, Mode};
    ///
    /// let bitmap = BitmapValue::new();
    /// assert!(bitmap.is_empty());
    /// assert_eq!(bitmap.mode(), Mode::Empty);
    /// ```
    pub fn new() -> Self {
        Self::with_options(BitmapOptions::default())
    }

    pub fn with_options(options: BitmapOptions) -> Self {
        BitmapValue {
            repr: Repr::Empty,
            options,
        }
    }

    /// Creates a value holding only `value`.
    pub fn from_u64(value: u64) -> Self {
        BitmapValue {
            repr: Repr::Single(value),
            options: BitmapOptions::default(),
        }
    }

    /// Creates a value from a slice, in the smallest mode that fits the
    /// distinct elements. Duplicates are ignored.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, Mode};
    ///
    /// assert_eq!(BitmapValue::from_slice(&[]).mode(), Mode::Empty);
    /// assert_eq!(BitmapValue::from_slice(&[7, 7, 7]).mode(), Mode::Single);
    /// assert_eq!(BitmapValue::from_slice(&[1, 2]).mode(), Mode::Large);
    /// ```
    pub fn from_slice(values: &[u64]) -> Self {
        Self::from_slice_with_options(values, BitmapOptions::default())
    }

    /// Same as `from_slice`, with the given options.
    pub fn from_slice_with_options(values: &[u64], options: BitmapOptions) -> Self {
        let repr = match values {
            [] => Repr::Empty,
            [value] => Repr::Single(*value),
            _ if options.small_set_enabled => {
                let set: FxHashSet<u64> = values.iter().copied().collect();
                if set.len() <= SMALL_SET_MAX {
                    Repr::from_set(set, options)
                } else {
                    Repr::from_map(RoaringMap64::of(values))
                }
            }
            _ => Repr::from_map(RoaringMap64::of(values)),
        };
        BitmapValue { repr, options }
    }

    /// Wraps `map`, in the smallest mode that fits it.
    pub fn from_map_with_options(map: RoaringMap64, options: BitmapOptions) -> Self {
        BitmapValue {
            repr: Repr::from_map(map),
            options,
        }
    }

    /// Adds `value`, promoting the value to a larger mode when needed.
    ///
    /// ```
    /// use bitmap_value::{BitmapOptions, BitmapValue, Mode, SMALL_SET_MAX};
    ///
    /// let mut bitmap = BitmapValue::with_options(BitmapOptions::new().small_set_enabled(true));
    /// for i in 0..SMALL_SET_MAX as u64 {
    ///     bitmap.add(i);
    /// }
    /// assert_eq!(bitmap.mode(), Mode::SmallSet);
    ///
    /// bitmap.add(0);
    /// assert_eq!(bitmap.mode(), Mode::SmallSet);
    ///
    /// bitmap.add(1000);
    /// assert_eq!(bitmap.mode(), Mode::Large);
    /// assert_eq!(bitmap.cardinality(), Ok(SMALL_SET_MAX as u64 + 1));
    /// ```
    pub fn add(&mut self, value: u64) {
        match &mut self.repr {
            Repr::Empty => self.repr = Repr::Single(value),
            Repr::Single(current) => {
                let current = *current;
                if current == value {
                    return;
                }
                let repr = if self.options.small_set_enabled {
                    let mut set = FxHashSet::default();
                    set.insert(current);
                    set.insert(value);
                    Repr::Set(set)
                } else {
                    Repr::Bitmap(Arc::new(RoaringMap64::of(&[current, value])))
                };
                self.set_repr(repr);
            }
            Repr::Set(set) => {
                if set.len() < SMALL_SET_MAX || set.contains(&value) {
                    set.insert(value);
                    return;
                }
                let mut map: RoaringMap64 = set.iter().copied().collect();
                map.add(value);
                self.set_repr(Repr::Bitmap(Arc::new(map)));
            }
            Repr::Bitmap(map) => Arc::make_mut(map).add(value),
        }
    }

    /// Removes `value` if present.
    ///
    /// A small set left with one element becomes `Single`. A `Large` value
    /// stays `Large` whatever it is left with.
    pub fn remove(&mut self, value: u64) {
        match &mut self.repr {
            Repr::Empty => {}
            Repr::Single(current) => {
                if *current == value {
                    self.set_repr(Repr::Empty);
                }
            }
            Repr::Set(set) => {
                if set.remove(&value) && set.len() == 1 {
                    let repr = set.iter().next().map_or(Repr::Empty, |&last| Repr::Single(last));
                    self.set_repr(repr);
                }
            }
            Repr::Bitmap(map) => {
                if map.contains(value) {
                    Arc::make_mut(map).remove(value);
                }
            }
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        match &self.repr {
            Repr::Empty => false,
            Repr::Single(current) => *current == value,
            Repr::Set(set) => set.contains(&value),
            Repr::Bitmap(map) => map.contains(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Empty => true,
            Repr::Single(_) | Repr::Set(_) => false,
            Repr::Bitmap(map) => map.is_empty(),
        }
    }

    /// Number of elements. Fails only when the value holds every `u64`.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// let bitmap = BitmapValue::from_slice(&[1, 2, 3, u64::MAX]);
    /// assert_eq!(bitmap.cardinality(), Ok(4));
    /// ```
    pub fn cardinality(&self) -> Result<u64, FullUniverseOverflow> {
        match &self.repr {
            Repr::Empty => Ok(0),
            Repr::Single(_) => Ok(1),
            Repr::Set(set) => Ok(set.len() as u64),
            Repr::Bitmap(map) => map.cardinality(),
        }
    }

    pub fn minimum(&self) -> Option<u64> {
        match &self.repr {
            Repr::Empty => None,
            Repr::Single(value) => Some(*value),
            Repr::Set(set) => set.iter().copied().min(),
            Repr::Bitmap(map) if map.is_empty() => None,
            Repr::Bitmap(map) => Some(map.minimum()),
        }
    }

    pub fn maximum(&self) -> Option<u64> {
        match &self.repr {
            Repr::Empty => None,
            Repr::Single(value) => Some(*value),
            Repr::Set(set) => set.iter().copied().max(),
            Repr::Bitmap(map) if map.is_empty() => None,
            Repr::Bitmap(map) => Some(map.maximum()),
        }
    }

    /// Returns true if every element fits in 32 bits. An empty value
    /// qualifies.
    pub fn is_32_bits_enough(&self) -> bool {
        self.maximum()
            .map_or(true, |maximum| maximum <= u64::from(u32::MAX))
    }

    /// Removes every element. The options are kept.
    pub fn clear(&mut self) {
        self.set_repr(Repr::Empty);
    }

    pub fn mode(&self) -> Mode {
        self.repr.mode()
    }

    pub fn options(&self) -> BitmapOptions {
        self.options
    }

    /// Optimizes the roaring containers of a `Large` value and releases
    /// unused memory. Other modes are left untouched.
    ///
    /// ```
    /// use bitmap_value::BitmapValue;
    ///
    /// let mut bitmap: BitmapValue = (0..100_000).collect();
    /// let before = bitmap.serialized_size();
    /// bitmap.compress();
    /// assert!(bitmap.serialized_size() < before);
    /// assert_eq!(bitmap.cardinality(), Ok(100_000));
    /// ```
    pub fn compress(&mut self) {
        if let Repr::Bitmap(map) = &mut self.repr {
            let map = Arc::make_mut(map);
            map.run_optimize();
            map.shrink_to_fit();
        }
    }

    /// Borrows the roaring map of a `Large` value.
    pub fn as_map(&self) -> Option<&RoaringMap64> {
        match &self.repr {
            Repr::Bitmap(map) => Some(&**map),
            _ => None,
        }
    }

    pub(super) fn set_repr(&mut self, repr: Repr) {
        let from = self.repr.mode();
        let to = repr.mode();
        if from != to {
            trace!("bitmap value mode {:?} -> {:?}", from, to);
        }
        self.repr = repr;
    }

    /// Replaces the representation with `f(current, options)`.
    pub(super) fn update<F>(&mut self, f: F)
    where
        F: FnOnce(Repr, BitmapOptions) -> Repr,
    {
        let current = std::mem::replace(&mut self.repr, Repr::Empty);
        let from = current.mode();
        self.repr = f(current, self.options);
        let to = self.repr.mode();
        if from != to {
            trace!("bitmap value mode {:?} -> {:?}", from, to);
        }
    }
}

impl Default for BitmapValue {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for BitmapValue {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<RoaringMap64> for BitmapValue {
    /// Wraps `map` in the smallest mode that fits it.
    fn from(map: RoaringMap64) -> Self {
        Self::from_map_with_options(map, BitmapOptions::default())
    }
}
