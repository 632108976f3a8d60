use serde::{Deserialize, Serialize};

/// Largest number of elements a bitmap keeps in its hash set representation
/// before it is promoted to a roaring map.
pub const SMALL_SET_MAX: usize = 32;

/// Per-value behaviour switches.
///
/// The options travel with each [`BitmapValue`](crate::BitmapValue); results of
/// binary operations keep the options of the left hand side.
///
/// ```
/// use bitmap_value::{BitmapOptions, BitmapValue, Mode};
///
/// let opts = BitmapOptions::default().small_set_enabled(true);
/// let mut bitmap = BitmapValue::with_options(opts);
/// bitmap.add(1);
/// bitmap.add(2);
/// assert_eq!(bitmap.mode(), Mode::SmallSet);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BitmapOptions {
    /// Allows the hash set mode and the `SET` type code.
    ///
    /// Keep this off while any reader of the serialized form predates the
    /// `SET` type code; values then go straight from a single element to a
    /// roaring map.
    pub small_set_enabled: bool,
}

impl BitmapOptions {
    pub const fn new() -> Self {
        BitmapOptions {
            small_set_enabled: false,
        }
    }

    #[must_use]
    pub const fn small_set_enabled(mut self, enabled: bool) -> Self {
        self.small_set_enabled = enabled;
        self
    }
}
