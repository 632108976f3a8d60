use std::fmt;
use std::str::FromStr;

use super::{BitmapValue, Repr};
use crate::error::ParseBitmapError;

/// Comma separated decimal elements without braces, ascending.
///
/// ```
/// use bitmap_value::BitmapValue;
///
/// assert_eq!(BitmapValue::new().to_string(), "");
/// assert_eq!(BitmapValue::from_u64(7).to_string(), "7");
/// assert_eq!(BitmapValue::from_slice(&[30, 10, 20]).to_string(), "10,20,30");
/// ```
impl fmt::Display for BitmapValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.repr {
            Repr::Set(set) => {
                let mut values: Vec<u64> = set.iter().copied().collect();
                values.sort_unstable();
                write_joined(f, values)
            }
            _ => write_joined(f, self.iter()),
        }
    }
}

fn write_joined<I: IntoIterator<Item = u64>>(f: &mut fmt::Formatter, values: I) -> fmt::Result {
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", value)?;
    }
    Ok(())
}

impl fmt::Debug for BitmapValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.repr {
            Repr::Empty => write!(f, "BitmapValue<empty>"),
            Repr::Single(value) => write!(f, "BitmapValue<single {}>", value),
            Repr::Set(_) => write!(f, "BitmapValue<set [{}]>", self),
            Repr::Bitmap(map) => write!(f, "BitmapValue<{:?}>", map),
        }
    }
}

impl FromStr for BitmapValue {
    type Err = ParseBitmapError;

    /// Parses the `Display` form. Whitespace around elements is ignored and
    /// an empty string gives an empty value.
    ///
    /// ```
    /// use bitmap_value::{BitmapValue, Mode};
    ///
    /// let bitmap: BitmapValue = " 3, 1 ,2".parse().unwrap();
    /// assert_eq!(bitmap.to_string(), "1,2,3");
    /// assert_eq!("".parse::<BitmapValue>().unwrap().mode(), Mode::Empty);
    /// assert!("1,x".parse::<BitmapValue>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, ParseBitmapError> {
        if s.trim().is_empty() {
            return Ok(BitmapValue::new());
        }
        let values = s
            .split(',')
            .map(|token| {
                let token = token.trim();
                token.parse::<u64>().map_err(|_| ParseBitmapError::InvalidElement {
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;
        Ok(BitmapValue::from_slice(&values))
    }
}

#[cfg(test)]
mod test {
    use crate::{BitmapOptions, BitmapValue, Mode, ParseBitmapError};

    #[test]
    fn small_set_prints_sorted() {
        let opts = BitmapOptions::new().small_set_enabled(true);
        let set = BitmapValue::from_slice_with_options(&[9, 1, 5, 3], opts);
        assert_eq!(set.mode(), Mode::SmallSet);
        assert_eq!(set.to_string(), "1,3,5,9");
        assert_eq!(format!("{:?}", set), "BitmapValue<set [1,3,5,9]>");
    }

    #[test]
    fn debug_per_mode() {
        assert_eq!(format!("{:?}", BitmapValue::new()), "BitmapValue<empty>");
        assert_eq!(format!("{:?}", BitmapValue::from_u64(3)), "BitmapValue<single 3>");
        assert_eq!(
            format!("{:?}", BitmapValue::from_slice(&[1, 2])),
            "BitmapValue<RoaringMap64<[1, 2]>>"
        );
    }

    #[test]
    fn parse_round_trips_display() {
        for text in ["", "0", "18446744073709551615", "1,2,3", "4294967295,4294967296"] {
            let bitmap: BitmapValue = text.parse().unwrap();
            assert_eq!(bitmap.to_string(), text);
        }
    }

    #[test]
    fn parse_picks_smallest_mode() {
        assert_eq!("5".parse::<BitmapValue>().unwrap().mode(), Mode::Single);
        assert_eq!("5, 5".parse::<BitmapValue>().unwrap().mode(), Mode::Single);
        assert_eq!("5,6".parse::<BitmapValue>().unwrap().mode(), Mode::Large);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "1,,2".parse::<BitmapValue>(),
            Err(ParseBitmapError::InvalidElement {
                token: String::new()
            })
        );
        assert_eq!(
            "1, -2".parse::<BitmapValue>(),
            Err(ParseBitmapError::InvalidElement {
                token: "-2".to_string()
            })
        );
        assert!("18446744073709551616".parse::<BitmapValue>().is_err());
    }
}
