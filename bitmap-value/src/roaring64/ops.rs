use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::RoaringMap64;

impl fmt::Debug for RoaringMap64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.cardinality() {
            Ok(cardinality) if cardinality < 32 => {
                write!(f, "RoaringMap64<{:?}>", self.to_vec())
            }
            Ok(cardinality) => write!(
                f,
                "RoaringMap64<{}, [{:?}..{:?}]>",
                cardinality,
                self.minimum(),
                self.maximum()
            ),
            Err(_) => write!(f, "RoaringMap64<full>"),
        }
    }
}

impl Default for RoaringMap64 {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_binop {
    ($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:ident, $op_inplace:ident) => {
        impl<'a, 'b> $trait<&'a RoaringMap64> for &'b RoaringMap64 {
            type Output = RoaringMap64;

            #[inline]
            fn $fn(self, other: &'a RoaringMap64) -> RoaringMap64 {
                self.$op(other)
            }
        }

        impl<'a> $trait<&'a RoaringMap64> for RoaringMap64 {
            type Output = RoaringMap64;

            #[inline]
            fn $fn(mut self, other: &'a RoaringMap64) -> RoaringMap64 {
                self.$op_inplace(other);
                self
            }
        }

        impl $trait for RoaringMap64 {
            type Output = RoaringMap64;

            #[inline]
            fn $fn(mut self, other: RoaringMap64) -> RoaringMap64 {
                self.$op_inplace(&other);
                self
            }
        }

        impl<'a> $assign_trait<&'a RoaringMap64> for RoaringMap64 {
            #[inline]
            fn $assign_fn(&mut self, other: &'a RoaringMap64) {
                self.$op_inplace(other);
            }
        }

        impl $assign_trait for RoaringMap64 {
            #[inline]
            fn $assign_fn(&mut self, other: RoaringMap64) {
                self.$op_inplace(&other);
            }
        }
    };
}

impl_binop!(BitOr, bitor, BitOrAssign, bitor_assign, or, or_inplace);
impl_binop!(BitAnd, bitand, BitAndAssign, bitand_assign, and, and_inplace);
impl_binop!(BitXor, bitxor, BitXorAssign, bitxor_assign, xor, xor_inplace);
impl_binop!(Sub, sub, SubAssign, sub_assign, andnot, andnot_inplace);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn operators_match_methods() {
        let a = RoaringMap64::of(&[1, 2, 3, 1 << 40]);
        let b = RoaringMap64::of(&[3, 4, 1 << 40, u64::MAX]);

        assert_eq!((&a | &b).to_vec(), [1, 2, 3, 4, 1 << 40, u64::MAX]);
        assert_eq!((&a & &b).to_vec(), [3, 1 << 40]);
        assert_eq!((&a - &b).to_vec(), [1, 2]);
        assert_eq!((&a ^ &b).to_vec(), [1, 2, 4, u64::MAX]);

        let mut c = a.clone();
        c |= &b;
        c -= b.clone();
        assert_eq!(c.to_vec(), [1, 2]);
        c ^= &a;
        assert_eq!(c.to_vec(), [3, 1 << 40]);
        c &= RoaringMap64::of(&[3]);
        assert_eq!(c.to_vec(), [3]);
    }

    #[test]
    fn debug_output() {
        let small = RoaringMap64::of(&[1, 2]);
        assert_eq!(format!("{:?}", small), "RoaringMap64<[1, 2]>");

        let large: RoaringMap64 = (10..110).collect();
        assert_eq!(format!("{:?}", large), "RoaringMap64<100, [10..109]>");
    }
}
