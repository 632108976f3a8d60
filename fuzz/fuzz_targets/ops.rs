#![no_main]

use bitmap_value::{BitmapOptions, BitmapValue, Mode, SMALL_SET_MAX};
use libfuzzer_sys::arbitrary::{self, Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Num(u64);

impl<'a> Arbitrary<'a> for Num {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        // Cluster around the bucket boundaries so ops hit several buckets.
        let base = match u.int_in_range(0..=3)? {
            0 => 0,
            1 => u64::from(u32::MAX) - 0x100,
            2 => 5 << 32,
            _ => u64::MAX - 0x200,
        };
        Ok(Num(base + u64::from(u.int_in_range(0..=0x1ffu16)?)))
    }
}

#[derive(Arbitrary, Debug)]
enum Operation {
    Add(Num),
    Remove(Num),
    Clear,
    Compress,
    Or(Vec<Num>),
    And(Vec<Num>),
    AndNot(Vec<Num>),
    Xor(Vec<Num>),
    Roundtrip,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    small_set: bool,
    ops: Vec<Operation>,
}

fn rhs_value(nums: &[Num], options: BitmapOptions) -> (BitmapValue, BTreeSet<u64>) {
    let values: Vec<u64> = nums.iter().map(|n| n.0).collect();
    let model = values.iter().copied().collect();
    (BitmapValue::from_slice_with_options(&values, options), model)
}

fn check(bitmap: &BitmapValue, model: &BTreeSet<u64>) {
    assert_eq!(bitmap.cardinality(), Ok(model.len() as u64));
    let mut values: Vec<u64> = bitmap.iter().collect();
    values.sort_unstable();
    assert!(values.iter().eq(model.iter()));
    if bitmap.mode() == Mode::SmallSet {
        assert!(bitmap.options().small_set_enabled);
        assert!(model.len() >= 2 && model.len() <= SMALL_SET_MAX);
    }
}

fuzz_target!(|input: FuzzInput| {
    let options = BitmapOptions::new().small_set_enabled(input.small_set);
    let mut bitmap = BitmapValue::with_options(options);
    let mut model = BTreeSet::new();

    for op in input.ops.iter().take(64) {
        match op {
            Operation::Add(n) => {
                bitmap.add(n.0);
                model.insert(n.0);
            }
            Operation::Remove(n) => {
                bitmap.remove(n.0);
                model.remove(&n.0);
            }
            Operation::Clear => {
                bitmap.clear();
                model.clear();
            }
            Operation::Compress => bitmap.compress(),
            Operation::Or(nums) => {
                let (rhs, rhs_model) = rhs_value(nums, options);
                bitmap |= &rhs;
                model.extend(rhs_model);
            }
            Operation::And(nums) => {
                let (rhs, rhs_model) = rhs_value(nums, options);
                bitmap &= &rhs;
                model = model.intersection(&rhs_model).copied().collect();
            }
            Operation::AndNot(nums) => {
                let (rhs, rhs_model) = rhs_value(nums, options);
                bitmap -= &rhs;
                model = model.difference(&rhs_model).copied().collect();
            }
            Operation::Xor(nums) => {
                let (mut rhs, rhs_model) = rhs_value(nums, options);
                bitmap ^= &mut rhs;
                model = model.symmetric_difference(&rhs_model).copied().collect();
            }
            Operation::Roundtrip => {
                let bytes = bitmap.to_bytes();
                bitmap = BitmapValue::from_bytes_with_options(&bytes, options).unwrap();
            }
        }
        check(&bitmap, &model);
    }
});
