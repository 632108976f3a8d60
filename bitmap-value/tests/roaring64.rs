use std::collections::BTreeSet;
use std::ops::Range;

use bitmap_value::{DecodeError, RoaringMap64, TypeCode};
use croaring::{Bitmap, Portable};
use proptest::prelude::*;

fn element() -> impl Strategy<Value = u64> {
    prop_oneof![
        0u64..1024,
        (u32::MAX as u64 - 512)..(u32::MAX as u64 + 512),
        (7u64 << 32)..((7u64 << 32) + 1024),
        (u64::MAX - 1024)..=u64::MAX,
    ]
}

fn small_range() -> impl Strategy<Value = Range<u64>> {
    (element(), 0u64..2048).prop_map(|(start, len)| start..start.saturating_add(len))
}

fn map_and_model() -> impl Strategy<Value = (RoaringMap64, BTreeSet<u64>)> {
    prop::collection::vec(element(), 0..300).prop_map(|values| {
        (RoaringMap64::of(&values), values.into_iter().collect())
    })
}

proptest! {
    #[test]
    fn add_many_and_iter_match_model((map, model) in map_and_model()) {
        prop_assert_eq!(map.cardinality(), Ok(model.len() as u64));
        prop_assert!(map.iter().eq(model.iter().copied()));
        prop_assert_eq!(map.to_vec(), model.iter().copied().collect::<Vec<_>>());
        if let (Some(&min), Some(&max)) = (model.iter().next(), model.iter().next_back()) {
            prop_assert_eq!(map.minimum(), min);
            prop_assert_eq!(map.maximum(), max);
        }
    }

    #[test]
    fn bucketwise_ops_match_model((a, a_model) in map_and_model(), (b, b_model) in map_and_model()) {
        let collect = |set: BTreeSet<u64>| set.into_iter().collect::<Vec<_>>();
        prop_assert_eq!((&a | &b).to_vec(), collect(a_model.union(&b_model).copied().collect()));
        prop_assert_eq!((&a & &b).to_vec(), collect(a_model.intersection(&b_model).copied().collect()));
        prop_assert_eq!((&a - &b).to_vec(), collect(a_model.difference(&b_model).copied().collect()));
        prop_assert_eq!(
            (&a ^ &b).to_vec(),
            collect(a_model.symmetric_difference(&b_model).copied().collect())
        );
        prop_assert_eq!(RoaringMap64::fast_union(&[&a, &b]), &a | &b);
        prop_assert_eq!(a.is_subset(&b), a_model.is_subset(&b_model));
    }

    #[test]
    fn rank_and_select((map, model) in map_and_model(), probe in element()) {
        let expected = model.range(..=probe).count() as u64;
        prop_assert_eq!(map.rank(probe), expected);
        for (rank, value) in model.iter().enumerate() {
            prop_assert_eq!(map.select(rank as u64), Some(*value));
        }
        prop_assert_eq!(map.select(model.len() as u64), None);
    }

    #[test]
    fn ranges_match_model((map, model) in map_and_model(), range in small_range(), op in 0u8..3) {
        let mut map = map;
        let mut model = model;
        match op {
            0 => {
                map.add_range(range.clone());
                model.extend(range);
            }
            1 => {
                map.remove_range(range.clone());
                for value in range {
                    model.remove(&value);
                }
            }
            _ => {
                map.flip(range.clone());
                for value in range {
                    if !model.remove(&value) {
                        model.insert(value);
                    }
                }
            }
        }
        prop_assert!(map.iter().eq(model.iter().copied()));
        prop_assert_eq!(map.bucket_count(), model.iter().map(|v| v >> 32).collect::<BTreeSet<_>>().len());
    }

    #[test]
    fn serialization_roundtrip((map, _model) in map_and_model()) {
        let bytes = map.serialize();
        prop_assert_eq!(bytes.len(), map.serialized_size());
        let expected_code = if map.is_32_bits_enough() {
            TypeCode::Bitmap32
        } else {
            TypeCode::Bitmap64
        };
        prop_assert_eq!(bytes[0], expected_code.as_u8());

        let (decoded, consumed) = RoaringMap64::deserialize(&bytes).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(decoded, map);
    }
}

#[test]
fn bitmap64_matches_hand_built_frame() {
    let mut map = RoaringMap64::new();
    map.add_range(0..0x1_0000);
    map.add(1 << 32);
    map.add((1 << 32) + 5);
    map.run_optimize();

    let mut low = Bitmap::from_range(0..0x1_0000);
    low.run_optimize();
    let high = Bitmap::of(&[0, 5]);

    let mut expected = vec![TypeCode::Bitmap64.as_u8(), 2];
    expected.extend_from_slice(&0u32.to_le_bytes());
    expected.extend_from_slice(&low.serialize::<Portable>());
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&high.serialize::<Portable>());

    assert_eq!(map.serialize(), expected);
    let (decoded, _) = RoaringMap64::deserialize(&expected).unwrap();
    assert_eq!(decoded, map);
}

#[test]
fn duplicate_bucket_keys_are_merged() {
    let mut frame = vec![TypeCode::Bitmap64.as_u8(), 2];
    for values in [[1u32, 2], [2, 3]] {
        frame.extend_from_slice(&9u32.to_le_bytes());
        frame.extend_from_slice(&Bitmap::of(&values).serialize::<Portable>());
    }
    let (map, consumed) = RoaringMap64::deserialize(&frame).unwrap();
    assert_eq!(consumed, frame.len());
    assert_eq!(map.to_vec(), [(9 << 32) | 1, (9 << 32) | 2, (9 << 32) | 3]);
}

#[test]
fn bad_roaring_payload_reports_offset() {
    let mut frame = vec![TypeCode::Bitmap64.as_u8(), 1];
    frame.extend_from_slice(&0u32.to_le_bytes());
    frame.extend_from_slice(&[0xaa; 16]);
    assert_eq!(
        RoaringMap64::deserialize(&frame),
        Err(DecodeError::BadRoaringPayload { offset: 6 })
    );
}

#[test]
fn shrink_to_fit_prunes_emptied_buckets() {
    let mut map = RoaringMap64::of(&[1, 1 << 33, 1 << 34]);
    map.remove(1 << 33);
    map.shrink_to_fit();
    assert_eq!(map.bucket_count(), 2);
    assert_eq!(map.to_vec(), [1, 1 << 34]);
}

#[test]
fn range_ending_at_u64_max() {
    let mut map = RoaringMap64::new();
    map.add_range(u64::MAX - 9..=u64::MAX);
    assert_eq!(map.cardinality(), Ok(10));
    assert!(!map.is_full());
}
