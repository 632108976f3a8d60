use std::collections::BTreeSet;

use bitmap_value::{BitmapOptions, BitmapValue, DecodeError, Mode, TypeCode, SMALL_SET_MAX};
use proptest::prelude::*;
use roaring::RoaringBitmap;

const BOUNDARIES: [u64; 5] = [0, 1, u32::MAX as u64, u32::MAX as u64 + 1, u64::MAX];

fn elements(bitmap: &BitmapValue) -> BTreeSet<u64> {
    bitmap.iter().collect()
}

fn element() -> impl Strategy<Value = u64> {
    prop_oneof![
        0u64..64,
        (u32::MAX as u64 - 8)..(u32::MAX as u64 + 8),
        (u64::MAX - 8)..=u64::MAX,
        any::<u64>(),
    ]
}

/// Values in every mode, including `Large` values left with fewer than two
/// elements by `remove`.
fn bitmap_value() -> impl Strategy<Value = BitmapValue> {
    let built = (prop::collection::vec(element(), 0..80), any::<bool>()).prop_map(
        |(values, small_set)| {
            let options = BitmapOptions::new().small_set_enabled(small_set);
            BitmapValue::from_slice_with_options(&values, options)
        },
    );
    let drained = (prop::collection::vec(element(), 2..10), 0usize..2).prop_map(|(values, keep)| {
        let mut bitmap = BitmapValue::from_slice(&values);
        let all: Vec<u64> = bitmap.iter().collect();
        for value in all.into_iter().skip(keep) {
            bitmap.remove(value);
        }
        bitmap
    });
    prop_oneof![4 => built, 1 => drained]
}

/// Checks the mode is the smallest one for the elements, which holds after
/// intersection, difference and symmetric difference.
fn assert_normalized(bitmap: &BitmapValue) {
    let cardinality = bitmap.cardinality().unwrap();
    match cardinality {
        0 => assert_eq!(bitmap.mode(), Mode::Empty),
        1 => assert_eq!(bitmap.mode(), Mode::Single),
        _ => assert!(matches!(bitmap.mode(), Mode::SmallSet | Mode::Large)),
    }
    assert_small_set_bounds(bitmap);
}

fn assert_small_set_bounds(bitmap: &BitmapValue) {
    if bitmap.mode() == Mode::SmallSet {
        assert!(bitmap.options().small_set_enabled);
        let cardinality = bitmap.cardinality().unwrap();
        assert!((2..=SMALL_SET_MAX as u64).contains(&cardinality));
    }
}

proptest! {
    #[test]
    fn union_laws(a in bitmap_value(), b in bitmap_value(), c in bitmap_value()) {
        prop_assert_eq!(&(&a | &b) | &c, &a | &(&b | &c));
        prop_assert_eq!(&a | &b, &b | &a);
        prop_assert_eq!(&a | &BitmapValue::new(), a.clone());
        prop_assert_eq!(&a | &a, a.clone());

        let union = &a | &b;
        let expected: BTreeSet<u64> = elements(&a).union(&elements(&b)).copied().collect();
        prop_assert_eq!(elements(&union), expected);
        assert_small_set_bounds(&union);
    }

    #[test]
    fn intersection_laws(a in bitmap_value(), b in bitmap_value(), c in bitmap_value()) {
        prop_assert_eq!(&(&a & &b) & &c, &a & &(&b & &c));
        prop_assert_eq!(&a & &b, &b & &a);
        prop_assert_eq!(&a & &BitmapValue::new(), BitmapValue::new());
        prop_assert_eq!(&a & &a, a.clone());

        let intersection = &a & &b;
        let expected: BTreeSet<u64> = elements(&a).intersection(&elements(&b)).copied().collect();
        prop_assert_eq!(elements(&intersection), expected);
        assert_normalized(&intersection);
    }

    #[test]
    fn difference_laws(a in bitmap_value(), b in bitmap_value()) {
        let empty = BitmapValue::new();
        prop_assert_eq!(&a - &a, empty.clone());
        prop_assert_eq!(&a - &empty, a.clone());
        prop_assert_eq!(&empty - &a, empty.clone());
        assert_normalized(&(&a - &a));

        let difference = &a - &b;
        let expected: BTreeSet<u64> = elements(&a).difference(&elements(&b)).copied().collect();
        prop_assert_eq!(elements(&difference), expected);
        assert_normalized(&difference);
    }

    #[test]
    fn symmetric_difference_laws(a in bitmap_value(), b in bitmap_value()) {
        let xor = &a ^ &b;
        prop_assert_eq!(xor.clone(), &(&a | &b) - &(&a & &b));
        prop_assert_eq!(&a ^ &a, BitmapValue::new());
        prop_assert_eq!(&a ^ &BitmapValue::new(), a.clone());
        assert_normalized(&xor);

        let expected: BTreeSet<u64> = elements(&a).symmetric_difference(&elements(&b)).copied().collect();
        prop_assert_eq!(elements(&xor), expected);

        let mut in_place = a.clone();
        let mut rhs = b.clone();
        in_place ^= &mut rhs;
        prop_assert_eq!(in_place, xor);
    }

    #[test]
    fn serialization_roundtrip(a in bitmap_value()) {
        let bytes = a.to_bytes();
        prop_assert_eq!(bytes.len(), a.serialized_size());

        let mut buffer = vec![0u8; a.serialized_size()];
        prop_assert_eq!(a.serialize(&mut buffer), buffer.len());
        prop_assert_eq!(&buffer, &bytes);

        let decoded = BitmapValue::from_bytes_with_options(&bytes, a.options()).unwrap();
        prop_assert_eq!(&decoded, &a);
        assert_normalized(&decoded);
    }

    #[test]
    fn cardinality_and_membership(a in bitmap_value(), probes in prop::collection::vec(any::<u64>(), 0..20)) {
        let expected = elements(&a);
        prop_assert_eq!(a.cardinality(), Ok(expected.len() as u64));
        prop_assert_eq!(a.is_empty(), expected.is_empty());
        prop_assert_eq!(a.minimum(), expected.iter().next().copied());
        prop_assert_eq!(a.maximum(), expected.iter().next_back().copied());
        for x in BOUNDARIES.iter().copied().chain(probes).chain(expected.iter().copied()) {
            prop_assert_eq!(a.contains(x), expected.contains(&x));
        }
    }

    #[test]
    fn add_and_remove_match_model(
        ops in prop::collection::vec((any::<bool>(), element()), 0..200),
        small_set in any::<bool>(),
    ) {
        let mut bitmap = BitmapValue::with_options(BitmapOptions::new().small_set_enabled(small_set));
        let mut model = BTreeSet::new();
        let mut was_large = false;
        for (insert, value) in ops {
            if insert {
                bitmap.add(value);
                model.insert(value);
            } else {
                bitmap.remove(value);
                model.remove(&value);
            }
            was_large |= bitmap.mode() == Mode::Large;
            assert_small_set_bounds(&bitmap);
            if !was_large {
                match model.len() {
                    0 => prop_assert_eq!(bitmap.mode(), Mode::Empty),
                    1 => prop_assert_eq!(bitmap.mode(), Mode::Single),
                    _ => {}
                }
            }
        }
        prop_assert_eq!(elements(&bitmap), model);
    }

    #[test]
    fn display_parse_roundtrip(a in bitmap_value()) {
        let text = a.to_string();
        let parsed: BitmapValue = text.parse().unwrap();
        prop_assert_eq!(&parsed, &a);

        let expected: Vec<String> = elements(&a).iter().map(u64::to_string).collect();
        prop_assert_eq!(text, expected.join(","));
    }

    #[test]
    fn decodes_roaring_crate_payloads(values in prop::collection::vec(any::<u32>(), 0..2000)) {
        let reference: RoaringBitmap = values.iter().copied().collect();
        let mut bytes = vec![TypeCode::Bitmap32.as_u8()];
        reference.serialize_into(&mut bytes).unwrap();

        let decoded = BitmapValue::from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded.cardinality(), Ok(reference.len()));
        prop_assert!(reference.iter().map(u64::from).eq(decoded.iter()));

        let encoded = BitmapValue::from_slice(&values.iter().map(|&v| u64::from(v)).collect::<Vec<_>>()).to_bytes();
        if encoded[0] == TypeCode::Bitmap32.as_u8() {
            let back = RoaringBitmap::deserialize_from(&encoded[1..]).unwrap();
            prop_assert_eq!(back, reference);
        }
    }

    #[test]
    fn decoding_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        if let Ok(decoded) = BitmapValue::from_bytes(&bytes) {
            let again = BitmapValue::from_bytes(&decoded.to_bytes()).unwrap();
            prop_assert_eq!(again, decoded);
        }
    }
}

#[test]
fn empty_roundtrip() {
    let empty = BitmapValue::new();
    assert_eq!(empty.to_bytes(), [0x00]);
    assert_eq!(BitmapValue::from_bytes(&[0x00]).unwrap().cardinality(), Ok(0));
}

#[test]
fn single32_roundtrip() {
    let a = BitmapValue::from_u64(42);
    let bytes = a.to_bytes();
    assert_eq!(bytes, [0x01, 0x2a, 0x00, 0x00, 0x00]);

    let decoded = BitmapValue::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.cardinality(), Ok(1));
    assert!(decoded.contains(42));
    assert!(!decoded.contains(43));
}

#[test]
fn single64_encoding() {
    let bytes = BitmapValue::from_u64(0x1_0000_0000).to_bytes();
    assert_eq!(bytes[0], 0x03);
    assert_eq!(bytes.len(), 9);
}

#[test]
fn second_element_promotes_to_large() {
    let mut a = BitmapValue::new();
    a.add(1);
    a.add(2);
    assert_eq!(a.mode(), Mode::Large);
    assert_eq!(a.cardinality(), Ok(2));
    assert_eq!(a.to_bytes()[0], 0x02);
}

#[test]
fn intersection_demotes_to_single() {
    let mut a = BitmapValue::from_slice(&[1, 2, 3, 4]);
    assert_eq!(a.mode(), Mode::Large);
    let b = BitmapValue::from_u64(3);
    a &= &b;
    assert_eq!(a.mode(), Mode::Single);
    assert!(a.contains(3));
    assert_eq!(a.to_bytes(), [0x01, 0x03, 0x00, 0x00, 0x00]);
}

#[test]
fn symmetric_difference_of_overlapping_sets() {
    let mut a = BitmapValue::from_slice(&[1, 2, 3]);
    let mut b = BitmapValue::from_slice(&[2, 3, 4]);
    a ^= &mut b;
    assert_eq!(elements(&a), [1, 4].into_iter().collect());
    assert_eq!(a.cardinality(), Ok(2));
}

#[test]
fn boundary_between_32_and_64_bits() {
    let a = BitmapValue::from_slice(&[u32::MAX as u64, u32::MAX as u64 + 1]);
    let bytes = a.to_bytes();
    assert_eq!(bytes[0], 0x04);

    let decoded = BitmapValue::from_bytes(&bytes).unwrap();
    assert!(!decoded.is_32_bits_enough());
    assert!(!decoded.as_map().unwrap().is_32_bits_enough());
    assert_eq!(decoded, a);
}

#[test]
fn large_32_bit_value_uses_fast_path() {
    let a: BitmapValue = (0..10_000).map(|i| i * 7).collect();
    let bytes = a.to_bytes();
    assert_eq!(bytes[0], TypeCode::Bitmap32.as_u8());
    assert_eq!(BitmapValue::from_bytes(&bytes).unwrap(), a);
}

#[test]
fn small_set_roundtrip_uses_set_code() {
    let options = BitmapOptions::new().small_set_enabled(true);
    let a = BitmapValue::from_slice_with_options(&[5, 1 << 40, 7], options);
    assert_eq!(a.mode(), Mode::SmallSet);
    let bytes = a.to_bytes();
    assert_eq!(bytes[0], TypeCode::Set.as_u8());
    assert_eq!(bytes.len(), 1 + 4 + 3 * 8);

    let decoded = BitmapValue::from_bytes_with_options(&bytes, options).unwrap();
    assert_eq!(decoded.mode(), Mode::SmallSet);
    assert_eq!(decoded, a);
}

#[test]
fn compress_keeps_elements() {
    let mut a: BitmapValue = (1_000..50_000).chain([1 << 40]).collect();
    let before = a.clone();
    a.compress();
    assert_eq!(a, before);
    assert!(a.serialized_size() <= before.serialized_size());

    let mut single = BitmapValue::from_u64(3);
    single.compress();
    assert_eq!(single.mode(), Mode::Single);
}

#[test]
fn clones_do_not_observe_writes() {
    let a = BitmapValue::from_slice(&[1, 2, 3]);
    let mut b = a.clone();
    b.add(4);
    b |= &BitmapValue::from_slice(&[5, 6]);
    b -= &BitmapValue::from_u64(1);
    assert_eq!(a.to_string(), "1,2,3");
    assert_eq!(b.to_string(), "2,3,4,5,6");
}

#[test]
fn truncated_frames_are_rejected() {
    let a = BitmapValue::from_slice(&[1, 2, 1 << 40, (1 << 40) + 5]);
    let bytes = a.to_bytes();
    for len in 0..bytes.len() {
        let result = BitmapValue::from_bytes(&bytes[..len]);
        assert!(result.is_err(), "prefix of {} bytes decoded", len);
    }
    assert!(matches!(
        BitmapValue::from_bytes(&[TypeCode::Single64.as_u8(), 1, 2, 3]),
        Err(DecodeError::Truncated { .. })
    ));
}

#[test]
fn values_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BitmapValue>();
}

#[test]
fn options_deserialize_with_defaults() {
    let options: BitmapOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, BitmapOptions::default());
    let options: BitmapOptions = serde_json::from_str(r#"{"small_set_enabled":true}"#).unwrap();
    assert!(options.small_set_enabled);
}
