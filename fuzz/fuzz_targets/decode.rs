#![no_main]

use bitmap_value::{BitmapOptions, BitmapValue, RoaringMap64};
use libfuzzer_sys::fuzz_target;

fn check_value(input: &[u8], options: BitmapOptions) {
    let Ok(bitmap) = BitmapValue::from_bytes_with_options(input, options) else {
        return;
    };

    let bytes = bitmap.to_bytes();
    assert_eq!(bytes.len(), bitmap.serialized_size());
    let decoded = BitmapValue::from_bytes_with_options(&bytes, options).unwrap();
    assert_eq!(decoded, bitmap, "re-encoded value differs");

    if let Ok(cardinality) = bitmap.cardinality() {
        assert_eq!(cardinality, bitmap.iter().count() as u64);
    }
}

fn check_map(input: &[u8]) {
    let Ok((map, consumed)) = RoaringMap64::deserialize(input) else {
        return;
    };
    assert!(consumed <= input.len());

    let bytes = map.serialize();
    assert_eq!(bytes.len(), map.serialized_size());
    let (decoded, _) = RoaringMap64::deserialize(&bytes).unwrap();
    assert_eq!(decoded, map);
}

fuzz_target!(|input: &[u8]| {
    check_value(input, BitmapOptions::default());
    check_value(input, BitmapOptions::new().small_set_enabled(true));
    check_map(input);
});
