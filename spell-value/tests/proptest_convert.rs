//! Property-based tests: native values survive the boundary.

use proptest::prelude::*;
use spell_value::*;
use std::collections::BTreeMap;

fn arb_scalar() -> impl Strategy<Value = DynamicValue> {
    prop_oneof![
        Just(DynamicValue::Null),
        any::<bool>().prop_map(DynamicValue::Bool),
        // Quarters keep the JSON text exact.
        (-1_000_000i32..1_000_000).prop_map(|n| DynamicValue::Number(f64::from(n) / 4.0)),
        ".*".prop_map(DynamicValue::Text),
    ]
}

fn arb_value() -> impl Strategy<Value = DynamicValue> {
    arb_scalar().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(DynamicValue::Sequence),
            proptest::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(DynamicValue::Mapping),
        ]
    })
}

proptest! {
    #[test]
    fn i64_within_safe_range_roundtrips(n in -(1i64 << 53)..(1i64 << 53)) {
        let back: i64 = from_boundary(to_boundary(&n).unwrap()).unwrap();
        prop_assert_eq!(back, n);
    }

    #[test]
    fn finite_f64_roundtrips(n in any::<f64>().prop_filter("finite", |n| n.is_finite())) {
        let back: f64 = from_boundary(to_boundary(&n).unwrap()).unwrap();
        prop_assert_eq!(back, n);
    }

    #[test]
    fn small_ints_convert_to_every_width(n in any::<u8>()) {
        let value = to_boundary(&n).unwrap();
        prop_assert_eq!(from_boundary::<i16>(value.clone()).unwrap(), i16::from(n));
        prop_assert_eq!(from_boundary::<u64>(value.clone()).unwrap(), u64::from(n));
        prop_assert_eq!(from_boundary::<f32>(value).unwrap(), f32::from(n));
    }

    #[test]
    fn string_vectors_roundtrip(items in proptest::collection::vec(".*", 0..8)) {
        let back: Vec<String> = from_boundary(to_boundary(&items).unwrap()).unwrap();
        prop_assert_eq!(back, items);
    }

    #[test]
    fn string_maps_roundtrip(map in proptest::collection::btree_map(".*", any::<i32>(), 0..8)) {
        let back: BTreeMap<String, i32> = from_boundary(to_boundary(&map).unwrap()).unwrap();
        prop_assert_eq!(back, map);
    }

    #[test]
    fn dynamic_value_json_roundtrip(value in arb_value()) {
        let text = serde_json::to_string(&value).unwrap();
        let back: DynamicValue = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn dynamic_value_converter_identity(value in arb_value()) {
        prop_assert_eq!(to_boundary(&value).unwrap(), value.clone());
        prop_assert_eq!(from_boundary::<DynamicValue>(value.clone()).unwrap(), value);
    }
}
