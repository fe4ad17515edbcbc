// Property-based tests for payload normalization

use common::etl::normalize;
use common::models::Record;
use proptest::prelude::*;
use serde_json::Value;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ]
}

/// Records whose object-valued fields hold only scalars
fn shallow_record() -> impl Strategy<Value = Record> {
    let field = prop_oneof![
        scalar(),
        prop::collection::btree_map("[a-z]{1,4}", scalar(), 1..4)
            .prop_map(|m| Value::Object(m.into_iter().collect())),
    ];
    prop::collection::btree_map("[a-z]{1,4}", field, 0..6).prop_map(|m| m.into_iter().collect())
}

proptest! {
    /// *For any* record, every nested object is replaced by its dot-joined
    /// children and no top-level object value remains.
    #[test]
    fn property_one_level_flattening(record in shallow_record()) {
        let out = normalize(vec![record.clone()]);
        prop_assert_eq!(out.len(), 1);
        let flat = &out[0];

        prop_assert!(flat.values().all(|v| !v.is_object()));

        for (key, value) in &record {
            match value {
                Value::Object(inner) => {
                    prop_assert!(!flat.contains_key(key) || inner.is_empty());
                    for (inner_key, inner_value) in inner {
                        let joined = format!("{}.{}", key, inner_key);
                        prop_assert_eq!(flat.get(&joined), Some(inner_value));
                    }
                }
                other => prop_assert_eq!(flat.get(key), Some(other)),
            }
        }
    }

    /// *For any* batch, normalization keeps the record count and order.
    #[test]
    fn property_batch_shape_preserved(records in prop::collection::vec(shallow_record(), 0..8)) {
        let out = normalize(records.clone());
        prop_assert_eq!(out.len(), records.len());
        // Flattened records are already normal
        prop_assert_eq!(normalize(out.clone()), out);
    }
}
