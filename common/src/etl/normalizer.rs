// Payload normalization: one level of nested-object flattening

use crate::models::Record;
use serde_json::Value;

/// Flatten every object-valued field one level deep using dot-joined keys.
///
/// `{"a": {"b": 1, "c": {"d": 2}}}` becomes `{"a.b": 1, "a.c": {"d": 2}}`.
/// Other values pass through unchanged. Pure and total.
/// If a literal key equals a flattened one (`"a.b"` next to `{"a": {"b": ..}}`),
/// the literal key's value wins.
pub fn normalize(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().map(flatten_record).collect()
}

fn flatten_record(record: Record) -> Record {
    let mut out = Record::new();

    for (key, value) in record {
        match value {
            Value::Object(inner) => {
                for (inner_key, inner_value) in inner {
                    out.insert(format!("{}.{}", key, inner_key), inner_value);
                }
            }
            other => {
                out.insert(key, other);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_nested_object_is_flattened_one_level() {
        let out = normalize(vec![record(json!({"a": {"b": 1, "c": 2}}))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], record(json!({"a.b": 1, "a.c": 2})));
        assert!(!out[0].contains_key("a"));
    }

    #[test]
    fn test_deeper_objects_pass_through_unflattened() {
        let out = normalize(vec![record(json!({"a": {"b": {"c": 1}}}))]);
        assert_eq!(out[0], record(json!({"a.b": {"c": 1}})));
    }

    #[test]
    fn test_scalars_and_arrays_pass_through() {
        let input = record(json!({"id": 1, "tags": ["x", "y"], "name": "n", "gone": null}));
        let out = normalize(vec![input.clone()]);
        assert_eq!(out[0], input);
    }

    #[test]
    fn test_empty_nested_object_contributes_no_fields() {
        let out = normalize(vec![record(json!({"id": 1, "meta": {}}))]);
        assert_eq!(out[0], record(json!({"id": 1})));
    }

    #[test]
    fn test_every_record_is_normalized() {
        let out = normalize(vec![
            record(json!({"p": {"x": 1}})),
            record(json!({"p": {"x": 2}})),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.contains_key("p.x")));
    }

    #[test]
    fn test_literal_dotted_key_wins_over_flattened_key() {
        let out = normalize(vec![record(json!({"a": {"b": 1}, "a.b": 2}))]);
        assert_eq!(out[0], record(json!({"a.b": 2})));
    }
}
