// Property-based tests for value coercion

use chrono::{DateTime, SecondsFormat, Utc};
use common::etl::{coerce, parse_timestamp};
use common::models::{StoreValue, TypeFamily};
use proptest::prelude::*;
use serde_json::{Number, Value};

fn float_value(f: f64) -> Value {
    Value::Number(Number::from_f64(f).unwrap())
}

proptest! {
    /// *For any* finite float sent to an integer column, the stored value is
    /// the float truncated toward zero.
    #[test]
    fn property_float_to_integer_truncates(f in -1.0e12f64..1.0e12f64) {
        let coerced = coerce(TypeFamily::Integer, &float_value(f)).unwrap();
        prop_assert_eq!(coerced, StoreValue::Integer(f.trunc() as i64));
    }

    /// *For any* integer literal, the value is kept exactly regardless of family.
    #[test]
    fn property_integer_literal_is_exact(
        i in any::<i64>(),
        family in prop::sample::select(vec![
            TypeFamily::Integer,
            TypeFamily::Float,
            TypeFamily::Text,
        ])
    ) {
        let coerced = coerce(family, &Value::from(i)).unwrap();
        prop_assert_eq!(coerced, StoreValue::Integer(i));
    }

    /// *For any* instant written as "YYYY-MM-DD HH:MM:SS", a timestamp column
    /// receives the same instant in canonical UTC RFC 3339 form.
    #[test]
    fn property_timestamp_canonicalization(secs in 0i64..4_102_444_800i64) {
        let instant: DateTime<Utc> = DateTime::from_timestamp(secs, 0).unwrap();
        let raw = Value::String(instant.format("%Y-%m-%d %H:%M:%S").to_string());

        let coerced = coerce(TypeFamily::Timestamp, &raw).unwrap();
        let expected = instant.to_rfc3339_opts(SecondsFormat::Secs, true);
        prop_assert_eq!(coerced, StoreValue::Text(expected.clone()));

        // Canonical output is itself accepted and unchanged
        let again = coerce(TypeFamily::Timestamp, &Value::String(expected.clone())).unwrap();
        prop_assert_eq!(again, StoreValue::Text(expected));
    }

    /// *For any* RFC 3339 timestamp, parsing preserves the instant.
    #[test]
    fn property_rfc3339_preserves_instant(secs in 0i64..4_102_444_800i64) {
        let instant: DateTime<Utc> = DateTime::from_timestamp(secs, 0).unwrap();
        let parsed = parse_timestamp(&instant.to_rfc3339()).unwrap();
        prop_assert_eq!(parsed.timestamp(), secs);
    }

    /// *For any* string that is not a recognizable value of the column's
    /// family, coercion passes it through as text.
    #[test]
    fn property_unparseable_text_passes_through(s in "[a-z]{3,12}") {
        prop_assume!(!matches!(s.as_str(), "true" | "false"));
        for family in [TypeFamily::Integer, TypeFamily::Float, TypeFamily::Timestamp, TypeFamily::Text] {
            let coerced = coerce(family, &Value::String(s.clone())).unwrap();
            prop_assert_eq!(coerced, StoreValue::Text(s.clone()));
        }
    }
}
