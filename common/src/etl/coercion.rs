// Type coercion: loosely typed JSON values → store-ready values

use crate::errors::EtlError;
use crate::models::{StoreValue, TypeFamily};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde_json::{Number, Value};

/// Coerce one raw value against the declared family of its column.
///
/// Coercion is permissive: anything that cannot be converted is passed on as
/// text and left for the store to accept or reject. The only hard failure is a
/// composite value that cannot be serialized to JSON text.
pub fn coerce(family: TypeFamily, raw: &Value) -> Result<StoreValue, EtlError> {
    match raw {
        Value::Null => Ok(StoreValue::Null),
        Value::Bool(b) => Ok(StoreValue::Boolean(*b)),
        Value::Number(n) => Ok(coerce_number(family, n)),
        Value::String(s) => Ok(coerce_text(family, s)),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(raw)
            .map(StoreValue::Text)
            .map_err(|e| EtlError::CoercionError {
                column: String::new(),
                cause: format!("cannot serialize composite value: {}", e),
            }),
    }
}

/// Number literals parse as integer first, then as floating point, else stay text.
fn coerce_number(family: TypeFamily, n: &Number) -> StoreValue {
    let literal = n.to_string();

    if let Ok(i) = literal.parse::<i64>() {
        return StoreValue::Integer(i);
    }

    match literal.parse::<f64>() {
        Ok(f) if f.is_finite() => coerce_float(family, f),
        _ => StoreValue::Text(literal),
    }
}

fn coerce_float(family: TypeFamily, f: f64) -> StoreValue {
    if family == TypeFamily::Integer && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        // `as` truncates toward zero
        StoreValue::Integer(f as i64)
    } else {
        StoreValue::Float(f)
    }
}

fn coerce_text(family: TypeFamily, s: &str) -> StoreValue {
    let converted = match family {
        TypeFamily::Timestamp => parse_timestamp(s)
            .map(|t| StoreValue::Text(t.to_rfc3339_opts(SecondsFormat::Secs, true))),
        TypeFamily::Integer => s.trim().parse::<i64>().ok().map(StoreValue::Integer),
        TypeFamily::Float => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(StoreValue::Float),
        TypeFamily::Boolean => parse_bool(s).map(StoreValue::Boolean),
        TypeFamily::Text => None,
    };

    converted.unwrap_or_else(|| StoreValue::Text(s.to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Try the accepted timestamp layouts in order; the first that parses wins.
///
/// Layouts without an offset are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0)?;

    // RFC 3339, with or without fractional seconds
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().with_timezone(&utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(midnight.and_utc().with_timezone(&utc));
    }

    // RFC 1123 / RFC 2822 style: "Mon, 02 Jan 2006 15:04:05 GMT"
    if let Ok(t) = DateTime::parse_from_rfc2822(s) {
        return Some(t);
    }

    None
}
