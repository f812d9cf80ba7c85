//! Runtime value decoding and date encoding.

use schemaforge_config::DateEncoding;
use schemaforge_core::{date_from_millis, format_date, parse_date, PrimitiveType, Result, SchemaError, Value};

use crate::code::Decoder;

/// Checks `value` against the decoder's declared type.
///
/// Null passes through for every type. Integral floats become integers,
/// RFC 3339 strings and epoch milliseconds become dates.
pub(crate) fn decode(decoder: &Decoder, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if !decoder.array {
        return decode_scalar(decoder, value);
    }
    match value {
        Value::List(items) => items
            .iter()
            .map(|item| decode_scalar(decoder, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        other => Err(mismatch(decoder, other)),
    }
}

fn decode_scalar(decoder: &Decoder, value: &Value) -> Result<Value> {
    match (decoder.ty, value) {
        (_, Value::Null) => Ok(Value::Null),
        (PrimitiveType::Json, _) => Ok(value.clone()),
        (PrimitiveType::String, Value::String(_))
        | (PrimitiveType::Number, Value::Int(_) | Value::Float(_))
        | (PrimitiveType::Integer, Value::Int(_))
        | (PrimitiveType::Boolean, Value::Bool(_))
        | (PrimitiveType::Date, Value::Date(_)) => Ok(value.clone()),
        (PrimitiveType::Integer, Value::Float(f))
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
        {
            Ok(Value::Int(*f as i64))
        }
        (PrimitiveType::Date, Value::String(text)) => parse_date(text)
            .map(Value::Date)
            .ok_or_else(|| mismatch(decoder, value)),
        (PrimitiveType::Date, Value::Int(millis)) => date_from_millis(*millis)
            .map(Value::Date)
            .ok_or_else(|| mismatch(decoder, value)),
        (PrimitiveType::Literal, _) => {
            let allowed = decoder
                .literals
                .as_deref()
                .is_some_and(|values| values.contains(value));
            if allowed {
                Ok(value.clone())
            } else {
                Err(SchemaError::LiteralNotAllowed {
                    path: decoder.path.to_string(),
                    value: value.to_json().to_string(),
                })
            }
        }
        _ => Err(mismatch(decoder, value)),
    }
}

fn mismatch(decoder: &Decoder, found: &Value) -> SchemaError {
    let expected = if decoder.array {
        format!("list of {}", decoder.ty)
    } else {
        decoder.ty.name().to_owned()
    };
    SchemaError::Deserialize {
        path: decoder.path.to_string(),
        expected,
        found: found.kind_name(),
    }
}

/// Encodes dates, and lists of dates, with `encoding`. Other values pass through.
pub(crate) fn encode_date(encoding: DateEncoding, value: &Value) -> Value {
    match (encoding, value) {
        (DateEncoding::Rfc3339, Value::Date(date)) => Value::String(format_date(date)),
        (DateEncoding::EpochMillis, Value::Date(date)) => Value::Int(date.timestamp_millis()),
        (_, Value::List(items)) => Value::List(items.iter().map(|v| encode_date(encoding, v)).collect()),
        _ => value.clone(),
    }
}

/// Hash rendering of a date leaf stored as a date or as epoch millis.
pub(crate) fn date_segment(value: &Value) -> String {
    match value {
        Value::Int(millis) => date_from_millis(*millis)
            .map(|date| format_date(&date))
            .unwrap_or_else(|| value.hash_segment()),
        other => other.hash_segment(),
    }
}
