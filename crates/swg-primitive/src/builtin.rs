//! Built-in scalar handlers: integer, number, string (and its formats),
//! boolean and file.
//!
//! Producers coerce the raw input (numeric strings are accepted for
//! numbers, `"true"`/`"false"` for booleans) and check the format.
//! Validators check the declared constraints.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use swg_core::{pointer, NodeId, SchemaFields, SwgError, SwgResult, ValidationError};
use uuid::Uuid;

use crate::context::{Direction, ProductionContext};
use crate::factory::{Handler, PrimitiveFactory, Production};
use crate::value::{FileValue, PrimitiveValue};

pub(crate) fn register(factory: &mut PrimitiveFactory) {
    let integer = Handler::new(produce_integer).with_validator(validate_number);
    factory.register("integer", None, integer.clone());
    factory.register("integer", Some("int64"), integer);
    factory.register(
        "integer",
        Some("int32"),
        Handler::new(produce_int32).with_validator(validate_number),
    );

    let number = Handler::new(produce_number).with_validator(validate_number);
    factory.register("number", None, number.clone());
    factory.register("number", Some("double"), number);
    factory.register(
        "number",
        Some("float"),
        Handler::new(produce_float).with_validator(validate_number),
    );

    let string = Handler::new(produce_string).with_validator(validate_string);
    factory.register("string", None, string.clone());
    factory.register("string", Some("password"), string);
    factory.register("string", Some("email"), Handler::new(produce_email).with_validator(validate_string));
    factory.register("string", Some("uuid"), Handler::new(produce_uuid).with_validator(validate_string));
    factory.register("string", Some("byte"), Handler::new(produce_byte).with_validator(validate_string));
    factory.register("string", Some("date"), Handler::new(produce_date).with_validator(validate_string));
    factory.register(
        "string",
        Some("date-time"),
        Handler::new(produce_date_time).with_validator(validate_string),
    );

    factory.register("boolean", None, Handler::new(produce_boolean).with_validator(validate_enum));
    factory.register("file", None, Handler::new(produce_file));
}

pub(crate) fn type_error(expected: &str, raw: &Value) -> SwgError {
    ValidationError::Type {
        expected: expected.to_string(),
        found: pointer::value_kind(raw).to_string(),
    }
    .into()
}

fn format_error(format: &str, value: impl Into<String>) -> SwgError {
    ValidationError::Format {
        format: format.to_string(),
        value: value.into(),
    }
    .into()
}

fn string_input<'v>(raw: &'v Value, expected: &str) -> SwgResult<&'v str> {
    raw.as_str().ok_or_else(|| type_error(expected, raw))
}

fn produce_integer(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(PrimitiveValue::Integer)
        .ok_or_else(|| type_error("integer", raw))
}

fn produce_int32(
    p: &mut Production<'_, '_>,
    ctx: &mut ProductionContext,
    node: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let value = produce_integer(p, ctx, node, raw)?;
    match value {
        PrimitiveValue::Integer(i) if i32::try_from(i).is_err() => Err(format_error("int32", i.to_string())),
        other => Ok(other),
    }
}

fn produce_number(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    };
    parsed
        .map(PrimitiveValue::Float)
        .ok_or_else(|| type_error("number", raw))
}

fn produce_float(
    p: &mut Production<'_, '_>,
    ctx: &mut ProductionContext,
    node: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let value = produce_number(p, ctx, node, raw)?;
    match value {
        PrimitiveValue::Float(f) if f.abs() > f64::from(f32::MAX) => Err(format_error("float", f.to_string())),
        other => Ok(other),
    }
}

fn produce_string(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    string_input(raw, "string").map(|s| PrimitiveValue::String(s.to_string()))
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty() && !rest.ends_with('.'))
}

fn produce_email(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let s = string_input(raw, "string")?;
    if !is_email(s) {
        return Err(format_error("email", s));
    }
    Ok(PrimitiveValue::String(s.to_string()))
}

fn produce_uuid(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let s = string_input(raw, "string")?;
    Uuid::parse_str(s)
        .map(PrimitiveValue::Uuid)
        .map_err(|_| format_error("uuid", s))
}

/// Read direction decodes base64 off the wire; write direction takes the
/// caller's string as the raw bytes to send.
fn produce_byte(
    _: &mut Production<'_, '_>,
    ctx: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let s = string_input(raw, "string")?;
    match ctx.direction() {
        Direction::Read => STANDARD
            .decode(s)
            .map(PrimitiveValue::Byte)
            .map_err(|_| format_error("byte", s)),
        Direction::Write => Ok(PrimitiveValue::Byte(s.as_bytes().to_vec())),
    }
}

/// Unix seconds, fractional and negative ones included.
fn timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let seconds = raw.as_f64().filter(|s| s.is_finite())?;
    let mut whole = seconds.floor();
    let mut nanos = ((seconds - whole) * 1e9).round();
    if nanos >= 1e9 {
        whole += 1.0;
        nanos = 0.0;
    }
    if whole.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(whole as i64, nanos as u32)
}

fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn produce_date(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let date = match raw {
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_date_time(s).map(|dt| dt.date_naive()))
            .ok_or_else(|| format_error("date", s.as_str()))?,
        Value::Number(_) => timestamp(raw)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| format_error("date", raw.to_string()))?,
        other => return Err(type_error("string", other)),
    };
    Ok(PrimitiveValue::Date(date))
}

fn produce_date_time(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let dt = match raw {
        Value::String(s) => parse_date_time(s).ok_or_else(|| format_error("date-time", s.as_str()))?,
        Value::Number(_) => timestamp(raw).ok_or_else(|| format_error("date-time", raw.to_string()))?,
        other => return Err(type_error("string", other)),
    };
    Ok(PrimitiveValue::DateTime(dt))
}

fn produce_boolean(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    match raw {
        Value::Bool(b) => Ok(PrimitiveValue::Boolean(*b)),
        Value::String(s) if s == "true" => Ok(PrimitiveValue::Boolean(true)),
        Value::String(s) if s == "false" => Ok(PrimitiveValue::Boolean(false)),
        other => Err(type_error("boolean", other)),
    }
}

/// A file is either its content as a string, or an object with `data` and
/// optional `name` and `contentType`.
fn produce_file(
    _: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    _: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    match raw {
        Value::String(s) => Ok(PrimitiveValue::File(FileValue {
            data: s.as_bytes().to_vec(),
            ..FileValue::default()
        })),
        Value::Object(map) => {
            let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            let data = text("data").ok_or_else(|| type_error("file data", map.get("data").unwrap_or(&Value::Null)))?;
            Ok(PrimitiveValue::File(FileValue {
                name: text("name"),
                content_type: text("contentType"),
                data: data.into_bytes(),
            }))
        }
        other => Err(type_error("file", other)),
    }
}

fn json_matches(allowed: &Value, actual: &Value) -> bool {
    match (allowed.as_f64(), actual.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => allowed == actual,
    }
}

fn check_enum(fields: &SchemaFields, value: &PrimitiveValue) -> Result<(), ValidationError> {
    let Some(allowed) = &fields.enum_ else {
        return Ok(());
    };
    let actual = value.to_json();
    if allowed.iter().any(|candidate| json_matches(candidate, &actual)) {
        Ok(())
    } else {
        Err(ValidationError::Enum {
            value: value.to_string(),
        })
    }
}

fn validate_enum(
    p: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    node: NodeId,
    value: &PrimitiveValue,
    _: &Value,
) -> SwgResult<Option<Value>> {
    check_enum(p.fields(node)?, value)?;
    Ok(None)
}

fn validate_number(
    p: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    node: NodeId,
    value: &PrimitiveValue,
    _: &Value,
) -> SwgResult<Option<Value>> {
    let fields = p.fields(node)?;
    let v = match value {
        PrimitiveValue::Integer(i) => *i as f64,
        PrimitiveValue::Float(f) => *f,
        _ => return Ok(None),
    };

    if let Some(minimum) = fields.minimum {
        let exclusive = fields.exclusive_minimum.unwrap_or(false);
        if v < minimum || (exclusive && v == minimum) {
            return Err(ValidationError::Minimum {
                value: v,
                minimum,
                exclusive,
            }
            .into());
        }
    }
    if let Some(maximum) = fields.maximum {
        let exclusive = fields.exclusive_maximum.unwrap_or(false);
        if v > maximum || (exclusive && v == maximum) {
            return Err(ValidationError::Maximum {
                value: v,
                maximum,
                exclusive,
            }
            .into());
        }
    }
    if let Some(multiple_of) = fields.multiple_of.filter(|m| *m > 0.0) {
        let quotient = v / multiple_of;
        if (quotient - quotient.round()).abs() > 1e-9 {
            return Err(ValidationError::MultipleOf { value: v, multiple_of }.into());
        }
    }
    check_enum(fields, value)?;
    Ok(None)
}

fn validate_string(
    p: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    node: NodeId,
    value: &PrimitiveValue,
    _: &Value,
) -> SwgResult<Option<Value>> {
    let fields = p.fields(node)?;
    if let PrimitiveValue::String(s) = value {
        let length = s.chars().count();
        if let Some(min_length) = fields.min_length {
            if (length as u64) < min_length {
                return Err(ValidationError::MinLength { length, min_length }.into());
            }
        }
        if let Some(max_length) = fields.max_length {
            if (length as u64) > max_length {
                return Err(ValidationError::MaxLength { length, max_length }.into());
            }
        }
        if let Some(pattern) = &fields.pattern {
            let re = p.factory().pattern(pattern).map_err(|e| {
                SwgError::malformed(p.graph().describe(node), format!("invalid pattern {pattern:?}: {e}"))
            })?;
            if !re.is_match(s) {
                return Err(ValidationError::Pattern {
                    value: s.clone(),
                    pattern: pattern.clone(),
                }
                .into());
            }
        }
    }
    check_enum(fields, value)?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_email("a@example.com"));
        assert!(!is_email("a@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("a@@example.com"));
    }

    #[test]
    fn date_time_layouts() {
        let expected = "2024-03-01T10:00:00Z";
        for input in ["2024-03-01T10:00:00Z", "2024-03-01T12:00:00+02:00", "2024-03-01T10:00:00", "2024-03-01 10:00:00"] {
            let dt = parse_date_time(input).unwrap();
            assert_eq!(PrimitiveValue::DateTime(dt).to_string(), expected, "input {input}");
        }
        assert!(parse_date_time("yesterday").is_none());
    }

    #[test]
    fn fractional_timestamps() {
        let at = |seconds: f64| timestamp(&serde_json::json!(seconds)).unwrap();
        assert_eq!(at(-1.5), DateTime::from_timestamp_millis(-1500).unwrap());
        assert_eq!(at(1.25), DateTime::from_timestamp_millis(1250).unwrap());
        assert_eq!(at(0.9999999999), DateTime::from_timestamp(1, 0).unwrap());
        assert_eq!(at(-0.0000000001), DateTime::from_timestamp(0, 0).unwrap());
    }

    #[test]
    fn numeric_enum_matches_across_representations() {
        assert!(json_matches(&serde_json::json!(1.0), &serde_json::json!(1)));
        assert!(!json_matches(&serde_json::json!("1"), &serde_json::json!(1)));
    }
}
