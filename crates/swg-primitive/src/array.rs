//! The `array` handler.
//!
//! A string input is split by the collection-format delimiter; `multi`
//! arrays arrive as JSON arrays (or a single repeated value). Elements are
//! produced against `items`, each in a child context. An element that
//! produces nothing (a `null` with no default) is a type error.

use serde_json::Value;
use swg_core::{CollectionFormat, NodeId, SwgError, SwgResult, ValidationError};

use crate::builtin::type_error;
use crate::context::ProductionContext;
use crate::factory::{Handler, PrimitiveFactory, Production};
use crate::value::{ArrayValue, PrimitiveValue};

pub(crate) fn register(factory: &mut PrimitiveFactory) {
    factory.register("array", None, Handler::new(produce_array).with_validator(validate_array));
}

fn split(raw: &Value, format: CollectionFormat) -> SwgResult<Vec<Value>> {
    match raw {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => match format.delimiter() {
            Some(_) if s.is_empty() => Ok(Vec::new()),
            Some(delimiter) => Ok(s.split(delimiter).map(|part| Value::String(part.to_string())).collect()),
            None => Ok(vec![raw.clone()]),
        },
        other => Err(type_error("array", other)),
    }
}

fn dedupe(items: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

fn produce_array(
    p: &mut Production<'_, '_>,
    ctx: &mut ProductionContext,
    node: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let fields = p.fields(node)?;
    let format = fields.collection_format.unwrap_or_default();
    let unique = fields.unique_items == Some(true);
    let items_id = fields
        .items
        .ok_or_else(|| SwgError::malformed(p.graph().describe(node), "array schema without items"))?;

    let mut raw_items = split(raw, format)?;
    if unique {
        raw_items = dedupe(raw_items);
    }

    let mut items = Vec::with_capacity(raw_items.len());
    for raw_item in &raw_items {
        let mut child = ctx.child();
        match p.produce(items_id, Some(raw_item), &mut child)? {
            Some(item) => items.push(item),
            None => return Err(type_error("array item", raw_item)),
        }
    }
    Ok(PrimitiveValue::Array(ArrayValue::new(items, format)))
}

fn validate_array(
    p: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    node: NodeId,
    value: &PrimitiveValue,
    _: &Value,
) -> SwgResult<Option<Value>> {
    let Some(array) = value.as_array() else {
        return Ok(None);
    };
    let fields = p.fields(node)?;
    let count = array.len();
    if let Some(min_items) = fields.min_items {
        if (count as u64) < min_items {
            return Err(ValidationError::MinItems { count, min_items }.into());
        }
    }
    if let Some(max_items) = fields.max_items {
        if (count as u64) > max_items {
            return Err(ValidationError::MaxItems { count, max_items }.into());
        }
    }
    Ok(None)
}
