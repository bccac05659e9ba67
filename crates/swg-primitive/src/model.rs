//! The `object` handler and model cleanup.

use serde_json::Value;
use swg_core::{AdditionalProperties, NodeId, SchemaFields, SchemaGraph, SwgResult, ValidationError};

use crate::builtin::type_error;
use crate::context::{Direction, ProductionContext};
use crate::factory::{Handler, PrimitiveFactory, Production};
use crate::value::{Model, PrimitiveValue};

pub(crate) fn register(factory: &mut PrimitiveFactory) {
    factory.register("object", None, Handler::new(produce_model).with_validator(validate_model));
}

/// Produce every declared property from the matching input key. Properties
/// missing from the input fall back to their defaults.
fn produce_model(
    p: &mut Production<'_, '_>,
    ctx: &mut ProductionContext,
    node: NodeId,
    raw: &Value,
) -> SwgResult<PrimitiveValue> {
    let Value::Object(input) = raw else {
        return Err(type_error("object", raw));
    };
    let fields = p.fields(node)?.clone();
    let mut model = Model::new(fields.name.clone());

    for (key, property) in &fields.properties {
        let supplied = input.get(key).filter(|v| !v.is_null());
        if supplied.is_some() && ctx.direction() == Direction::Write {
            let composed = p.compose(*property)?;
            if p.fields(composed)?.read_only == Some(true) {
                return Err(ValidationError::ReadOnly {
                    property: key.clone(),
                }
                .into());
            }
        }
        let mut child = ctx.child();
        if let Some(value) = p.produce(*property, supplied, &mut child)? {
            model.insert(key.clone(), value);
        }
    }

    ctx.set_pending_additional(fields.additional_properties);
    Ok(PrimitiveValue::Model(model))
}

fn validate_model(
    p: &mut Production<'_, '_>,
    _: &mut ProductionContext,
    node: NodeId,
    _: &PrimitiveValue,
    raw: &Value,
) -> SwgResult<Option<Value>> {
    Ok(residual(p.graph(), node, raw))
}

/// Input keys `node` does not declare as properties, or `None` when every
/// key was consumed.
pub(crate) fn residual(graph: &SchemaGraph, node: NodeId, raw: &Value) -> Option<Value> {
    let Value::Object(input) = raw else {
        return None;
    };
    let declared = graph.schema_fields(node);
    let rest: serde_json::Map<String, Value> = input
        .iter()
        .filter(|(key, _)| !declared.is_some_and(|f| f.has_property(key)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    (!rest.is_empty()).then_some(Value::Object(rest))
}

/// Fold the residual input into `model` per `additionalProperties`, then
/// check `required` (the schema's own plus those deferred by `allOf`
/// members).
///
/// `true` copies residual keys verbatim, a schema produces each one, and
/// `false` drops them. An unset field copies them verbatim on a free-form
/// schema (no declared properties) and drops them otherwise.
pub(crate) fn cleanup(
    p: &mut Production<'_, '_>,
    fields: &SchemaFields,
    model: &mut Model,
    residual: Option<Value>,
    ctx: &mut ProductionContext,
) -> SwgResult<()> {
    let pending = ctx.take_pending_additional();
    let additional = if pending.is_set() {
        pending
    } else {
        fields.additional_properties
    };

    if let Some(Value::Object(rest)) = residual {
        match additional {
            AdditionalProperties::Allowed(true) => keep_verbatim(model, rest),
            AdditionalProperties::Unset if fields.properties.is_empty() => keep_verbatim(model, rest),
            AdditionalProperties::Schema(schema) => {
                for (key, value) in rest {
                    if model.contains_key(&key) {
                        continue;
                    }
                    let mut child = ctx.child();
                    if let Some(produced) = p.produce(schema, Some(&value), &mut child)? {
                        model.insert(key, produced);
                    }
                }
            }
            AdditionalProperties::Allowed(false) | AdditionalProperties::Unset => {}
        }
    }

    let mut required = fields.required.clone();
    for name in ctx.take_pending_required() {
        if !required.contains(&name) {
            required.push(name);
        }
    }
    for property in required {
        if !model.contains_key(&property) {
            return Err(ValidationError::Required { property }.into());
        }
    }
    Ok(())
}

fn keep_verbatim(model: &mut Model, rest: serde_json::Map<String, Value>) {
    for (key, value) in rest {
        if !model.contains_key(&key) {
            model.insert_verbatim(key, value);
        }
    }
}
