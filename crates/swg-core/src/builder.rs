//! Maps raw JSON documents into [`SchemaGraph`] nodes.
//!
//! Each object gets its own node, indexed by its absolute location. Field
//! types are checked on the way in; a field of the wrong JSON shape is a
//! [`SchemaError::Malformed`](crate::error::SchemaError::Malformed) that names
//! the field's location. A JSON `null` counts as absent.
//!
//! Parent links are left empty here. They are assigned by the scan
//! pipeline, or by [`SchemaGraph::adopt`] for nodes built on demand.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{SwgError, SwgResult};
use crate::model::{
    AdditionalProperties, CollectionFormat, HttpMethod, Location, NodeData, NodeId, NodeKind,
    Operation, Parameter, ParameterLocation, PathItem, Response, SchemaFields, SchemaGraph,
    SwaggerObject,
};
use crate::pointer;

/// Build the root Swagger object of the document at `url`.
pub fn build_document(graph: &mut SchemaGraph, url: &str, value: &Value) -> SwgResult<NodeId> {
    build_node(graph, Location::new(url, "#"), value, NodeKind::Swagger)
}

/// Build one object, and everything below it, as a node of `kind`.
pub fn build_node(
    graph: &mut SchemaGraph,
    location: Location,
    value: &Value,
    kind: NodeKind,
) -> SwgResult<NodeId> {
    let Value::Object(map) = value else {
        return Err(SwgError::malformed(
            location.to_string(),
            format!("expected a {kind} object, found {}", pointer::value_kind(value)),
        ));
    };
    trace!(location = %location, kind = %kind, "building node");

    let data = match kind {
        NodeKind::Swagger => NodeData::Swagger(swagger(graph, &location, map)?),
        NodeKind::PathItem => NodeData::PathItem(path_item(graph, &location, map)?),
        NodeKind::Operation => NodeData::Operation(operation(graph, &location, map)?),
        NodeKind::Parameter => NodeData::Parameter(parameter(graph, &location, map)?),
        NodeKind::Response => NodeData::Response(response(graph, &location, map)?),
        NodeKind::Header => NodeData::Header(schema_fields(graph, &location, map, kind)?),
        NodeKind::Items => NodeData::Items(schema_fields(graph, &location, map, kind)?),
        NodeKind::Schema => NodeData::Schema(schema_fields(graph, &location, map, kind)?),
        NodeKind::BaseSchema => {
            return Err(SwgError::malformed(
                location.to_string(),
                "BaseSchema is abstract and cannot be built",
            ))
        }
    };

    let present: BTreeSet<String> = map
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, _)| k.clone())
        .collect();
    Ok(graph.insert(data, location, present))
}

/// Typed access to the fields of one raw object.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    location: &'a Location,
}

impl<'a> Fields<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn mistyped(&self, key: &str, expected: &str, found: &Value) -> SwgError {
        SwgError::malformed(
            self.location.child(key).to_string(),
            format!("expected {expected}, found {}", pointer::value_kind(found)),
        )
    }

    fn string(&self, key: &str) -> SwgResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mistyped(key, "a string", other)),
        }
    }

    fn boolean(&self, key: &str) -> SwgResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.mistyped(key, "a boolean", other)),
        }
    }

    fn number(&self, key: &str) -> SwgResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.mistyped(key, "a number", v)),
        }
    }

    fn count(&self, key: &str) -> SwgResult<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.mistyped(key, "a non-negative integer", v)),
        }
    }

    fn strings(&self, key: &str) -> SwgResult<Option<Vec<String>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.mistyped(key, "an array of strings", other)),
                })
                .collect::<SwgResult<Vec<_>>>()
                .map(Some),
            Some(other) => Err(self.mistyped(key, "an array of strings", other)),
        }
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }

    fn parsed<T: FromStr<Err = String>>(&self, key: &str) -> SwgResult<Option<T>> {
        match self.string(key)? {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|reason| SwgError::malformed(self.location.child(key).to_string(), reason)),
        }
    }
}

fn child(
    graph: &mut SchemaGraph,
    fields: &Fields<'_>,
    key: &str,
    kind: NodeKind,
) -> SwgResult<Option<NodeId>> {
    match fields.get(key) {
        None => Ok(None),
        Some(value) => build_node(graph, fields.location.child(key), value, kind).map(Some),
    }
}

/// Build every entry of a key→object map. Vendor extensions (`x-*`) are
/// skipped where Swagger allows them alongside the entries.
fn keyed_children(
    graph: &mut SchemaGraph,
    fields: &Fields<'_>,
    key: &str,
    kind: NodeKind,
    skip_extensions: bool,
) -> SwgResult<Vec<(String, NodeId)>> {
    let Some(value) = fields.get(key) else {
        return Ok(Vec::new());
    };
    let Value::Object(entries) = value else {
        return Err(fields.mistyped(key, "an object", value));
    };
    let base = fields.location.child(key);
    let mut out = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        if skip_extensions && name.starts_with("x-") {
            continue;
        }
        out.push((name.clone(), build_node(graph, base.child(name), entry, kind)?));
    }
    Ok(out)
}

fn listed_children(
    graph: &mut SchemaGraph,
    fields: &Fields<'_>,
    key: &str,
    kind: NodeKind,
) -> SwgResult<Vec<NodeId>> {
    let Some(value) = fields.get(key) else {
        return Ok(Vec::new());
    };
    let Value::Array(entries) = value else {
        return Err(fields.mistyped(key, "an array", value));
    };
    let base = fields.location.child(key);
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| build_node(graph, base.child(&i.to_string()), entry, kind))
        .collect()
}

/// Declared key of a top-level definition or parameter.
fn declared_name(location: &Location, kind: NodeKind) -> Option<String> {
    let tokens = pointer::tokens(&location.pointer).ok()?;
    match (kind, tokens.as_slice()) {
        (NodeKind::Schema, [container, key]) if container == "definitions" => Some(key.clone()),
        (NodeKind::Parameter, [container, key]) if container == "parameters" => Some(key.clone()),
        _ => None,
    }
}

fn swagger(graph: &mut SchemaGraph, location: &Location, map: &Map<String, Value>) -> SwgResult<SwaggerObject> {
    let f = Fields { map, location };
    Ok(SwaggerObject {
        swagger: f.string("swagger")?,
        info: f.value("info"),
        host: f.string("host")?,
        base_path: f.string("basePath")?,
        schemes: f.strings("schemes")?.unwrap_or_default(),
        consumes: f.strings("consumes")?.unwrap_or_default(),
        produces: f.strings("produces")?.unwrap_or_default(),
        paths: keyed_children(graph, &f, "paths", NodeKind::PathItem, true)?,
        definitions: keyed_children(graph, &f, "definitions", NodeKind::Schema, false)?,
        parameters: keyed_children(graph, &f, "parameters", NodeKind::Parameter, false)?,
        responses: keyed_children(graph, &f, "responses", NodeKind::Response, false)?,
    })
}

fn path_item(graph: &mut SchemaGraph, location: &Location, map: &Map<String, Value>) -> SwgResult<PathItem> {
    let f = Fields { map, location };
    let mut operations = Vec::new();
    for method in HttpMethod::ALL {
        if let Some(id) = child(graph, &f, method.as_str(), NodeKind::Operation)? {
            operations.push((method, id));
        }
    }
    Ok(PathItem {
        ref_: f.string("$ref")?,
        operations,
        parameters: listed_children(graph, &f, "parameters", NodeKind::Parameter)?,
    })
}

fn operation(graph: &mut SchemaGraph, location: &Location, map: &Map<String, Value>) -> SwgResult<Operation> {
    let f = Fields { map, location };
    Ok(Operation {
        operation_id: f.string("operationId")?,
        tags: f.strings("tags")?.unwrap_or_default(),
        summary: f.string("summary")?,
        description: f.string("description")?,
        consumes: f.strings("consumes")?,
        produces: f.strings("produces")?,
        schemes: f.strings("schemes")?,
        deprecated: f.boolean("deprecated")?,
        parameters: listed_children(graph, &f, "parameters", NodeKind::Parameter)?,
        responses: keyed_children(graph, &f, "responses", NodeKind::Response, true)?,
        patch: None,
    })
}

fn parameter(graph: &mut SchemaGraph, location: &Location, map: &Map<String, Value>) -> SwgResult<Parameter> {
    let f = Fields { map, location };
    Ok(Parameter {
        name: f.string("name")?,
        location: f.parsed::<ParameterLocation>("in")?,
        required: f.boolean("required")?,
        allow_empty_value: f.boolean("allowEmptyValue")?,
        schema: child(graph, &f, "schema", NodeKind::Schema)?,
        fields: schema_fields(graph, location, map, NodeKind::Parameter)?,
    })
}

fn response(graph: &mut SchemaGraph, location: &Location, map: &Map<String, Value>) -> SwgResult<Response> {
    let f = Fields { map, location };
    Ok(Response {
        ref_: f.string("$ref")?,
        description: f.string("description")?,
        schema: child(graph, &f, "schema", NodeKind::Schema)?,
        headers: keyed_children(graph, &f, "headers", NodeKind::Header, false)?,
        examples: f.value("examples"),
    })
}

fn schema_fields(
    graph: &mut SchemaGraph,
    location: &Location,
    map: &Map<String, Value>,
    kind: NodeKind,
) -> SwgResult<SchemaFields> {
    let f = Fields { map, location };
    let is_schema = kind == NodeKind::Schema;
    let items_kind = if is_schema { NodeKind::Schema } else { NodeKind::Items };

    let enum_ = match f.get("enum") {
        None => None,
        Some(Value::Array(values)) => Some(values.clone()),
        Some(other) => return Err(f.mistyped("enum", "an array", other)),
    };

    let additional_properties = match f.get("additionalProperties") {
        None => AdditionalProperties::Unset,
        Some(Value::Bool(allowed)) => AdditionalProperties::Allowed(*allowed),
        Some(value @ Value::Object(_)) => AdditionalProperties::Schema(build_node(
            graph,
            location.child("additionalProperties"),
            value,
            NodeKind::Schema,
        )?),
        Some(other) => return Err(f.mistyped("additionalProperties", "a boolean or a schema", other)),
    };

    // `required` is a boolean on parameters and a name list on schemas.
    let required = if is_schema {
        f.strings("required")?.unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(SchemaFields {
        name: declared_name(location, kind),
        ref_: f.string("$ref")?,
        type_: f.string("type")?,
        format: f.string("format")?,
        title: f.string("title")?,
        description: f.string("description")?,
        default: f.value("default"),
        maximum: f.number("maximum")?,
        exclusive_maximum: f.boolean("exclusiveMaximum")?,
        minimum: f.number("minimum")?,
        exclusive_minimum: f.boolean("exclusiveMinimum")?,
        max_length: f.count("maxLength")?,
        min_length: f.count("minLength")?,
        pattern: f.string("pattern")?,
        max_items: f.count("maxItems")?,
        min_items: f.count("minItems")?,
        unique_items: f.boolean("uniqueItems")?,
        enum_,
        multiple_of: f.number("multipleOf")?,
        collection_format: f.parsed::<CollectionFormat>("collectionFormat")?,
        items: child(graph, &f, "items", items_kind)?,
        properties: keyed_children(graph, &f, "properties", NodeKind::Schema, false)?,
        additional_properties,
        all_of: listed_children(graph, &f, "allOf", NodeKind::Schema)?,
        discriminator: f.string("discriminator")?,
        read_only: f.boolean("readOnly")?,
        required,
        example: f.value("example"),
    })
}
