//! Produced primitive values.
//!
//! Values are fresh per production call. [`Model`] compares leniently: a
//! key missing on one side equals an explicit `null` on the other.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use swg_core::CollectionFormat;
use uuid::Uuid;

/// A value produced against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Byte(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    File(FileValue),
    Array(ArrayValue),
    Model(Model),
}

impl PrimitiveValue {
    /// Kinds that `allOf` members are never applied to.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PrimitiveValue::Byte(_)
                | PrimitiveValue::Date(_)
                | PrimitiveValue::DateTime(_)
                | PrimitiveValue::File(_)
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PrimitiveValue::Integer(_) => "integer",
            PrimitiveValue::Float(_) => "number",
            PrimitiveValue::String(_) => "string",
            PrimitiveValue::Boolean(_) => "boolean",
            PrimitiveValue::Byte(_) => "byte",
            PrimitiveValue::Date(_) => "date",
            PrimitiveValue::DateTime(_) => "date-time",
            PrimitiveValue::Uuid(_) => "uuid",
            PrimitiveValue::File(_) => "file",
            PrimitiveValue::Array(_) => "array",
            PrimitiveValue::Model(_) => "object",
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            PrimitiveValue::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            PrimitiveValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// JSON rendering. Bytes become standard base64, dates ISO 8601.
    pub fn to_json(&self) -> Value {
        match self {
            PrimitiveValue::Integer(i) => Value::Number((*i).into()),
            PrimitiveValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            PrimitiveValue::String(s) => Value::String(s.clone()),
            PrimitiveValue::Boolean(b) => Value::Bool(*b),
            PrimitiveValue::Byte(bytes) => Value::String(STANDARD.encode(bytes)),
            PrimitiveValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            PrimitiveValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            PrimitiveValue::Uuid(uuid) => Value::String(uuid.hyphenated().to_string()),
            PrimitiveValue::File(file) => file.to_json(),
            PrimitiveValue::Array(array) => {
                Value::Array(array.items.iter().map(PrimitiveValue::to_json).collect())
            }
            PrimitiveValue::Model(model) => model.to_json(),
        }
    }
}

/// Wire form of scalars: what goes into a query string or header.
impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Integer(i) => write!(f, "{i}"),
            PrimitiveValue::Float(x) => write!(f, "{x}"),
            PrimitiveValue::String(s) => f.write_str(s),
            PrimitiveValue::Boolean(b) => write!(f, "{b}"),
            PrimitiveValue::Byte(bytes) => f.write_str(&STANDARD.encode(bytes)),
            PrimitiveValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PrimitiveValue::DateTime(dt) => {
                f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            PrimitiveValue::Uuid(uuid) => write!(f, "{}", uuid.hyphenated()),
            PrimitiveValue::File(file) => match &file.name {
                Some(name) => f.write_str(name),
                None => write!(f, "<file: {} bytes>", file.data.len()),
            },
            PrimitiveValue::Array(array) => write!(f, "{array}"),
            PrimitiveValue::Model(model) => write!(f, "{}", model.to_json()),
        }
    }
}

/// Uploaded file content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileValue {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FileValue {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(content_type) = &self.content_type {
            map.insert("contentType".to_string(), Value::String(content_type.clone()));
        }
        map.insert("data".to_string(), Value::String(STANDARD.encode(&self.data)));
        Value::Object(map)
    }
}

/// How an array travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEncoding {
    /// One string with the elements joined by the collection delimiter.
    Joined(String),
    /// One `(name, value)` pair per element (`collectionFormat: multi`).
    Repeated(Vec<(String, String)>),
}

/// Produced array plus the collection format it was declared with.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub items: Vec<PrimitiveValue>,
    pub collection_format: CollectionFormat,
}

impl ArrayValue {
    pub fn new(items: Vec<PrimitiveValue>, collection_format: CollectionFormat) -> Self {
        Self {
            items,
            collection_format,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Encode for a parameter called `name`.
    pub fn to_wire(&self, name: &str) -> WireEncoding {
        match self.collection_format.delimiter() {
            Some(_) => WireEncoding::Joined(self.to_string()),
            None => WireEncoding::Repeated(
                self.items
                    .iter()
                    .map(|item| (name.to_string(), item.to_string()))
                    .collect(),
            ),
        }
    }
}

/// Elements joined by the collection delimiter; `multi` falls back to `,`.
impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delimiter = self.collection_format.delimiter().unwrap_or(',');
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, "{delimiter}")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// One slot of a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEntry {
    Value(PrimitiveValue),
    /// Copied unchanged from input under `additionalProperties: true`.
    Verbatim(Value),
}

impl ModelEntry {
    pub fn to_json(&self) -> Value {
        match self {
            ModelEntry::Value(value) => value.to_json(),
            ModelEntry::Verbatim(raw) => raw.clone(),
        }
    }

    pub fn as_value(&self) -> Option<&PrimitiveValue> {
        match self {
            ModelEntry::Value(value) => Some(value),
            ModelEntry::Verbatim(_) => None,
        }
    }
}

/// An object produced against a schema with properties.
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: Option<String>,
    entries: BTreeMap<String, ModelEntry>,
}

impl Model {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            entries: BTreeMap::new(),
        }
    }

    /// Name of the schema this model was produced from.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&ModelEntry> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&PrimitiveValue> {
        self.entries.get(key).and_then(ModelEntry::as_value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PrimitiveValue) {
        self.entries.insert(key.into(), ModelEntry::Value(value));
    }

    pub fn insert_verbatim(&mut self, key: impl Into<String>, raw: Value) {
        self.entries.insert(key.into(), ModelEntry::Verbatim(raw));
    }

    pub fn remove(&mut self, key: &str) -> Option<ModelEntry> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.to_json()))
                .collect(),
        )
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        let keys: BTreeSet<&String> = self.entries.keys().chain(other.entries.keys()).collect();
        keys.into_iter().all(|key| match (self.entries.get(key), other.entries.get(key)) {
            (Some(ModelEntry::Value(mine)), Some(ModelEntry::Value(theirs))) => mine == theirs,
            (Some(mine), Some(theirs)) => lenient_json_eq(&mine.to_json(), &theirs.to_json()),
            (Some(entry), None) | (None, Some(entry)) => entry.to_json().is_null(),
            (None, None) => true,
        })
    }
}

/// JSON equality where an object key missing on one side equals `null` on
/// the other, at any depth.
fn lenient_json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            keys.into_iter().all(|key| {
                let mine = a.get(key).unwrap_or(&Value::Null);
                let theirs = b.get(key).unwrap_or(&Value::Null);
                lenient_json_eq(mine, theirs)
            })
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| lenient_json_eq(x, y))
        }
        _ => a == b,
    }
}
