//! # Document Model: Arena of Swagger 2.0 Objects
//!
//! Every object of a loaded Swagger document becomes a [`Node`] stored in a
//! [`SchemaGraph`]. Nodes refer to each other by [`NodeId`]: children are
//! ids inside kind-specific fields, the parent is an optional id. After
//! `$ref` dereferencing several nodes may share a child id; the arena makes
//! that aliasing harmless.
//!
//! ## Field presence
//!
//! Scalar fields are `Option`s and collections are possibly empty, which
//! gives the "unset" state that merging relies on: during a merge the
//! destination keeps every field it has set and takes the source's value
//! for everything else. [`Node::present`] additionally records the keys
//! that appeared in the source document.
//!
//! ## Kind hierarchy
//!
//! [`NodeKind::BaseSchema`] is an abstract kind shared by parameters,
//! headers, items and schemas. Dispatch tables keyed by kind consult
//! [`NodeKind::lineage`] so a callback registered for `BaseSchema` sees all
//! four.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::pointer;

/// Index of a node inside its [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Runtime kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Swagger,
    PathItem,
    Operation,
    Parameter,
    Response,
    Header,
    Items,
    Schema,
    /// Abstract ancestor of `Parameter`, `Header`, `Items` and `Schema`.
    BaseSchema,
}

impl NodeKind {
    /// Every kind a node can actually have.
    pub const CONCRETE: [NodeKind; 8] = [
        NodeKind::Swagger,
        NodeKind::PathItem,
        NodeKind::Operation,
        NodeKind::Parameter,
        NodeKind::Response,
        NodeKind::Header,
        NodeKind::Items,
        NodeKind::Schema,
    ];

    /// The kind itself followed by its ancestors.
    pub fn lineage(self) -> &'static [NodeKind] {
        match self {
            NodeKind::Swagger => &[NodeKind::Swagger],
            NodeKind::PathItem => &[NodeKind::PathItem],
            NodeKind::Operation => &[NodeKind::Operation],
            NodeKind::Response => &[NodeKind::Response],
            NodeKind::Parameter => &[NodeKind::Parameter, NodeKind::BaseSchema],
            NodeKind::Header => &[NodeKind::Header, NodeKind::BaseSchema],
            NodeKind::Items => &[NodeKind::Items, NodeKind::BaseSchema],
            NodeKind::Schema => &[NodeKind::Schema, NodeKind::BaseSchema],
            NodeKind::BaseSchema => &[NodeKind::BaseSchema],
        }
    }

    /// Kinds that may carry a `$ref`.
    pub fn is_referable(self) -> bool {
        matches!(
            self,
            NodeKind::Schema | NodeKind::Parameter | NodeKind::Response | NodeKind::PathItem
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Swagger => "Swagger",
            NodeKind::PathItem => "PathItem",
            NodeKind::Operation => "Operation",
            NodeKind::Parameter => "Parameter",
            NodeKind::Response => "Response",
            NodeKind::Header => "Header",
            NodeKind::Items => "Items",
            NodeKind::Schema => "Schema",
            NodeKind::BaseSchema => "BaseSchema",
        }
    }

    /// Kind of the object a pointer into a Swagger root document addresses,
    /// or `None` when the pointer stops at a container or a non-object
    /// field.
    pub fn for_pointer(tokens: &[String]) -> Option<NodeKind> {
        enum Position {
            Node(NodeKind),
            Container(NodeKind),
            Elsewhere,
        }

        let mut position = Position::Node(NodeKind::Swagger);
        for token in tokens {
            position = match position {
                Position::Container(kind) => Position::Node(kind),
                Position::Elsewhere => Position::Elsewhere,
                Position::Node(kind) => match (kind, token.as_str()) {
                    (NodeKind::Swagger, "paths") => Position::Container(NodeKind::PathItem),
                    (NodeKind::Swagger, "definitions") => Position::Container(NodeKind::Schema),
                    (NodeKind::Swagger, "parameters") => Position::Container(NodeKind::Parameter),
                    (NodeKind::Swagger, "responses") => Position::Container(NodeKind::Response),
                    (NodeKind::PathItem, "parameters") => {
                        Position::Container(NodeKind::Parameter)
                    }
                    (NodeKind::PathItem, method) if HttpMethod::from_str(method).is_ok() => {
                        Position::Node(NodeKind::Operation)
                    }
                    (NodeKind::Operation, "parameters") => {
                        Position::Container(NodeKind::Parameter)
                    }
                    (NodeKind::Operation, "responses") => Position::Container(NodeKind::Response),
                    (NodeKind::Parameter, "schema") | (NodeKind::Response, "schema") => {
                        Position::Node(NodeKind::Schema)
                    }
                    (NodeKind::Response, "headers") => Position::Container(NodeKind::Header),
                    (NodeKind::Parameter, "items")
                    | (NodeKind::Header, "items")
                    | (NodeKind::Items, "items") => Position::Node(NodeKind::Items),
                    (NodeKind::Schema, "items") | (NodeKind::Schema, "additionalProperties") => {
                        Position::Node(NodeKind::Schema)
                    }
                    (NodeKind::Schema, "properties") | (NodeKind::Schema, "allOf") => {
                        Position::Container(NodeKind::Schema)
                    }
                    _ => Position::Elsewhere,
                },
            };
        }
        match position {
            Position::Node(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute source position of a node: document URL plus `#`-prefixed
/// pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub url: String,
    pub pointer: String,
}

impl Location {
    pub fn new(url: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pointer: pointer.into(),
        }
    }

    /// Location of a child addressed by one unescaped token.
    pub fn child(&self, token: &str) -> Self {
        Self {
            url: self.url.clone(),
            pointer: pointer::append(&self.pointer, token),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.url, self.pointer)
    }
}

/// Operation keys of a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
    ];

    /// Lowercase key as it appears in a path item.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown http method {s:?}"))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// The `in` field of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    FormData,
    Body,
}

impl ParameterLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::FormData => "formData",
            ParameterLocation::Body => "body",
        }
    }
}

impl FromStr for ParameterLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(ParameterLocation::Query),
            "header" => Ok(ParameterLocation::Header),
            "path" => Ok(ParameterLocation::Path),
            "formData" => Ok(ParameterLocation::FormData),
            "body" => Ok(ParameterLocation::Body),
            other => Err(format!("unknown parameter location {other:?}")),
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire encoding of an array-valued parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CollectionFormat {
    #[default]
    Csv,
    Ssv,
    Tsv,
    Pipes,
    /// Each element is sent as its own `name=value` pair.
    Multi,
}

impl CollectionFormat {
    /// Join/split delimiter; `multi` has none.
    pub fn delimiter(self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionFormat::Csv => "csv",
            CollectionFormat::Ssv => "ssv",
            CollectionFormat::Tsv => "tsv",
            CollectionFormat::Pipes => "pipes",
            CollectionFormat::Multi => "multi",
        }
    }
}

impl FromStr for CollectionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(CollectionFormat::Csv),
            "ssv" => Ok(CollectionFormat::Ssv),
            "tsv" => Ok(CollectionFormat::Tsv),
            "pipes" => Ok(CollectionFormat::Pipes),
            "multi" => Ok(CollectionFormat::Multi),
            other => Err(format!("unknown collectionFormat {other:?}")),
        }
    }
}

/// The `additionalProperties` field of a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdditionalProperties {
    #[default]
    Unset,
    Allowed(bool),
    Schema(NodeId),
}

impl AdditionalProperties {
    pub fn is_set(&self) -> bool {
        !matches!(self, AdditionalProperties::Unset)
    }
}

/// Fields shared by every schema-like object (`Schema`, `Items`, `Header`
/// and the non-body part of `Parameter`).
///
/// Fields that only exist on `Schema` objects stay unset elsewhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaFields {
    /// Definition key this schema was declared under, if any.
    pub name: Option<String>,
    pub ref_: Option<String>,
    pub type_: Option<String>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub maximum: Option<f64>,
    pub exclusive_maximum: Option<bool>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<bool>,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub enum_: Option<Vec<Value>>,
    pub multiple_of: Option<f64>,
    pub collection_format: Option<CollectionFormat>,
    pub items: Option<NodeId>,
    /// Declared properties in document order.
    pub properties: Vec<(String, NodeId)>,
    pub additional_properties: AdditionalProperties,
    pub all_of: Vec<NodeId>,
    pub discriminator: Option<String>,
    pub read_only: Option<bool>,
    pub required: Vec<String>,
    pub example: Option<Value>,
}

macro_rules! take_unset {
    ($dest:ident, $src:ident, $copied:ident; $($field:ident => $name:literal),+ $(,)?) => {
        $(
            if $dest.$field.is_none() && $src.$field.is_some() {
                $dest.$field = $src.$field.clone();
                $copied.push($name);
            }
        )+
    };
}

impl SchemaFields {
    pub fn property(&self, name: &str) -> Option<NodeId> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, id)| *id)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Whether this schema fixes what kind of value it produces.
    pub fn determines_kind(&self) -> bool {
        self.type_.is_some() || !self.properties.is_empty() || self.additional_properties.is_set()
    }

    /// Copy every field `self` leaves unset from `other`, except the
    /// reference itself. Returns the names of the copied fields.
    pub fn merge_from(&mut self, other: &SchemaFields) -> Vec<&'static str> {
        let mut copied = self.merge_scalars_from(other);
        if self.properties.is_empty() && !other.properties.is_empty() {
            self.properties = other.properties.clone();
            copied.push("properties");
        }
        if self.all_of.is_empty() && !other.all_of.is_empty() {
            self.all_of = other.all_of.clone();
            copied.push("allOf");
        }
        copied
    }

    /// Fold one composed `allOf` member into `self`: properties are added
    /// per key with the first declaration winning, everything else follows
    /// [`merge_from`](Self::merge_from) minus `allOf`.
    pub fn absorb_member(&mut self, member: &SchemaFields) -> Vec<&'static str> {
        let mut copied = self.merge_scalars_from(member);
        for (key, id) in &member.properties {
            if !self.has_property(key) {
                self.properties.push((key.clone(), *id));
                if !copied.contains(&"properties") {
                    copied.push("properties");
                }
            }
        }
        copied
    }

    fn merge_scalars_from(&mut self, other: &SchemaFields) -> Vec<&'static str> {
        let mut copied = Vec::new();
        let dest = self;
        take_unset!(dest, other, copied;
            name => "name",
            type_ => "type",
            format => "format",
            title => "title",
            description => "description",
            default => "default",
            maximum => "maximum",
            exclusive_maximum => "exclusiveMaximum",
            minimum => "minimum",
            exclusive_minimum => "exclusiveMinimum",
            max_length => "maxLength",
            min_length => "minLength",
            pattern => "pattern",
            max_items => "maxItems",
            min_items => "minItems",
            unique_items => "uniqueItems",
            enum_ => "enum",
            multiple_of => "multipleOf",
            collection_format => "collectionFormat",
            items => "items",
            discriminator => "discriminator",
            read_only => "readOnly",
            example => "example",
        );
        if !dest.additional_properties.is_set() && other.additional_properties.is_set() {
            dest.additional_properties = other.additional_properties;
            copied.push("additionalProperties");
        }
        if dest.required.is_empty() && !other.required.is_empty() {
            dest.required = other.required.clone();
            copied.push("required");
        }
        copied
    }

    fn children(&self) -> Vec<(String, NodeId)> {
        let mut out = Vec::new();
        if let Some(items) = self.items {
            out.push(("items".to_string(), items));
        }
        for (key, id) in &self.properties {
            out.push((format!("properties/{}", pointer::encode_token(key)), *id));
        }
        if let AdditionalProperties::Schema(id) = self.additional_properties {
            out.push(("additionalProperties".to_string(), id));
        }
        for (i, id) in self.all_of.iter().enumerate() {
            out.push((format!("allOf/{i}"), *id));
        }
        out
    }
}

/// A Swagger parameter object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub location: Option<ParameterLocation>,
    pub required: Option<bool>,
    pub allow_empty_value: Option<bool>,
    /// Body parameters only.
    pub schema: Option<NodeId>,
    pub fields: SchemaFields,
}

impl Parameter {
    /// Identity of a parameter within one operation.
    pub fn key(&self) -> Option<(String, ParameterLocation)> {
        Some((self.name.clone()?, self.location?))
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

/// A response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub ref_: Option<String>,
    pub description: Option<String>,
    pub schema: Option<NodeId>,
    pub headers: Vec<(String, NodeId)>,
    pub examples: Option<Value>,
}

/// Fields synthesized for an operation from its position in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationPatch {
    pub method: HttpMethod,
    /// Path template key, e.g. `/pets/{id}`.
    pub path: String,
    /// Base URL joined with the path template.
    pub url: String,
    /// Path-item parameters overridden by operation parameters.
    pub parameters: Vec<NodeId>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub schemes: Vec<String>,
}

/// An operation object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub consumes: Option<Vec<String>>,
    pub produces: Option<Vec<String>>,
    pub schemes: Option<Vec<String>>,
    pub deprecated: Option<bool>,
    pub parameters: Vec<NodeId>,
    pub responses: Vec<(String, NodeId)>,
    pub patch: Option<OperationPatch>,
}

/// A path item object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    pub ref_: Option<String>,
    pub operations: Vec<(HttpMethod, NodeId)>,
    pub parameters: Vec<NodeId>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<NodeId> {
        self.operations
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, id)| *id)
    }

    /// Sibling path items combine: operations and parameters of `other`
    /// that `self` lacks are added.
    pub fn combine_from(&mut self, other: &PathItem) -> Vec<&'static str> {
        let mut copied = Vec::new();
        for (method, id) in &other.operations {
            if self.operation(*method).is_none() {
                self.operations.push((*method, *id));
                copied.push(method.as_str());
            }
        }
        for id in &other.parameters {
            if !self.parameters.contains(id) {
                self.parameters.push(*id);
                if !copied.contains(&"parameters") {
                    copied.push("parameters");
                }
            }
        }
        copied
    }
}

/// The root object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwaggerObject {
    pub swagger: Option<String>,
    pub info: Option<Value>,
    pub host: Option<String>,
    pub base_path: Option<String>,
    pub schemes: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub paths: Vec<(String, NodeId)>,
    pub definitions: Vec<(String, NodeId)>,
    pub parameters: Vec<(String, NodeId)>,
    pub responses: Vec<(String, NodeId)>,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Swagger(SwaggerObject),
    PathItem(PathItem),
    Operation(Operation),
    Parameter(Parameter),
    Response(Response),
    Header(SchemaFields),
    Items(SchemaFields),
    Schema(SchemaFields),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Swagger(_) => NodeKind::Swagger,
            NodeData::PathItem(_) => NodeKind::PathItem,
            NodeData::Operation(_) => NodeKind::Operation,
            NodeData::Parameter(_) => NodeKind::Parameter,
            NodeData::Response(_) => NodeKind::Response,
            NodeData::Header(_) => NodeKind::Header,
            NodeData::Items(_) => NodeKind::Items,
            NodeData::Schema(_) => NodeKind::Schema,
        }
    }

    /// The `$ref` string, if this kind carries one and it is set.
    pub fn reference(&self) -> Option<&str> {
        match self {
            NodeData::PathItem(p) => p.ref_.as_deref(),
            NodeData::Response(r) => r.ref_.as_deref(),
            NodeData::Parameter(p) => p.fields.ref_.as_deref(),
            NodeData::Schema(s) => s.ref_.as_deref(),
            _ => None,
        }
    }

    /// Overwrite the `$ref` string. No-op for kinds without one.
    pub fn set_reference(&mut self, reference: String) {
        match self {
            NodeData::PathItem(p) => p.ref_ = Some(reference),
            NodeData::Response(r) => r.ref_ = Some(reference),
            NodeData::Parameter(p) => p.fields.ref_ = Some(reference),
            NodeData::Schema(s) => s.ref_ = Some(reference),
            _ => {}
        }
    }

    pub fn schema_fields(&self) -> Option<&SchemaFields> {
        match self {
            NodeData::Schema(s) | NodeData::Items(s) | NodeData::Header(s) => Some(s),
            NodeData::Parameter(p) => Some(&p.fields),
            _ => None,
        }
    }

    pub fn schema_fields_mut(&mut self) -> Option<&mut SchemaFields> {
        match self {
            NodeData::Schema(s) | NodeData::Items(s) | NodeData::Header(s) => Some(s),
            NodeData::Parameter(p) => Some(&mut p.fields),
            _ => None,
        }
    }

    /// Child nodes as (escaped relative pointer, id), in document order.
    pub fn children(&self) -> Vec<(String, NodeId)> {
        fn keyed(prefix: &str, entries: &[(String, NodeId)]) -> Vec<(String, NodeId)> {
            entries
                .iter()
                .map(|(key, id)| (format!("{prefix}/{}", pointer::encode_token(key)), *id))
                .collect()
        }
        fn indexed(prefix: &str, ids: &[NodeId]) -> Vec<(String, NodeId)> {
            ids.iter()
                .enumerate()
                .map(|(i, id)| (format!("{prefix}/{i}"), *id))
                .collect()
        }

        match self {
            NodeData::Swagger(root) => {
                let mut out = keyed("paths", &root.paths);
                out.extend(keyed("definitions", &root.definitions));
                out.extend(keyed("parameters", &root.parameters));
                out.extend(keyed("responses", &root.responses));
                out
            }
            NodeData::PathItem(item) => {
                let mut out: Vec<(String, NodeId)> = item
                    .operations
                    .iter()
                    .map(|(method, id)| (method.as_str().to_string(), *id))
                    .collect();
                out.extend(indexed("parameters", &item.parameters));
                out
            }
            NodeData::Operation(op) => {
                let mut out = indexed("parameters", &op.parameters);
                out.extend(keyed("responses", &op.responses));
                out
            }
            NodeData::Parameter(param) => {
                let mut out = Vec::new();
                if let Some(schema) = param.schema {
                    out.push(("schema".to_string(), schema));
                }
                out.extend(param.fields.children());
                out
            }
            NodeData::Response(resp) => {
                let mut out = Vec::new();
                if let Some(schema) = resp.schema {
                    out.push(("schema".to_string(), schema));
                }
                out.extend(keyed("headers", &resp.headers));
                out
            }
            NodeData::Header(fields) | NodeData::Items(fields) | NodeData::Schema(fields) => {
                fields.children()
            }
        }
    }
}

/// One object of the document graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub location: Location,
    /// Keys that were explicitly present in the source document (or copied
    /// in by a merge).
    pub present: BTreeSet<String>,
    /// Node the `$ref` resolved to.
    pub ref_target: Option<NodeId>,
    /// Set once dereferencing has finished for this node.
    pub resolved: bool,
    /// Memoized composed form.
    pub final_id: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Declared name of a schema-like node.
    pub fn name(&self) -> Option<&str> {
        self.data.schema_fields().and_then(|f| f.name.as_deref())
    }
}

/// Arena owning every node of every loaded document.
#[derive(Debug, Default)]
pub struct SchemaGraph {
    nodes: Vec<Node>,
    index: HashMap<Location, NodeId>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node built from source and index it by location.
    pub fn insert(&mut self, data: NodeData, location: Location, present: BTreeSet<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(location.clone(), id);
        self.nodes.push(Node {
            data,
            parent: None,
            location,
            present,
            ref_target: None,
            resolved: false,
            final_id: None,
        });
        id
    }

    /// Add a node that has no source position of its own (composed forms).
    /// It is not reachable through [`lookup`](Self::lookup).
    pub fn insert_synthetic(&mut self, data: NodeData, location: Location, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            location,
            present: BTreeSet::new(),
            ref_target: None,
            resolved: true,
            final_id: None,
        });
        id
    }

    /// Ids handed out by this graph are always valid indices.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn lookup(&self, location: &Location) -> Option<NodeId> {
        self.index.get(location).copied()
    }

    /// Human-readable position of a node, used in errors and diagnostics.
    pub fn describe(&self, id: NodeId) -> String {
        self.node(id).location.to_string()
    }

    pub fn schema_fields(&self, id: NodeId) -> Option<&SchemaFields> {
        self.node(id).data.schema_fields()
    }

    /// Follow resolved references to the node a reference chain ends at.
    pub fn identity(&self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..self.nodes.len() {
            match self.node(current).ref_target {
                Some(next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }

    /// Assign `parent` to every child in the subtree below `root` that does
    /// not have one yet. Shared children keep the first parent they get.
    pub fn adopt(&mut self, root: NodeId) {
        let mut stack = vec![root];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for (_, child) in self.node(id).data.children() {
                if child != id && self.node(child).parent.is_none() {
                    self.node_mut(child).parent = Some(id);
                }
                stack.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(type_: &str) -> SchemaFields {
        SchemaFields {
            type_: Some(type_.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn lineage_reaches_base_schema() {
        assert_eq!(
            NodeKind::Parameter.lineage(),
            &[NodeKind::Parameter, NodeKind::BaseSchema]
        );
        assert_eq!(NodeKind::Operation.lineage(), &[NodeKind::Operation]);
    }

    #[test]
    fn kind_for_pointer_follows_containers() {
        let kind = |p: &str| NodeKind::for_pointer(&crate::pointer::tokens(p).unwrap());
        assert_eq!(kind("#/definitions/Pet"), Some(NodeKind::Schema));
        assert_eq!(kind("#/definitions/Pet/properties/tags/items"), Some(NodeKind::Schema));
        assert_eq!(kind("#/paths/~1pets"), Some(NodeKind::PathItem));
        assert_eq!(kind("#/paths/~1pets/get"), Some(NodeKind::Operation));
        assert_eq!(kind("#/paths/~1pets/get/parameters/0"), Some(NodeKind::Parameter));
        assert_eq!(kind("#/responses/NotFound/headers/X-Rate"), Some(NodeKind::Header));
        assert_eq!(kind("#/paths"), None);
        assert_eq!(kind("#/info/title"), None);
        assert_eq!(kind("#"), Some(NodeKind::Swagger));
    }

    #[test]
    fn merge_keeps_destination_values() {
        let mut dest = SchemaFields {
            type_: Some("integer".to_string()),
            ..Default::default()
        };
        let src = SchemaFields {
            type_: Some("string".to_string()),
            format: Some("int64".to_string()),
            default: Some(json!(3)),
            ref_: Some("#/definitions/Other".to_string()),
            ..Default::default()
        };
        let copied = dest.merge_from(&src);
        assert_eq!(dest.type_.as_deref(), Some("integer"));
        assert_eq!(dest.format.as_deref(), Some("int64"));
        assert_eq!(dest.default, Some(json!(3)));
        assert!(dest.ref_.is_none());
        assert_eq!(copied, vec!["format", "default"]);
    }

    #[test]
    fn absorb_member_first_property_wins() {
        let mut graph = SchemaGraph::new();
        let first = graph.insert(NodeData::Schema(schema("string")), Location::new("m", "#/a"), BTreeSet::new());
        let second = graph.insert(NodeData::Schema(schema("integer")), Location::new("m", "#/b"), BTreeSet::new());

        let mut composed = SchemaFields {
            properties: vec![("p1".to_string(), first)],
            ..Default::default()
        };
        let member = SchemaFields {
            properties: vec![("p1".to_string(), second), ("p2".to_string(), second)],
            ..Default::default()
        };
        composed.absorb_member(&member);
        assert_eq!(composed.property("p1"), Some(first));
        assert_eq!(composed.property("p2"), Some(second));
    }

    #[test]
    fn path_items_combine_operations() {
        let mut graph = SchemaGraph::new();
        let get = graph.insert(NodeData::Operation(Operation::default()), Location::new("m", "#/g"), BTreeSet::new());
        let post = graph.insert(NodeData::Operation(Operation::default()), Location::new("m", "#/p"), BTreeSet::new());
        let other_get = graph.insert(NodeData::Operation(Operation::default()), Location::new("m", "#/og"), BTreeSet::new());

        let mut local = PathItem {
            operations: vec![(HttpMethod::Get, get)],
            ..Default::default()
        };
        let shared = PathItem {
            operations: vec![(HttpMethod::Get, other_get), (HttpMethod::Post, post)],
            ..Default::default()
        };
        local.combine_from(&shared);
        assert_eq!(local.operation(HttpMethod::Get), Some(get));
        assert_eq!(local.operation(HttpMethod::Post), Some(post));
    }

    #[test]
    fn identity_follows_reference_chain() {
        let mut graph = SchemaGraph::new();
        let a = graph.insert(NodeData::Schema(SchemaFields::default()), Location::new("m", "#/a"), BTreeSet::new());
        let b = graph.insert(NodeData::Schema(SchemaFields::default()), Location::new("m", "#/b"), BTreeSet::new());
        let c = graph.insert(NodeData::Schema(schema("string")), Location::new("m", "#/c"), BTreeSet::new());
        graph.node_mut(a).ref_target = Some(b);
        graph.node_mut(b).ref_target = Some(c);
        assert_eq!(graph.identity(a), c);
        assert_eq!(graph.identity(c), c);
    }

    #[test]
    fn adopt_assigns_first_parent_only() {
        let mut graph = SchemaGraph::new();
        let leaf = graph.insert(NodeData::Schema(schema("string")), Location::new("m", "#/leaf"), BTreeSet::new());
        let a = graph.insert(
            NodeData::Schema(SchemaFields { items: Some(leaf), ..Default::default() }),
            Location::new("m", "#/a"),
            BTreeSet::new(),
        );
        let b = graph.insert(
            NodeData::Schema(SchemaFields { items: Some(leaf), ..Default::default() }),
            Location::new("m", "#/b"),
            BTreeSet::new(),
        );
        graph.adopt(a);
        graph.adopt(b);
        assert_eq!(graph.node(leaf).parent, Some(a));
    }

    #[test]
    fn collection_format_delimiters() {
        assert_eq!(CollectionFormat::default(), CollectionFormat::Csv);
        assert_eq!("pipes".parse::<CollectionFormat>().unwrap().delimiter(), Some('|'));
        assert_eq!(CollectionFormat::Multi.delimiter(), None);
        assert!("semicolon".parse::<CollectionFormat>().is_err());
    }
}
