//! Non-raising structural checks.
//!
//! Nodes that carry a `$ref` mirror their target after resolution and are
//! skipped by the per-node checks, so a problem is reported once, at the
//! target.

use std::collections::BTreeMap;

use swg_core::{
    CollectionFormat, NodeData, NodeId, NodeKind, ParameterLocation, SchemaGraph, SwgResult,
};
use swg_schema::Composer;
use tracing::debug;

use crate::dispatch::{Dispatcher, Visitor};
use crate::report::{Diagnostic, ScanReport};

#[derive(Debug, Default)]
pub struct ValidateSpec {
    diagnostics: Vec<Diagnostic>,
    operation_ids: BTreeMap<String, Vec<String>>,
}

impl ValidateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    fn report(&mut self, graph: &SchemaGraph, id: NodeId, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(graph.describe(id), message));
    }

    fn check_schema_like(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let graph = composer.graph();
        let node = graph.node(id);
        if node.data.reference().is_some() {
            return Ok(());
        }
        let Some(fields) = node.data.schema_fields() else {
            return Ok(());
        };

        match fields.type_.as_deref() {
            Some("array") if fields.items.is_none() => {
                self.report(graph, id, "array type without items");
            }
            Some("file") if !file_allowed(graph, id) => {
                self.report(
                    graph,
                    id,
                    "file type is only allowed on formData parameters and response schemas",
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn check_parameter(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let graph = composer.graph();
        let NodeData::Parameter(param) = &graph.node(id).data else {
            return Ok(());
        };
        if param.fields.ref_.is_some() {
            return Ok(());
        }

        let Some(location) = param.location else {
            self.report(graph, id, "parameter without \"in\"");
            return Ok(());
        };
        if param.name.is_none() {
            self.report(graph, id, "parameter without \"name\"");
        }
        match location {
            ParameterLocation::Body if param.schema.is_none() => {
                self.report(graph, id, "body parameter without schema");
            }
            ParameterLocation::Body => {}
            _ if param.fields.type_.is_none() => {
                self.report(graph, id, "non-body parameter without type");
            }
            _ => {}
        }
        if location == ParameterLocation::Path && !param.is_required() {
            self.report(graph, id, "path parameter must be required");
        }
        if param.fields.collection_format == Some(CollectionFormat::Multi)
            && !matches!(location, ParameterLocation::Query | ParameterLocation::FormData)
        {
            self.report(
                graph,
                id,
                "collectionFormat multi is only allowed on query and formData parameters",
            );
        }
        Ok(())
    }

    fn check_operation(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let graph = composer.graph();
        let NodeData::Operation(op) = &graph.node(id).data else {
            return Ok(());
        };

        let mut keys = Vec::new();
        for param in &op.parameters {
            if let NodeData::Parameter(p) = &graph.node(*param).data {
                if let Some(key) = p.key() {
                    if keys.contains(&key) {
                        self.report(
                            graph,
                            id,
                            format!("duplicate parameter {:?} in {}", key.0, key.1),
                        );
                    } else {
                        keys.push(key);
                    }
                }
            }
        }

        let effective = match &op.patch {
            Some(patch) => patch.parameters.as_slice(),
            None => op.parameters.as_slice(),
        };
        let locations: Vec<ParameterLocation> = effective
            .iter()
            .filter_map(|param| match &graph.node(*param).data {
                NodeData::Parameter(p) => p.location,
                _ => None,
            })
            .collect();
        let bodies = locations.iter().filter(|l| **l == ParameterLocation::Body).count();
        if bodies > 1 {
            self.report(graph, id, "more than one body parameter");
        }
        if bodies > 0 && locations.contains(&ParameterLocation::FormData) {
            self.report(graph, id, "body and formData parameters are mixed");
        }

        if let Some(operation_id) = &op.operation_id {
            self.operation_ids
                .entry(operation_id.clone())
                .or_default()
                .push(graph.describe(id));
        }
        Ok(())
    }

    fn check_discriminator(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let graph = composer.graph();
        let node = graph.node(id);
        if node.data.reference().is_some() {
            return Ok(());
        }
        let Some(fields) = node.data.schema_fields() else {
            return Ok(());
        };
        let Some(discriminator) = &fields.discriminator else {
            return Ok(());
        };
        if !fields.has_property(discriminator) {
            self.report(
                graph,
                id,
                format!("discriminator {discriminator:?} is not a declared property"),
            );
        } else if !fields.required.contains(discriminator) {
            self.report(
                graph,
                id,
                format!("discriminator {discriminator:?} must be required"),
            );
        }
        Ok(())
    }
}

/// `file` is legal on a formData parameter, as the schema of a response,
/// or on a top-level definition a response may reference.
fn file_allowed(graph: &SchemaGraph, id: NodeId) -> bool {
    let node = graph.node(id);
    match &node.data {
        NodeData::Parameter(param) => param.location == Some(ParameterLocation::FormData),
        NodeData::Schema(_) => node.parent.is_some_and(|parent| match &graph.node(parent).data {
            NodeData::Response(response) => response.schema == Some(id),
            NodeData::Swagger(root) => root.definitions.iter().any(|(_, def)| *def == id),
            _ => false,
        }),
        _ => false,
    }
}

impl Visitor for ValidateSpec {
    fn name(&self) -> &'static str {
        "validate-document"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        Dispatcher::new()
            .on(NodeKind::BaseSchema, Self::check_schema_like)
            .on(NodeKind::Parameter, Self::check_parameter)
            .on(NodeKind::Operation, Self::check_operation)
            .on(NodeKind::Schema, Self::check_discriminator)
    }

    fn finish(&mut self, _: &mut Composer<'_>, report: &mut ScanReport) -> SwgResult<()> {
        for (operation_id, locations) in &self.operation_ids {
            if locations.len() > 1 {
                for location in locations {
                    self.diagnostics.push(Diagnostic::new(
                        location.clone(),
                        format!("duplicate operationId {operation_id:?}"),
                    ));
                }
            }
        }
        debug!(diagnostics = self.diagnostics.len(), "document validated");
        report.diagnostics.append(&mut self.diagnostics);
        Ok(())
    }
}
