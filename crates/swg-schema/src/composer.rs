//! # Schema Composer
//!
//! Two operations over a [`SchemaGraph`]:
//!
//! - [`Composer::dereference`] chases a node's `$ref` chain and copies the
//!   final target's fields into the node. Path items are the exception:
//!   they combine with their target, gaining the operations and parameters
//!   they lack. A target of a different kind is a
//!   [`SwgError::TypeMismatch`].
//! - [`Composer::compose`] flattens `allOf` into a synthesized final node
//!   and memoizes it on the original.
//!
//! Targets in documents that are not part of the graph yet are built on
//! demand through the [`ReferenceResolver`].
//!
//! ## Guards
//!
//! Each top-level `dereference` owns one [`CycleGuard`] for the reference
//! chain. Each top-level `compose` owns a separate guard for the `allOf`
//! traversal. The memo check runs before the guard visit, so a member
//! reached twice through different branches (a diamond) is not a cycle.

use serde_json::Value;
use swg_core::{
    build_node, pointer, CycleGuard, NodeData, NodeId, NodeKind, SchemaFields, SchemaGraph,
    SwgError, SwgResult,
};
use swg_resolve::ReferenceResolver;
use tracing::{debug, trace};

use crate::inheritance;

/// Mutable view over a graph and the resolver that feeds it.
pub struct Composer<'a> {
    graph: &'a mut SchemaGraph,
    resolver: &'a mut ReferenceResolver,
}

impl<'a> Composer<'a> {
    pub fn new(graph: &'a mut SchemaGraph, resolver: &'a mut ReferenceResolver) -> Self {
        Self { graph, resolver }
    }

    pub fn graph(&self) -> &SchemaGraph {
        &*self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SchemaGraph {
        &mut *self.graph
    }

    pub fn resolver_mut(&mut self) -> &mut ReferenceResolver {
        &mut *self.resolver
    }

    /// End of the resolved reference chain starting at `id`.
    pub fn identity(&self, id: NodeId) -> NodeId {
        self.graph.identity(id)
    }

    /// The node `reference` addresses, relative to document `base`.
    ///
    /// A location the graph does not know yet is fetched and built. Its kind
    /// is inferred from the pointer when the pointer follows the Swagger
    /// document layout, and is `expected` (or `Schema`) otherwise.
    pub fn resolve(
        &mut self,
        reference: &str,
        base: Option<&str>,
        expected: Option<NodeKind>,
    ) -> SwgResult<NodeId> {
        let location = self.resolver.locate(reference, base)?;
        if let Some(id) = self.graph.lookup(&location) {
            return Ok(id);
        }

        let tokens = pointer::tokens(&location.pointer)?;
        // A whole foreign document is whatever the referrer expects.
        let kind = match (tokens.is_empty(), expected) {
            (true, Some(expected)) => expected,
            _ => NodeKind::for_pointer(&tokens)
                .or(expected)
                .unwrap_or(NodeKind::Schema),
        };
        let absolute = location.to_string();
        let raw: Value = self.resolver.resolve(&absolute, None)?.clone();
        debug!(location = %absolute, kind = %kind, "building referenced node on demand");
        let id = build_node(&mut *self.graph, location, &raw, kind)?;
        self.graph.adopt(id);
        Ok(id)
    }

    /// Resolve the `$ref` of `id`, if any, and merge the target into it.
    ///
    /// # Errors
    ///
    /// - [`SwgError::Resolution`] if the target cannot be loaded.
    /// - [`SwgError::TypeMismatch`] if the target is of another kind.
    /// - [`SwgError::Cycle`] if the chain loops back on itself.
    pub fn dereference(&mut self, id: NodeId) -> SwgResult<NodeId> {
        let mut guard = CycleGuard::new();
        self.dereference_guarded(id, &mut guard)
    }

    fn dereference_guarded(&mut self, id: NodeId, guard: &mut CycleGuard) -> SwgResult<NodeId> {
        let node = self.graph.node(id);
        if node.resolved {
            return Ok(id);
        }
        let Some(reference) = node.data.reference().map(str::to_string) else {
            self.graph.node_mut(id).resolved = true;
            return Ok(id);
        };
        let kind = node.kind();
        let base = node.location.url.clone();

        guard.visit(id, self.graph.describe(id))?;
        let target = self.resolve(&reference, Some(&base), Some(kind))?;
        let found = self.graph.node(target).kind();
        if found != kind {
            return Err(SwgError::TypeMismatch {
                reference,
                expected: kind,
                found,
            });
        }
        self.dereference_guarded(target, guard)?;

        trace!(node = %self.graph.describe(id), target = %self.graph.describe(target), "dereferenced");
        self.merge_target(id, target, reference);
        let node = self.graph.node_mut(id);
        node.ref_target = Some(target);
        node.resolved = true;
        Ok(id)
    }

    fn merge_target(&mut self, id: NodeId, target: NodeId, reference: String) {
        let source = self.graph.node(target);
        let source_data = source.data.clone();
        let source_present = source.present.clone();

        let node = self.graph.node_mut(id);
        if let NodeData::PathItem(shared) = &source_data {
            if let NodeData::PathItem(local) = &mut node.data {
                for key in local.combine_from(shared) {
                    node.present.insert(key.to_string());
                }
                return;
            }
        }
        let mut data = source_data;
        data.set_reference(reference);
        node.data = data;
        node.present.extend(source_present);
    }

    /// Composed form of `id`: dereferenced, with every `allOf` member
    /// folded in. Memoized; composing a final node returns it unchanged.
    ///
    /// Nodes that are not schema-like are only dereferenced.
    ///
    /// # Errors
    ///
    /// Everything [`dereference`](Self::dereference) reports, plus
    /// [`SwgError::Cycle`] for `allOf` loops and the inheritance
    /// [`SchemaError`](swg_core::SchemaError)s.
    pub fn compose(&mut self, id: NodeId) -> SwgResult<NodeId> {
        let mut guard = CycleGuard::new();
        self.compose_guarded(id, &mut guard)
    }

    fn compose_guarded(&mut self, id: NodeId, guard: &mut CycleGuard) -> SwgResult<NodeId> {
        if let Some(final_id) = self.graph.node(id).final_id {
            return Ok(final_id);
        }
        self.dereference(id)?;

        let Some(fields) = self.graph.schema_fields(id).cloned() else {
            self.graph.node_mut(id).final_id = Some(id);
            return Ok(id);
        };

        let identity = self.graph.identity(id);
        if identity != id {
            let final_id = self.compose_guarded(identity, guard)?;
            self.graph.node_mut(id).final_id = Some(final_id);
            return Ok(final_id);
        }

        guard.visit(id, self.graph.describe(id))?;

        for child in local_children(&fields) {
            self.dereference(child)?;
        }
        if fields.all_of.is_empty() {
            self.graph.node_mut(id).final_id = Some(id);
            return Ok(id);
        }

        let mut members = Vec::with_capacity(fields.all_of.len());
        for member in &fields.all_of {
            members.push(self.compose_guarded(*member, guard)?);
        }
        inheritance::check(&*self.graph, id)?;

        let mut composed = fields.clone();
        composed.all_of.clear();
        let mut present = self.graph.node(id).present.clone();
        present.remove("allOf");
        for member in &members {
            if let Some(member_fields) = self.graph.schema_fields(*member) {
                for key in composed.absorb_member(member_fields) {
                    present.insert(key.to_string());
                }
            }
        }

        let original = self.graph.node(id);
        let data = with_fields(&original.data, composed);
        let location = original.location.clone();
        let final_id = self.graph.insert_synthetic(data, location, id);
        let final_node = self.graph.node_mut(final_id);
        final_node.present = present;
        final_node.final_id = Some(final_id);
        self.graph.node_mut(id).final_id = Some(final_id);

        debug!(
            node = %self.graph.describe(id),
            members = members.len(),
            "composed allOf"
        );
        Ok(final_id)
    }
}

/// Items, property and additionalProperties schemas of a node.
fn local_children(fields: &SchemaFields) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = fields.items.into_iter().collect();
    out.extend(fields.properties.iter().map(|(_, id)| *id));
    if let swg_core::AdditionalProperties::Schema(id) = fields.additional_properties {
        out.push(id);
    }
    out
}

fn with_fields(data: &NodeData, fields: SchemaFields) -> NodeData {
    match data {
        NodeData::Parameter(param) => NodeData::Parameter(swg_core::Parameter {
            fields,
            ..param.clone()
        }),
        NodeData::Header(_) => NodeData::Header(fields),
        NodeData::Items(_) => NodeData::Items(fields),
        _ => NodeData::Schema(fields),
    }
}
