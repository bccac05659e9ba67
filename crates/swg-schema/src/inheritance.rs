//! Model inheritance rules checked while composing `allOf`.
//!
//! An `allOf` member that carries a `$ref` names a *parent*. A schema may
//! have at most one parent, may not redeclare any of the parent's
//! properties, and the parent's discriminator (if any) must be one of the
//! parent's own properties.

use std::collections::BTreeSet;

use swg_core::{NodeData, NodeId, SchemaError, SchemaGraph};

/// Parents of `id`: identities of the `allOf` members that were references.
pub fn parents(graph: &SchemaGraph, id: NodeId) -> Vec<NodeId> {
    let Some(fields) = graph.schema_fields(id) else {
        return Vec::new();
    };
    fields
        .all_of
        .iter()
        .filter(|member| graph.node(**member).data.reference().is_some())
        .map(|member| graph.identity(*member))
        .collect()
}

fn label(graph: &SchemaGraph, id: NodeId) -> String {
    match graph.node(id).name() {
        Some(name) => name.to_string(),
        None => graph.describe(id),
    }
}

/// Property names of `id` in composed form, falling back to the raw node.
fn composed_properties(graph: &SchemaGraph, id: NodeId) -> BTreeSet<String> {
    let composed = graph.node(id).final_id.unwrap_or(id);
    graph
        .schema_fields(composed)
        .map(|f| f.properties.iter().map(|(key, _)| key.clone()).collect())
        .unwrap_or_default()
}

/// Check the inheritance rules for the schema `id`, whose `allOf` members
/// have already been composed.
///
/// # Errors
///
/// Returns [`SchemaError::MultipleInheritance`],
/// [`SchemaError::Redeclared`] or [`SchemaError::DiscriminatorNotDeclared`].
pub fn check(graph: &SchemaGraph, id: NodeId) -> Result<(), SchemaError> {
    let parents = parents(graph, id);
    let location = graph.describe(id);
    let parent = match parents.as_slice() {
        [] => return Ok(()),
        [parent] => *parent,
        _ => {
            return Err(SchemaError::MultipleInheritance {
                location,
                parents: parents.iter().map(|p| label(graph, *p)).collect(),
            })
        }
    };

    let inherited = composed_properties(graph, parent);
    let parent_label = label(graph, parent);

    // Own properties plus those of inline (non-reference) members.
    let mut declared: Vec<String> = Vec::new();
    if let Some(fields) = graph.schema_fields(id) {
        declared.extend(fields.properties.iter().map(|(key, _)| key.clone()));
        for member in &fields.all_of {
            let member_node = graph.node(*member);
            if member_node.data.reference().is_some() {
                continue;
            }
            if let Some(member_fields) = member_node.data.schema_fields() {
                declared.extend(member_fields.properties.iter().map(|(key, _)| key.clone()));
            }
        }
    }
    if let Some(property) = declared.into_iter().find(|key| inherited.contains(key)) {
        return Err(SchemaError::Redeclared {
            location,
            property,
            parent: parent_label,
        });
    }

    let parent_final = graph.node(parent).final_id.unwrap_or(parent);
    let discriminator = match &graph.node(parent_final).data {
        NodeData::Schema(fields) => fields.discriminator.clone(),
        _ => None,
    };
    if let Some(discriminator) = discriminator {
        if !inherited.contains(&discriminator) {
            return Err(SchemaError::DiscriminatorNotDeclared {
                location,
                discriminator,
                parent: parent_label,
            });
        }
    }
    Ok(())
}
