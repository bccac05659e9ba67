use std::collections::{BTreeSet, HashMap};

use swg_core::{AdditionalProperties, NodeId, NodeKind, SchemaGraph, SwgResult};
use swg_schema::Composer;
use tracing::debug;

use crate::dispatch::{Dispatcher, Visitor};
use crate::report::ScanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open,
    Done,
}

/// Reports schema cycles. Edges run from a schema's identity to the
/// identities of its `allOf` members, `items`, properties and
/// `additionalProperties` schema, so a `$ref` edge is implied by the
/// identity step.
#[derive(Debug, Default)]
pub struct DetectCycles {
    schemas: BTreeSet<NodeId>,
}

impl DetectCycles {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        self.schemas.insert(composer.graph().identity(id));
        Ok(())
    }
}

fn successors(graph: &SchemaGraph, id: NodeId) -> Vec<NodeId> {
    let Some(fields) = graph.schema_fields(id) else {
        return Vec::new();
    };
    let mut out: Vec<NodeId> = fields.all_of.clone();
    out.extend(fields.items);
    out.extend(fields.properties.iter().map(|(_, prop)| *prop));
    if let AdditionalProperties::Schema(extra) = fields.additional_properties {
        out.push(extra);
    }
    out.into_iter().map(|next| graph.identity(next)).collect()
}

/// One cycle per back edge found by an iterative DFS from each root in
/// order. Each cycle starts at its smallest node id.
fn find_cycles(graph: &SchemaGraph, roots: &BTreeSet<NodeId>) -> Vec<Vec<NodeId>> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut found: BTreeSet<Vec<NodeId>> = BTreeSet::new();
    let mut cycles = Vec::new();

    for &root in roots {
        if marks.contains_key(&root) {
            continue;
        }
        let mut path: Vec<NodeId> = vec![root];
        let mut stack: Vec<(NodeId, Vec<NodeId>)> = vec![(root, successors(graph, root))];
        marks.insert(root, Mark::Open);

        while let Some((node, pending)) = stack.last_mut() {
            let Some(next) = pending.pop() else {
                marks.insert(*node, Mark::Done);
                stack.pop();
                path.pop();
                continue;
            };
            match marks.get(&next) {
                Some(Mark::Open) => {
                    let Some(start) = path.iter().position(|id| *id == next) else {
                        continue;
                    };
                    let mut cycle = path[start..].to_vec();
                    if let Some(min) = cycle.iter().enumerate().min_by_key(|(_, id)| **id) {
                        let offset = min.0;
                        cycle.rotate_left(offset);
                    }
                    if found.insert(cycle.clone()) {
                        cycles.push(cycle);
                    }
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::Open);
                    path.push(next);
                    stack.push((next, successors(graph, next)));
                }
            }
        }
    }
    cycles
}

impl Visitor for DetectCycles {
    fn name(&self) -> &'static str {
        "detect-cycles"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        Dispatcher::new().on(NodeKind::Schema, Self::collect)
    }

    fn finish(&mut self, composer: &mut Composer<'_>, report: &mut ScanReport) -> SwgResult<()> {
        let graph = composer.graph();
        let cycles = find_cycles(graph, &self.schemas);
        debug!(schemas = self.schemas.len(), cycles = cycles.len(), "cycles detected");
        report.cycles.extend(
            cycles
                .into_iter()
                .map(|cycle| cycle.into_iter().map(|id| graph.describe(id)).collect()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swg_core::{Location, NodeData, SchemaFields};

    fn schema(graph: &mut SchemaGraph, name: &str) -> NodeId {
        graph.insert(
            NodeData::Schema(SchemaFields::default()),
            Location::new("mem://t", format!("#/definitions/{name}")),
            Default::default(),
        )
    }

    fn link(graph: &mut SchemaGraph, from: NodeId, to: NodeId) {
        if let Some(fields) = graph.node_mut(from).data.schema_fields_mut() {
            fields.properties.push((format!("p{}", to.index()), to));
        }
    }

    #[test]
    fn self_loop_is_one_cycle() {
        let mut graph = SchemaGraph::new();
        let a = schema(&mut graph, "A");
        link(&mut graph, a, a);
        let cycles = find_cycles(&graph, &[a].into_iter().collect());
        assert_eq!(cycles, vec![vec![a]]);
    }

    #[test]
    fn two_node_cycle_is_reported_once_from_either_root() {
        let mut graph = SchemaGraph::new();
        let a = schema(&mut graph, "A");
        let b = schema(&mut graph, "B");
        link(&mut graph, a, b);
        link(&mut graph, b, a);
        let cycles = find_cycles(&graph, &[a, b].into_iter().collect());
        assert_eq!(cycles, vec![vec![a, b]]);
    }

    #[test]
    fn acyclic_diamond_has_no_cycles() {
        let mut graph = SchemaGraph::new();
        let a = schema(&mut graph, "A");
        let b = schema(&mut graph, "B");
        let c = schema(&mut graph, "C");
        let d = schema(&mut graph, "D");
        link(&mut graph, a, b);
        link(&mut graph, a, c);
        link(&mut graph, b, d);
        link(&mut graph, c, d);
        assert!(find_cycles(&graph, &[a].into_iter().collect()).is_empty());
    }

    #[test]
    fn cycle_through_ref_identity() {
        let mut graph = SchemaGraph::new();
        let a = schema(&mut graph, "A");
        let alias = schema(&mut graph, "Alias");
        graph.node_mut(alias).ref_target = Some(a);
        link(&mut graph, a, alias);
        let cycles = find_cycles(&graph, &[a].into_iter().collect());
        assert_eq!(cycles, vec![vec![a]]);
    }
}
