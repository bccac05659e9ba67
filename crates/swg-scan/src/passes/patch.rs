use swg_core::{
    HttpMethod, NodeData, NodeId, NodeKind, Operation, OperationPatch, ParameterLocation, PathItem,
    SchemaGraph, SwaggerObject, SwgResult,
};
use swg_schema::Composer;
use tracing::{debug, trace};

use crate::dispatch::{Dispatcher, Visitor};
use crate::report::ScanReport;

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_HOST: &str = "localhost";

/// Fills [`Operation::patch`] for every operation under `paths`, from its
/// position in the tree and the root defaults.
#[derive(Debug, Default)]
pub struct PatchOperations {
    patched: usize,
}

impl PatchOperations {
    pub fn new() -> Self {
        Self::default()
    }

    fn patch_root(&mut self, composer: &mut Composer<'_>, root: NodeId, _: &str) -> SwgResult<()> {
        let NodeData::Swagger(swagger) = &composer.graph().node(root).data else {
            return Ok(());
        };
        let swagger = swagger.clone();

        for (path, item_id) in &swagger.paths {
            let NodeData::PathItem(item) = &composer.graph().node(*item_id).data else {
                continue;
            };
            let item = item.clone();
            for (method, op_id) in &item.operations {
                let graph = composer.graph();
                let NodeData::Operation(op) = &graph.node(*op_id).data else {
                    continue;
                };
                let patch = operation_patch(graph, &swagger, path, &item, *method, op);
                trace!(method = %method, url = %patch.url, "patched operation");
                if let NodeData::Operation(op) = &mut composer.graph_mut().node_mut(*op_id).data {
                    op.patch = Some(patch);
                    self.patched += 1;
                }
            }
        }
        Ok(())
    }
}

fn parameter_key(graph: &SchemaGraph, id: NodeId) -> Option<(String, ParameterLocation)> {
    match &graph.node(id).data {
        NodeData::Parameter(param) => param.key(),
        _ => None,
    }
}

/// Path-item parameters not overridden by the operation, then the
/// operation's own.
pub(crate) fn effective_parameters(graph: &SchemaGraph, item: &PathItem, op: &Operation) -> Vec<NodeId> {
    let own: Vec<_> = op
        .parameters
        .iter()
        .filter_map(|id| parameter_key(graph, *id))
        .collect();
    let mut out: Vec<NodeId> = item
        .parameters
        .iter()
        .copied()
        .filter(|id| parameter_key(graph, *id).map_or(true, |key| !own.contains(&key)))
        .collect();
    out.extend(op.parameters.iter().copied());
    out
}

fn operation_patch(
    graph: &SchemaGraph,
    root: &SwaggerObject,
    path: &str,
    item: &PathItem,
    method: HttpMethod,
    op: &Operation,
) -> OperationPatch {
    let schemes = op.schemes.clone().unwrap_or_else(|| root.schemes.clone());
    let scheme = schemes.first().map_or(DEFAULT_SCHEME, String::as_str);
    let host = root.host.as_deref().unwrap_or(DEFAULT_HOST);
    let base_path = root.base_path.as_deref().unwrap_or("").trim_end_matches('/');

    OperationPatch {
        method,
        path: path.to_string(),
        url: format!("{scheme}://{host}{base_path}{path}"),
        parameters: effective_parameters(graph, item, op),
        consumes: op.consumes.clone().unwrap_or_else(|| root.consumes.clone()),
        produces: op.produces.clone().unwrap_or_else(|| root.produces.clone()),
        schemes,
    }
}

impl Visitor for PatchOperations {
    fn name(&self) -> &'static str {
        "patch-operations"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        Dispatcher::new().on(NodeKind::Swagger, Self::patch_root)
    }

    fn finish(&mut self, _: &mut Composer<'_>, _: &mut ScanReport) -> SwgResult<()> {
        debug!(patched = self.patched, "operations patched");
        Ok(())
    }
}
