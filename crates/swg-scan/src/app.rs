//! # SwaggerApp
//!
//! One loaded document: the graph, the resolver that fetched it, the scan
//! report, and a primitive factory for producing values against it.
//!
//! ```ignore
//! let app = SwaggerApp::load_path(Path::new("api.yaml"), ScanConfig::default())?;
//! let pet = app.resolve("#/definitions/Pet")?;
//! let value = app.produce(pet, Some(&json!({"name": "Tom"})), Direction::Read)?;
//! ```

use std::path::Path;

use serde_json::Value;
use swg_core::{NodeData, NodeId, ResolutionError, SchemaError, SchemaGraph, SwgResult};
use swg_primitive::{Direction, PrimitiveFactory, PrimitiveValue};
use swg_resolve::{file_url, FileLoader, Loader, PrefixHooks, ReferenceResolver};
use swg_schema::Composer;
use tracing::{info, warn};
use url::Url;

use crate::config::ScanConfig;
use crate::pipeline::Pipeline;
use crate::report::ScanReport;

#[derive(Debug)]
pub struct SwaggerApp {
    graph: SchemaGraph,
    resolver: ReferenceResolver,
    root: NodeId,
    url: Url,
    report: ScanReport,
    factory: PrimitiveFactory,
    config: ScanConfig,
}

impl SwaggerApp {
    /// Load the document at `url` through `loader`, build it and run the
    /// standard pipeline.
    ///
    /// # Errors
    ///
    /// Any hard error of loading or of a pass. In strict mode, a document
    /// with diagnostics fails with [`SchemaError::Rejected`].
    pub fn load(url: &str, loader: impl Loader + 'static, config: ScanConfig) -> SwgResult<Self> {
        let mut resolver = ReferenceResolver::new(loader);
        let hooks = PrefixHooks::new(&config.load_hooks);
        if !hooks.is_empty() {
            resolver.set_hook(Some(hooks.into_hook()));
        }

        let url = resolver.normalize_url(url, None)?;
        let raw = resolver.document(&url)?.clone();
        let mut graph = SchemaGraph::new();
        let root = swg_core::build_document(&mut graph, url.as_str(), &raw)?;

        let report = {
            let mut composer = Composer::new(&mut graph, &mut resolver);
            Pipeline::standard(&config).run(&mut composer, root)?
        };

        if let Some(first) = report.diagnostics.first() {
            if config.strict {
                return Err(SchemaError::Rejected {
                    count: report.diagnostics.len(),
                    first: first.to_string(),
                }
                .into());
            }
            warn!(count = report.diagnostics.len(), "document has diagnostics");
        }
        info!(
            url = %url,
            nodes = graph.len(),
            documents = resolver.load_count(),
            cycles = report.cycles.len(),
            "document loaded"
        );

        Ok(Self {
            graph,
            resolver,
            root,
            url,
            report,
            factory: PrimitiveFactory::new(),
            config,
        })
    }

    /// [`load`](Self::load) a file from disk.
    pub fn load_path(path: &Path, config: ScanConfig) -> SwgResult<Self> {
        let url = file_url(path).map_err(|reason| ResolutionError::InvalidUrl {
            url: path.display().to_string(),
            reason,
        })?;
        Self::load(url.as_str(), FileLoader, config)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn factory_mut(&mut self) -> &mut PrimitiveFactory {
        &mut self.factory
    }

    pub fn composer(&mut self) -> Composer<'_> {
        Composer::new(&mut self.graph, &mut self.resolver)
    }

    /// The dereferenced node `reference` addresses, relative to the root
    /// document.
    pub fn resolve(&mut self, reference: &str) -> SwgResult<NodeId> {
        let base = self.url.as_str().to_string();
        let mut composer = self.composer();
        let id = composer.resolve(reference, Some(&base), None)?;
        composer.dereference(id)
    }

    pub fn compose(&mut self, id: NodeId) -> SwgResult<NodeId> {
        self.composer().compose(id)
    }

    pub fn produce(
        &mut self,
        id: NodeId,
        raw: Option<&Value>,
        direction: Direction,
    ) -> SwgResult<Option<PrimitiveValue>> {
        let mut composer = Composer::new(&mut self.graph, &mut self.resolver);
        self.factory.produce(&mut composer, id, raw, direction)
    }

    /// The operation declaring `operation_id`, searched in `paths` order.
    pub fn operation(&self, operation_id: &str) -> Option<NodeId> {
        let NodeData::Swagger(root) = &self.graph.node(self.root).data else {
            return None;
        };
        root.paths
            .iter()
            .filter_map(|(_, item)| match &self.graph.node(*item).data {
                NodeData::PathItem(item) => Some(item),
                _ => None,
            })
            .flat_map(|item| item.operations.iter().map(|(_, op)| *op))
            .find(|op| match &self.graph.node(*op).data {
                NodeData::Operation(op) => op.operation_id.as_deref() == Some(operation_id),
                _ => false,
            })
    }
}
