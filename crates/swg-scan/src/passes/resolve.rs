use swg_core::{NodeId, SwgResult};
use swg_schema::Composer;
use tracing::debug;

use super::REFERABLE;
use crate::dispatch::{Dispatcher, Visitor};
use crate::report::ScanReport;

/// Dereferences every node that carries a `$ref`. The first failure aborts
/// the pass.
#[derive(Debug, Default)]
pub struct ResolveRefs {
    resolved: usize,
}

impl ResolveRefs {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let node = composer.graph().node(id);
        if node.resolved || node.data.reference().is_none() {
            return Ok(());
        }
        composer.dereference(id)?;
        self.resolved += 1;
        Ok(())
    }
}

impl Visitor for ResolveRefs {
    fn name(&self) -> &'static str {
        "resolve-refs"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        let mut dispatcher = Dispatcher::new();
        for kind in REFERABLE {
            dispatcher.register(kind, Self::resolve);
        }
        dispatcher
    }

    fn finish(&mut self, _: &mut Composer<'_>, _: &mut ScanReport) -> SwgResult<()> {
        debug!(resolved = self.resolved, "references resolved");
        Ok(())
    }
}
