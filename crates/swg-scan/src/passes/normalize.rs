use swg_core::{NodeId, SwgResult};
use swg_schema::Composer;
use tracing::{debug, trace};

use super::REFERABLE;
use crate::dispatch::{Dispatcher, Visitor};
use crate::report::ScanReport;

/// Rewrites every `$ref` to absolute `url#pointer` form against the
/// document it appears in.
#[derive(Debug, Default)]
pub struct NormalizeRefs {
    rewritten: usize,
}

impl NormalizeRefs {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let node = composer.graph().node(id);
        if node.resolved {
            return Ok(());
        }
        let Some(reference) = node.data.reference().map(str::to_string) else {
            return Ok(());
        };
        let base = node.location.url.clone();

        let absolute = composer.resolver_mut().locate(&reference, Some(&base))?.to_string();
        if absolute != reference {
            trace!(from = %reference, to = %absolute, "normalized reference");
            composer.graph_mut().node_mut(id).data.set_reference(absolute);
            self.rewritten += 1;
        }
        Ok(())
    }
}

impl Visitor for NormalizeRefs {
    fn name(&self) -> &'static str {
        "normalize-refs"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        let mut dispatcher = Dispatcher::new();
        for kind in REFERABLE {
            dispatcher.register(kind, Self::normalize);
        }
        dispatcher
    }

    fn finish(&mut self, _: &mut Composer<'_>, _: &mut ScanReport) -> SwgResult<()> {
        debug!(rewritten = self.rewritten, "references normalized");
        Ok(())
    }
}
