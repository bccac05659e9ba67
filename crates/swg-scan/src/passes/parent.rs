use swg_core::{NodeId, NodeKind, SwgResult};
use swg_schema::Composer;
use tracing::debug;

use crate::dispatch::{Dispatcher, Visitor};
use crate::report::ScanReport;

/// Points every child at the first parent the walk reaches it from.
#[derive(Debug, Default)]
pub struct AssignParent {
    assigned: usize,
}

impl AssignParent {
    pub fn new() -> Self {
        Self::default()
    }

    fn adopt_children(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let graph = composer.graph_mut();
        let children = graph.node(id).data.children();
        for (_, child) in children {
            let node = graph.node_mut(child);
            if child != id && node.parent.is_none() {
                node.parent = Some(id);
                self.assigned += 1;
            }
        }
        Ok(())
    }
}

impl Visitor for AssignParent {
    fn name(&self) -> &'static str {
        "assign-parent"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        let mut dispatcher = Dispatcher::new();
        for kind in NodeKind::CONCRETE {
            dispatcher.register(kind, Self::adopt_children);
        }
        dispatcher
    }

    fn finish(&mut self, _: &mut Composer<'_>, _: &mut ScanReport) -> SwgResult<()> {
        debug!(assigned = self.assigned, "parents assigned");
        Ok(())
    }
}
