use swg_core::{NodeId, NodeKind, SwgResult};
use swg_schema::Composer;
use tracing::debug;

use crate::dispatch::{Dispatcher, Visitor};
use crate::report::ScanReport;

/// Composes every schema-like node that declares `allOf`, which also
/// enforces the inheritance rules.
#[derive(Debug, Default)]
pub struct ComposeAllOf {
    composed: usize,
}

impl ComposeAllOf {
    pub fn new() -> Self {
        Self::default()
    }

    fn compose(&mut self, composer: &mut Composer<'_>, id: NodeId, _: &str) -> SwgResult<()> {
        let declares_all_of = composer
            .graph()
            .schema_fields(id)
            .is_some_and(|fields| !fields.all_of.is_empty());
        if declares_all_of {
            composer.compose(id)?;
            self.composed += 1;
        }
        Ok(())
    }
}

impl Visitor for ComposeAllOf {
    fn name(&self) -> &'static str {
        "compose-all-of"
    }

    fn dispatcher(&self) -> Dispatcher<Self> {
        Dispatcher::new().on(NodeKind::BaseSchema, Self::compose)
    }

    fn finish(&mut self, _: &mut Composer<'_>, _: &mut ScanReport) -> SwgResult<()> {
        debug!(composed = self.composed, "allOf composed");
        Ok(())
    }
}
