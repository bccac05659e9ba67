//! The ordered pass list run over a freshly built document.

use swg_core::{NodeId, SwgResult};
use swg_schema::Composer;
use tracing::debug;

use crate::config::ScanConfig;
use crate::dispatch::Pass;
use crate::passes::{
    AssignParent, ComposeAllOf, DetectCycles, NormalizeRefs, PatchOperations, ResolveRefs, ValidateSpec,
};
use crate::report::ScanReport;

/// Passes run in insertion order, each a full walk from the root.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parents, normalized references, resolution, composition and
    /// operation patching always run. Validation and cycle detection
    /// follow when `config` enables them.
    pub fn standard(config: &ScanConfig) -> Self {
        let mut pipeline = Self::new()
            .with_pass(AssignParent::new())
            .with_pass(NormalizeRefs::new())
            .with_pass(ResolveRefs::new())
            .with_pass(ComposeAllOf::new())
            .with_pass(PatchOperations::new());
        if config.validate {
            pipeline.push(ValidateSpec::new());
        }
        if config.detect_cycles {
            pipeline.push(DetectCycles::new());
        }
        pipeline
    }

    pub fn push(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.push(pass);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass. The first hard error aborts the run.
    pub fn run(self, composer: &mut Composer<'_>, root: NodeId) -> SwgResult<ScanReport> {
        let mut report = ScanReport::default();
        for mut pass in self.passes {
            debug!(pass = pass.name(), "running pass");
            pass.run(composer, root, &mut report)?;
        }
        Ok(report)
    }
}
