//! # Kind-Dispatched Graph Walks
//!
//! A [`Dispatcher`] maps node kinds to visit callbacks. A node is handed to
//! every callback registered for any kind in its
//! [`lineage`](swg_core::NodeKind::lineage), most specific kind first, so a
//! callback registered for `BaseSchema` sees parameters, headers, items and
//! schemas alike.
//!
//! A [`Scanner`] walks the graph pre-order from a root and visits each node
//! once per walk. Nodes shared after dereferencing are visited at the first
//! path that reaches them.
//!
//! Passes are [`Visitor`]s: a state type that builds its own dispatcher and
//! optionally aggregates in [`Visitor::finish`]. Every visitor is a
//! [`Pass`], which is what the pipeline stores.

use std::collections::{HashMap, HashSet};

use swg_core::{NodeId, NodeKind, SwgResult};
use swg_schema::Composer;
use tracing::trace;

use crate::report::ScanReport;

/// Callback invoked with the pass state, the graph, the node and the path
/// the walk reached it by.
pub type VisitFn<S> = fn(&mut S, &mut Composer<'_>, NodeId, &str) -> SwgResult<()>;

/// Kind → callbacks registry for one pass.
pub struct Dispatcher<S> {
    callbacks: HashMap<NodeKind, Vec<VisitFn<S>>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }
}

impl<S> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.callbacks.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("Dispatcher").field("kinds", &kinds).finish()
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, kind: NodeKind, callback: VisitFn<S>) -> Self {
        self.register(kind, callback);
        self
    }

    pub fn register(&mut self, kind: NodeKind, callback: VisitFn<S>) {
        self.callbacks.entry(kind).or_default().push(callback);
    }

    /// Callbacks that apply to a node of `kind`, most specific kind first.
    pub fn callbacks(&self, kind: NodeKind) -> Vec<VisitFn<S>> {
        kind.lineage()
            .iter()
            .filter_map(|k| self.callbacks.get(k))
            .flatten()
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// Pre-order walker over a dispatcher.
#[derive(Debug)]
pub struct Scanner<'d, S> {
    dispatcher: &'d Dispatcher<S>,
}

impl<'d, S> Scanner<'d, S> {
    pub fn new(dispatcher: &'d Dispatcher<S>) -> Self {
        Self { dispatcher }
    }

    /// Visit every node reachable from `root`. Children are read after the
    /// node's callbacks run, so a callback that rewrites a node (by
    /// dereferencing it) steers the walk into the rewritten children.
    ///
    /// Returns the number of nodes visited.
    pub fn walk(&self, composer: &mut Composer<'_>, root: NodeId, state: &mut S) -> SwgResult<usize> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![(root, "#".to_string())];
        while let Some((id, path)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let kind = composer.graph().node(id).kind();
            for callback in self.dispatcher.callbacks(kind) {
                callback(state, composer, id, &path)?;
            }
            let children = composer.graph().node(id).data.children();
            for (key, child) in children.into_iter().rev() {
                if !seen.contains(&child) {
                    stack.push((child, format!("{path}/{key}")));
                }
            }
        }
        trace!(visited = seen.len(), "walk finished");
        Ok(seen.len())
    }
}

/// A pass implemented as kind-dispatched callbacks over its own state.
pub trait Visitor: Sized {
    fn name(&self) -> &'static str;

    fn dispatcher(&self) -> Dispatcher<Self>;

    /// Post-visit aggregation, run once after the walk.
    fn finish(&mut self, _composer: &mut Composer<'_>, _report: &mut ScanReport) -> SwgResult<()> {
        Ok(())
    }
}

/// One step of the pipeline.
pub trait Pass {
    fn name(&self) -> &'static str;

    fn run(&mut self, composer: &mut Composer<'_>, root: NodeId, report: &mut ScanReport) -> SwgResult<()>;
}

impl<V: Visitor> Pass for V {
    fn name(&self) -> &'static str {
        Visitor::name(self)
    }

    fn run(&mut self, composer: &mut Composer<'_>, root: NodeId, report: &mut ScanReport) -> SwgResult<()> {
        let dispatcher = self.dispatcher();
        Scanner::new(&dispatcher).walk(composer, root, self)?;
        self.finish(composer, report)
    }
}
