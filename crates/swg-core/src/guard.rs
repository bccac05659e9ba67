//! Per-traversal cycle detection.

use std::collections::HashSet;

use crate::error::CycleDetectionError;
use crate::model::NodeId;

/// Ordered set of node identities visited by one guarded traversal.
///
/// A guard belongs to exactly one top-level resolve, compose or produce
/// call. Visiting an identity twice is a hard failure.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    seen: HashSet<NodeId>,
    trail: Vec<String>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, labelled for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`CycleDetectionError`] if `id` was already visited.
    pub fn visit(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), CycleDetectionError> {
        let label = label.into();
        if !self.seen.insert(id) {
            let mut trail = self.trail.clone();
            trail.push(label.clone());
            return Err(CycleDetectionError {
                identity: label,
                trail,
            });
        }
        self.trail.push(label);
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Labels in visiting order.
    pub fn trail(&self) -> &[String] {
        &self.trail
    }
}
