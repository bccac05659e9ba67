//! Per-call production state.

use swg_core::{AdditionalProperties, CycleGuard};

/// Whether a value is being read from a response or written into a
/// request. `readOnly` properties may only appear when reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Read,
    Write,
}

/// State owned by one top-level production call.
///
/// `allOf` members are produced with the same context, so they share the
/// identity and the guard. Properties and array items get a
/// [`child`](Self::child) context: same direction, fresh everything else.
#[derive(Debug, Default)]
pub struct ProductionContext {
    identity: Option<String>,
    guard: CycleGuard,
    pending_additional: AdditionalProperties,
    pending_required: Vec<String>,
    direction: Direction,
}

impl ProductionContext {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn child(&self) -> Self {
        Self::new(self.direction)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Schema name established by the outermost call.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Set the identity unless an outer call already did.
    pub fn set_identity_once(&mut self, name: &str) {
        if self.identity.is_none() {
            self.identity = Some(name.to_string());
        }
    }

    pub fn guard_mut(&mut self) -> &mut CycleGuard {
        &mut self.guard
    }

    pub fn set_pending_additional(&mut self, additional: AdditionalProperties) {
        self.pending_additional = additional;
    }

    pub fn take_pending_additional(&mut self) -> AdditionalProperties {
        std::mem::take(&mut self.pending_additional)
    }

    /// Names an `allOf` member requires, checked during model cleanup.
    pub fn defer_required(&mut self, names: &[String]) {
        for name in names {
            if !self.pending_required.contains(name) {
                self.pending_required.push(name.clone());
            }
        }
    }

    pub fn take_pending_required(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_required)
    }
}
