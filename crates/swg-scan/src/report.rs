//! Findings collected by the diagnostic passes.

use std::fmt;

use serde::Serialize;

/// One non-fatal finding about the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Absolute location of the offending node.
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Schema cycles through `$ref`, `allOf`, `items` and property edges,
    /// each as the locations along it.
    pub cycles: Vec<Vec<String>>,
}

impl ScanReport {
    /// No diagnostics. Cycles are informational: recursive models are legal.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn cycle_strings(&self) -> impl Iterator<Item = String> + '_ {
        self.cycles.iter().map(|cycle| cycle.join(" -> "))
    }
}
