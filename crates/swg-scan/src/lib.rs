//! # swg-scan: Scan Orchestration
//!
//! Turns a freshly built document graph into a resolved, composed and
//! checked one by running a fixed list of graph walks over it.
//!
//! ## Pipeline
//!
//! | Pass               | Effect                                                     |
//! |--------------------|------------------------------------------------------------|
//! | `assign-parent`    | every child points at the first parent reaching it         |
//! | `normalize-refs`   | `$ref` strings become absolute `url#pointer`               |
//! | `resolve-refs`     | every `$ref` is dereferenced (hard errors abort)           |
//! | `compose-all-of`   | every `allOf` is composed (inheritance errors abort)       |
//! | `patch-operations` | operations get their effective url, parameters and media   |
//! | `validate-document`| structural diagnostics, optional                           |
//! | `detect-cycles`    | informational schema cycle list, optional                  |
//!
//! Each pass is a [`Visitor`](dispatch::Visitor): kind-dispatched callbacks
//! over a pre-order walk, see [`dispatch`].
//!
//! ## Crate Policy
//!
//! - Hard errors are [`SwgError`](swg_core::SwgError)s. Findings a document
//!   can survive are [`Diagnostic`]s in the [`ScanReport`].
//! - [`SwaggerApp`] is the entry point most callers want.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod passes;
pub mod pipeline;
pub mod report;

pub use app::SwaggerApp;
pub use config::{ConfigError, ScanConfig};
pub use dispatch::{Dispatcher, Pass, Scanner, VisitFn, Visitor};
pub use pipeline::Pipeline;
pub use report::{Diagnostic, ScanReport};
