//! # swg-schema: `$ref` Dereferencing and `allOf` Composition
//!
//! Operates on the `swg-core` arena in place:
//!
//! - [`Composer::dereference`] resolves a node's `$ref` chain under a
//!   per-call [`CycleGuard`](swg_core::CycleGuard) and merges the target in.
//! - [`Composer::compose`] produces the memoized final form of a schema:
//!   reference-free, with every `allOf` member folded in.
//! - [`inheritance`] enforces the single-parent model inheritance rules.
//!
//! Composition is lazy. A `$ref` reached through an `allOf` member is
//! dereferenced when that member is composed, so `$ref → allOf → $ref`
//! chains settle within one call and need no repeated pass.

pub mod composer;
pub mod inheritance;

pub use composer::Composer;
