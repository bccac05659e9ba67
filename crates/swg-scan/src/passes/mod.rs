//! The pipeline's passes, in the order [`Pipeline::standard`] runs them.
//!
//! [`Pipeline::standard`]: crate::pipeline::Pipeline::standard

mod compose;
mod cycles;
mod normalize;
mod parent;
mod patch;
mod resolve;
mod validate;

pub use compose::ComposeAllOf;
pub use cycles::DetectCycles;
pub use normalize::NormalizeRefs;
pub use parent::AssignParent;
pub use patch::PatchOperations;
pub use resolve::ResolveRefs;
pub use validate::ValidateSpec;

use swg_core::NodeKind;

/// Kinds that may carry a `$ref`.
const REFERABLE: [NodeKind; 4] = [
    NodeKind::PathItem,
    NodeKind::Parameter,
    NodeKind::Response,
    NodeKind::Schema,
];
