//! # Error Types: Structured Error Hierarchy
//!
//! Every failure the core can report falls into one of five families:
//!
//! - [`ResolutionError`]: a reference cannot be loaded or navigated.
//! - [`SwgError::TypeMismatch`]: a resolved reference target is not the
//!   kind of object the referring node expects.
//! - [`CycleDetectionError`]: a guarded traversal revisited a node.
//! - [`SchemaError`]: the document violates a structural contract, or no
//!   producer is registered for a type/format pair.
//! - [`ValidationError`]: a runtime value fails a declared constraint.
//!
//! Resolution and composition errors describe malformed documents and abort
//! the current pass. Validation errors describe bad runtime input and abort
//! the current production call.

use thiserror::Error;

use crate::model::NodeKind;

/// A reference could not be turned into a raw value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The reference string itself is unusable.
    #[error("invalid reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The document part of a reference is not a valid URL or path.
    #[error("invalid document url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The loader reported that nothing exists at this URL.
    #[error("document not found: {url}")]
    NotFound { url: String },

    /// The loader failed while fetching or parsing the document.
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// A pointer token tried to index into a scalar, or into an array with
    /// a non-numeric token.
    #[error("{reference}: token {token:?} cannot index into {found}")]
    WrongContainer {
        reference: String,
        token: String,
        found: &'static str,
    },

    /// A pointer token names a key or index that does not exist.
    #[error("{reference}: token {token:?} does not exist")]
    MissingToken { reference: String, token: String },
}

/// A guarded traversal reached a node identity it had already visited.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cycle detected at {identity} (trail: {})", .trail.join(" -> "))]
pub struct CycleDetectionError {
    /// Location of the node that was revisited.
    pub identity: String,
    /// Locations visited by the traversal, ending with the revisit.
    pub trail: Vec<String>,
}

/// A structural contract of the document (or the handler registry) is
/// violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Production reached a type/format pair nobody registered.
    #[error("no producer registered for type {type_:?} with format {format:?}")]
    NoHandler {
        type_: String,
        format: Option<String>,
    },

    /// A subtype declares a property its parent already declares.
    #[error("{location}: property {property:?} redeclares a property of parent {parent}")]
    Redeclared {
        location: String,
        property: String,
        parent: String,
    },

    /// The parent's discriminator names a property the parent never declares.
    #[error("{location}: discriminator {discriminator:?} is not a declared property of {parent}")]
    DiscriminatorNotDeclared {
        location: String,
        discriminator: String,
        parent: String,
    },

    /// More than one referenced parent appears in a single `allOf`.
    #[error("{location}: multiple inheritance is not supported (parents: {})", .parents.join(", "))]
    MultipleInheritance {
        location: String,
        parents: Vec<String>,
    },

    /// No `allOf` member ever yields a concrete value kind.
    #[error("{location}: no allOf member determines a concrete value kind")]
    UnderSpecifiedAllOf { location: String },

    /// A field has the wrong shape, or a required structural field is absent.
    #[error("{location}: {reason}")]
    Malformed { location: String, reason: String },

    /// Strict scanning found diagnostics.
    #[error("document has {count} diagnostic(s), first: {first}")]
    Rejected { count: usize, first: String },
}

/// A runtime value violates a declared constraint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The raw value cannot be coerced to the declared type.
    #[error("expected {expected}, got {found}")]
    Type { expected: String, found: String },

    /// The raw value does not satisfy the declared format.
    #[error("{value:?} is not a valid {format}")]
    Format { format: String, value: String },

    #[error("{value} is below the minimum {minimum} (exclusive: {exclusive})")]
    Minimum {
        value: f64,
        minimum: f64,
        exclusive: bool,
    },

    #[error("{value} is above the maximum {maximum} (exclusive: {exclusive})")]
    Maximum {
        value: f64,
        maximum: f64,
        exclusive: bool,
    },

    #[error("{value} is not a multiple of {multiple_of}")]
    MultipleOf { value: f64, multiple_of: f64 },

    #[error("length {length} is shorter than minLength {min_length}")]
    MinLength { length: usize, min_length: u64 },

    #[error("length {length} is longer than maxLength {max_length}")]
    MaxLength { length: usize, max_length: u64 },

    #[error("{value:?} does not match pattern {pattern:?}")]
    Pattern { value: String, pattern: String },

    #[error("{value} is not one of the enumerated values")]
    Enum { value: String },

    /// A name listed in `required` is absent from the produced model.
    #[error("missing required property {property:?}")]
    Required { property: String },

    /// A `readOnly` property was supplied while producing a request value.
    #[error("property {property:?} is read-only and cannot be written")]
    ReadOnly { property: String },

    #[error("{count} item(s) is fewer than minItems {min_items}")]
    MinItems { count: usize, min_items: u64 },

    #[error("{count} item(s) is more than maxItems {max_items}")]
    MaxItems { count: usize, max_items: u64 },
}

/// Top-level error type for swg.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwgError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A reference resolved to an object of a different kind.
    #[error("{reference}: expected a {expected} target, found {found}")]
    TypeMismatch {
        reference: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error(transparent)]
    Cycle(#[from] CycleDetectionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type alias used across the swg crates.
pub type SwgResult<T> = Result<T, SwgError>;

impl SwgError {
    /// Shorthand for [`SchemaError::Malformed`].
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        SwgError::Schema(SchemaError::Malformed {
            location: location.into(),
            reason: reason.into(),
        })
    }
}
