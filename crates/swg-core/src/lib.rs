//! # swg-core: Foundational Types for swg
//!
//! The leaf of the swg crate DAG. Defines the arena-backed document model
//! that every other crate mutates or reads, the JSON pointer helpers used
//! to address locations inside raw documents, the per-traversal
//! [`CycleGuard`], and the error taxonomy shared by resolution, composition
//! and value production.
//!
//! ## Key Design Principles
//!
//! 1. **Index-based back references.** Nodes live in a [`SchemaGraph`] arena
//!    and refer to each other (including their parent) by [`NodeId`]. No
//!    ownership cycle can be formed regardless of traversal order.
//!
//! 2. **One variant per document-object kind.** [`NodeData`] is a closed
//!    enum; every field of every Swagger 2.0 object is an explicit struct
//!    field. The set of fields explicitly present in the source document is
//!    recorded per node.
//!
//! 3. **Guards are values, not globals.** A [`CycleGuard`] is created per
//!    top-level call and dropped with it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `swg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod builder;
pub mod error;
pub mod guard;
pub mod model;
pub mod pointer;

pub use builder::{build_document, build_node};
pub use error::{
    CycleDetectionError, ResolutionError, SchemaError, SwgError, SwgResult, ValidationError,
};
pub use guard::CycleGuard;
pub use model::{
    AdditionalProperties, CollectionFormat, HttpMethod, Location, Node, NodeData, NodeId,
    NodeKind, Operation, OperationPatch, Parameter, ParameterLocation, PathItem, Response,
    SchemaFields, SchemaGraph, SwaggerObject,
};
pub use pointer::{decode_token, encode_token, split_reference};
