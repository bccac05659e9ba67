//! # swg-resolve: JSON Reference Resolution
//!
//! Turns `$ref` strings into raw values:
//!
//! - [`ReferenceResolver`] splits a reference into document URL and pointer,
//!   normalizes the URL with the `url` crate, loads and caches the document,
//!   and walks the pointer.
//! - [`Loader`] is the seam to the outside world. [`FileLoader`] reads
//!   JSON or YAML from disk; [`MemoryLoader`] serves fixtures and embedded
//!   documents.
//! - [`PrefixHooks`] turns configured URL prefix rewrites into a load hook.
//!
//! ## Crate Policy
//!
//! - Raw values only. Building typed nodes from them is `swg-core`'s job and
//!   deciding *when* to build is `swg-schema`'s.
//! - No network access: non-`file` URLs must be served by a custom loader or
//!   redirected by a hook.

pub mod loader;
pub mod resolver;

pub use loader::{parse_document, FileLoader, LoadHook, Loader, MemoryLoader, PrefixHooks};
pub use resolver::{file_url, ReferenceResolver};
