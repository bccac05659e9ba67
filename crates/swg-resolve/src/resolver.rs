//! # Reference Resolver
//!
//! Splits JSON References, normalizes their document part to an absolute
//! URL, loads each document at most once, and walks the pointer into the
//! cached raw value.
//!
//! The cache is keyed by the URL *before* any load hook redirect, so a
//! hooked document is still found under the name references use for it.
//! A document the loader reports as absent is cached as a not-found
//! sentinel and never requested again.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde_json::Value;
use swg_core::{pointer, Location, ResolutionError};
use tracing::debug;
use url::Url;

use crate::loader::{LoadHook, Loader};

/// Per-resolver document cache plus the loader that fills it.
///
/// All methods take `&mut self`; share a resolver across threads only
/// behind external synchronization.
pub struct ReferenceResolver {
    loader: Box<dyn Loader>,
    hook: Option<LoadHook>,
    cache: HashMap<String, Option<Value>>,
    loads: usize,
}

impl std::fmt::Debug for ReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("cached", &self.cache.len())
            .field("loads", &self.loads)
            .field("hooked", &self.hook.is_some())
            .finish()
    }
}

impl ReferenceResolver {
    pub fn new(loader: impl Loader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            hook: None,
            cache: HashMap::new(),
            loads: 0,
        }
    }

    pub fn with_hook(mut self, hook: LoadHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn set_hook(&mut self, hook: Option<LoadHook>) {
        self.hook = hook;
    }

    /// Number of times the loader was actually called.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn is_cached(&self, url: &Url) -> bool {
        self.cache.contains_key(url.as_str())
    }

    /// Normalize the document part of a reference into an absolute URL.
    ///
    /// An empty document part means the referring document `base`. Relative
    /// parts are joined against `base`; without a base they are treated as
    /// filesystem paths relative to the working directory.
    pub fn normalize_url(&self, raw: &str, base: Option<&str>) -> Result<Url, ResolutionError> {
        let invalid = |reason: String| ResolutionError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            let base = base.ok_or_else(|| invalid("same-document reference without a base document".to_string()))?;
            return Url::parse(base).map_err(|e| invalid(e.to_string()));
        }

        match Url::parse(raw) {
            // One-letter schemes are Windows drive letters, not URLs.
            Ok(url) if url.scheme().len() > 1 => Ok(url),
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => match base {
                Some(base) => {
                    let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
                    base.join(raw).map_err(|e| invalid(e.to_string()))
                }
                None => file_url(Path::new(raw)).map_err(invalid),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    /// Split `reference` into its normalized document URL and canonical
    /// pointer.
    pub fn split(&self, reference: &str, base: Option<&str>) -> Result<(Url, String), ResolutionError> {
        let (raw_url, raw_pointer) = pointer::split_reference(reference);
        let url = self.normalize_url(raw_url, base)?;
        let pointer = pointer::normalize(raw_pointer).map_err(|_| ResolutionError::InvalidReference {
            reference: reference.to_string(),
            reason: "pointer must be empty or start with '/'".to_string(),
        })?;
        Ok((url, pointer))
    }

    /// Absolute location `reference` addresses, relative to `base`.
    pub fn locate(&self, reference: &str, base: Option<&str>) -> Result<Location, ResolutionError> {
        let (url, pointer) = self.split(reference, base)?;
        Ok(Location::new(url.as_str(), pointer))
    }

    /// The raw document at `url`, loading it on first use.
    pub fn document(&mut self, url: &Url) -> Result<&Value, ResolutionError> {
        self.document_with(url, None)
    }

    fn document_with(&mut self, url: &Url, loader: Option<&dyn Loader>) -> Result<&Value, ResolutionError> {
        let key = url.as_str().to_string();
        if !self.cache.contains_key(&key) {
            let effective = match &self.hook {
                Some(hook) => hook(url),
                None => url.clone(),
            };
            debug!(url = %key, effective = %effective, "document cache miss");
            self.loads += 1;
            let loaded = match loader {
                Some(loader) => loader.load(&effective)?,
                None => self.loader.load(&effective)?,
            };
            if loaded.is_none() {
                debug!(url = %key, "caching not-found sentinel");
            }
            self.cache.insert(key.clone(), loaded);
        }
        match self.cache.get(&key) {
            Some(Some(value)) => Ok(value),
            _ => Err(ResolutionError::NotFound { url: key }),
        }
    }

    /// Resolve `reference` (relative to document `base`) to a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if the document cannot be loaded or the
    /// pointer cannot be walked.
    pub fn resolve(&mut self, reference: &str, base: Option<&str>) -> Result<&Value, ResolutionError> {
        self.resolve_inner(reference, base, None)
    }

    /// Like [`resolve`](Self::resolve), but a cache miss is served by
    /// `loader` instead of the resolver's own loader.
    pub fn resolve_with(
        &mut self,
        reference: &str,
        base: Option<&str>,
        loader: &dyn Loader,
    ) -> Result<&Value, ResolutionError> {
        self.resolve_inner(reference, base, Some(loader))
    }

    fn resolve_inner(
        &mut self,
        reference: &str,
        base: Option<&str>,
        loader: Option<&dyn Loader>,
    ) -> Result<&Value, ResolutionError> {
        let (url, pointer) = self.split(reference, base)?;
        let document = self.document_with(&url, loader)?;
        pointer::walk(document, reference, &pointer)
    }
}

/// Absolute `file://` URL for a filesystem path.
pub fn file_url(path: &Path) -> Result<Url, String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| format!("cannot determine working directory: {e}"))?
            .join(path)
    };
    Url::from_file_path(&absolute).map_err(|()| format!("{} is not a valid file path", absolute.display()))
}
