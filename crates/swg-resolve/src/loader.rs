//! # Document Loaders
//!
//! A [`Loader`] turns an absolute document URL into a parsed raw value.
//! `Ok(None)` means "nothing exists there"; the resolver caches that answer
//! as a not-found sentinel. Any other failure is a
//! [`ResolutionError::Load`].
//!
//! YAML documents are parsed with `serde_yaml` and converted into
//! `serde_json::Value` so everything downstream handles one value model.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde_json::Value;
use swg_core::{pointer, ResolutionError};
use tracing::debug;
use url::Url;

/// Fetches raw documents by absolute URL.
pub trait Loader {
    /// # Errors
    ///
    /// Returns [`ResolutionError::Load`] if the document exists but cannot
    /// be read or parsed.
    fn load(&self, url: &Url) -> Result<Option<Value>, ResolutionError>;
}

/// Redirects a document URL before it is handed to the loader.
pub type LoadHook = Box<dyn Fn(&Url) -> Url>;

/// Loads `file://` documents from the local filesystem.
///
/// `.yaml`/`.yml` files are parsed as YAML. Everything else is parsed as
/// JSON first and as YAML if that fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl Loader for FileLoader {
    fn load(&self, url: &Url) -> Result<Option<Value>, ResolutionError> {
        if url.scheme() != "file" {
            return Err(ResolutionError::Load {
                url: url.to_string(),
                reason: format!("scheme {:?} is not supported by the file loader", url.scheme()),
            });
        }
        let path = url.to_file_path().map_err(|()| ResolutionError::InvalidUrl {
            url: url.to_string(),
            reason: "not a local file path".to_string(),
        })?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ResolutionError::Load {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        debug!(path = %path.display(), bytes = content.len(), "read document");

        parse_document(url, &path, &content).map(Some)
    }
}

/// Parse document text, choosing the format from the file extension.
pub fn parse_document(url: &Url, path: &Path, content: &str) -> Result<Value, ResolutionError> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if !is_yaml {
        if let Ok(value) = serde_json::from_str::<Value>(content) {
            return Ok(value);
        }
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| ResolutionError::Load {
        url: url.to_string(),
        reason: format!("YAML parse error: {e}"),
    })?;
    YamlDocument { url }.convert(yaml, "")
}

/// Converts parsed YAML into the JSON value model. Errors name the pointer
/// of the offending node.
struct YamlDocument<'u> {
    url: &'u Url,
}

impl YamlDocument<'_> {
    fn fail(&self, at: &str, reason: impl std::fmt::Display) -> ResolutionError {
        let at = if at.is_empty() { "#" } else { at };
        ResolutionError::Load {
            url: self.url.to_string(),
            reason: format!("{reason} at {at}"),
        }
    }

    fn convert(&self, yaml: serde_yaml::Value, at: &str) -> Result<Value, ResolutionError> {
        use serde_yaml::Value as Yaml;

        Ok(match yaml {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::String(s) => Value::String(s),
            Yaml::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => Value::from(i),
                (None, Some(u), _) => Value::from(u),
                (None, None, Some(f)) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| self.fail(at, format!("non-finite number {f}")))?,
                _ => return Err(self.fail(at, format!("unsupported number {n}"))),
            },
            Yaml::Sequence(items) => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.convert(item, &pointer::append(at, &i.to_string())))
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(entries) => {
                let mut object = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries {
                    // Response codes like `200:` arrive as numbers.
                    let key = match key {
                        Yaml::String(s) => s,
                        Yaml::Number(n) => n.to_string(),
                        Yaml::Bool(b) => b.to_string(),
                        other => {
                            let kind = match other {
                                Yaml::Null => "null",
                                Yaml::Sequence(_) => "sequence",
                                Yaml::Mapping(_) => "mapping",
                                _ => "tagged",
                            };
                            return Err(self.fail(at, format!("{kind} used as a map key")));
                        }
                    };
                    let child = pointer::append(at, &key);
                    object.insert(key, self.convert(value, &child)?);
                }
                Value::Object(object)
            }
            Yaml::Tagged(tagged) => self.convert(tagged.value, at)?,
        })
    }
}

/// Serves documents from memory, keyed by absolute URL string.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, Value>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document. `url` must already be in normalized form
    /// (what [`Url::as_str`] returns).
    pub fn insert(&mut self, url: impl Into<String>, document: Value) -> &mut Self {
        self.documents.insert(url.into(), document);
        self
    }

    pub fn with(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }
}

impl Loader for MemoryLoader {
    fn load(&self, url: &Url) -> Result<Option<Value>, ResolutionError> {
        Ok(self.documents.get(url.as_str()).cloned())
    }
}

/// URL prefix rewrites, longest prefix first.
#[derive(Debug, Clone, Default)]
pub struct PrefixHooks {
    rewrites: Vec<(String, String)>,
}

impl PrefixHooks {
    pub fn new(rewrites: &BTreeMap<String, String>) -> Self {
        let mut rewrites: Vec<(String, String)> = rewrites
            .iter()
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();
        rewrites.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { rewrites }
    }

    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    /// Apply the longest matching rewrite. A rewrite that does not produce
    /// a valid URL leaves the input unchanged.
    pub fn rewrite(&self, url: &Url) -> Url {
        let raw = url.as_str();
        for (from, to) in &self.rewrites {
            if let Some(rest) = raw.strip_prefix(from.as_str()) {
                match Url::parse(&format!("{to}{rest}")) {
                    Ok(rewritten) => {
                        debug!(from = %url, to = %rewritten, "load hook redirect");
                        return rewritten;
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, prefix = %to, error = %e, "ignoring invalid rewrite");
                        return url.clone();
                    }
                }
            }
        }
        url.clone()
    }

    pub fn into_hook(self) -> LoadHook {
        Box::new(move |url| self.rewrite(url))
    }
}
