//! # JSON Pointer and JSON Reference helpers
//!
//! A JSON Reference has the form `documentURL#pointer`. The pointer is a
//! `/`-delimited list of tokens in which `~1` stands for `/` and `~0` for
//! `~`. These helpers are purely syntactic: URL normalization and document
//! loading live in `swg-resolve`.

use serde_json::Value;

use crate::error::ResolutionError;

/// Split a reference into its document part and its pointer part.
///
/// Everything before the first `#` is the document URL (possibly empty for
/// a same-document reference); the pointer keeps its leading `#`. A
/// reference without `#` addresses the document root, `"#"`.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.find('#') {
        Some(idx) => (&reference[..idx], &reference[idx..]),
        None => (reference, "#"),
    }
}

/// Escape one pointer token.
pub fn encode_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape one pointer token. `~1` is decoded before `~0` so that `~01`
/// yields `~1` rather than `/`.
pub fn decode_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Decode a `#`-prefixed (or bare) pointer into its unescaped tokens.
pub fn tokens(pointer: &str) -> Result<Vec<String>, ResolutionError> {
    let body = pointer.strip_prefix('#').unwrap_or(pointer);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = body.strip_prefix('/') else {
        return Err(ResolutionError::InvalidReference {
            reference: pointer.to_string(),
            reason: "pointer must be empty or start with '/'".to_string(),
        });
    };
    Ok(rest.split('/').map(decode_token).collect())
}

/// Build a `#`-prefixed pointer from unescaped tokens.
pub fn from_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pointer = String::from("#");
    for token in tokens {
        pointer.push('/');
        pointer.push_str(&encode_token(token.as_ref()));
    }
    pointer
}

/// Append an unescaped token to a `#`-prefixed pointer.
pub fn append(pointer: &str, token: &str) -> String {
    let base = if pointer.is_empty() { "#" } else { pointer };
    format!("{base}/{}", encode_token(token))
}

/// Canonical form of a pointer: re-encoded tokens behind a single `#`.
pub fn normalize(pointer: &str) -> Result<String, ResolutionError> {
    Ok(from_tokens(tokens(pointer)?))
}

/// Short name for the JSON kind of a value, used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Walk `pointer` into `value`. Sequences are indexed numerically, maps by
/// key. `reference` is only used to give errors context.
pub fn walk<'v>(
    value: &'v Value,
    reference: &str,
    pointer: &str,
) -> Result<&'v Value, ResolutionError> {
    let mut current = value;
    for token in tokens(pointer)? {
        current = match current {
            Value::Object(map) => {
                map.get(&token)
                    .ok_or_else(|| ResolutionError::MissingToken {
                        reference: reference.to_string(),
                        token: token.clone(),
                    })?
            }
            Value::Array(items) => {
                let index: usize =
                    token
                        .parse()
                        .map_err(|_| ResolutionError::WrongContainer {
                            reference: reference.to_string(),
                            token: token.clone(),
                            found: "array",
                        })?;
                items.get(index).ok_or_else(|| ResolutionError::MissingToken {
                    reference: reference.to_string(),
                    token: token.clone(),
                })?
            }
            other => {
                return Err(ResolutionError::WrongContainer {
                    reference: reference.to_string(),
                    token,
                    found: value_kind(other),
                })
            }
        };
    }
    Ok(current)
}
