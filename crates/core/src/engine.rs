//! The recursive expansion walker.
//!
//! A node is an object. Its expand-key field, when present, is a reference
//! block in one of two shapes:
//!
//! - named: `{"author": "user/1", "tags": ["tag/1", "tag/2"]}`, resolved into
//!   sibling fields of the node;
//! - list: `["item/1", "item/2"]`, resolved into an ordered list that either
//!   replaces the node or is nested under the placeholder field.
//!
//! Each reference block consumes one unit of the depth budget. Blocks met
//! with no budget left are dropped, so raw keys never reach the output.

use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{BatchError, ExpandError, ExpandErrors};
use crate::provider::Provider;

/// Output of [`expand`].
#[derive(Debug, Clone)]
pub struct Expanded {
    /// Encoded result. Equals the input when the root is not an object or
    /// when the expanded tree could not be encoded.
    pub bytes: Vec<u8>,
    /// Non-fatal errors collected along the way.
    pub errors: ExpandErrors,
}

impl Expanded {
    /// Treat any collected error as a failure.
    pub fn into_result(self) -> Result<Vec<u8>, ExpandErrors> {
        self.errors.into_result().map(|()| self.bytes)
    }
}

/// Expand every reference field of an encoded document.
///
/// Only an undecodable input is fatal. Everything else that goes wrong is
/// collected in [`Expanded::errors`] next to a best-effort result.
pub fn expand<P>(provider: &P, input: &[u8], ctx: &P::Context) -> Result<Expanded, ExpandError>
where
    P: Provider + ?Sized,
{
    let value = provider.deserialize(input).map_err(ExpandError::Decode)?;

    let root = match value {
        Value::Object(root) => root,
        _ => {
            tracing::debug!("root is not an object, nothing to expand");
            return Ok(Expanded {
                bytes: input.to_vec(),
                errors: ExpandErrors::new(),
            });
        }
    };

    let walker = Walker::new(provider, ctx);
    let (tree, mut errors) = walker.walk(&root, provider.config().max_depth);

    match provider.serialize(&tree) {
        Ok(bytes) => Ok(Expanded { bytes, errors }),
        Err(e) => {
            tracing::warn!(error = %e, "could not encode expanded document");
            errors.push(ExpandError::Encode(e));
            Ok(Expanded {
                bytes: input.to_vec(),
                errors,
            })
        }
    }
}

/// Expand an already decoded tree. Non-object values are returned as is.
pub fn expand_value<P>(provider: &P, value: Value, ctx: &P::Context) -> (Value, ExpandErrors)
where
    P: Provider + ?Sized,
{
    match value {
        Value::Object(root) => {
            Walker::new(provider, ctx).walk(&root, provider.config().max_depth)
        }
        other => (other, ExpandErrors::new()),
    }
}

struct Walker<'a, P: Provider + ?Sized> {
    provider: &'a P,
    config: &'a Config,
    ctx: &'a P::Context,
}

impl<'a, P: Provider + ?Sized> Walker<'a, P> {
    fn new(provider: &'a P, ctx: &'a P::Context) -> Self {
        Self {
            provider,
            config: provider.config(),
            ctx,
        }
    }

    fn walk(&self, node: &Map<String, Value>, depth: u32) -> (Value, ExpandErrors) {
        let mut errors = ExpandErrors::new();
        let mut fields = Map::new();
        let mut named = Map::new();
        let mut items = Vec::new();
        let mut list_requested = false;

        for (key, value) in node {
            if *key == self.config.expand_key {
                let Some(remaining) = depth.checked_sub(1) else {
                    tracing::debug!("depth budget exhausted, dropping reference block");
                    continue;
                };

                match value {
                    Value::Object(refs) => {
                        let (resolved, errs) = self.resolve_named(refs, remaining);
                        errors.merge(errs);
                        named.extend(resolved);
                    }
                    Value::Array(keys) => {
                        let (resolved, errs) = self.resolve_list(keys, remaining);
                        errors.merge(errs);
                        items.extend(resolved);
                        list_requested = true;
                    }
                    other => {
                        tracing::debug!(shape = shape_of(other), "ignoring reference block");
                    }
                }
                continue;
            }

            match value {
                Value::Object(child) => {
                    let (expanded, errs) = self.walk(child, depth);
                    errors.merge(errs);
                    fields.insert(key.clone(), expanded);
                }
                _ => {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }

        // Resolved names win over ordinary fields of the same name.
        fields.extend(named);

        if !items.is_empty() && !fields.is_empty() {
            fields.insert(self.config.placeholder_key.clone(), Value::Array(items));
            return (Value::Object(fields), errors);
        }

        // A requested list replaces the node even when nothing resolved.
        if list_requested {
            return (Value::Array(items), errors);
        }

        (Value::Object(fields), errors)
    }

    fn resolve_named(
        &self,
        refs: &Map<String, Value>,
        depth: u32,
    ) -> (Map<String, Value>, ExpandErrors) {
        let mut errors = ExpandErrors::new();
        let mut resolved = Map::new();

        for (name, value) in refs {
            if self.config.is_excluded(name) {
                tracing::debug!(name = %name, "skipping excluded reference");
                continue;
            }

            match value {
                Value::Array(keys) => {
                    let (items, errs) = self.resolve_list(keys, depth);
                    errors.merge(errs);
                    resolved.insert(name.clone(), Value::Array(items));
                }
                Value::String(key) => {
                    if let Some((doc, errs)) = self.resolve_one(key, depth) {
                        errors.merge(errs);
                        resolved.insert(name.clone(), doc);
                    }
                }
                other => {
                    tracing::debug!(
                        name = %name,
                        shape = shape_of(other),
                        "ignoring named reference"
                    );
                }
            }
        }

        (resolved, errors)
    }

    /// Fetch and expand a single key. A miss yields `None` and no error.
    fn resolve_one(&self, key: &str, depth: u32) -> Option<(Value, ExpandErrors)> {
        let bytes = match self.provider.read_one(key, self.ctx) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(key, error = %e, "dropping unavailable reference");
                return None;
            }
        };
        let doc = self.decode_object(key, &bytes)?;
        Some(self.walk(&doc, depth))
    }

    fn resolve_list(&self, keys: &[Value], depth: u32) -> (Vec<Value>, ExpandErrors) {
        let mut errors = ExpandErrors::new();

        let keys: Vec<String> = keys
            .iter()
            .filter_map(|k| match k {
                Value::String(s) => Some(s.clone()),
                other => {
                    tracing::debug!(shape = shape_of(other), "ignoring non-string key");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            return (Vec::new(), errors);
        }

        let entries = match self.provider.read_many(&keys, self.ctx) {
            Ok(entries) => entries,
            Err(BatchError { partial, source }) => {
                tracing::warn!(keys = keys.len(), error = %source, "batch fetch failed");
                errors.push(ExpandError::BatchFetch {
                    keys: keys.clone(),
                    source,
                });
                partial
            }
        };

        let mut items = Vec::with_capacity(keys.len());
        for key in &keys {
            let Some(bytes) = entries.get(&self.provider.normalize(key)) else {
                tracing::debug!(key = %key, "dropping unavailable list item");
                continue;
            };
            let Some(doc) = self.decode_object(key, bytes) else {
                continue;
            };
            let (expanded, errs) = self.walk(&doc, depth);
            errors.merge(errs);
            if !expanded.is_null() {
                items.push(expanded);
            }
        }

        (items, errors)
    }

    fn decode_object(&self, key: &str, bytes: &[u8]) -> Option<Map<String, Value>> {
        match self.provider.deserialize(bytes) {
            Ok(Value::Object(doc)) => Some(doc),
            Ok(other) => {
                tracing::debug!(
                    key,
                    shape = shape_of(&other),
                    "referenced entry is not an object"
                );
                None
            }
            Err(e) => {
                tracing::debug!(key, error = %e, "referenced entry is undecodable");
                None
            }
        }
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
