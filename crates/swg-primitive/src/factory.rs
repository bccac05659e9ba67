//! # Primitive Value Factory
//!
//! A caller-owned registry from `(type, format)` to a [`Handler`], plus the
//! recursive production algorithm that drives it.
//!
//! ## Production steps
//!
//! For a schema node and a raw input value:
//!
//! 1. An absent (or `null`) input falls back to the schema's `default`;
//!    with no default the result is absent.
//! 2. The node is composed to its final form.
//! 3. The context identity is set to the schema name if still unset.
//! 4. The node's identity is registered in the context's cycle guard.
//! 5. A declared `type` selects a handler: the producer builds the value,
//!    the validator checks it and returns the unconsumed residual input.
//! 6. Otherwise, declared properties (or `additionalProperties`) produce a
//!    model. The discriminator property of a model is forced to the context
//!    identity.
//! 7. Byte, date, date-time and file values skip `allOf` handling.
//! 8. The original node's `allOf` members either discover the value kind
//!    (when nothing was produced yet) or validate the produced value.
//! 9. Models are cleaned up with the residual input.
//!
//! Handler lookup falls back from `(type, format)` to `(type, None)`, so an
//! unregistered format of a known type is produced as the plain type.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;
use serde_json::Value;
use swg_core::{NodeId, SchemaError, SchemaFields, SchemaGraph, SwgError, SwgResult};
use swg_schema::Composer;
use tracing::trace;

use crate::context::{Direction, ProductionContext};
use crate::value::PrimitiveValue;
use crate::{array, builtin, model};

/// Builds a value from raw input against a composed schema node.
pub type Producer = Arc<
    dyn Fn(&mut Production<'_, '_>, &mut ProductionContext, NodeId, &Value) -> SwgResult<PrimitiveValue>
        + Send
        + Sync,
>;

/// Checks a produced value against a composed schema node and returns the
/// part of the raw input it did not consume.
pub type Validator = Arc<
    dyn Fn(
            &mut Production<'_, '_>,
            &mut ProductionContext,
            NodeId,
            &PrimitiveValue,
            &Value,
        ) -> SwgResult<Option<Value>>
        + Send
        + Sync,
>;

/// Producer plus optional validator for one `(type, format)` pair.
#[derive(Clone)]
pub struct Handler {
    producer: Producer,
    validator: Option<Validator>,
}

impl Handler {
    pub fn new<P>(producer: P) -> Self
    where
        P: Fn(&mut Production<'_, '_>, &mut ProductionContext, NodeId, &Value) -> SwgResult<PrimitiveValue>
            + Send
            + Sync
            + 'static,
    {
        Self {
            producer: Arc::new(producer),
            validator: None,
        }
    }

    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(
                &mut Production<'_, '_>,
                &mut ProductionContext,
                NodeId,
                &PrimitiveValue,
                &Value,
            ) -> SwgResult<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

type HandlerKey = (String, Option<String>);

/// Compiled `pattern` regexes keyed by source, shared between clones.
#[derive(Debug, Clone, Default)]
struct PatternCache(Arc<Mutex<HashMap<String, Regex>>>);

impl PatternCache {
    fn get(&self, pattern: &str) -> Result<Regex, regex::Error> {
        let mut cache = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern)?;
        cache.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// The `(type, format)` handler table.
#[derive(Debug, Clone)]
pub struct PrimitiveFactory {
    handlers: HashMap<HandlerKey, Handler>,
    patterns: PatternCache,
}

impl Default for PrimitiveFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimitiveFactory {
    /// A factory with every built-in handler registered.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        builtin::register(&mut factory);
        array::register(&mut factory);
        model::register(&mut factory);
        factory
    }

    /// A factory with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            patterns: PatternCache::default(),
        }
    }

    /// Register or replace the handler for `(type_, format)`. A `None`
    /// format is the fallback for every unregistered format of `type_`.
    pub fn register(&mut self, type_: &str, format: Option<&str>, handler: Handler) -> Option<Handler> {
        self.handlers
            .insert((type_.to_string(), format.map(str::to_string)), handler)
    }

    pub fn unregister(&mut self, type_: &str, format: Option<&str>) -> Option<Handler> {
        self.handlers
            .remove(&(type_.to_string(), format.map(str::to_string)))
    }

    pub fn handler(&self, type_: &str, format: Option<&str>) -> Option<&Handler> {
        let exact = (type_.to_string(), format.map(str::to_string));
        self.handlers
            .get(&exact)
            .or_else(|| self.handlers.get(&(type_.to_string(), None)))
    }

    /// The compiled form of a schema `pattern`, compiled on first use.
    pub fn pattern(&self, pattern: &str) -> Result<Regex, regex::Error> {
        self.patterns.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Produce a value for `node` from `raw` in a fresh context.
    ///
    /// # Errors
    ///
    /// Composition errors, [`SchemaError`]s for unhandled types and
    /// under-specified `allOf`, and [`ValidationError`](swg_core::ValidationError)s
    /// for bad input. No partial value is returned on error.
    pub fn produce(
        &self,
        composer: &mut Composer<'_>,
        node: NodeId,
        raw: Option<&Value>,
        direction: Direction,
    ) -> SwgResult<Option<PrimitiveValue>> {
        let mut ctx = ProductionContext::new(direction);
        let mut production = Production {
            factory: self,
            composer,
        };
        production.produce(node, raw, &mut ctx)
    }
}

/// One production run: the handler table plus the composer it needs to
/// reach composed schemas.
pub struct Production<'p, 'c> {
    factory: &'p PrimitiveFactory,
    composer: &'p mut Composer<'c>,
}

impl<'p, 'c> Production<'p, 'c> {
    pub fn new(factory: &'p PrimitiveFactory, composer: &'p mut Composer<'c>) -> Self {
        Self { factory, composer }
    }

    pub fn factory(&self) -> &'p PrimitiveFactory {
        self.factory
    }

    pub fn graph(&self) -> &SchemaGraph {
        self.composer.graph()
    }

    pub fn compose(&mut self, node: NodeId) -> SwgResult<NodeId> {
        self.composer.compose(node)
    }

    /// Schema fields of `node`, which must be schema-like.
    pub fn fields(&self, node: NodeId) -> SwgResult<&SchemaFields> {
        let graph = self.composer.graph();
        graph
            .schema_fields(node)
            .ok_or_else(|| SwgError::malformed(graph.describe(node), "not a schema object"))
    }

    /// Run the production steps for `node` within `ctx`.
    pub fn produce(
        &mut self,
        node: NodeId,
        raw: Option<&Value>,
        ctx: &mut ProductionContext,
    ) -> SwgResult<Option<PrimitiveValue>> {
        let final_id = self.compose(node)?;
        let fields = self.fields(final_id)?.clone();

        let defaulted;
        let raw = match raw.filter(|v| !v.is_null()) {
            Some(raw) => raw,
            None => {
                let fallback = fields
                    .default
                    .clone()
                    .or_else(|| self.graph().schema_fields(node).and_then(|f| f.default.clone()));
                match fallback {
                    Some(value) => {
                        defaulted = value;
                        &defaulted
                    }
                    None => return Ok(None),
                }
            }
        };

        let name = fields
            .name
            .clone()
            .or_else(|| self.graph().node(node).name().map(str::to_string));
        if let Some(name) = &name {
            ctx.set_identity_once(name);
        }

        let identity = self.composer.identity(node);
        let label = self.graph().describe(identity);
        ctx.guard_mut().visit(identity, label)?;
        trace!(node = %self.graph().describe(node), "producing");

        let (mut value, mut residual) = match &fields.type_ {
            Some(type_) => {
                let (value, residual) = self.run_handler(type_, fields.format.as_deref(), final_id, raw, ctx)?;
                (Some(value), residual)
            }
            None if !fields.properties.is_empty() || fields.additional_properties.is_set() => {
                let (value, residual) = self.run_handler("object", None, final_id, raw, ctx)?;
                (Some(value), residual)
            }
            None => (None, None),
        };

        if let (Some(PrimitiveValue::Model(produced)), Some(discriminator), Some(identity)) =
            (value.as_mut(), fields.discriminator.as_ref(), ctx.identity())
        {
            produced.insert(discriminator.clone(), PrimitiveValue::String(identity.to_string()));
        }

        let terminal = value.as_ref().is_some_and(PrimitiveValue::is_terminal);
        if !terminal {
            let members = self
                .graph()
                .schema_fields(node)
                .map(|f| f.all_of.clone())
                .unwrap_or_default();
            if !members.is_empty() {
                value = Some(self.apply_all_of(node, &members, value, raw, ctx)?);
                if residual.is_none() && value.as_ref().is_some_and(|v| v.as_model().is_some()) {
                    residual = model::residual(self.graph(), final_id, raw);
                }
            }
        }

        if let Some(PrimitiveValue::Model(produced)) = value.as_mut() {
            model::cleanup(self, &fields, produced, residual, ctx)?;
        }
        Ok(value)
    }

    fn run_handler(
        &mut self,
        type_: &str,
        format: Option<&str>,
        final_id: NodeId,
        raw: &Value,
        ctx: &mut ProductionContext,
    ) -> SwgResult<(PrimitiveValue, Option<Value>)> {
        let factory = self.factory;
        let handler = factory
            .handler(type_, format)
            .ok_or_else(|| SchemaError::NoHandler {
                type_: type_.to_string(),
                format: format.map(str::to_string),
            })?;
        let value = (handler.producer)(self, ctx, final_id, raw)?;
        let residual = match &handler.validator {
            Some(validator) => validator(self, ctx, final_id, &value, raw)?,
            None => None,
        };
        Ok((value, residual))
    }

    /// Step 8: discover a value kind through the members if needed, then
    /// validate the value against every member that did not produce it.
    fn apply_all_of(
        &mut self,
        node: NodeId,
        members: &[NodeId],
        mut value: Option<PrimitiveValue>,
        raw: &Value,
        ctx: &mut ProductionContext,
    ) -> SwgResult<PrimitiveValue> {
        let mut pending: Vec<NodeId> = Vec::new();
        for &member in members {
            if value.is_none() {
                match self.produce(member, Some(raw), ctx)? {
                    Some(found) => value = Some(found),
                    None => pending.push(member),
                }
            } else {
                pending.push(member);
            }
        }

        let Some(value) = value else {
            return Err(SchemaError::UnderSpecifiedAllOf {
                location: self.graph().describe(node),
            }
            .into());
        };
        for member in pending {
            self.validate_member(member, &value, raw, ctx)?;
        }
        Ok(value)
    }

    /// Apply a member's validator to an already produced value.
    fn validate_member(
        &mut self,
        member: NodeId,
        value: &PrimitiveValue,
        raw: &Value,
        ctx: &mut ProductionContext,
    ) -> SwgResult<()> {
        let final_id = self.compose(member)?;
        let fields = self.fields(final_id)?.clone();
        ctx.defer_required(&fields.required);

        let type_ = match (&fields.type_, value) {
            (Some(type_), _) => type_.clone(),
            (None, PrimitiveValue::Model(_)) => "object".to_string(),
            (None, _) => return Ok(()),
        };
        let factory = self.factory;
        if let Some(validator) = factory
            .handler(&type_, fields.format.as_deref())
            .and_then(|h| h.validator.as_ref())
        {
            // Models consume only their own keys; the member's residual is
            // meaningless for the composed value.
            validator(self, ctx, final_id, value, raw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_unspecified_format() {
        let factory = PrimitiveFactory::new();
        assert!(factory.handler("string", Some("ipv6")).is_some());
        assert!(factory.handler("integer", Some("int32")).is_some());
        assert!(factory.handler("decimal", None).is_none());
    }

    #[test]
    fn register_overrides_builtin() {
        let mut factory = PrimitiveFactory::new();
        let previous = factory.register(
            "string",
            Some("email"),
            Handler::new(|_, _, _, raw| Ok(PrimitiveValue::String(raw.to_string()))),
        );
        assert!(previous.is_some());
        assert!(factory.unregister("string", Some("email")).is_some());
        assert!(factory.handler("string", Some("email")).is_some());
    }

    #[test]
    fn patterns_compile_once() {
        let factory = PrimitiveFactory::new();
        assert!(factory.pattern("^[a-z]+$").unwrap().is_match("rex"));
        assert!(factory.pattern("^[a-z]+$").unwrap().is_match("tom"));
        assert_eq!(factory.patterns.len(), 1);

        assert!(factory.pattern("(").is_err());
        assert_eq!(factory.patterns.len(), 1);

        let clone = factory.clone();
        clone.pattern("^x$").unwrap();
        assert_eq!(factory.patterns.len(), 2);
    }

    #[test]
    fn empty_factory_has_no_handlers() {
        assert!(PrimitiveFactory::empty().is_empty());
        assert!(!PrimitiveFactory::new().is_empty());
    }
}
