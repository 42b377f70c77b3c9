//! Schema compilation.
//!
//! Every schema object is parsed depth-first into a [`SchemaNode`] and appended to the
//! registry only after all of its sub-schemas, so insertion order is a post-order of each
//! document. `$ref` targets are recorded but not looked up until the registry is sealed.
use std::collections::hash_map::Entry;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use url::Url;

use crate::{
    error::{CompileError, SchemaErrorKind},
    keywords::{self, helpers::equal},
    node::{self, SchemaIndex, SchemaNode},
    paths::JsonPointer,
    registry::Registry,
};

pub(crate) const DEFAULT_ROOT_URL: &str = "json-schema:///";

/// Base URI of documents that do not declare `$id`.
pub(crate) static DEFAULT_SCOPE: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_ROOT_URL).expect("Is a valid URL"));

/// A resolution scope opened by a document root or by a nested `$id`.
#[derive(Debug)]
struct Scope {
    base: Url,
    pointer: JsonPointer,
}

/// Compile `documents` into a sealed [`Registry`].
pub(crate) fn compile(documents: &[Value]) -> Result<Registry, CompileError> {
    tracing::debug!(documents = documents.len(), "Compiling schemas");
    let mut parser = Parser::new();
    for document in documents {
        let root = parser.parse_document(document)?;
        parser.registry.add_root(root);
    }
    let registry = parser.registry;
    registry.seal()?;
    tracing::debug!(nodes = registry.len(), "Schemas compiled");
    Ok(registry)
}

pub(crate) struct Parser<'a> {
    registry: Registry,
    scopes: Vec<Scope>,
    // Raw schema behind every registered location, to tell overlays from conflicts.
    seen: AHashMap<Url, &'a Value>,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        Parser {
            registry: Registry::new(),
            scopes: Vec::new(),
            seen: AHashMap::new(),
        }
    }

    fn parse_document(&mut self, document: &'a Value) -> Result<SchemaIndex, CompileError> {
        self.scopes.clear();
        self.scopes.push(Scope {
            base: DEFAULT_SCOPE.clone(),
            pointer: JsonPointer::new(),
        });
        if !is_schema(document) {
            return Err(self.error("schema", SchemaErrorKind::SchemaNotObject));
        }
        self.parse(document)
    }

    /// Current base URI.
    pub(crate) fn base(&self) -> &Url {
        self.scopes
            .last()
            .map_or(&*DEFAULT_SCOPE, |scope| &scope.base)
    }

    /// Canonical URI of the schema currently being parsed.
    pub(crate) fn uri(&self) -> Url {
        self.scopes.last().map_or_else(
            || DEFAULT_SCOPE.clone(),
            |scope| node::location(&scope.base, &scope.pointer),
        )
    }

    pub(crate) fn error(&self, keyword: &str, kind: SchemaErrorKind) -> CompileError {
        CompileError::schema(keyword, self.uri(), kind)
    }

    /// Resolve a URI reference against the current base URI.
    pub(crate) fn resolve_uri(&self, keyword: &str, reference: &str) -> Result<Url, CompileError> {
        Url::options()
            .base_url(Some(self.base()))
            .parse(reference)
            .map_err(|_| self.error(keyword, SchemaErrorKind::InvalidUri))
    }

    fn push(&mut self, token: &str) {
        for scope in &mut self.scopes {
            scope.pointer.push(token);
        }
    }

    fn pop(&mut self) {
        for scope in &mut self.scopes {
            scope.pointer.pop();
        }
    }

    fn at_document_root(&self) -> bool {
        self.scopes.len() == 1 && self.scopes[0].pointer.is_empty()
    }

    /// Compile the sub-schema found under `keyword` at `path`, relative to the current schema.
    pub(crate) fn subschema(
        &mut self,
        keyword: &str,
        value: &'a Value,
        path: &[&str],
    ) -> Result<SchemaIndex, CompileError> {
        if !is_schema(value) {
            return Err(self.error(keyword, SchemaErrorKind::SchemaNotObject));
        }
        for token in path {
            self.push(token);
        }
        let result = self.parse(value);
        for _ in path {
            self.pop();
        }
        result
    }

    fn parse(&mut self, schema: &'a Value) -> Result<SchemaIndex, CompileError> {
        match schema {
            Value::Bool(value) => {
                let node = SchemaNode::trivial(self.uri(), *value);
                self.register(node, schema)
            }
            Value::Object(object) => self.parse_object(object, schema),
            _ => Err(self.error("schema", SchemaErrorKind::SchemaNotObject)),
        }
    }

    fn parse_object(
        &mut self,
        object: &'a Map<String, Value>,
        schema: &'a Value,
    ) -> Result<SchemaIndex, CompileError> {
        let root = self.at_document_root();
        let id = match object.get("$id") {
            Some(Value::String(raw)) => {
                let mut id = self.resolve_uri("$id", raw)?;
                if id.fragment().is_some_and(|fragment| !fragment.is_empty()) {
                    return Err(self.error("$id", SchemaErrorKind::IdWithFragment));
                }
                id.set_fragment(None);
                Some(id)
            }
            Some(_) => return Err(self.error("$id", SchemaErrorKind::IdNotString)),
            None => None,
        };
        let opened = match &id {
            Some(id) if root => {
                self.scopes[0].base = id.clone();
                false
            }
            Some(id) => {
                self.scopes.push(Scope {
                    base: id.clone(),
                    pointer: JsonPointer::new(),
                });
                true
            }
            None => false,
        };
        if root || opened {
            self.registry.add_resource(self.base().clone());
        }
        let result = self.parse_keywords(object, schema, id);
        if opened {
            self.scopes.pop();
        }
        result
    }

    fn parse_keywords(
        &mut self,
        object: &'a Map<String, Value>,
        schema: &'a Value,
        id: Option<Url>,
    ) -> Result<SchemaIndex, CompileError> {
        let mut node = SchemaNode::new(self.uri());
        node.id = id;
        keywords::ref_::compile(self, object, &mut node)?;
        keywords::type_::compile(self, object, &mut node)?;
        keywords::numeric::compile(self, object, &mut node)?;
        keywords::string::compile(self, object, &mut node)?;
        keywords::array::compile(self, object, &mut node)?;
        keywords::object::compile(self, object, &mut node)?;
        keywords::enum_::compile(self, object, &mut node)?;
        keywords::combinators::compile(self, object, &mut node)?;
        if let Some(definitions) = object.get("definitions") {
            let Value::Object(definitions) = definitions else {
                return Err(self.error("definitions", SchemaErrorKind::InvalidObjectValue));
            };
            for (name, subschema) in definitions {
                self.subschema("definitions", subschema, &["definitions", name.as_str()])?;
            }
        }
        self.register(node, schema)
    }

    /// Append `node` to the registry under every location it has in the open scopes.
    fn register(&mut self, node: SchemaNode, raw: &'a Value) -> Result<SchemaIndex, CompileError> {
        let locations: Vec<Url> = self
            .scopes
            .iter()
            .rev()
            .map(|scope| node::location(&scope.base, &scope.pointer))
            .collect();
        for uri in &locations {
            match self.seen.entry(uri.clone()) {
                Entry::Occupied(previous) => {
                    if !equal(previous.get(), raw) {
                        return Err(CompileError::ConflictingDefinition { uri: uri.clone() });
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(raw);
                }
            }
        }
        let index = self.registry.insert(node);
        for uri in locations.into_iter().skip(1) {
            self.registry.alias(uri, index);
        }
        Ok(index)
    }
}

fn is_schema(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Bool(_))
}
