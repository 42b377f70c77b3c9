//! An append-only store of compiled schema nodes, addressable by index and by URI.
use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use url::Url;

use crate::{
    error::CompileError,
    node::{self, SchemaIndex, SchemaNode},
    paths::JsonPointer,
};

/// A sealed collection of compiled schemas.
///
/// Every node is reachable by its index and by each URI it was registered under: its
/// canonical location and the locations it has within enclosing documents. A `Registry` is
/// immutable once built and can be shared between threads for concurrent validation.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: Vec<SchemaNode>,
    locations: AHashMap<Url, SchemaIndex>,
    resources: AHashSet<Url>,
    roots: Vec<SchemaIndex>,
}

impl Registry {
    /// Compile `documents` and seal the result.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use jsonschema_vm::Registry;
    ///
    /// let registry = Registry::compile(&[
    ///     json!({"$id": "http://example.com/root", "items": {"$ref": "http://example.com/item"}}),
    ///     json!({"$id": "http://example.com/item", "type": "string"}),
    /// ])
    /// .expect("All references resolve");
    /// assert_eq!(registry.roots().len(), 2);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error on the first malformed keyword, on conflicting definitions, or when
    /// some `$ref` targets are not defined by any of the documents.
    pub fn compile(documents: &[Value]) -> Result<Registry, CompileError> {
        crate::compilation::compile(documents)
    }

    pub(crate) fn new() -> Self {
        Registry::default()
    }

    /// Append `node`, registering it under its canonical URI.
    pub(crate) fn insert(&mut self, node: SchemaNode) -> SchemaIndex {
        let index = self.nodes.len();
        self.locations.entry(node.uri.clone()).or_insert(index);
        self.nodes.push(node);
        index
    }

    /// Register an additional location for an already inserted node.
    pub(crate) fn alias(&mut self, uri: Url, index: SchemaIndex) {
        self.locations.entry(uri).or_insert(index);
    }

    pub(crate) fn add_resource(&mut self, mut uri: Url) {
        uri.set_fragment(None);
        self.resources.insert(uri);
    }

    pub(crate) fn add_root(&mut self, index: SchemaIndex) {
        self.roots.push(index);
    }

    /// Check that every `$ref` target is defined.
    ///
    /// Nodes are visited in insertion order, so missing targets are listed in the post-order
    /// of the documents, each unique URI once.
    pub(crate) fn seal(&self) -> Result<(), CompileError> {
        let mut seen = AHashSet::new();
        let mut missing = Vec::new();
        for reference in self.nodes.iter().filter_map(|node| node.reference.as_ref()) {
            let unresolved = if !self.resources.contains(&reference.base) {
                &reference.base
            } else if !self.locations.contains_key(&reference.target) {
                &reference.target
            } else {
                continue;
            };
            if seen.insert(unresolved) {
                missing.push(unresolved.clone());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            tracing::debug!(missing = missing.len(), "Unresolved references found while sealing");
            Err(CompileError::UnresolvedReferences { uris: missing })
        }
    }

    /// Get a node by its index.
    #[must_use]
    pub fn get(&self, index: SchemaIndex) -> Option<&SchemaNode> {
        self.nodes.get(index)
    }

    /// Canonical URI of the node at `index`.
    #[must_use]
    pub fn uri_of(&self, index: SchemaIndex) -> Option<&Url> {
        self.nodes.get(index).map(SchemaNode::uri)
    }

    #[inline]
    pub(crate) fn node(&self, index: SchemaIndex) -> &SchemaNode {
        &self.nodes[index]
    }

    /// Find the node registered at `uri`.
    ///
    /// The fragment, if any, is interpreted as a JSON Pointer into the document.
    #[must_use]
    pub fn resolve(&self, uri: &Url) -> Option<SchemaIndex> {
        let pointer = JsonPointer::parse(uri.fragment().unwrap_or_default()).ok()?;
        self.locations
            .get(&node::location(uri, &pointer))
            .copied()
    }

    /// Look up an already normalized location, such as a [`crate::node::Reference`] target.
    #[inline]
    pub(crate) fn lookup(&self, uri: &Url) -> Option<SchemaIndex> {
        self.locations.get(uri).copied()
    }

    /// Whether some document or `$id` scope is identified by `uri` (fragment ignored).
    #[must_use]
    pub fn contains_resource(&self, uri: &Url) -> bool {
        let mut uri = uri.clone();
        uri.set_fragment(None);
        self.resources.contains(&uri)
    }

    /// Root node of the first compiled document.
    #[must_use]
    pub fn root(&self) -> Option<SchemaIndex> {
        self.roots.first().copied()
    }

    /// Root nodes of all compiled documents, in input order.
    #[must_use]
    pub fn roots(&self) -> &[SchemaIndex] {
        &self.roots
    }

    /// Number of compiled nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
