//! Compiled schema nodes.
//!
//! Every sub-schema is stored as an index into the owning [`crate::Registry`], which keeps
//! cyclic schema graphs finite.
use ahash::AHashMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;
use url::Url;

use crate::{paths::JsonPointer, primitive_type::PrimitiveTypesBitMap};

/// Index of a [`SchemaNode`] within a [`crate::Registry`].
pub type SchemaIndex = usize;

/// Characters escaped in location fragments. `%` is included, so `JsonPointer::parse` recovers
/// every token of a pointer from its location.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'%');

/// A deferred `$ref`, looked up only when validation reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub(crate) target: Url,
    pub(crate) base: Url,
    pub(crate) pointer: JsonPointer,
}

impl Reference {
    /// Absolute target location, including the pointer fragment.
    #[must_use]
    pub fn target(&self) -> &Url {
        &self.target
    }
    /// Absolute URI of the target document, without fragment.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }
    /// Pointer into the target document.
    #[must_use]
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }
}

/// A compiled `pattern` or `patternProperties` expression.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    original: String,
    regex: fancy_regex::Regex,
}

impl Pattern {
    pub(crate) fn new(original: &str, regex: fancy_regex::Regex) -> Self {
        Pattern {
            original: original.to_string(),
            regex,
        }
    }

    /// The expression as written in the schema.
    pub(crate) fn as_str(&self) -> &str {
        &self.original
    }

    /// A match that cannot be completed, e.g. on hitting the backtrack limit, is a mismatch.
    pub(crate) fn is_match(&self, text: &str) -> bool {
        match self.regex.is_match(text) {
            Ok(is_match) => is_match,
            Err(error) => {
                tracing::debug!(pattern = %self.original, %error, "Regex evaluation failed");
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Items {
    Single(SchemaIndex),
    Tuple(Vec<SchemaIndex>),
}

#[derive(Debug, Clone)]
pub(crate) enum Dependency {
    Keys(Vec<String>),
    Schema(SchemaIndex),
}

#[derive(Debug, Clone)]
pub(crate) struct Conditional {
    pub(crate) if_: SchemaIndex,
    pub(crate) then_: Option<SchemaIndex>,
    pub(crate) else_: Option<SchemaIndex>,
}

/// The compiled form of one schema object, or of a `true`/`false` schema.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) uri: Url,
    pub(crate) id: Option<Url>,
    pub(crate) trivial: Option<bool>,
    pub(crate) reference: Option<Reference>,
    pub(crate) types: Option<PrimitiveTypesBitMap>,
    // Numbers
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_minimum: Option<f64>,
    pub(crate) exclusive_maximum: Option<f64>,
    pub(crate) multiple_of: Option<f64>,
    // Strings
    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<Pattern>,
    // Arrays
    pub(crate) items: Option<Items>,
    pub(crate) additional_items: Option<SchemaIndex>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) contains: Option<SchemaIndex>,
    // Objects
    pub(crate) properties: AHashMap<String, SchemaIndex>,
    pub(crate) pattern_properties: Vec<(Pattern, SchemaIndex)>,
    pub(crate) additional_properties: Option<SchemaIndex>,
    pub(crate) required: Vec<String>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) dependencies: Vec<(String, Dependency)>,
    pub(crate) property_names: Option<SchemaIndex>,
    // Any instance
    pub(crate) enum_: Option<Vec<Value>>,
    pub(crate) const_: Option<Value>,
    pub(crate) all_of: Vec<SchemaIndex>,
    pub(crate) any_of: Vec<SchemaIndex>,
    pub(crate) one_of: Vec<SchemaIndex>,
    pub(crate) not: Option<SchemaIndex>,
    pub(crate) conditional: Option<Conditional>,
}

impl SchemaNode {
    pub(crate) fn new(uri: Url) -> Self {
        SchemaNode {
            uri,
            id: None,
            trivial: None,
            reference: None,
            types: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
            min_length: None,
            max_length: None,
            pattern: None,
            items: None,
            additional_items: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            contains: None,
            properties: AHashMap::new(),
            pattern_properties: Vec::new(),
            additional_properties: None,
            required: Vec::new(),
            min_properties: None,
            max_properties: None,
            dependencies: Vec::new(),
            property_names: None,
            enum_: None,
            const_: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            not: None,
            conditional: None,
        }
    }

    pub(crate) fn trivial(uri: Url, value: bool) -> Self {
        let mut node = SchemaNode::new(uri);
        node.trivial = Some(value);
        node
    }

    /// Canonical URI of this node: the innermost base URI plus a pointer fragment.
    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The absolute URI introduced by `$id`, if any.
    #[must_use]
    pub fn id(&self) -> Option<&Url> {
        self.id.as_ref()
    }

    /// `Some(value)` for the `true` and `false` schemas.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.trivial
    }

    /// The deferred `$ref` of this node, if any.
    #[must_use]
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// Accepted primitive types, if `type` is present.
    #[must_use]
    pub fn types(&self) -> Option<PrimitiveTypesBitMap> {
        self.types
    }
}

/// Build the location URI for `pointer` within the document identified by `base`.
///
/// An empty pointer yields the base itself, without a trailing `#`.
pub(crate) fn location(base: &Url, pointer: &JsonPointer) -> Url {
    let mut uri = base.clone();
    if pointer.is_empty() {
        uri.set_fragment(None);
    } else {
        let fragment = utf8_percent_encode(&pointer.to_string(), FRAGMENT).to_string();
        uri.set_fragment(Some(&fragment));
    }
    uri
}
