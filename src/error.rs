//! Error types
use std::fmt;

use url::Url;

use crate::paths::JsonPointer;

/// Kinds of malformed keyword values detected while compiling a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// `type` is not a type name or a non-empty array of type names.
    InvalidTypeValue,
    /// A sub-schema position holds something other than an object or a boolean.
    SchemaNotObject,
    /// An array was expected (e.g. `enum`, `allOf`) but something else was found.
    InvalidArrayValue,
    /// A number was expected (e.g. `minimum`, `multipleOf`) but something else was found.
    InvalidNumberValue,
    /// A non-negative integer was expected (e.g. `maxLength`, `minItems`).
    InvalidNaturalValue,
    /// A pattern is not a string or does not compile as a regular expression.
    InvalidRegexpValue,
    /// A boolean was expected (e.g. `uniqueItems`).
    InvalidBoolValue,
    /// A string was expected (e.g. elements of `required`).
    InvalidStringValue,
    /// An object was expected (e.g. `properties`, `dependencies`).
    InvalidObjectValue,
    /// `$id` is not a string.
    IdNotString,
    /// `$id` carries a non-empty fragment.
    IdWithFragment,
    /// `$ref` is not a string.
    RefNotString,
    /// `$id` or `$ref` is not a valid URI reference.
    InvalidUri,
    /// The fragment of a `$ref` is not a JSON Pointer.
    InvalidPointer,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemaErrorKind::InvalidTypeValue => {
                "expected a type name or a non-empty array of type names"
            }
            SchemaErrorKind::SchemaNotObject => "expected a schema (object or boolean)",
            SchemaErrorKind::InvalidArrayValue => "expected a non-empty array",
            SchemaErrorKind::InvalidNumberValue => "expected a number",
            SchemaErrorKind::InvalidNaturalValue => "expected a non-negative integer",
            SchemaErrorKind::InvalidRegexpValue => "expected a valid regular expression",
            SchemaErrorKind::InvalidBoolValue => "expected a boolean",
            SchemaErrorKind::InvalidStringValue => "expected a string",
            SchemaErrorKind::InvalidObjectValue => "expected an object",
            SchemaErrorKind::IdNotString => "`$id` must be a string",
            SchemaErrorKind::IdWithFragment => "`$id` must not have a non-empty fragment",
            SchemaErrorKind::RefNotString => "`$ref` must be a string",
            SchemaErrorKind::InvalidUri => "expected a valid URI reference",
            SchemaErrorKind::InvalidPointer => "URI fragment is not a JSON Pointer",
        })
    }
}

/// Errors that make building a [`crate::Registry`] fail.
///
/// No registry is produced when any of these occur.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A keyword holds a malformed value.
    #[error("Invalid `{keyword}` in schema at '{location}': {kind}")]
    Schema {
        keyword: String,
        location: Url,
        kind: SchemaErrorKind,
    },
    /// Sealing found `$ref` targets that no compiled schema defines.
    #[error("Unresolved references: {}", join(.uris))]
    UnresolvedReferences { uris: Vec<Url> },
    /// Two documents define different schemas at the same location.
    #[error("Conflicting definitions for '{uri}'")]
    ConflictingDefinition { uri: Url },
}

impl CompileError {
    pub(crate) fn schema(keyword: impl Into<String>, location: Url, kind: SchemaErrorKind) -> Self {
        CompileError::Schema {
            keyword: keyword.into(),
            location,
            kind,
        }
    }

    /// Kind of the malformed keyword value, if this is a schema error.
    #[must_use]
    pub fn kind(&self) -> Option<SchemaErrorKind> {
        match self {
            CompileError::Schema { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Missing `$ref` targets, in the order they were first seen. Empty for other errors.
    #[must_use]
    pub fn unresolved(&self) -> &[Url] {
        match self {
            CompileError::UnresolvedReferences { uris } => uris,
            _ => &[],
        }
    }
}

fn join(uris: &[Url]) -> String {
    uris.iter()
        .map(Url::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that abort a single validation call.
///
/// These are distinct from violations, which are reported as [`ValidationError`] data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidateError {
    /// The requested URI does not address any compiled schema.
    #[error("No schema with URI '{uri}'")]
    NoSuchSchema { uri: String },
    /// The requested URI is not a valid absolute URI.
    #[error("Invalid schema URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        source: url::ParseError,
    },
    /// `$ref` recursion went deeper than allowed, most likely because of a reference cycle.
    #[error("Maximum stack depth of {max_depth} exceeded")]
    StackOverflow { max_depth: usize },
}

/// A single violation found while validating an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationError {
    /// Location of the offending value within the instance.
    pub instance_path: JsonPointer,
    /// Location of the failing keyword, relative to `schema_uri`.
    pub schema_path: JsonPointer,
    /// URI of the schema the keyword belongs to.
    pub schema_uri: Url,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is invalid against '{}' at '{}'",
            self.instance_path, self.schema_uri, self.schema_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_display() {
        let error = CompileError::UnresolvedReferences {
            uris: vec![
                Url::parse("http://example.com/1").unwrap(),
                Url::parse("http://example.com/2").unwrap(),
            ],
        };
        assert_eq!(
            error.to_string(),
            "Unresolved references: http://example.com/1, http://example.com/2"
        );
        assert_eq!(error.unresolved().len(), 2);
        assert_eq!(error.kind(), None);
    }

    #[test]
    fn violation_display() {
        let error = ValidationError {
            instance_path: JsonPointer::from(["1"]),
            schema_path: JsonPointer::from(["items", "type"]),
            schema_uri: Url::parse("http://example.com/s").unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "'/1' is invalid against 'http://example.com/s' at '/items/type'"
        );
    }
}
