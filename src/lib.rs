//! # jsonschema-vm
//!
//! Compile a set of JSON Schema documents that reference each other into a [`Registry`], then
//! validate any number of instances against it.
//!
//! Compilation parses every schema object into an indexed node, resolves `$id` scopes and
//! records `$ref` targets without following them. Once all documents are in, the registry is
//! sealed: every reference must point at a compiled schema, otherwise the build fails with the
//! list of missing URIs. Validation then follows references lazily, so recursive and mutually
//! recursive schemas are fine; a configurable depth ceiling turns reference cycles into an
//! error instead of endless recursion.
//!
//! ## Usage Examples:
//! ```rust
//! use jsonschema_vm::{compile, validate};
//! use serde_json::json;
//!
//! let registry = compile(&[
//!     json!({
//!         "$id": "http://example.com/person",
//!         "properties": {"name": {"$ref": "http://example.com/name"}},
//!         "required": ["name"]
//!     }),
//!     json!({"$id": "http://example.com/name", "type": "string"}),
//! ])
//! .expect("Valid schemas");
//!
//! let result = validate(&registry, &json!({"name": 42})).expect("Validation completes");
//! for error in &result {
//!     // '/name' is invalid against 'http://example.com/name' at '/type'
//!     println!("{error}");
//! }
//! assert!(!result.is_valid());
//! ```
//!
//! Validation can be tuned through [`ValidationOptions`]:
//! ```rust
//! # use jsonschema_vm::compile;
//! # use serde_json::json;
//! let registry = compile(&[json!({"multipleOf": 0.1})]).expect("Valid schema");
//! let result = jsonschema_vm::options()
//!     .with_max_errors(10)
//!     .with_epsilon(1e-6)
//!     .validate(&registry, &json!(0.3))
//!     .expect("Validation completes");
//! assert!(result.is_valid());
//! ```
#![warn(
    clippy::cast_possible_truncation,
    clippy::doc_markdown,
    clippy::explicit_iter_loop,
    clippy::map_unwrap_or,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::needless_pass_by_value,
    clippy::print_stdout,
    clippy::redundant_closure,
    clippy::trivially_copy_pass_by_ref,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    variant_size_differences
)]
mod compilation;
pub mod error;
mod keywords;
pub mod node;
mod options;
mod output;
pub mod paths;
pub mod primitive_type;
mod registry;
mod vm;

pub use error::{CompileError, SchemaErrorKind, ValidateError, ValidationError};
pub use node::{Reference, SchemaIndex, SchemaNode};
pub use options::{ValidationOptions, DEFAULT_EPSILON, DEFAULT_MAX_STACK_DEPTH};
pub use output::ValidationResult;
pub use paths::{JsonPointer, PointerError};
pub use registry::Registry;
use serde_json::Value;

/// Compile `documents` into a sealed [`Registry`].
///
/// Documents without `$id` share the base URI `json-schema:///`.
///
/// # Errors
///
/// Fails on the first malformed keyword, on two different schemas claiming the same location,
/// or when some `$ref` targets are left undefined once all documents are compiled.
#[inline]
pub fn compile(documents: &[Value]) -> Result<Registry, CompileError> {
    Registry::compile(documents)
}

/// Default validation options, to be tuned with the `with_*` methods.
#[must_use]
#[inline]
pub fn options() -> ValidationOptions {
    ValidationOptions::default()
}

/// Validate `instance` against the root of the first document in `registry`, with default
/// options.
///
/// ```rust
/// use serde_json::json;
///
/// let registry = jsonschema_vm::compile(&[json!({"maxLength": 5})]).expect("Valid schema");
/// let result = jsonschema_vm::validate(&registry, &json!("foo")).expect("Validation completes");
/// assert!(result.is_valid());
/// ```
///
/// # Errors
///
/// Fails if the registry holds no document or if `$ref` recursion goes deeper than
/// [`DEFAULT_MAX_STACK_DEPTH`].
#[inline]
pub fn validate(
    registry: &Registry,
    instance: &Value,
) -> Result<ValidationResult, ValidateError> {
    ValidationOptions::default().validate(registry, instance)
}

/// Validate `instance` against the schema registered at `uri`, with default options.
///
/// # Errors
///
/// See [`ValidationOptions::validate_uri`].
#[inline]
pub fn validate_uri(
    registry: &Registry,
    uri: &str,
    instance: &Value,
) -> Result<ValidationResult, ValidateError> {
    ValidationOptions::default().validate_uri(registry, uri, instance)
}

/// A shortcut for checking `instance` against the first document in `registry`.
///
/// # Errors
///
/// See [`ValidationOptions::is_valid`].
#[inline]
pub fn is_valid(registry: &Registry, instance: &Value) -> Result<bool, ValidateError> {
    ValidationOptions::default().is_valid(registry, instance)
}


#[cfg(test)]
mod tests {
    use super::{compile, is_valid};
    use serde_json::json;

    #[test]
    fn test_is_valid() {
        let registry = compile(&[json!({"minLength": 5})]).unwrap();
        assert!(is_valid(&registry, &json!("foobar")).unwrap());
        assert!(!is_valid(&registry, &json!("foo")).unwrap());
    }
}
