use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    compilation::DEFAULT_ROOT_URL, error::ValidateError, node::SchemaIndex,
    output::ValidationResult, registry::Registry, vm::Vm,
};

/// Default ceiling on nested `$ref` jumps.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 64;
/// Default tolerance of `multipleOf`.
pub const DEFAULT_EPSILON: f64 = 1e-3;

/// Configuration of a validation call.
///
/// Options can be built in code or loaded from a configuration document; missing fields take
/// their defaults:
///
/// ```rust
/// use jsonschema_vm::ValidationOptions;
///
/// let options: ValidationOptions =
///     serde_json::from_str(r#"{"maxErrors": 10}"#).expect("Valid options");
/// assert_eq!(options.max_errors(), 10);
/// assert_eq!(options.max_stack_depth(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOptions {
    max_errors: usize,
    max_stack_depth: usize,
    epsilon: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            max_errors: usize::MAX,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl ValidationOptions {
    /// Stop recording errors once this many are collected. Validation itself still runs to
    /// completion, so stack overflows are detected regardless.
    ///
    /// ```rust
    /// # use serde_json::json;
    /// # let registry = jsonschema_vm::compile(&[json!({"items": {"type": "string"}})]).unwrap();
    /// let result = jsonschema_vm::options()
    ///     .with_max_errors(1)
    ///     .validate(&registry, &json!([1, 2, 3]))
    ///     .expect("Validation completes");
    /// assert_eq!(result.len(), 1);
    /// ```
    #[inline]
    pub fn with_max_errors(&mut self, max_errors: usize) -> &mut Self {
        self.max_errors = max_errors;
        self
    }

    /// Limit the number of nested `$ref` jumps.
    ///
    /// Every jump recurses on the native stack, so very large values can exhaust it.
    #[inline]
    pub fn with_max_stack_depth(&mut self, max_stack_depth: usize) -> &mut Self {
        self.max_stack_depth = max_stack_depth;
        self
    }

    /// Tolerance used by `multipleOf`.
    #[inline]
    pub fn with_epsilon(&mut self, epsilon: f64) -> &mut Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    #[must_use]
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Validate `instance` against the root of the first compiled document.
    ///
    /// # Errors
    ///
    /// Fails if the registry is empty or if `$ref` recursion exceeds the stack depth.
    pub fn validate(
        &self,
        registry: &Registry,
        instance: &Value,
    ) -> Result<ValidationResult, ValidateError> {
        let root = root_of(registry)?;
        Vm::new(registry, self).run(root, instance)
    }

    /// Validate `instance` against the schema registered at `uri`.
    ///
    /// The URI must be absolute; its fragment, if any, is a JSON Pointer.
    ///
    /// # Errors
    ///
    /// Fails if `uri` is not a valid absolute URI, if no compiled schema is registered there,
    /// or if `$ref` recursion exceeds the stack depth.
    pub fn validate_uri(
        &self,
        registry: &Registry,
        uri: &str,
        instance: &Value,
    ) -> Result<ValidationResult, ValidateError> {
        let root = lookup(registry, uri)?;
        Vm::new(registry, self).run(root, instance)
    }

    /// Whether `instance` is valid against the root of the first compiled document.
    ///
    /// Unlike [`ValidationOptions::validate`], no errors are recorded, so the answer does not
    /// depend on `max_errors`.
    ///
    /// # Errors
    ///
    /// Same as [`ValidationOptions::validate`].
    pub fn is_valid(&self, registry: &Registry, instance: &Value) -> Result<bool, ValidateError> {
        let root = root_of(registry)?;
        Vm::new(registry, self).check(root, instance)
    }
}

fn root_of(registry: &Registry) -> Result<SchemaIndex, ValidateError> {
    registry.root().ok_or_else(|| ValidateError::NoSuchSchema {
        uri: DEFAULT_ROOT_URL.to_string(),
    })
}

fn lookup(registry: &Registry, uri: &str) -> Result<SchemaIndex, ValidateError> {
    let parsed = Url::parse(uri).map_err(|source| ValidateError::InvalidUri {
        uri: uri.to_string(),
        source,
    })?;
    registry
        .resolve(&parsed)
        .ok_or_else(|| ValidateError::NoSuchSchema {
            uri: uri.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let options = ValidationOptions::default();
        assert_eq!(options.max_errors(), usize::MAX);
        assert_eq!(options.max_stack_depth(), DEFAULT_MAX_STACK_DEPTH);
        assert!((options.epsilon() - DEFAULT_EPSILON).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialize_partial() {
        let options: ValidationOptions =
            serde_json::from_value(json!({"maxStackDepth": 8, "epsilon": 0.5})).unwrap();
        assert_eq!(options.max_errors(), usize::MAX);
        assert_eq!(options.max_stack_depth(), 8);
        assert!((options.epsilon() - 0.5).abs() < f64::EPSILON);
    }

    #[test_case("http://example.com/s", true)]
    #[test_case("http://example.com/s#", true)]
    #[test_case("http://example.com/s#/items", true)]
    #[test_case("http://example.com/s#/properties", false)]
    #[test_case("http://example.com/other", false)]
    fn validate_uri_lookup(uri: &str, found: bool) {
        let registry =
            crate::compile(&[json!({"$id": "http://example.com/s", "items": {}})]).unwrap();
        let result = ValidationOptions::default().validate_uri(&registry, uri, &json!([]));
        if found {
            assert!(result.unwrap().is_valid());
        } else {
            assert_eq!(
                result.unwrap_err(),
                ValidateError::NoSuchSchema {
                    uri: uri.to_string()
                }
            );
        }
    }

    #[test]
    fn validate_uri_rejects_relative_uris() {
        let registry = crate::compile(&[json!({})]).unwrap();
        let error = ValidationOptions::default()
            .validate_uri(&registry, "relative/path", &json!(1))
            .unwrap_err();
        assert!(matches!(error, ValidateError::InvalidUri { .. }));
    }

    #[test]
    fn empty_registry() {
        let registry = crate::compile(&[]).unwrap();
        assert!(matches!(
            ValidationOptions::default().validate(&registry, &json!(1)),
            Err(ValidateError::NoSuchSchema { .. })
        ));
    }

    #[test]
    fn is_valid_ignores_error_cap() {
        let registry = crate::compile(&[json!({"type": "string"})]).unwrap();
        let mut options = ValidationOptions::default();
        options.with_max_errors(0);
        assert!(options.validate(&registry, &json!(1)).unwrap().is_valid());
        assert!(!options.is_valid(&registry, &json!(1)).unwrap());
    }
}
