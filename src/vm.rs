//! The validation executor.
//!
//! A [`Vm`] walks an instance against the node graph of a [`Registry`] by recursive descent.
//! It keeps two kinds of path state next to the call stack: the location within the instance
//! and, per open schema context, the location within that schema. Every `$ref` jump opens a
//! new schema context, which is what the recursion-depth ceiling counts.
use std::mem;

use serde_json::Value;
use url::Url;

use crate::{
    error::{ValidateError, ValidationError},
    keywords,
    node::{Reference, SchemaIndex},
    options::ValidationOptions,
    output::ValidationResult,
    paths::JsonPointer,
    registry::Registry,
};

/// Keyword location within one schema context.
#[derive(Debug)]
struct SchemaFrame<'r> {
    uri: &'r Url,
    tokens: JsonPointer,
}

pub(crate) struct Vm<'r> {
    registry: &'r Registry,
    options: &'r ValidationOptions,
    instance_path: JsonPointer,
    schemas: Vec<SchemaFrame<'r>>,
    errors: Vec<ValidationError>,
    // Errors are recorded only while below this limit
    limit: usize,
    // Failed checks, recorded or not
    violations: usize,
}

impl<'r> Vm<'r> {
    pub(crate) fn new(registry: &'r Registry, options: &'r ValidationOptions) -> Self {
        Vm {
            registry,
            options,
            instance_path: JsonPointer::new(),
            schemas: Vec::new(),
            errors: Vec::new(),
            limit: options.max_errors(),
            violations: 0,
        }
    }

    /// Validate `instance` against the node at `root`, collecting errors up to the cap.
    pub(crate) fn run(
        mut self,
        root: SchemaIndex,
        instance: &Value,
    ) -> Result<ValidationResult, ValidateError> {
        self.open(root, instance)?;
        if self.violations > 0 && self.errors.len() >= self.limit {
            tracing::debug!(limit = self.limit, "Error cap reached");
        }
        Ok(ValidationResult::new(self.errors))
    }

    /// Whether `instance` is valid against the node at `root`, without recording errors.
    pub(crate) fn check(mut self, root: SchemaIndex, instance: &Value) -> Result<bool, ValidateError> {
        self.limit = 0;
        self.open(root, instance)?;
        Ok(self.violations == 0)
    }

    fn open(&mut self, index: SchemaIndex, instance: &Value) -> Result<(), ValidateError> {
        let registry = self.registry;
        self.schemas.push(SchemaFrame {
            uri: registry.node(index).uri(),
            tokens: JsonPointer::new(),
        });
        let result = self.exec(index, instance);
        self.schemas.pop();
        result
    }

    /// Evaluate every keyword of the node at `index` in the current schema context.
    pub(crate) fn exec(&mut self, index: SchemaIndex, instance: &Value) -> Result<(), ValidateError> {
        let registry = self.registry;
        let node = registry.node(index);
        if let Some(valid) = node.as_bool() {
            if !valid {
                self.report();
            }
            return Ok(());
        }
        if let Some(reference) = node.reference() {
            keywords::ref_::validate(self, reference, instance)?;
        }
        keywords::type_::validate(self, node, instance);
        match instance {
            Value::Number(number) => keywords::numeric::validate(self, node, number),
            Value::String(string) => keywords::string::validate(self, node, string),
            Value::Array(items) => keywords::array::validate(self, node, items)?,
            Value::Object(object) => keywords::object::validate(self, node, instance, object)?,
            Value::Null | Value::Bool(_) => {}
        }
        keywords::enum_::validate(self, node, instance);
        keywords::combinators::validate(self, node, instance)
    }

    /// Jump to the target of `reference`, keeping the instance and its path.
    pub(crate) fn follow(
        &mut self,
        reference: &Reference,
        instance: &Value,
    ) -> Result<(), ValidateError> {
        let max_depth = self.options.max_stack_depth();
        // The first context is the validation root, not a jump
        if self.schemas.len() > max_depth {
            tracing::debug!(max_depth, uri = %reference.target(), "Maximum stack depth exceeded");
            return Err(ValidateError::StackOverflow { max_depth });
        }
        let index = self.registry.lookup(reference.target()).ok_or_else(|| {
            ValidateError::NoSuchSchema {
                uri: reference.target().to_string(),
            }
        })?;
        tracing::trace!(uri = %reference.target(), depth = self.schemas.len(), "Following reference");
        self.open(index, instance)
    }

    /// Record a violation at the current locations.
    pub(crate) fn report(&mut self) {
        self.violations += 1;
        if self.errors.len() < self.limit {
            if let Some(frame) = self.schemas.last() {
                self.errors.push(ValidationError {
                    instance_path: self.instance_path.clone(),
                    schema_path: frame.tokens.clone(),
                    schema_uri: frame.uri.clone(),
                });
            }
        }
    }

    /// Record a violation of the keyword `token`.
    #[inline]
    pub(crate) fn report_at(&mut self, token: &str) {
        self.keyword(token, Self::report);
    }

    /// Run `f` with `token` appended to the schema path.
    pub(crate) fn keyword<R>(&mut self, token: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        if let Some(frame) = self.schemas.last_mut() {
            frame.tokens.push(token);
        }
        let result = f(self);
        if let Some(frame) = self.schemas.last_mut() {
            frame.tokens.pop();
        }
        result
    }

    /// Run `f` with `token` appended to the instance path.
    pub(crate) fn item<R>(&mut self, token: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.instance_path.push(token);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    /// Whether `instance` is valid against `index`. Nothing is reported.
    pub(crate) fn probe(&mut self, index: SchemaIndex, instance: &Value) -> Result<bool, ValidateError> {
        self.speculate(0, index, instance).map(|(valid, _)| valid)
    }

    /// Like [`Vm::probe`], but also hands back the errors that the remaining capacity allows.
    pub(crate) fn attempt(
        &mut self,
        index: SchemaIndex,
        instance: &Value,
    ) -> Result<(bool, Vec<ValidationError>), ValidateError> {
        let remaining = self.limit.saturating_sub(self.errors.len());
        self.speculate(remaining, index, instance)
    }

    fn speculate(
        &mut self,
        limit: usize,
        index: SchemaIndex,
        instance: &Value,
    ) -> Result<(bool, Vec<ValidationError>), ValidateError> {
        let errors = mem::take(&mut self.errors);
        let limit = mem::replace(&mut self.limit, limit);
        let violations = mem::replace(&mut self.violations, 0);
        let result = self.exec(index, instance);
        let valid = self.violations == 0;
        let scratch = mem::replace(&mut self.errors, errors);
        self.limit = limit;
        self.violations = violations;
        result.map(|()| (valid, scratch))
    }

    /// Record one violation carrying `errors` collected by [`Vm::attempt`].
    pub(crate) fn fail_with(&mut self, errors: Vec<ValidationError>) {
        self.violations += 1;
        let room = self.limit.saturating_sub(self.errors.len());
        self.errors.extend(errors.into_iter().take(room));
    }

    #[inline]
    pub(crate) fn epsilon(&self) -> f64 {
        self.options.epsilon()
    }
}
