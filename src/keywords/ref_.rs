use serde_json::{Map, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind, ValidateError},
    node::{self, Reference, SchemaNode},
    paths::JsonPointer,
    vm::Vm,
};

/// Record the target of `$ref` without looking it up.
pub(crate) fn compile(
    parser: &Parser<'_>,
    object: &Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    let Some(value) = object.get("$ref") else {
        return Ok(());
    };
    let Value::String(reference) = value else {
        return Err(parser.error("$ref", SchemaErrorKind::RefNotString));
    };
    let mut base = parser.resolve_uri("$ref", reference)?;
    let pointer = JsonPointer::parse(base.fragment().unwrap_or_default())
        .map_err(|_| parser.error("$ref", SchemaErrorKind::InvalidPointer))?;
    base.set_fragment(None);
    node.reference = Some(Reference {
        target: node::location(&base, &pointer),
        base,
        pointer,
    });
    Ok(())
}

#[inline]
pub(crate) fn validate(
    vm: &mut Vm<'_>,
    reference: &Reference,
    instance: &Value,
) -> Result<(), ValidateError> {
    vm.follow(reference, instance)
}
