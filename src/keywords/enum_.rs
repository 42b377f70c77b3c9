use serde_json::{Map, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind},
    keywords::helpers::equal,
    node::SchemaNode,
    vm::Vm,
};

pub(crate) fn compile(
    parser: &Parser<'_>,
    object: &Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    node.enum_ = match object.get("enum") {
        None => None,
        Some(Value::Array(options)) if !options.is_empty() => Some(options.clone()),
        Some(_) => return Err(parser.error("enum", SchemaErrorKind::InvalidArrayValue)),
    };
    node.const_ = object.get("const").cloned();
    Ok(())
}

pub(crate) fn validate(vm: &mut Vm<'_>, node: &SchemaNode, instance: &Value) {
    if let Some(options) = &node.enum_ {
        if !options.iter().any(|option| equal(option, instance)) {
            vm.report_at("enum");
        }
    }
    if let Some(expected) = &node.const_ {
        if !equal(expected, instance) {
            vm.report_at("const");
        }
    }
}
