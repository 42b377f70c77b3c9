use serde_json::{Map, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind},
    keywords::helpers,
    node::SchemaNode,
    vm::Vm,
};

pub(crate) fn compile<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    node.min_length = helpers::natural(parser, object, "minLength")?;
    node.max_length = helpers::natural(parser, object, "maxLength")?;
    node.pattern = match object.get("pattern") {
        None => None,
        Some(Value::String(pattern)) => Some(helpers::regex(parser, "pattern", pattern)?),
        Some(_) => return Err(parser.error("pattern", SchemaErrorKind::InvalidRegexpValue)),
    };
    Ok(())
}

pub(crate) fn validate(vm: &mut Vm<'_>, node: &SchemaNode, string: &str) {
    if node.min_length.is_some() || node.max_length.is_some() {
        // Lengths are counted in Unicode scalar values
        let length = string.chars().count() as u64;
        if node.min_length.is_some_and(|limit| length < limit) {
            vm.report_at("minLength");
        }
        if node.max_length.is_some_and(|limit| length > limit) {
            vm.report_at("maxLength");
        }
    }
    if let Some(pattern) = &node.pattern {
        if !pattern.is_match(string) {
            vm.report_at("pattern");
        }
    }
}
