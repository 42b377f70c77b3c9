//! Keywords that apply several sub-schemas to the same instance.
use serde_json::{Map, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, ValidateError},
    keywords::helpers,
    node::{Conditional, SchemaIndex, SchemaNode},
    vm::Vm,
};

pub(crate) fn compile<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    node.all_of = helpers::schema_array(parser, object, "allOf")?;
    node.any_of = helpers::schema_array(parser, object, "anyOf")?;
    node.one_of = helpers::schema_array(parser, object, "oneOf")?;
    node.not = helpers::optional_schema(parser, object, "not")?;
    let if_ = helpers::optional_schema(parser, object, "if")?;
    // `then` and `else` are inert without `if`, but must still be well-formed
    let then_ = helpers::optional_schema(parser, object, "then")?;
    let else_ = helpers::optional_schema(parser, object, "else")?;
    node.conditional = if_.map(|if_| Conditional { if_, then_, else_ });
    Ok(())
}

pub(crate) fn validate(
    vm: &mut Vm<'_>,
    node: &SchemaNode,
    instance: &Value,
) -> Result<(), ValidateError> {
    if !node.all_of.is_empty() {
        vm.keyword("allOf", |vm| {
            let mut buffer = itoa::Buffer::new();
            for (idx, subschema) in node.all_of.iter().enumerate() {
                vm.keyword(buffer.format(idx), |vm| vm.exec(*subschema, instance))?;
            }
            Ok(())
        })?;
    }
    if !node.any_of.is_empty() {
        any_of(vm, &node.any_of, instance)?;
    }
    if !node.one_of.is_empty() {
        let mut matches = 0;
        for subschema in &node.one_of {
            if vm.probe(*subschema, instance)? {
                matches += 1;
                if matches > 1 {
                    break;
                }
            }
        }
        if matches != 1 {
            vm.report_at("oneOf");
        }
    }
    if let Some(subschema) = node.not {
        if vm.probe(subschema, instance)? {
            vm.report_at("not");
        }
    }
    if let Some(conditional) = &node.conditional {
        if vm.probe(conditional.if_, instance)? {
            if let Some(then_) = conditional.then_ {
                vm.keyword("then", |vm| vm.exec(then_, instance))?;
            }
        } else if let Some(else_) = conditional.else_ {
            vm.keyword("else", |vm| vm.exec(else_, instance))?;
        }
    }
    Ok(())
}

/// Valid as soon as one member matches; otherwise every member's errors are reported.
fn any_of(
    vm: &mut Vm<'_>,
    members: &[SchemaIndex],
    instance: &Value,
) -> Result<(), ValidateError> {
    let mut collected = Vec::new();
    let mut buffer = itoa::Buffer::new();
    for (idx, subschema) in members.iter().enumerate() {
        let (valid, errors) = vm.keyword("anyOf", |vm| {
            vm.keyword(buffer.format(idx), |vm| vm.attempt(*subschema, instance))
        })?;
        if valid {
            return Ok(());
        }
        collected.extend(errors);
    }
    vm.fail_with(collected);
    Ok(())
}
