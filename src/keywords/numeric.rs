use serde_json::{Map, Number, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind},
    keywords::helpers::{self, as_f64, greater_or_equal, greater_than, less_or_equal, less_than},
    node::SchemaNode,
    vm::Vm,
};

pub(crate) fn compile<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    node.minimum = helpers::number(parser, object, "minimum")?;
    node.maximum = helpers::number(parser, object, "maximum")?;
    node.exclusive_minimum = helpers::number(parser, object, "exclusiveMinimum")?;
    node.exclusive_maximum = helpers::number(parser, object, "exclusiveMaximum")?;
    node.multiple_of = match helpers::number(parser, object, "multipleOf")? {
        Some(divisor) if divisor <= 0. => {
            return Err(parser.error("multipleOf", SchemaErrorKind::InvalidNumberValue))
        }
        divisor => divisor,
    };
    Ok(())
}

/// `|value| mod divisor / divisor` must lie within `epsilon` of either 0 or 1.
#[inline]
pub(crate) fn is_multiple_of(value: f64, divisor: f64, epsilon: f64) -> bool {
    let remainder = (value.abs() % divisor) / divisor;
    remainder.min(1. - remainder) <= epsilon
}

pub(crate) fn validate(vm: &mut Vm<'_>, node: &SchemaNode, number: &Number) {
    if let Some(limit) = node.minimum {
        if less_than(number, limit) {
            vm.report_at("minimum");
        }
    }
    if let Some(limit) = node.maximum {
        if greater_than(number, limit) {
            vm.report_at("maximum");
        }
    }
    if let Some(limit) = node.exclusive_minimum {
        if less_or_equal(number, limit) {
            vm.report_at("exclusiveMinimum");
        }
    }
    if let Some(limit) = node.exclusive_maximum {
        if greater_or_equal(number, limit) {
            vm.report_at("exclusiveMaximum");
        }
    }
    if let Some(divisor) = node.multiple_of {
        if !is_multiple_of(as_f64(number), divisor, vm.epsilon()) {
            vm.report_at("multipleOf");
        }
    }
}
