use serde_json::{Map, Number, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind},
    keywords::helpers::as_f64,
    node::SchemaNode,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    vm::Vm,
};

pub(crate) fn compile<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    let Some(value) = object.get("type") else {
        return Ok(());
    };
    let invalid = || parser.error("type", SchemaErrorKind::InvalidTypeValue);
    let mut types = PrimitiveTypesBitMap::new();
    match value {
        Value::String(name) => {
            types |= PrimitiveType::try_from(name.as_str()).map_err(|()| invalid())?;
        }
        Value::Array(names) if !names.is_empty() => {
            for name in names {
                let Value::String(name) = name else {
                    return Err(invalid());
                };
                types |= PrimitiveType::try_from(name.as_str()).map_err(|()| invalid())?;
            }
        }
        _ => return Err(invalid()),
    }
    node.types = Some(types);
    Ok(())
}

/// Integers are numbers equal to their own rounding, so `1.0` is an integer too.
#[inline]
pub(crate) fn is_integer(number: &Number) -> bool {
    if number.is_u64() || number.is_i64() {
        return true;
    }
    let value = as_f64(number);
    value == value.round()
}

#[inline]
pub(crate) fn is_of_type(types: PrimitiveTypesBitMap, instance: &Value) -> bool {
    match instance {
        Value::Null => types.contains_type(PrimitiveType::Null),
        Value::Bool(_) => types.contains_type(PrimitiveType::Boolean),
        Value::Number(number) => {
            types.contains_type(PrimitiveType::Number)
                || (types.contains_type(PrimitiveType::Integer) && is_integer(number))
        }
        Value::String(_) => types.contains_type(PrimitiveType::String),
        Value::Array(_) => types.contains_type(PrimitiveType::Array),
        Value::Object(_) => types.contains_type(PrimitiveType::Object),
    }
}

pub(crate) fn validate(vm: &mut Vm<'_>, node: &SchemaNode, instance: &Value) {
    if let Some(types) = node.types {
        if !is_of_type(types, instance) {
            vm.report_at("type");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::SchemaErrorKind, tests_util};
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"type": "integer"}), &json!(1))]
    #[test_case(&json!({"type": "integer"}), &json!(1.0))]
    #[test_case(&json!({"type": "integer"}), &json!(-3.0))]
    #[test_case(&json!({"type": "integer"}), &json!(-0.0))]
    #[test_case(&json!({"type": "number"}), &json!(1.5))]
    #[test_case(&json!({"type": ["null", "integer"]}), &json!(null))]
    #[test_case(&json!({"type": ["null", "integer"]}), &json!(7))]
    #[test_case(&json!({"type": "object"}), &json!({}))]
    #[test_case(&json!({"type": "array"}), &json!([]))]
    #[test_case(&json!({"type": "boolean"}), &json!(false))]
    fn type_is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"type": "integer"}), &json!(1.5))]
    #[test_case(&json!({"type": "integer"}), &json!(-0.5))]
    #[test_case(&json!({"type": "integer"}), &json!("1"))]
    #[test_case(&json!({"type": "null"}), &json!(false))]
    #[test_case(&json!({"type": ["null", "integer"]}), &json!("x"))]
    #[test_case(&json!({"type": "string"}), &json!([]))]
    fn type_is_not_valid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn reported_at_type_keyword() {
        tests_util::expect_errors(
            &json!({"type": ["null", "integer"]}),
            &json!("x"),
            &[("", "/type")],
        );
    }

    #[test_case(&json!({"type": 3}))]
    #[test_case(&json!({"type": "invalid"}))]
    #[test_case(&json!({"type": []}))]
    #[test_case(&json!({"type": ["null", 1]}))]
    fn invalid_type_value(schema: &Value) {
        tests_util::assert_compile_error(schema, SchemaErrorKind::InvalidTypeValue);
    }
}
