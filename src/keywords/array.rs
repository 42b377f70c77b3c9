use serde_json::{Map, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, ValidateError},
    keywords::{helpers, unique_items::is_unique},
    node::{Items, SchemaNode},
    vm::Vm,
};

pub(crate) fn compile<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    node.items = match object.get("items") {
        None => None,
        Some(Value::Array(schemas)) => {
            let mut tuple = Vec::with_capacity(schemas.len());
            for (idx, subschema) in schemas.iter().enumerate() {
                let mut buffer = itoa::Buffer::new();
                tuple.push(parser.subschema("items", subschema, &["items", buffer.format(idx)])?);
            }
            Some(Items::Tuple(tuple))
        }
        Some(subschema) => Some(Items::Single(parser.subschema(
            "items",
            subschema,
            &["items"],
        )?)),
    };
    node.additional_items = helpers::optional_schema(parser, object, "additionalItems")?;
    node.min_items = helpers::natural(parser, object, "minItems")?;
    node.max_items = helpers::natural(parser, object, "maxItems")?;
    node.unique_items = helpers::boolean(parser, object, "uniqueItems")?.unwrap_or(false);
    node.contains = helpers::optional_schema(parser, object, "contains")?;
    Ok(())
}

pub(crate) fn validate(
    vm: &mut Vm<'_>,
    node: &SchemaNode,
    items: &[Value],
) -> Result<(), ValidateError> {
    match &node.items {
        Some(Items::Single(subschema)) => {
            vm.keyword("items", |vm| {
                let mut buffer = itoa::Buffer::new();
                for (idx, item) in items.iter().enumerate() {
                    vm.item(buffer.format(idx), |vm| vm.exec(*subschema, item))?;
                }
                Ok(())
            })?;
        }
        Some(Items::Tuple(tuple)) => {
            vm.keyword("items", |vm| {
                let mut buffer = itoa::Buffer::new();
                for (idx, (subschema, item)) in tuple.iter().zip(items).enumerate() {
                    let token = buffer.format(idx);
                    vm.keyword(token, |vm| vm.item(token, |vm| vm.exec(*subschema, item)))?;
                }
                Ok(())
            })?;
            if let Some(additional) = node.additional_items {
                if items.len() > tuple.len() {
                    vm.keyword("additionalItems", |vm| {
                        let mut buffer = itoa::Buffer::new();
                        for (idx, item) in items.iter().enumerate().skip(tuple.len()) {
                            vm.item(buffer.format(idx), |vm| vm.exec(additional, item))?;
                        }
                        Ok(())
                    })?;
                }
            }
        }
        None => {}
    }
    let length = items.len() as u64;
    if node.min_items.is_some_and(|limit| length < limit) {
        vm.report_at("minItems");
    }
    if node.max_items.is_some_and(|limit| length > limit) {
        vm.report_at("maxItems");
    }
    if node.unique_items && !is_unique(items) {
        vm.report_at("uniqueItems");
    }
    if let Some(contains) = node.contains {
        let mut matched = false;
        for item in items {
            if vm.probe(contains, item)? {
                matched = true;
                break;
            }
        }
        if !matched {
            vm.report_at("contains");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{error::SchemaErrorKind, tests_util};
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"items": {"type": "null"}}), &json!([null, null]))]
    #[test_case(&json!({"items": []}), &json!([1, "a"]); "empty tuple")]
    #[test_case(&json!({"items": [{"type": "null"}]}), &json!([null, 1]); "tuple without additionalItems")]
    #[test_case(&json!({"items": [{}], "additionalItems": {"type": "string"}}), &json!([1, "a", "b"]))]
    #[test_case(&json!({"items": {}, "additionalItems": false}), &json!([1, 2]); "additionalItems ignored for single items")]
    #[test_case(&json!({"minItems": 1, "maxItems": 2}), &json!([1, 2]))]
    #[test_case(&json!({"contains": {"type": "string"}}), &json!([1, "a"]))]
    #[test_case(&json!({"items": false}), &json!([]))]
    #[test_case(&json!({"items": {"type": "null"}}), &json!({"a": 1}); "ignores non-arrays")]
    fn arrays_are_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test]
    fn items_error_location() {
        tests_util::expect_errors(
            &json!({"items": {"type": "null"}}),
            &json!([null, 1]),
            &[("/1", "/items/type")],
        );
    }

    #[test]
    fn tuple_error_locations() {
        tests_util::expect_errors(
            &json!({
                "items": [{"type": "string"}, {"type": "null"}],
                "additionalItems": {"type": "boolean"}
            }),
            &json!([1, null, true, 4]),
            &[("/0", "/items/0/type"), ("/3", "/additionalItems/type")],
        );
    }

    #[test]
    fn additional_items_false() {
        tests_util::expect_errors(
            &json!({"items": [{}], "additionalItems": false}),
            &json!([1, 2, 3]),
            &[("/1", "/additionalItems"), ("/2", "/additionalItems")],
        );
    }

    #[test]
    fn contains_reports_once() {
        tests_util::expect_errors(
            &json!({"contains": {"type": "string"}}),
            &json!([1, 2, 3]),
            &[("", "/contains")],
        );
        tests_util::is_not_valid(&json!({"contains": {}}), &json!([]));
    }

    #[test_case(&json!({"minItems": 2}), &json!([1]), "/minItems")]
    #[test_case(&json!({"maxItems": 1}), &json!([1, 2]), "/maxItems")]
    fn schema_path(schema: &Value, instance: &Value, expected: &str) {
        tests_util::assert_schema_path(schema, instance, expected);
    }

    #[test_case(&json!({"items": "foo"}))]
    #[test_case(&json!({"items": ["foo"]}))]
    #[test_case(&json!({"additionalItems": ["foo"]}))]
    #[test_case(&json!({"contains": "foo"}))]
    fn schema_not_object(schema: &Value) {
        tests_util::assert_compile_error(schema, SchemaErrorKind::SchemaNotObject);
    }

    #[test_case(&json!({"maxItems": "foobar"}))]
    #[test_case(&json!({"maxItems": 3.14}))]
    #[test_case(&json!({"minItems": -2.0}))]
    fn invalid_natural_value(schema: &Value) {
        tests_util::assert_compile_error(schema, SchemaErrorKind::InvalidNaturalValue);
    }

    #[test]
    fn invalid_bool_value() {
        tests_util::assert_compile_error(
            &json!({"uniqueItems": "foobar"}),
            SchemaErrorKind::InvalidBoolValue,
        );
    }
}
