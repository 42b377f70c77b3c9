use jsonschema_vm::{compile, options, validate, validate_uri, ValidateError, ValidationError};
use rayon::prelude::*;
use serde_json::{json, Value};
use test_case::test_case;

fn locations(errors: &[ValidationError]) -> Vec<(String, String)> {
    errors
        .iter()
        .map(|error| (error.instance_path.to_string(), error.schema_path.to_string()))
        .collect()
}

#[test]
fn type_union_scenario() {
    let registry = compile(&[json!({"type": ["null", "integer"]})]).unwrap();
    let result = validate(&registry, &json!("x")).unwrap();
    assert_eq!(result.len(), 1);
    let error = &result.errors()[0];
    assert!(error.instance_path.is_empty());
    assert_eq!(error.schema_path.tokens(), ["type"]);
}

#[test]
fn items_scenario() {
    let registry = compile(&[json!({"items": {"type": "null"}})]).unwrap();
    let result = validate(&registry, &json!([null, 1])).unwrap();
    assert_eq!(result.len(), 1);
    let error = &result.errors()[0];
    assert_eq!(error.instance_path.tokens(), ["1"]);
    assert_eq!(error.schema_path.tokens(), ["items", "type"]);
    assert_eq!(error.schema_uri.as_str(), "json-schema:///");
}

#[test_case(&json!(1), true)]
#[test_case(&json!(1.0), true)]
#[test_case(&json!(-7.0), true)]
#[test_case(&json!(1e20), true; "large integral float")]
#[test_case(&json!(1.5), false)]
#[test_case(&json!("1"), false)]
#[test_case(&json!(null), false)]
fn integer_type(instance: &Value, expected: bool) {
    let registry = compile(&[json!({"type": "integer"})]).unwrap();
    assert_eq!(validate(&registry, instance).unwrap().is_valid(), expected);
}

#[test_case(&json!([1, 2]), true)]
#[test_case(&json!([1, 1.0]), false)]
fn unique_items(instance: &Value, expected: bool) {
    let registry = compile(&[json!({"uniqueItems": true})]).unwrap();
    assert_eq!(validate(&registry, instance).unwrap().is_valid(), expected);
}

#[test_case(&json!(null))]
#[test_case(&json!([1, [2]]))]
#[test_case(&json!({"a": {}}))]
fn self_reference_overflows(instance: &Value) {
    let registry = compile(&[json!({"$ref": "#"})]).unwrap();
    assert_eq!(
        validate(&registry, instance).unwrap_err(),
        ValidateError::StackOverflow { max_depth: 64 }
    );
}

#[test]
fn mutual_recursion_terminates() {
    let registry = compile(&[
        json!({"$id": "http://example.com/a", "$ref": "http://example.com/b"}),
        json!({"$id": "http://example.com/b", "$ref": "http://example.com/a"}),
    ])
    .unwrap();
    let error = options()
        .with_max_stack_depth(10)
        .validate(&registry, &json!({}))
        .unwrap_err();
    assert_eq!(error, ValidateError::StackOverflow { max_depth: 10 });
}

#[test]
fn recursive_tree() {
    let registry = compile(&[json!({
        "$id": "http://example.com/tree",
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "children": {"type": "array", "items": {"$ref": "#"}}
        },
        "required": ["value"]
    })])
    .unwrap();
    let valid = json!({"value": 1, "children": [{"value": 2, "children": []}, {"value": 3}]});
    assert!(validate(&registry, &valid).unwrap().is_valid());
    let invalid = json!({"value": 1, "children": [{"value": 2}, {"children": [{"value": "x"}]}]});
    let result = validate(&registry, &invalid).unwrap();
    assert_eq!(
        locations(result.errors()),
        [
            ("/children/1/children/0/value".to_string(), "/properties/value/type".to_string()),
            ("/children/1".to_string(), "/required/0".to_string()),
        ]
    );
    assert!(result
        .iter()
        .all(|error| error.schema_uri.as_str() == "http://example.com/tree"));
}

#[test]
fn validation_is_idempotent() {
    let registry = compile(&[json!({
        "properties": {"a": {"type": "string"}, "b": {"anyOf": [{"type": "null"}, {"minimum": 3}]}},
        "additionalProperties": {"maxLength": 1},
        "required": ["c"]
    })])
    .unwrap();
    let instance = json!({"a": 1, "b": 2, "x": "long"});
    let first = validate(&registry, &instance).unwrap();
    let second = validate(&registry, &instance).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn error_cap_is_monotonic() {
    let registry = compile(&[json!({
        "items": {"type": "string", "anyOf": [{"minLength": 3}, {"maxLength": 0}]}
    })])
    .unwrap();
    let instance = json!([1, "ab", 2, "cd", 3]);
    let all = validate(&registry, &instance).unwrap().into_errors();
    assert_eq!(all.len(), 7);
    for cap in 0..=all.len() + 2 {
        let capped = options()
            .with_max_errors(cap)
            .validate(&registry, &instance)
            .unwrap()
            .into_errors();
        assert_eq!(capped.len(), cap.min(all.len()));
        assert_eq!(capped, all[..capped.len()]);
    }
}

#[test]
fn validate_by_uri() {
    let registry = compile(&[
        json!({"$id": "http://example.com/a", "type": "string"}),
        json!({"$id": "http://example.com/b", "definitions": {"n": {"type": "null"}}}),
    ])
    .unwrap();
    let instance = json!(null);
    assert!(!validate(&registry, &instance).unwrap().is_valid());
    assert!(validate_uri(&registry, "http://example.com/b", &instance)
        .unwrap()
        .is_valid());
    assert!(validate_uri(&registry, "http://example.com/b#/definitions/n", &instance)
        .unwrap()
        .is_valid());
    assert!(matches!(
        validate_uri(&registry, "http://example.com/c", &instance),
        Err(ValidateError::NoSuchSchema { .. })
    ));
}

#[test]
fn boolean_schemas() {
    let registry = compile(&[json!({"properties": {"a": true, "b": false}})]).unwrap();
    let result = validate(&registry, &json!({"a": 1, "b": 2})).unwrap();
    assert_eq!(
        locations(result.errors()),
        [("/b".to_string(), "/properties/b".to_string())]
    );
    let registry = compile(&[json!(false)]).unwrap();
    let result = validate(&registry, &json!(1)).unwrap();
    assert_eq!(locations(result.errors()), [(String::new(), String::new())]);
}

#[test]
fn concurrent_validation() {
    let registry = compile(&[json!({
        "$id": "http://example.com/list",
        "type": "array",
        "items": {"$ref": "http://example.com/list#/definitions/item"},
        "definitions": {"item": {"type": "integer", "minimum": 0}}
    })])
    .unwrap();
    let instances: Vec<Value> = (0..64)
        .map(|idx| {
            if idx % 2 == 0 {
                json!([idx, idx + 1])
            } else {
                json!([idx, -1])
            }
        })
        .collect();
    let sequential: Vec<_> = instances
        .iter()
        .map(|instance| validate(&registry, instance).unwrap())
        .collect();
    let parallel: Vec<_> = instances
        .par_iter()
        .map(|instance| validate(&registry, instance).unwrap())
        .collect();
    assert_eq!(sequential, parallel);
    assert_eq!(parallel.iter().filter(|result| result.is_valid()).count(), 32);
}
