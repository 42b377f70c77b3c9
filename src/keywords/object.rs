use serde_json::{Map, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind, ValidateError},
    keywords::helpers,
    node::{Dependency, SchemaNode},
    vm::Vm,
};

pub(crate) fn compile<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    node: &mut SchemaNode,
) -> Result<(), CompileError> {
    if let Some(properties) = object.get("properties") {
        let Value::Object(properties) = properties else {
            return Err(parser.error("properties", SchemaErrorKind::InvalidObjectValue));
        };
        node.properties.reserve(properties.len());
        for (name, subschema) in properties {
            let index = parser.subschema("properties", subschema, &["properties", name.as_str()])?;
            node.properties.insert(name.clone(), index);
        }
    }
    if let Some(patterns) = object.get("patternProperties") {
        let Value::Object(patterns) = patterns else {
            return Err(parser.error("patternProperties", SchemaErrorKind::InvalidObjectValue));
        };
        node.pattern_properties.reserve(patterns.len());
        for (pattern, subschema) in patterns {
            let regex = helpers::regex(parser, "patternProperties", pattern)?;
            let index = parser.subschema(
                "patternProperties",
                subschema,
                &["patternProperties", pattern.as_str()],
            )?;
            node.pattern_properties.push((regex, index));
        }
    }
    node.additional_properties = helpers::optional_schema(parser, object, "additionalProperties")?;
    if let Some(required) = object.get("required") {
        node.required = string_array(parser, "required", required)?;
    }
    node.min_properties = helpers::natural(parser, object, "minProperties")?;
    node.max_properties = helpers::natural(parser, object, "maxProperties")?;
    if let Some(dependencies) = object.get("dependencies") {
        let Value::Object(dependencies) = dependencies else {
            return Err(parser.error("dependencies", SchemaErrorKind::InvalidObjectValue));
        };
        for (key, dependency) in dependencies {
            let dependency = match dependency {
                Value::Array(_) => Dependency::Keys(string_array(parser, "dependencies", dependency)?),
                _ => Dependency::Schema(parser.subschema(
                    "dependencies",
                    dependency,
                    &["dependencies", key.as_str()],
                )?),
            };
            node.dependencies.push((key.clone(), dependency));
        }
    }
    node.property_names = helpers::optional_schema(parser, object, "propertyNames")?;
    Ok(())
}

/// An array of strings, possibly empty.
fn string_array(
    parser: &Parser<'_>,
    keyword: &str,
    value: &Value,
) -> Result<Vec<String>, CompileError> {
    let Value::Array(items) = value else {
        return Err(parser.error(keyword, SchemaErrorKind::InvalidArrayValue));
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(item) => Ok(item.clone()),
            _ => Err(parser.error(keyword, SchemaErrorKind::InvalidStringValue)),
        })
        .collect()
}

pub(crate) fn validate(
    vm: &mut Vm<'_>,
    node: &SchemaNode,
    instance: &Value,
    object: &Map<String, Value>,
) -> Result<(), ValidateError> {
    for (key, value) in object {
        let mut matched = false;
        if let Some(subschema) = node.properties.get(key) {
            matched = true;
            vm.keyword("properties", |vm| {
                vm.keyword(key, |vm| vm.item(key, |vm| vm.exec(*subschema, value)))
            })?;
        }
        for (pattern, subschema) in &node.pattern_properties {
            if pattern.is_match(key) {
                matched = true;
                vm.keyword("patternProperties", |vm| {
                    vm.keyword(pattern.as_str(), |vm| {
                        vm.item(key, |vm| vm.exec(*subschema, value))
                    })
                })?;
            }
        }
        if !matched {
            if let Some(additional) = node.additional_properties {
                vm.keyword("additionalProperties", |vm| {
                    vm.item(key, |vm| vm.exec(additional, value))
                })?;
            }
        }
    }
    if !node.required.is_empty() {
        vm.keyword("required", |vm| missing_keys(vm, &node.required, object));
    }
    let length = object.len() as u64;
    if node.min_properties.is_some_and(|limit| length < limit) {
        vm.report_at("minProperties");
    }
    if node.max_properties.is_some_and(|limit| length > limit) {
        vm.report_at("maxProperties");
    }
    for (key, dependency) in &node.dependencies {
        if !object.contains_key(key) {
            continue;
        }
        vm.keyword("dependencies", |vm| {
            vm.keyword(key, |vm| match dependency {
                Dependency::Keys(keys) => {
                    missing_keys(vm, keys, object);
                    Ok(())
                }
                Dependency::Schema(subschema) => vm.exec(*subschema, instance),
            })
        })?;
    }
    if let Some(subschema) = node.property_names {
        vm.keyword("propertyNames", |vm| {
            for key in object.keys() {
                let name = Value::String(key.clone());
                vm.item(key, |vm| vm.exec(subschema, &name))?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Report every key of `keys` absent from `object`, at the key's position in the list.
fn missing_keys(vm: &mut Vm<'_>, keys: &[String], object: &Map<String, Value>) {
    let mut buffer = itoa::Buffer::new();
    for (idx, key) in keys.iter().enumerate() {
        if !object.contains_key(key) {
            vm.report_at(buffer.format(idx));
        }
    }
}
