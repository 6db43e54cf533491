//! Conversion between runtime values and JSON
//!
//! Backs the `JSON` intrinsic. Follows the scripting language's rules:
//! `undefined` and functions are skipped in objects and become `null` in
//! arrays, non-finite numbers become `null`, and cycles are an error.

use super::value::{Object, Value};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    Circular,
}

/// Convert a value to JSON; `None` when the value has no JSON form
/// (`undefined`, functions)
pub fn to_json(value: &Value) -> Result<Option<serde_json::Value>, JsonError> {
    let mut stack = Vec::new();
    convert(value, &mut stack)
}

fn convert(value: &Value, stack: &mut Vec<*const ()>) -> Result<Option<serde_json::Value>, JsonError> {
    let json = match value {
        Value::Undefined | Value::Function(_) | Value::Native(_) => return Ok(None),
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Error(_) => serde_json::Value::Object(serde_json::Map::new()),
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            enter(stack, ptr)?;
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                out.push(convert(item, stack)?.unwrap_or(serde_json::Value::Null));
            }
            stack.pop();
            serde_json::Value::Array(out)
        }
        Value::Object(object) => {
            let ptr = Rc::as_ptr(object) as *const ();
            enter(stack, ptr)?;
            let map = object_to_json(&object.borrow(), stack)?;
            stack.pop();
            serde_json::Value::Object(map)
        }
        Value::Element(element) => {
            let ptr = Rc::as_ptr(element) as *const ();
            enter(stack, ptr)?;
            let mut map = serde_json::Map::new();
            let element_type = match &element.element_type {
                Value::String(s) => serde_json::Value::String(s.to_string()),
                other => other
                    .function_name()
                    .map(|name| serde_json::Value::String(name.to_string()))
                    .unwrap_or(serde_json::Value::Null),
            };
            map.insert("type".to_string(), element_type);
            map.insert(
                "props".to_string(),
                serde_json::Value::Object(object_to_json(&element.props.borrow(), stack)?),
            );
            stack.pop();
            serde_json::Value::Object(map)
        }
    };
    Ok(Some(json))
}

fn enter(stack: &mut Vec<*const ()>, ptr: *const ()) -> Result<(), JsonError> {
    if stack.contains(&ptr) {
        return Err(JsonError::Circular);
    }
    stack.push(ptr);
    Ok(())
}

fn object_to_json(
    object: &Object,
    stack: &mut Vec<*const ()>,
) -> Result<serde_json::Map<String, serde_json::Value>, JsonError> {
    let mut map = serde_json::Map::new();
    for (key, value) in object.iter() {
        if let Some(json) = convert(value, stack)? {
            map.insert(key.to_string(), json);
        }
    }
    Ok(map)
}

/// Integral numbers serialize without a fraction; NaN and infinities as `null`
pub fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Convert parsed JSON into a fresh runtime value
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::object(
            map.iter()
                .map(|(key, value)| (key.clone(), from_json(value)))
                .collect(),
        ),
    }
}

/// Serialize compactly, or pretty-printed with `indent` per level
pub fn stringify(json: &serde_json::Value, indent: Option<&str>) -> String {
    match indent {
        None | Some("") => json.to_string(),
        Some(indent) => {
            let mut out = Vec::new();
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = Serializer::with_formatter(&mut out, formatter);
            match json.serialize(&mut serializer) {
                Ok(()) => String::from_utf8(out).unwrap_or_default(),
                Err(_) => json.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keeps_insertion_order_and_skips_functions() {
        let mut object = Object::new();
        object.set("b", Value::Number(1.0));
        object.set("a", Value::array(vec![Value::Undefined, Value::Number(0.5)]));
        object.set("f", Value::native("f", |_, _, _| Ok(Value::Undefined)));
        object.set("u", Value::Undefined);

        let json = to_json(&Value::object(object)).unwrap().unwrap();
        assert_eq!(json.to_string(), r#"{"b":1,"a":[null,0.5]}"#);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let array = Value::array(vec![]);
        if let Value::Array(items) = &array {
            items.borrow_mut().push(array.clone());
        }
        assert_eq!(to_json(&array), Err(JsonError::Circular));
        // break the cycle so the test does not leak
        if let Value::Array(items) = &array {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn test_pretty_stringify() {
        let json = serde_json::json!({"a": [1, 2]});
        assert_eq!(stringify(&json, Some("  ")), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn test_from_json() {
        let value = from_json(&serde_json::json!({"x": [true, null, "s"]}));
        assert_eq!(value.to_display_string(), "[object Object]");
    }
}
