//! Language intrinsics
//!
//! Installs the built-in globals into the intrinsic scope:
//!
//! - `Math`, `JSON`
//! - `Object`, `Array`, `String`, `Number`, `Boolean` with their static helpers
//! - `parseInt`, `parseFloat`, `isNaN`, `isFinite`, `NaN`, `Infinity`
//! - Error constructors: `Error`, `TypeError`, `RangeError`,
//!   `ReferenceError`, `SyntaxError`
//!
//! These belong to the language, not to the embedding program: nothing here
//! reaches outside the interpreter. `Math.random` draws from the
//! interpreter's seeded generator.

use crate::interpreter::constants::MAX_COLLECTION_LENGTH;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods::{arg, own_keys};
use crate::memory::json::{self, JsonError};
use crate::memory::scope::Scope;
use crate::memory::value::{format_number, parse_number, Object, Value};

type Builtin = fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, RuntimeError>;

/// Declare every intrinsic in `scope`
pub(crate) fn install(scope: &Scope) {
    scope.declare("NaN", Value::Number(f64::NAN), false);
    scope.declare("Infinity", Value::Number(f64::INFINITY), false);

    scope.declare("Math", math(), false);
    scope.declare("JSON", json_object(), false);
    scope.declare("Object", object_constructor(), false);
    scope.declare("Array", array_constructor(), false);
    scope.declare("String", string_constructor(), false);
    scope.declare("Number", number_constructor(), false);
    scope.declare("Boolean", Value::native("Boolean", |_, _, args| Ok(Value::Bool(arg(args, 0).is_truthy()))), false);

    scope.declare("parseInt", Value::native("parseInt", parse_int), false);
    scope.declare("parseFloat", Value::native("parseFloat", parse_float), false);
    scope.declare(
        "isNaN",
        Value::native("isNaN", |_, _, args| Ok(Value::Bool(arg(args, 0).to_number().is_nan()))),
        false,
    );
    scope.declare(
        "isFinite",
        Value::native("isFinite", |_, _, args| Ok(Value::Bool(arg(args, 0).to_number().is_finite()))),
        false,
    );

    for name in ["Error", "TypeError", "RangeError", "ReferenceError", "SyntaxError"] {
        scope.declare(name, error_constructor(name), false);
    }
}

/// A native function carrying static properties
fn with_properties(constructor: Value, properties: Vec<(&str, Value)>) -> Value {
    if let Value::Native(native) = &constructor {
        let mut table = native.properties.borrow_mut();
        for (key, value) in properties {
            table.set(key, value);
        }
    }
    constructor
}

fn namespace(members: Vec<(&str, Value)>) -> Value {
    Value::object(
        members
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

fn function(name: &str, func: Builtin) -> (&str, Value) {
    (name, Value::native(name, func))
}

fn error_constructor(name: &'static str) -> Value {
    Value::native(name, move |_, _, args| {
        let message = match arg(args, 0) {
            Value::Undefined => String::new(),
            other => other.to_display_string(),
        };
        Ok(Value::error(name, message))
    })
}

// ---------------------------------------------------------------------------
// Math
// ---------------------------------------------------------------------------

fn unary_math(name: &'static str, f: fn(f64) -> f64) -> (&'static str, Value) {
    (
        name,
        Value::native(name, move |_, _, args| Ok(Value::Number(f(arg(args, 0).to_number())))),
    )
}

/// `Math.round`: halves round toward +Infinity
fn round_half_up(n: f64) -> f64 {
    let floor = n.floor();
    if n - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

fn math() -> Value {
    let mut members = vec![
        ("PI", Value::Number(std::f64::consts::PI)),
        ("E", Value::Number(std::f64::consts::E)),
        ("LN2", Value::Number(std::f64::consts::LN_2)),
        ("LN10", Value::Number(std::f64::consts::LN_10)),
        ("SQRT2", Value::Number(std::f64::consts::SQRT_2)),
        unary_math("abs", f64::abs),
        unary_math("floor", f64::floor),
        unary_math("ceil", f64::ceil),
        unary_math("round", round_half_up),
        unary_math("trunc", f64::trunc),
        unary_math("sqrt", f64::sqrt),
        unary_math("cbrt", f64::cbrt),
        unary_math("exp", f64::exp),
        unary_math("log", f64::ln),
        unary_math("log2", f64::log2),
        unary_math("log10", f64::log10),
        unary_math("sin", f64::sin),
        unary_math("cos", f64::cos),
        unary_math("tan", f64::tan),
        unary_math("asin", f64::asin),
        unary_math("acos", f64::acos),
        unary_math("atan", f64::atan),
        unary_math("sign", |n| if n.is_nan() || n == 0.0 { n } else { n.signum() }),
    ];
    members.push(function("pow", |_, _, args| {
        let base = arg(args, 0).to_number();
        let exponent = arg(args, 1).to_number();
        Ok(Value::Number(if exponent.is_nan() { f64::NAN } else { base.powf(exponent) }))
    }));
    members.push(function("atan2", |_, _, args| {
        Ok(Value::Number(arg(args, 0).to_number().atan2(arg(args, 1).to_number())))
    }));
    members.push(function("hypot", |_, _, args| {
        Ok(Value::Number(args.iter().map(|v| v.to_number().powi(2)).sum::<f64>().sqrt()))
    }));
    members.push(function("max", |_, _, args| {
        let mut result = f64::NEG_INFINITY;
        for value in args {
            let n = value.to_number();
            if n.is_nan() {
                return Ok(Value::Number(f64::NAN));
            }
            result = result.max(n);
        }
        Ok(Value::Number(result))
    }));
    members.push(function("min", |_, _, args| {
        let mut result = f64::INFINITY;
        for value in args {
            let n = value.to_number();
            if n.is_nan() {
                return Ok(Value::Number(f64::NAN));
            }
            result = result.min(n);
        }
        Ok(Value::Number(result))
    }));
    members.push(function("random", |interp, _, _| Ok(Value::Number(interp.random()))));
    namespace(members)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn json_object() -> Value {
    namespace(vec![
        function("stringify", |_, _, args| {
            let indent = match arg(args, 2) {
                Value::Number(n) => Some(" ".repeat(n.clamp(0.0, 10.0) as usize)),
                Value::String(s) => Some(s.chars().take(10).collect()),
                _ => None,
            };
            match json::to_json(&arg(args, 0)) {
                Ok(Some(value)) => Ok(Value::from(json::stringify(&value, indent.as_deref()))),
                Ok(None) => Ok(Value::Undefined),
                Err(JsonError::Circular) => Err(RuntimeError::type_error(
                    "Converting circular structure to JSON",
                )),
            }
        }),
        function("parse", |_, _, args| {
            let text = arg(args, 0).to_display_string();
            serde_json::from_str::<serde_json::Value>(&text)
                .map(|parsed| json::from_json(&parsed))
                .map_err(|err| RuntimeError::syntax_error(format!("JSON.parse: {}", err)))
        }),
    ])
}

// ---------------------------------------------------------------------------
// Constructors with static helpers
// ---------------------------------------------------------------------------

fn object_constructor() -> Value {
    let constructor = Value::native("Object", |_, _, args| {
        Ok(match arg(args, 0) {
            value @ (Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Native(_)) => value,
            _ => Value::object(Object::new()),
        })
    });
    with_properties(
        constructor,
        vec![
            function("keys", |_, _, args| {
                Ok(Value::array(own_keys(&arg(args, 0)).into_iter().map(Value::from).collect()))
            }),
            function("values", |interp, _, args| {
                let target = arg(args, 0);
                let mut values = Vec::new();
                for key in own_keys(&target) {
                    values.push(interp.get_property(&target, &key)?);
                }
                Ok(Value::array(values))
            }),
            function("entries", |interp, _, args| {
                let target = arg(args, 0);
                let mut entries = Vec::new();
                for key in own_keys(&target) {
                    let value = interp.get_property(&target, &key)?;
                    entries.push(Value::array(vec![Value::from(key), value]));
                }
                Ok(Value::array(entries))
            }),
            function("assign", |interp, _, args| {
                let target = arg(args, 0);
                if target.is_nullish() {
                    return Err(RuntimeError::type_error(
                        "Cannot convert undefined or null to object",
                    ));
                }
                for source in args.iter().skip(1) {
                    for key in own_keys(source) {
                        let value = interp.get_property(source, &key)?;
                        interp.set_property(&target, &key, value)?;
                    }
                }
                Ok(target)
            }),
            function("fromEntries", |interp, _, args| {
                let mut object = Object::new();
                for entry in interp.iterate(&arg(args, 0))? {
                    let key = interp.get_property(&entry, "0")?.to_property_key();
                    let value = interp.get_property(&entry, "1")?;
                    object.set(key, value);
                }
                Ok(Value::object(object))
            }),
            function("freeze", |_, _, args| Ok(arg(args, 0))),
        ],
    )
}

fn array_constructor() -> Value {
    let constructor = Value::native("Array", |_, _, args| match args {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || *n > MAX_COLLECTION_LENGTH as f64 {
                return Err(RuntimeError::range_error("Invalid array length"));
            }
            Ok(Value::array(vec![Value::Undefined; *n as usize]))
        }
        _ => Ok(Value::array(args.to_vec())),
    });
    with_properties(
        constructor,
        vec![
            function("isArray", |_, _, args| Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))),
            function("of", |_, _, args| Ok(Value::array(args.to_vec()))),
            function("from", |interp, _, args| {
                let source = arg(args, 0);
                let items = match &source {
                    Value::Array(_) | Value::String(_) => interp.iterate(&source)?,
                    Value::Object(_) => {
                        // array-like: `{ length: 3 }`
                        let length = interp.get_property(&source, "length")?.to_integer().max(0.0);
                        if length > MAX_COLLECTION_LENGTH as f64 {
                            return Err(RuntimeError::range_error("Invalid array length"));
                        }
                        let mut items = Vec::new();
                        for index in 0..length as usize {
                            items.push(interp.get_property(&source, &index.to_string())?);
                        }
                        items
                    }
                    _ => Vec::new(),
                };
                let mapper = arg(args, 1);
                if !mapper.is_callable() {
                    return Ok(Value::array(items));
                }
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    mapped.push(interp.call_function(&mapper, Value::Undefined, &[item, Value::Number(index as f64)])?);
                }
                Ok(Value::array(mapped))
            }),
        ],
    )
}

fn string_constructor() -> Value {
    let constructor = Value::native("String", |_, _, args| {
        Ok(match args.first() {
            Some(value) => Value::from(value.to_display_string()),
            None => Value::string(""),
        })
    });
    with_properties(
        constructor,
        vec![function("fromCharCode", |_, _, args| {
            Ok(Value::from(
                args.iter()
                    .filter_map(|v| char::from_u32(v.to_number() as u32))
                    .collect::<String>(),
            ))
        })],
    )
}

fn number_constructor() -> Value {
    let constructor = Value::native("Number", |_, _, args| {
        Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
    });
    let is_integer = |n: f64| n.is_finite() && n.fract() == 0.0;
    with_properties(
        constructor,
        vec![
            ("MAX_SAFE_INTEGER", Value::Number(9_007_199_254_740_991.0)),
            ("MIN_SAFE_INTEGER", Value::Number(-9_007_199_254_740_991.0)),
            ("EPSILON", Value::Number(f64::EPSILON)),
            ("MAX_VALUE", Value::Number(f64::MAX)),
            ("MIN_VALUE", Value::Number(5e-324)),
            ("POSITIVE_INFINITY", Value::Number(f64::INFINITY)),
            ("NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY)),
            ("NaN", Value::Number(f64::NAN)),
            (
                "isInteger",
                Value::native("isInteger", move |_, _, args| {
                    Ok(Value::Bool(matches!(arg(args, 0), Value::Number(n) if is_integer(n))))
                }),
            ),
            (
                "isSafeInteger",
                Value::native("isSafeInteger", move |_, _, args| {
                    Ok(Value::Bool(matches!(
                        arg(args, 0),
                        Value::Number(n) if is_integer(n) && n.abs() <= 9_007_199_254_740_991.0
                    )))
                }),
            ),
            function("isFinite", |_, _, args| {
                Ok(Value::Bool(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
            }),
            function("isNaN", |_, _, args| {
                Ok(Value::Bool(matches!(arg(args, 0), Value::Number(n) if n.is_nan())))
            }),
            function("parseInt", parse_int),
            function("parseFloat", parse_float),
        ],
    )
}

// ---------------------------------------------------------------------------
// Global functions
// ---------------------------------------------------------------------------

/// `parseInt(text, radix)`: longest valid digit prefix after an optional sign
fn parse_int(_: &mut Interpreter, _: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_display_string();
    let mut text = text.trim_start();

    let negative = text.starts_with('-');
    if let Some(rest) = text.strip_prefix('-').or_else(|| text.strip_prefix('+')) {
        text = rest;
    }

    let mut radix = match arg(args, 1) {
        Value::Undefined => 0,
        other => other.to_integer() as i64,
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    if radix == 0 || radix == 16 {
        if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            text = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }

    let mut result: Option<f64> = None;
    for c in text.chars() {
        let Some(digit) = c.to_digit(radix as u32) else {
            break;
        };
        result = Some(result.unwrap_or(0.0) * radix as f64 + digit as f64);
    }
    Ok(Value::Number(match result {
        Some(n) if negative => -n,
        Some(n) => n,
        None => f64::NAN,
    }))
}

/// `parseFloat(text)`: longest decimal literal prefix
fn parse_float(_: &mut Interpreter, _: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_display_string();
    let text = text.trim_start();

    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Ok(Value::Number(sign * f64::INFINITY));
    }

    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &text[digits_start..end] == "." {
        return Ok(Value::Number(f64::NAN));
    }
    // exponent only counts when digits follow
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits {
            end = exponent_end;
        }
    }
    Ok(Value::Number(parse_number(&text[..end])))
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{AmbientBindings, Interpreter, Limits};
    use crate::memory::value::Value;
    use crate::transpiler::transpile;

    fn run(source: &str) -> Result<Value, String> {
        let script = transpile(source).map_err(|e| e.to_string())?;
        let mut interpreter = Interpreter::new(AmbientBindings::new(), Limits::default());
        interpreter.evaluate(&script).map_err(|e| e.to_string())
    }

    fn text(source: &str) -> String {
        run(source).unwrap().to_display_string()
    }

    #[test]
    fn test_math() {
        assert_eq!(text("Math.max(1, 5, 3)"), "5");
        assert_eq!(text("Math.max()"), "-Infinity");
        assert_eq!(text("Math.round(2.5) + Math.round(-2.5)"), "1");
        assert_eq!(text("Math.floor(-1.5)"), "-2");
        assert_eq!(text("Math.hypot(3, 4)"), "5");
    }

    #[test]
    fn test_json() {
        assert_eq!(text("JSON.stringify({ a: [1, 'x', null], b: undefined })"), r#"{"a":[1,"x",null]}"#);
        assert_eq!(text("JSON.stringify([1], null, 2)"), "[\n  1\n]");
        assert_eq!(text("JSON.parse('{\"k\": [1, 2]}').k[1]"), "2");
        assert_eq!(
            run("const o = {}; o.self = o; JSON.stringify(o)").unwrap_err(),
            "TypeError: Converting circular structure to JSON"
        );
        assert!(run("JSON.parse('{')").unwrap_err().starts_with("SyntaxError: JSON.parse:"));
    }

    #[test]
    fn test_object_statics() {
        assert_eq!(text("Object.entries({ a: 1, b: 2 }).map(([k, v]) => k + v).join()"), "a1,b2");
        assert_eq!(text("Object.values({ a: 1, b: 2 })"), "1,2");
        assert_eq!(text("const t = Object.assign({}, { a: 1 }, { b: 2 }); Object.keys(t)"), "a,b");
        assert_eq!(text("Object.fromEntries([['x', 1]]).x"), "1");
    }

    #[test]
    fn test_array_statics() {
        assert_eq!(text("Array.isArray([])"), "true");
        assert_eq!(text("Array.from({ length: 3 }, (_, i) => i * i)"), "0,1,4");
        assert_eq!(text("Array.from('ab')"), "a,b");
        assert_eq!(text("Array(3).length"), "3");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(text("parseInt('42px')"), "42");
        assert_eq!(text("parseInt('ff', 16)"), "255");
        assert_eq!(text("parseInt('0x1A')"), "26");
        assert_eq!(text("parseInt('abc')"), "NaN");
        assert_eq!(text("parseFloat('3.5e2kg')"), "350");
        assert_eq!(text("parseFloat('.5')"), "0.5");
        assert_eq!(text("Number('12') + Number('')"), "12");
        assert_eq!(text("String(null) + Boolean('')"), "nullfalse");
        assert_eq!(text("isNaN('x')"), "true");
        assert_eq!(text("Number.isInteger(5) && !Number.isInteger('5')"), "true");
    }

    #[test]
    fn test_error_constructors() {
        assert_eq!(text("String(new RangeError('bad'))"), "RangeError: bad");
        assert_eq!(text("Error('no new').message"), "no new");
        assert_eq!(text("new Error().name"), "Error");
    }
}
