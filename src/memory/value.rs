//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values
//! of an executing snippet. Primitives are stored inline; arrays, objects and
//! functions are shared, reference-counted handles, so assignment aliases them
//! the way the scripting language expects.
//!
//! # Value Types
//!
//! - [`Value::Undefined`], [`Value::Null`], [`Value::Bool`], [`Value::Number`], [`Value::String`]
//! - [`Value::Array`]: shared, mutable list
//! - [`Value::Object`]: shared, mutable, insertion-ordered property map
//! - [`Value::Function`]: closure over a script function and its defining scope
//! - [`Value::Native`]: built-in function implemented in Rust
//! - [`Value::Element`]: UI node produced by the markup factory
//! - [`Value::Error`]: thrown error with name and message

use super::scope::Scope;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::transpiler::script::Function;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type ObjectRef = Rc<RefCell<Object>>;

/// Signature of built-in functions: interpreter, `this`, arguments
pub type NativeFn = dyn Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, RuntimeError>;

/// Runtime values in the interpreter
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<Closure>),
    Native(Rc<NativeFunction>),
    Element(Rc<Element>),
    Error(Rc<ErrorObject>),
}

/// Insertion-ordered property map
#[derive(Debug, Clone, Default)]
pub struct Object {
    properties: Vec<(String, Value)>,
    /// Function that constructed this object through `new`, for `instanceof`
    pub constructor: Option<Rc<Closure>>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty instance created by `new` on a script function
    pub fn with_constructor(constructor: Rc<Closure>) -> Self {
        Self {
            properties: Vec::new(),
            constructor: Some(constructor),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.iter().any(|(k, _)| k == key)
    }

    /// Set a property, keeping its original position when it already exists
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.properties.iter().position(|(k, _)| k == key)?;
        Some(self.properties.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.set(key, value);
        }
        object
    }
}

/// A script function together with the scope it was created in
pub struct Closure {
    pub function: Rc<Function>,
    pub scope: Scope,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.function.name.as_deref().unwrap_or("")
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({})", self.name())
    }
}

/// A function implemented in Rust, with static properties of its own
/// (`Object.keys`, `Array.isArray`, `Markup.Fragment`)
pub struct NativeFunction {
    pub name: String,
    pub func: Box<NativeFn>,
    pub properties: RefCell<Object>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, RuntimeError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
            properties: RefCell::new(Object::new()),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// UI node created by `Markup.createElement`. `children` already lives in
/// `props` (a single child as-is, several as an array).
#[derive(Debug)]
pub struct Element {
    pub element_type: Value,
    pub props: ObjectRef,
}

/// Error value: `new Error("boom")`, or an error raised by the interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
}

impl ErrorObject {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: Object) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn native(
        name: impl Into<String>,
        func: impl Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, RuntimeError> + 'static,
    ) -> Value {
        Value::Native(Rc::new(NativeFunction::new(name, func)))
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Value {
        Value::Error(Rc::new(ErrorObject::new(name, message)))
    }

    /// Result of the `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Null
            | Value::Array(_)
            | Value::Object(_)
            | Value::Element(_)
            | Value::Error(_) => "object",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric conversion (`+value`)
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) => parse_number(&self.to_display_string()),
            _ => f64::NAN,
        }
    }

    /// Integer conversion used by index arguments (`slice(1.5)` → 1)
    pub fn to_integer(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else {
            n.trunc()
        }
    }

    /// String conversion (`String(value)`, `"" + value`, template literals)
    pub fn to_display_string(&self) -> String {
        let mut seen = Vec::new();
        self.to_string_guarded(&mut seen)
    }

    fn to_string_guarded(&self, seen: &mut Vec<*const RefCell<Vec<Value>>>) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items);
                if seen.contains(&ptr) {
                    return String::new();
                }
                seen.push(ptr);
                let joined = items
                    .borrow()
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_string_guarded(seen)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                seen.pop();
                joined
            }
            Value::Object(_) | Value::Element(_) => "[object Object]".to_string(),
            Value::Function(closure) => format!("function {}() {{ [code] }}", closure.name()),
            Value::Native(native) => format!("function {}() {{ [native code] }}", native.name),
            Value::Error(error) => error.to_string(),
        }
    }

    /// Property key conversion (`obj[1]` reads key `"1"`)
    pub fn to_property_key(&self) -> String {
        self.to_display_string()
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.same_reference(other),
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Array(_), Value::String(_) | Value::Number(_)) => {
                Value::string(self.to_display_string()).loose_equals(other)
            }
            (Value::String(_) | Value::Number(_), Value::Array(_)) => {
                self.loose_equals(&Value::string(other.to_display_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// SameValueZero, used by `includes` (NaN equals NaN)
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Name reported by `[Function: name]` and stack-less error messages
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Value::Function(closure) => Some(closure.name()),
            Value::Native(native) => Some(&native.name),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(object) => {
                let object = object.borrow();
                f.debug_map().entries(object.iter()).finish()
            }
            Value::Function(closure) => write!(f, "[Function: {}]", closure.name()),
            Value::Native(native) => write!(f, "[Function: {}]", native.name),
            Value::Element(element) => write!(f, "Element({:?})", element.element_type),
            Value::Error(error) => write!(f, "{}", error),
            other => write!(f, "{}", other.to_display_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

/// Format a number the way the scripting language prints it:
/// `2`, `0.5`, `-0` as `0`, `1e+21`, `NaN`, `Infinity`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if !(1e-6..1e21).contains(&abs) {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        return format!("{:.0}", n);
    }
    format!("{}", n)
}

/// String to number conversion: surrounding whitespace ignored, empty is 0,
/// hex/binary/octal prefixes and `Infinity` accepted, anything else NaN
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0b") | Some("0B") => Some(2),
        Some("0o") | Some("0O") => Some(8),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }

    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            // reject forms Rust accepts but the language does not ("inf", "nan", "1_0")
            let valid = trimmed
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
            if valid {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("0xff"), 255.0);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("inf").is_nan());
    }

    #[test]
    fn test_truthiness_and_typeof() {
        assert!(!Value::string("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::native("f", |_, _, _| Ok(Value::Undefined)).type_of(), "function");
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::Number(1.0).loose_equals(&Value::string("1")));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
        assert!(Value::Number(f64::NAN).same_value_zero(&Value::Number(f64::NAN)));

        let shared = Value::array(vec![]);
        assert!(shared.strict_equals(&shared.clone()));
        assert!(!shared.strict_equals(&Value::array(vec![])));
    }

    #[test]
    fn test_array_to_string() {
        let inner = Value::array(vec![Value::Number(2.0), Value::Null]);
        let outer = Value::array(vec![Value::Number(1.0), inner, Value::string("x")]);
        assert_eq!(outer.to_display_string(), "1,2,,x");
    }
}
