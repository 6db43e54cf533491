//! Property access and built-in methods
//!
//! Reading a property goes through [`Interpreter::get_property`], which
//! dispatches on the receiver: own properties first, then the method table
//! for the receiver's kind in [`Prototypes`]. Methods are native functions
//! that take their receiver as `this`, so `xs.map(f)` calls the shared `map`
//! with `this = xs`.
//!
//! Strings are indexed by character.

use crate::interpreter::constants::MAX_COLLECTION_LENGTH;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{format_number, ArrayRef, Object, Value};
use std::cmp::Ordering;

/// Method tables per receiver kind
pub(crate) struct Prototypes {
    pub array: Object,
    pub string: Object,
    pub number: Object,
    pub function: Object,
    pub error: Object,
    pub object: Object,
}

impl Prototypes {
    pub fn new() -> Self {
        Self {
            array: array_methods(),
            string: string_methods(),
            number: number_methods(),
            function: function_methods(),
            error: error_methods(),
            object: object_methods(),
        }
    }
}

impl Interpreter {
    pub(crate) fn get_property(&mut self, object: &Value, key: &str) -> Result<Value, RuntimeError> {
        let found = match object {
            Value::Undefined | Value::Null => {
                return Err(RuntimeError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    object.to_display_string(),
                    key
                )))
            }
            Value::Object(properties) => match properties.borrow().get(key) {
                Some(value) => Some(value.clone()),
                None => self.prototypes.object.get(key).cloned(),
            },
            Value::Array(items) => {
                if key == "length" {
                    Some(Value::Number(items.borrow().len() as f64))
                } else if let Some(index) = array_index(key) {
                    items.borrow().get(index).cloned()
                } else {
                    self.prototypes.array.get(key).cloned()
                }
            }
            Value::String(s) => {
                if key == "length" {
                    Some(Value::Number(s.chars().count() as f64))
                } else if let Some(index) = array_index(key) {
                    s.chars().nth(index).map(|c| Value::from(c.to_string()))
                } else {
                    self.prototypes.string.get(key).cloned()
                }
            }
            Value::Number(_) => self.prototypes.number.get(key).cloned(),
            Value::Bool(_) => self.prototypes.object.get(key).cloned(),
            Value::Function(closure) => match key {
                "name" => Some(Value::string(closure.name())),
                "length" => Some(Value::Number(
                    closure
                        .function
                        .params
                        .iter()
                        .take_while(|p| !p.rest && p.default.is_none())
                        .count() as f64,
                )),
                _ => self.prototypes.function.get(key).cloned(),
            },
            Value::Native(native) => match native.properties.borrow().get(key) {
                Some(value) => Some(value.clone()),
                None if key == "name" => Some(Value::string(&native.name)),
                None => self.prototypes.function.get(key).cloned(),
            },
            Value::Element(element) => match key {
                "type" => Some(element.element_type.clone()),
                "props" => Some(Value::Object(element.props.clone())),
                "key" => Some(Value::Null),
                _ => self.prototypes.object.get(key).cloned(),
            },
            Value::Error(error) => match key {
                "name" => Some(Value::string(&error.name)),
                "message" => Some(Value::string(&error.message)),
                "stack" => Some(Value::from(error.to_string())),
                _ => self
                    .prototypes
                    .error
                    .get(key)
                    .or_else(|| self.prototypes.object.get(key))
                    .cloned(),
            },
        };
        Ok(found.unwrap_or_default())
    }

    pub(crate) fn set_property(&mut self, object: &Value, key: &str, value: Value) -> Result<(), RuntimeError> {
        match object {
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                object.to_display_string(),
                key
            ))),
            Value::Object(properties) => {
                properties.borrow_mut().set(key, value);
                Ok(())
            }
            Value::Array(items) => {
                if key == "length" {
                    let length = value.to_number();
                    if length < 0.0 || length.fract() != 0.0 || length > MAX_COLLECTION_LENGTH as f64 {
                        return Err(RuntimeError::range_error("Invalid array length"));
                    }
                    items.borrow_mut().resize(length as usize, Value::Undefined);
                } else if let Some(index) = array_index(key) {
                    let mut items = items.borrow_mut();
                    if index >= MAX_COLLECTION_LENGTH {
                        return Err(RuntimeError::range_error("Invalid array length"));
                    }
                    if index >= items.len() {
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            Value::Native(native) => {
                native.properties.borrow_mut().set(key, value);
                Ok(())
            }
            // primitives, closures, elements and errors ignore writes
            _ => Ok(()),
        }
    }

    /// Values produced by iterating `value` (`for-of`, spread, array patterns)
    pub(crate) fn iterate(&mut self, value: &Value) -> Result<Vec<Value>, RuntimeError> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
                "{} is not iterable",
                value.to_display_string()
            ))),
            other => Err(RuntimeError::type_error(format!(
                "{} is not iterable",
                other.type_of()
            ))),
        }
    }
}

/// Own enumerable keys, in order
pub(crate) fn own_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(object) => object.borrow().keys().map(str::to_string).collect(),
        Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
        Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        Value::Native(native) => native.properties.borrow().keys().map(str::to_string).collect(),
        Value::Element(_) => vec!["type".to_string(), "props".to_string()],
        _ => Vec::new(),
    }
}

/// The `in` operator
pub(crate) fn has_property(value: &Value, key: &str) -> bool {
    match value {
        Value::Array(items) => {
            key == "length" || array_index(key).is_some_and(|i| i < items.borrow().len())
        }
        Value::Error(_) => matches!(key, "name" | "message" | "stack"),
        Value::Function(_) => matches!(key, "name" | "length"),
        other => own_keys(other).iter().any(|k| k == key),
    }
}

/// Canonical array index: `"2"` is an index, `"02"` and `"-1"` are not
pub(crate) fn array_index(key: &str) -> Option<usize> {
    let index = key.parse::<u32>().ok()?;
    (index.to_string() == key).then_some(index as usize)
}

pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Clamp a possibly negative relative index into `0..=len`
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_integer();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn method(
    table: &mut Object,
    name: &str,
    func: impl Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, RuntimeError> + 'static,
) {
    table.set(name, Value::native(name, func));
}

fn this_array(this: &Value, name: &str) -> Result<ArrayRef, RuntimeError> {
    match this {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(RuntimeError::type_error(format!(
            "Array.prototype.{} called on a non-array",
            name
        ))),
    }
}

fn this_string(this: &Value) -> String {
    this.to_display_string()
}

fn callback(args: &[Value], index: usize) -> Result<Value, RuntimeError> {
    let function = arg(args, index);
    if function.is_callable() {
        Ok(function)
    } else {
        Err(RuntimeError::type_error(format!(
            "{} is not a function",
            crate::interpreter::engine::describe_callee(&function)
        )))
    }
}

pub(crate) fn check_length(length: usize, what: &str) -> Result<(), RuntimeError> {
    if length > MAX_COLLECTION_LENGTH {
        Err(RuntimeError::range_error(format!("Invalid {} length", what)))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

/// Iteration callbacks: `(element, index, array)` with an optional `this`
fn for_each_item(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    name: &str,
    mut visit: impl FnMut(usize, Value, Value) -> Option<Value>,
) -> Result<Option<Value>, RuntimeError> {
    let items = this_array(this, name)?.borrow().clone();
    let function = callback(args, 0)?;
    let this_arg = arg(args, 1);
    for (index, item) in items.into_iter().enumerate() {
        let result = interp.call_function(
            &function,
            this_arg.clone(),
            &[item.clone(), Value::Number(index as f64), this.clone()],
        )?;
        if let Some(done) = visit(index, item, result) {
            return Ok(Some(done));
        }
    }
    Ok(None)
}

fn array_methods() -> Object {
    let mut table = Object::new();

    method(&mut table, "push", |_, this, args| {
        let items = this_array(this, "push")?;
        let mut items = items.borrow_mut();
        check_length(items.len() + args.len(), "array")?;
        items.extend(args.iter().cloned());
        Ok(Value::Number(items.len() as f64))
    });
    method(&mut table, "pop", |_, this, _| {
        Ok(this_array(this, "pop")?.borrow_mut().pop().unwrap_or_default())
    });
    method(&mut table, "shift", |_, this, _| {
        let items = this_array(this, "shift")?;
        let mut items = items.borrow_mut();
        Ok(if items.is_empty() {
            Value::Undefined
        } else {
            items.remove(0)
        })
    });
    method(&mut table, "unshift", |_, this, args| {
        let items = this_array(this, "unshift")?;
        let mut items = items.borrow_mut();
        check_length(items.len() + args.len(), "array")?;
        items.splice(0..0, args.iter().cloned());
        Ok(Value::Number(items.len() as f64))
    });
    method(&mut table, "slice", |_, this, args| {
        let items = this_array(this, "slice")?;
        let items = items.borrow();
        let start = relative_index(&arg(args, 0), items.len(), 0);
        let end = relative_index(&arg(args, 1), items.len(), items.len());
        Ok(Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec()))
    });
    method(&mut table, "splice", |_, this, args| {
        let items = this_array(this, "splice")?;
        let mut items = items.borrow_mut();
        let len = items.len();
        let start = relative_index(&arg(args, 0), len, 0);
        let delete = if args.len() < 2 {
            len - start
        } else {
            (arg(args, 1).to_integer().max(0.0) as usize).min(len - start)
        };
        let inserted = args.get(2..).unwrap_or_default().iter().cloned();
        let removed: Vec<Value> = items.splice(start..start + delete, inserted).collect();
        Ok(Value::array(removed))
    });
    method(&mut table, "concat", |_, this, args| {
        let mut result = this_array(this, "concat")?.borrow().clone();
        for value in args {
            match value {
                Value::Array(more) => result.extend(more.borrow().iter().cloned()),
                other => result.push(other.clone()),
            }
        }
        check_length(result.len(), "array")?;
        Ok(Value::array(result))
    });
    method(&mut table, "join", |_, this, args| {
        let items = this_array(this, "join")?;
        let separator = match arg(args, 0) {
            Value::Undefined => ",".to_string(),
            other => other.to_display_string(),
        };
        let joined = join_items(&items.borrow(), &separator);
        check_length(joined.chars().count(), "string")?;
        Ok(Value::from(joined))
    });
    method(&mut table, "toString", |_, this, _| {
        let items = this_array(this, "toString")?;
        let joined = join_items(&items.borrow(), ",");
        check_length(joined.chars().count(), "string")?;
        Ok(Value::from(joined))
    });
    method(&mut table, "indexOf", |_, this, args| {
        let items = this_array(this, "indexOf")?;
        let items = items.borrow();
        let target = arg(args, 0);
        let from = relative_index(&arg(args, 1), items.len(), 0);
        let found = items
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, item)| item.strict_equals(&target));
        Ok(Value::Number(found.map_or(-1.0, |(i, _)| i as f64)))
    });
    method(&mut table, "lastIndexOf", |_, this, args| {
        let items = this_array(this, "lastIndexOf")?;
        let items = items.borrow();
        let target = arg(args, 0);
        let found = items.iter().rposition(|item| item.strict_equals(&target));
        Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
    });
    method(&mut table, "includes", |_, this, args| {
        let items = this_array(this, "includes")?;
        let target = arg(args, 0);
        let found = items.borrow().iter().any(|item| item.same_value_zero(&target));
        Ok(Value::Bool(found))
    });
    method(&mut table, "reverse", |_, this, _| {
        this_array(this, "reverse")?.borrow_mut().reverse();
        Ok(this.clone())
    });
    method(&mut table, "at", |_, this, args| {
        let items = this_array(this, "at")?;
        let items = items.borrow();
        let n = arg(args, 0).to_integer();
        let index = if n < 0.0 { items.len() as f64 + n } else { n };
        Ok(if index < 0.0 {
            Value::Undefined
        } else {
            items.get(index as usize).cloned().unwrap_or_default()
        })
    });
    method(&mut table, "fill", |_, this, args| {
        let items = this_array(this, "fill")?;
        let mut items = items.borrow_mut();
        let len = items.len();
        let start = relative_index(&arg(args, 1), len, 0);
        let end = relative_index(&arg(args, 2), len, len);
        let value = arg(args, 0);
        for slot in items.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
        Ok(this.clone())
    });
    method(&mut table, "flat", |_, this, args| {
        let depth = match arg(args, 0) {
            Value::Undefined => 1.0,
            other => other.to_integer(),
        };
        let items = this_array(this, "flat")?.borrow().clone();
        let mut out = Vec::new();
        flatten_into(&items, depth, &mut out);
        Ok(Value::array(out))
    });
    method(&mut table, "keys", |_, this, _| {
        let len = this_array(this, "keys")?.borrow().len();
        Ok(Value::array((0..len).map(|i| Value::Number(i as f64)).collect()))
    });
    method(&mut table, "values", |_, this, _| {
        Ok(Value::array(this_array(this, "values")?.borrow().clone()))
    });
    method(&mut table, "entries", |_, this, _| {
        let items = this_array(this, "entries")?.borrow().clone();
        Ok(Value::array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Value::array(vec![Value::Number(i as f64), item]))
                .collect(),
        ))
    });

    method(&mut table, "forEach", |interp, this, args| {
        for_each_item(interp, this, args, "forEach", |_, _, _| None)?;
        Ok(Value::Undefined)
    });
    method(&mut table, "map", |interp, this, args| {
        let mut out = Vec::new();
        for_each_item(interp, this, args, "map", |_, _, result| {
            out.push(result);
            None
        })?;
        Ok(Value::array(out))
    });
    method(&mut table, "filter", |interp, this, args| {
        let mut out = Vec::new();
        for_each_item(interp, this, args, "filter", |_, item, keep| {
            if keep.is_truthy() {
                out.push(item);
            }
            None
        })?;
        Ok(Value::array(out))
    });
    method(&mut table, "flatMap", |interp, this, args| {
        let mut out = Vec::new();
        for_each_item(interp, this, args, "flatMap", |_, _, result| {
            match result {
                Value::Array(items) => out.extend(items.borrow().iter().cloned()),
                other => out.push(other),
            }
            None
        })?;
        Ok(Value::array(out))
    });
    method(&mut table, "find", |interp, this, args| {
        let found = for_each_item(interp, this, args, "find", |_, item, hit| hit.is_truthy().then_some(item))?;
        Ok(found.unwrap_or_default())
    });
    method(&mut table, "findIndex", |interp, this, args| {
        let found = for_each_item(interp, this, args, "findIndex", |index, _, hit| {
            hit.is_truthy().then_some(Value::Number(index as f64))
        })?;
        Ok(found.unwrap_or(Value::Number(-1.0)))
    });
    method(&mut table, "findLast", |interp, this, args| {
        let mut last = Value::Undefined;
        for_each_item(interp, this, args, "findLast", |_, item, hit| {
            if hit.is_truthy() {
                last = item;
            }
            None
        })?;
        Ok(last)
    });
    method(&mut table, "findLastIndex", |interp, this, args| {
        let mut last = -1.0;
        for_each_item(interp, this, args, "findLastIndex", |index, _, hit| {
            if hit.is_truthy() {
                last = index as f64;
            }
            None
        })?;
        Ok(Value::Number(last))
    });
    method(&mut table, "some", |interp, this, args| {
        let found = for_each_item(interp, this, args, "some", |_, _, hit| hit.is_truthy().then_some(Value::Bool(true)))?;
        Ok(found.unwrap_or(Value::Bool(false)))
    });
    method(&mut table, "every", |interp, this, args| {
        let failed = for_each_item(interp, this, args, "every", |_, _, hit| (!hit.is_truthy()).then_some(Value::Bool(false)))?;
        Ok(failed.unwrap_or(Value::Bool(true)))
    });
    method(&mut table, "reduce", |interp, this, args| reduce(interp, this, args, false));
    method(&mut table, "reduceRight", |interp, this, args| reduce(interp, this, args, true));
    method(&mut table, "sort", |interp, this, args| {
        let items = this_array(this, "sort")?;
        let comparator = arg(args, 0);
        if !matches!(comparator, Value::Undefined) && !comparator.is_callable() {
            return Err(RuntimeError::type_error(
                "The comparison function must be either a function or undefined",
            ));
        }
        let snapshot = items.borrow().clone();
        let sorted = sort_values(interp, snapshot, &comparator)?;
        *items.borrow_mut() = sorted;
        Ok(this.clone())
    });

    table
}

fn join_items(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|item| {
            if item.is_nullish() {
                String::new()
            } else {
                item.to_display_string()
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn flatten_into(items: &[Value], depth: f64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(nested) if depth >= 1.0 => {
                let nested = nested.borrow().clone();
                flatten_into(&nested, depth - 1.0, out);
            }
            other => out.push(other.clone()),
        }
    }
}

fn reduce(interp: &mut Interpreter, this: &Value, args: &[Value], from_right: bool) -> Result<Value, RuntimeError> {
    let mut items: Vec<(usize, Value)> = this_array(this, "reduce")?
        .borrow()
        .iter()
        .cloned()
        .enumerate()
        .collect();
    if from_right {
        items.reverse();
    }
    let function = callback(args, 0)?;
    let mut items = items.into_iter();

    let mut accumulator = if args.len() >= 2 {
        arg(args, 1)
    } else {
        match items.next() {
            Some((_, first)) => first,
            None => {
                return Err(RuntimeError::type_error(
                    "Reduce of empty array with no initial value",
                ))
            }
        }
    };
    for (index, item) in items {
        accumulator = interp.call_function(
            &function,
            Value::Undefined,
            &[accumulator, item, Value::Number(index as f64), this.clone()],
        )?;
    }
    Ok(accumulator)
}

/// Stable merge sort with a fallible comparator; `undefined` sorts last
fn sort_values(interp: &mut Interpreter, mut items: Vec<Value>, comparator: &Value) -> Result<Vec<Value>, RuntimeError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = sort_values(interp, items, comparator)?;
    let right = sort_values(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => compare_for_sort(interp, a, b, comparator)? == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    Ok(merged)
}

fn compare_for_sort(interp: &mut Interpreter, a: &Value, b: &Value, comparator: &Value) -> Result<Ordering, RuntimeError> {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ok(Ordering::Equal),
        (Value::Undefined, _) => return Ok(Ordering::Greater),
        (_, Value::Undefined) => return Ok(Ordering::Less),
        _ => {}
    }
    if matches!(comparator, Value::Undefined) {
        return Ok(a.to_display_string().cmp(&b.to_display_string()));
    }
    let n = interp
        .call_function(comparator, Value::Undefined, &[a.clone(), b.clone()])?
        .to_number();
    Ok(if n > 0.0 {
        Ordering::Greater
    } else if n < 0.0 {
        Ordering::Less
    } else {
        Ordering::Equal
    })
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    (from..haystack.len())
        .take_while(|i| i + needle.len() <= haystack.len())
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

fn rfind_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

fn pad(this: &Value, args: &[Value], at_start: bool) -> Result<Value, RuntimeError> {
    let s = this_string(this);
    let target = arg(args, 0).to_integer().max(0.0) as usize;
    check_length(target, "string")?;
    let fill = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        other => other.to_display_string(),
    };
    let current = s.chars().count();
    if target <= current || fill.is_empty() {
        return Ok(Value::from(s));
    }
    let padding: String = fill.chars().cycle().take(target - current).collect();
    Ok(Value::from(if at_start {
        padding + &s
    } else {
        s + &padding
    }))
}

fn replace(interp: &mut Interpreter, this: &Value, args: &[Value], all: bool) -> Result<Value, RuntimeError> {
    let s = this_string(this);
    let pattern = arg(args, 0).to_display_string();
    let replacement = arg(args, 1);

    let mut out = String::new();
    let mut rest = s.as_str();
    let mut offset = 0;
    while let Some(position) = rest.find(pattern.as_str()) {
        out.push_str(&rest[..position]);
        let char_offset = s[..offset + position].chars().count();
        let substitute = if replacement.is_callable() {
            interp
                .call_function(
                    &replacement,
                    Value::Undefined,
                    &[
                        Value::string(&pattern),
                        Value::Number(char_offset as f64),
                        Value::string(&s),
                    ],
                )?
                .to_display_string()
        } else {
            replacement.to_display_string()
        };
        out.push_str(&substitute);

        let advance = position + pattern.len();
        if pattern.is_empty() {
            // empty pattern: insert once per gap, then step past one char
            match rest[advance..].chars().next() {
                Some(c) if all => {
                    out.push(c);
                    offset += advance + c.len_utf8();
                    rest = &rest[advance + c.len_utf8()..];
                    continue;
                }
                _ => {
                    offset += advance;
                    rest = &rest[advance..];
                    break;
                }
            }
        }
        offset += advance;
        rest = &rest[advance..];
        if !all {
            break;
        }
    }
    out.push_str(rest);
    Ok(Value::from(out))
}

fn string_methods() -> Object {
    let mut table = Object::new();

    method(&mut table, "charAt", |_, this, args| {
        let index = arg(args, 0).to_integer();
        let c = (index >= 0.0)
            .then(|| this_string(this).chars().nth(index as usize))
            .flatten();
        Ok(Value::from(c.map(String::from).unwrap_or_default()))
    });
    method(&mut table, "charCodeAt", |_, this, args| {
        let index = arg(args, 0).to_integer();
        let c = (index >= 0.0)
            .then(|| this_string(this).chars().nth(index as usize))
            .flatten();
        Ok(Value::Number(c.map_or(f64::NAN, |c| c as u32 as f64)))
    });
    method(&mut table, "at", |_, this, args| {
        let chars: Vec<char> = this_string(this).chars().collect();
        let n = arg(args, 0).to_integer();
        let index = if n < 0.0 { chars.len() as f64 + n } else { n };
        Ok(if index < 0.0 {
            Value::Undefined
        } else {
            chars
                .get(index as usize)
                .map_or(Value::Undefined, |c| Value::from(c.to_string()))
        })
    });
    method(&mut table, "indexOf", |_, this, args| {
        let chars: Vec<char> = this_string(this).chars().collect();
        let needle: Vec<char> = arg(args, 0).to_display_string().chars().collect();
        let from = relative_index(&arg(args, 1), chars.len(), 0);
        Ok(Value::Number(find_chars(&chars, &needle, from).map_or(-1.0, |i| i as f64)))
    });
    method(&mut table, "lastIndexOf", |_, this, args| {
        let chars: Vec<char> = this_string(this).chars().collect();
        let needle: Vec<char> = arg(args, 0).to_display_string().chars().collect();
        Ok(Value::Number(rfind_chars(&chars, &needle).map_or(-1.0, |i| i as f64)))
    });
    method(&mut table, "includes", |_, this, args| {
        Ok(Value::Bool(this_string(this).contains(&arg(args, 0).to_display_string())))
    });
    method(&mut table, "startsWith", |_, this, args| {
        Ok(Value::Bool(this_string(this).starts_with(&arg(args, 0).to_display_string())))
    });
    method(&mut table, "endsWith", |_, this, args| {
        Ok(Value::Bool(this_string(this).ends_with(&arg(args, 0).to_display_string())))
    });
    method(&mut table, "slice", |_, this, args| {
        let chars: Vec<char> = this_string(this).chars().collect();
        let start = relative_index(&arg(args, 0), chars.len(), 0);
        let end = relative_index(&arg(args, 1), chars.len(), chars.len());
        Ok(Value::from(chars.get(start..end.max(start)).unwrap_or_default().iter().collect::<String>()))
    });
    method(&mut table, "substring", |_, this, args| {
        let chars: Vec<char> = this_string(this).chars().collect();
        let clamp = |v: Value, default: usize| match v {
            Value::Undefined => default,
            other => other.to_integer().clamp(0.0, chars.len() as f64) as usize,
        };
        let a = clamp(arg(args, 0), 0);
        let b = clamp(arg(args, 1), chars.len());
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Ok(Value::from(chars[start..end].iter().collect::<String>()))
    });
    method(&mut table, "toUpperCase", |_, this, _| Ok(Value::from(this_string(this).to_uppercase())));
    method(&mut table, "toLowerCase", |_, this, _| Ok(Value::from(this_string(this).to_lowercase())));
    method(&mut table, "trim", |_, this, _| Ok(Value::string(this_string(this).trim())));
    method(&mut table, "trimStart", |_, this, _| Ok(Value::string(this_string(this).trim_start())));
    method(&mut table, "trimEnd", |_, this, _| Ok(Value::string(this_string(this).trim_end())));
    method(&mut table, "split", |_, this, args| {
        let s = this_string(this);
        let limit = match arg(args, 1) {
            Value::Undefined => usize::MAX,
            other => other.to_integer().max(0.0) as usize,
        };
        let parts: Vec<Value> = match arg(args, 0) {
            Value::Undefined => vec![Value::from(s)],
            separator => {
                let separator = separator.to_display_string();
                if separator.is_empty() {
                    s.chars().map(|c| Value::from(c.to_string())).collect()
                } else {
                    s.split(separator.as_str()).map(Value::string).collect()
                }
            }
        };
        Ok(Value::array(parts.into_iter().take(limit).collect()))
    });
    method(&mut table, "replace", |interp, this, args| replace(interp, this, args, false));
    method(&mut table, "replaceAll", |interp, this, args| replace(interp, this, args, true));
    method(&mut table, "repeat", |_, this, args| {
        let s = this_string(this);
        let count = arg(args, 0).to_integer();
        if count < 0.0 || count.is_infinite() {
            return Err(RuntimeError::range_error(format!(
                "Invalid count value: {}",
                format_number(count)
            )));
        }
        check_length(s.chars().count().saturating_mul(count as usize), "string")?;
        Ok(Value::from(s.repeat(count as usize)))
    });
    method(&mut table, "padStart", |_, this, args| pad(this, args, true));
    method(&mut table, "padEnd", |_, this, args| pad(this, args, false));
    method(&mut table, "concat", |_, this, args| {
        let mut s = this_string(this);
        for value in args {
            s.push_str(&value.to_display_string());
        }
        Ok(Value::from(s))
    });
    method(&mut table, "localeCompare", |_, this, args| {
        let ordering = this_string(this).cmp(&arg(args, 0).to_display_string());
        Ok(Value::Number(match ordering {
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
            Ordering::Greater => 1.0,
        }))
    });
    method(&mut table, "toString", |_, this, _| Ok(Value::from(this_string(this))));

    table
}

// ---------------------------------------------------------------------------
// Numbers, functions, errors, objects
// ---------------------------------------------------------------------------

/// Digits of `n` in `radix` (2..=36); fractions get up to 20 digits
fn format_radix(n: f64, radix: u32) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    let digit = |d: u32| std::char::from_digit(d, radix).unwrap_or('?');

    let negative = n < 0.0;
    let mut integer = n.abs().trunc();
    let mut fraction = n.abs().fract();

    let mut digits = Vec::new();
    if integer == 0.0 {
        digits.push('0');
    }
    while integer >= 1.0 {
        digits.push(digit((integer % radix as f64) as u32));
        integer = (integer / radix as f64).trunc();
    }
    let mut out: String = digits.into_iter().rev().collect();
    if negative {
        out.insert(0, '-');
    }

    if fraction > 0.0 {
        out.push('.');
        for _ in 0..20 {
            fraction *= radix as f64;
            out.push(digit(fraction.trunc() as u32));
            fraction = fraction.fract();
            if fraction == 0.0 {
                break;
            }
        }
    }
    out
}

/// `1234567.891` → `1,234,567.891`
fn format_grouped(n: f64) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    let rounded = (n * 1000.0).round() / 1000.0;
    let text = format_number(rounded);
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits.to_string()),
        None => ("", integer),
    };
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

fn number_methods() -> Object {
    let mut table = Object::new();

    method(&mut table, "toFixed", |_, this, args| {
        let n = this.to_number();
        let digits = arg(args, 0).to_integer();
        if !(0.0..=100.0).contains(&digits) {
            return Err(RuntimeError::range_error(
                "toFixed() digits argument must be between 0 and 100",
            ));
        }
        if !n.is_finite() || n.abs() >= 1e21 {
            return Ok(Value::from(format_number(n)));
        }
        let n = if n == 0.0 { 0.0 } else { n };
        Ok(Value::from(format!("{:.*}", digits as usize, n)))
    });
    method(&mut table, "toString", |_, this, args| {
        let n = this.to_number();
        match arg(args, 0) {
            Value::Undefined => Ok(Value::from(format_number(n))),
            radix => {
                let radix = radix.to_integer();
                if !(2.0..=36.0).contains(&radix) {
                    return Err(RuntimeError::range_error(
                        "toString() radix must be between 2 and 36",
                    ));
                }
                if radix == 10.0 {
                    Ok(Value::from(format_number(n)))
                } else {
                    Ok(Value::from(format_radix(n, radix as u32)))
                }
            }
        }
    });
    method(&mut table, "toLocaleString", |_, this, _| {
        Ok(Value::from(format_grouped(this.to_number())))
    });

    table
}

fn function_methods() -> Object {
    let mut table = Object::new();

    method(&mut table, "call", |interp, this, args| {
        let rest = args.get(1..).unwrap_or_default();
        interp.call_function(this, arg(args, 0), rest)
    });
    method(&mut table, "apply", |interp, this, args| {
        let list = match arg(args, 1) {
            Value::Undefined | Value::Null => Vec::new(),
            Value::Array(items) => items.borrow().clone(),
            _ => {
                return Err(RuntimeError::type_error(
                    "CreateListFromArrayLike called on non-object",
                ))
            }
        };
        interp.call_function(this, arg(args, 0), &list)
    });
    method(&mut table, "bind", |_, this, args| {
        if !this.is_callable() {
            return Err(RuntimeError::type_error("Bind must be called on a function"));
        }
        let target = this.clone();
        let bound_this = arg(args, 0);
        let bound_args: Vec<Value> = args.get(1..).unwrap_or_default().to_vec();
        let name = format!("bound {}", target.function_name().unwrap_or_default());
        Ok(Value::native(name, move |interp, _, more| {
            let mut all = bound_args.clone();
            all.extend(more.iter().cloned());
            interp.call_function(&target, bound_this.clone(), &all)
        }))
    });
    method(&mut table, "toString", |_, this, _| Ok(Value::from(this.to_display_string())));

    table
}

fn error_methods() -> Object {
    let mut table = Object::new();
    method(&mut table, "toString", |_, this, _| Ok(Value::from(this.to_display_string())));
    table
}

fn object_methods() -> Object {
    let mut table = Object::new();

    method(&mut table, "hasOwnProperty", |_, this, args| {
        let key = arg(args, 0).to_property_key();
        Ok(Value::Bool(own_keys(this).contains(&key)))
    });
    method(&mut table, "toString", |_, this, _| {
        Ok(Value::string(match this {
            Value::Object(_) | Value::Element(_) => "[object Object]".to_string(),
            other => other.to_display_string(),
        }))
    });

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::engine::{AmbientBindings, Limits};
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
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("012"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(text("[1, 2, 3].map(x => x * 2).filter(x => x > 2).join('-')"), "4-6");
        assert_eq!(text("[1, 2, 3, 4].reduce((a, b) => a + b)"), "10");
        assert_eq!(text("[3, 1, 10, 2].sort()"), "1,10,2,3");
        assert_eq!(text("[3, 1, 10, 2].sort((a, b) => a - b)"), "1,2,3,10");
        assert_eq!(text("const xs = [1, 2, 3, 4, 5]; const removed = xs.splice(1, 2, 'a'); `${xs}|${removed}`"), "1,a,4,5|2,3");
        assert_eq!(text("[1, [2, [3, [4]]]].flat(2)"), "1,2,3,4");
        assert_eq!(text("[1, 2, 3].slice(-2)"), "2,3");
        assert_eq!(text("[NaN].includes(NaN) && [NaN].indexOf(NaN) === -1"), "true");
        assert_eq!(text("[5, 6, 7].findIndex(x => x === 6)"), "1");
        assert_eq!(text("[].find(x => true)"), "undefined");
        assert_eq!(
            run("[].reduce((a, b) => a)").unwrap_err(),
            "TypeError: Reduce of empty array with no initial value"
        );
    }

    #[test]
    fn test_array_length_writes() {
        assert_eq!(text("const xs = [1, 2, 3]; xs.length = 1; xs"), "1");
        assert_eq!(text("const xs = []; xs[2] = 'c'; xs.length"), "3");
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(text("'Hello'.toUpperCase()"), "HELLO");
        assert_eq!(text("'a,b,c'.split(',').length"), "3");
        assert_eq!(text("'abc'.split('')"), "a,b,c");
        assert_eq!(text("'  x '.trim() + '|'"), "x|");
        assert_eq!(text("'5'.padStart(3, '0')"), "005");
        assert_eq!(text("'aXbXc'.replaceAll('X', '-')"), "a-b-c");
        assert_eq!(text("'aXbXc'.replace('X', m => m.toLowerCase())"), "axbXc");
        assert_eq!(text("'héllo'.length"), "5");
        assert_eq!(text("'héllo'.indexOf('l')"), "2");
        assert_eq!(text("'abcdef'.substring(4, 1)"), "bcd");
        assert_eq!(text("'ab'.repeat(3)"), "ababab");
        assert_eq!(run("'a'.repeat(-1)").unwrap_err(), "RangeError: Invalid count value: -1");
    }

    #[test]
    fn test_number_methods() {
        assert_eq!(text("(3.14159).toFixed(2)"), "3.14");
        assert_eq!(text("(255).toString(16)"), "ff");
        assert_eq!(text("(0.5).toString(2)"), "0.1");
        assert_eq!(text("(1234567.5).toLocaleString()"), "1,234,567.5");
    }

    #[test]
    fn test_function_methods() {
        assert_eq!(text("function f(a, b) { return this.x + a + b } f.call({ x: 1 }, 2, 3)"), "6");
        assert_eq!(text("function f(a, b) { return this.x + a + b } f.apply({ x: 1 }, [2, 3])"), "6");
        assert_eq!(text("function f(a, b) { return this.x + a + b } const g = f.bind({ x: 1 }, 2); g(3)"), "6");
        assert_eq!(text("const named = () => 1; named.name"), "named");
    }
}
