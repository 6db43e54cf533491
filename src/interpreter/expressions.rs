//! Expression evaluation implementation
//!
//! This module handles evaluation of all expression types:
//!
//! - Literals, templates, array and object literals (with spread)
//! - Unary, update, binary, logical and conditional operators
//! - Assignment, including compound and logical assignment
//! - Member access, indexing and calls, with optional chaining
//! - `new` and `instanceof`
//!
//! # Optional chaining
//!
//! A chain such as `a?.b.c()` is evaluated by [`Interpreter::evaluate_chain`],
//! which returns `None` once an optional link meets `null`/`undefined`. The
//! rest of the chain is then skipped and the whole expression is `undefined`.
//!
//! # Assignment targets
//!
//! Targets are resolved once to a [`Reference`] so that `a[f()] += 1` calls
//! `f` a single time.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods::check_length;
use crate::memory::scope::AssignError;
use crate::memory::value::{Object, Value};
use crate::parser::ast::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};
use crate::transpiler::script::{Argument, ArrayElement, Expr, ObjectProperty, PropertyKey};
use std::cmp::Ordering;
use std::rc::Rc;

/// A resolved assignment target
enum Reference {
    Variable(String),
    Property(Value, String),
}

impl Interpreter {
    pub(crate) fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::string(s)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),

            Expr::Template {
                quasis,
                expressions,
            } => {
                let mut out = String::new();
                let mut length = 0;
                for (index, quasi) in quasis.iter().enumerate() {
                    length += quasi.chars().count();
                    out.push_str(quasi);
                    if let Some(expr) = expressions.get(index) {
                        let part = self.evaluate_expr(expr)?.to_display_string();
                        length += part.chars().count();
                        check_length(length, "string")?;
                        out.push_str(&part);
                    }
                }
                check_length(length, "string")?;
                Ok(Value::from(out))
            }

            Expr::Identifier(name) => self.lookup_variable(name),

            Expr::This => Ok(self.scope.this_value()),

            Expr::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        ArrayElement::Item(expr) => items.push(self.evaluate_expr(expr)?),
                        ArrayElement::Spread(expr) => {
                            let spread = self.evaluate_expr(expr)?;
                            items.extend(self.iterate(&spread)?);
                        }
                        ArrayElement::Hole => items.push(Value::Undefined),
                    }
                }
                Ok(Value::array(items))
            }

            Expr::Object(properties) => self.evaluate_object_literal(properties),

            Expr::Function(function) => Ok(self.make_closure(function)),

            Expr::Unary { op, operand } => self.evaluate_unary(*op, operand),

            Expr::Update { op, prefix, target } => {
                let reference = self.resolve_reference(target)?;
                let old = self.get_reference(&reference)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.put_reference(&reference, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Binary { op, left, right } => {
                let left = self.evaluate_expr(left)?;
                let right = self.evaluate_expr(right)?;
                self.binary_operation(*op, &left, &right)
            }

            Expr::Logical { op, left, right } => {
                let left = self.evaluate_expr(left)?;
                if short_circuits(*op, &left) {
                    Ok(left)
                } else {
                    self.evaluate_expr(right)
                }
            }

            Expr::Assign { op, target, value } => self.evaluate_assignment(*op, target, value),

            Expr::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.evaluate_expr(consequent)
                } else {
                    self.evaluate_expr(alternate)
                }
            }

            Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => {
                Ok(self.evaluate_chain(expr)?.unwrap_or_default())
            }

            Expr::New { callee, arguments } => {
                let constructor = self.evaluate_expr(callee)?;
                let args = self.evaluate_arguments(arguments)?;
                if !constructor.is_callable() {
                    return Err(RuntimeError::type_error(format!(
                        "{} is not a constructor",
                        callee_text(callee)
                    )));
                }
                self.construct(&constructor, &args)
            }
        }
    }

    fn evaluate_object_literal(&mut self, properties: &[ObjectProperty]) -> Result<Value, RuntimeError> {
        let mut object = Object::new();
        for property in properties {
            match property {
                ObjectProperty::KeyValue { key, value } => {
                    let key = match key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(expr) => self.evaluate_expr(expr)?.to_property_key(),
                    };
                    let value = self.evaluate_expr(value)?;
                    object.set(key, value);
                }
                ObjectProperty::Spread(expr) => {
                    let source = self.evaluate_expr(expr)?;
                    for key in crate::interpreter::methods::own_keys(&source) {
                        let value = self.get_property(&source, &key)?;
                        object.set(key, value);
                    }
                }
            }
        }
        Ok(Value::object(object))
    }

    fn evaluate_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value, RuntimeError> {
        // `typeof missing` is "undefined", not a ReferenceError
        if let (UnaryOp::TypeOf, Expr::Identifier(name)) = (op, operand) {
            return Ok(Value::string(
                self.scope.lookup(name).map_or("undefined", |v| v.type_of()),
            ));
        }

        let value = self.evaluate_expr(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::string(value.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    pub(crate) fn binary_operation(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        let number = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));

        Ok(match op {
            BinaryOp::Add => {
                if is_numeric_primitive(left) && is_numeric_primitive(right) {
                    Value::Number(left.to_number() + right.to_number())
                } else {
                    let mut joined = left.to_display_string();
                    let tail = right.to_display_string();
                    check_length(joined.chars().count() + tail.chars().count(), "string")?;
                    joined.push_str(&tail);
                    Value::from(joined)
                }
            }
            BinaryOp::Sub => number(|a, b| a - b),
            BinaryOp::Mul => number(|a, b| a * b),
            BinaryOp::Div => number(|a, b| a / b),
            BinaryOp::Mod => number(|a, b| a % b),
            BinaryOp::Pow => number(power),
            BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
            BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
            BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
            BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
            BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
            BinaryOp::Le => Value::Bool(matches!(
                compare(left, right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
            BinaryOp::Ge => Value::Bool(matches!(
                compare(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOp::InstanceOf => Value::Bool(instance_of(left, right)?),
            BinaryOp::In => {
                let key = left.to_property_key();
                if !matches!(
                    right,
                    Value::Object(_) | Value::Array(_) | Value::Native(_) | Value::Function(_) | Value::Element(_) | Value::Error(_)
                ) {
                    return Err(RuntimeError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key,
                        right.to_display_string()
                    )));
                }
                Value::Bool(crate::interpreter::methods::has_property(right, &key))
            }
        })
    }

    fn evaluate_assignment(&mut self, op: AssignOp, target: &Expr, value: &Expr) -> Result<Value, RuntimeError> {
        let reference = self.resolve_reference(target)?;
        let value = match op {
            AssignOp::Assign => self.evaluate_expr(value)?,
            AssignOp::Compound(binary) => {
                let current = self.get_reference(&reference)?;
                let operand = self.evaluate_expr(value)?;
                self.binary_operation(binary, &current, &operand)?
            }
            AssignOp::Logical(logical) => {
                let current = self.get_reference(&reference)?;
                if short_circuits(logical, &current) {
                    return Ok(current);
                }
                self.evaluate_expr(value)?
            }
        };
        self.put_reference(&reference, value.clone())?;
        Ok(value)
    }

    fn resolve_reference(&mut self, target: &Expr) -> Result<Reference, RuntimeError> {
        match target {
            Expr::Identifier(name) => Ok(Reference::Variable(name.clone())),
            Expr::Member {
                object, property, ..
            } => {
                let object = self.evaluate_expr(object)?;
                Ok(Reference::Property(object, property.clone()))
            }
            Expr::Index { object, index, .. } => {
                let object = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?.to_property_key();
                Ok(Reference::Property(object, key))
            }
            _ => Err(RuntimeError::syntax_error("Invalid left-hand side in assignment")),
        }
    }

    fn get_reference(&mut self, reference: &Reference) -> Result<Value, RuntimeError> {
        match reference {
            Reference::Variable(name) => self.lookup_variable(name),
            Reference::Property(object, key) => self.get_property(object, key),
        }
    }

    fn put_reference(&mut self, reference: &Reference, value: Value) -> Result<(), RuntimeError> {
        match reference {
            Reference::Variable(name) => self.scope.assign(name, value).map_err(|err| match err {
                AssignError::NotDefined => RuntimeError::reference_error(format!("{} is not defined", name)),
                AssignError::Constant => RuntimeError::type_error("Assignment to constant variable."),
            }),
            Reference::Property(object, key) => self.set_property(object, key, value),
        }
    }

    /// Evaluate a member/index/call chain. `None` when an optional link
    /// short-circuits.
    pub(crate) fn evaluate_chain(&mut self, expr: &Expr) -> Result<Option<Value>, RuntimeError> {
        match expr {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(base) = self.evaluate_chain(object)? else {
                    return Ok(None);
                };
                if *optional && base.is_nullish() {
                    return Ok(None);
                }
                self.get_property(&base, property).map(Some)
            }

            Expr::Index {
                object,
                index,
                optional,
            } => {
                let Some(base) = self.evaluate_chain(object)? else {
                    return Ok(None);
                };
                if *optional && base.is_nullish() {
                    return Ok(None);
                }
                let key = self.evaluate_expr(index)?.to_property_key();
                self.get_property(&base, &key).map(Some)
            }

            Expr::Call {
                callee,
                arguments,
                optional,
            } => {
                let Some((function, this)) = self.evaluate_callee(callee)? else {
                    return Ok(None);
                };
                if *optional && function.is_nullish() {
                    return Ok(None);
                }
                let args = self.evaluate_arguments(arguments)?;
                if !function.is_callable() {
                    return Err(RuntimeError::type_error(format!(
                        "{} is not a function",
                        callee_text(callee)
                    )));
                }
                self.call_function(&function, this, &args).map(Some)
            }

            other => self.evaluate_expr(other).map(Some),
        }
    }

    /// The function to call and its `this`
    fn evaluate_callee(&mut self, callee: &Expr) -> Result<Option<(Value, Value)>, RuntimeError> {
        let (base, key, optional) = match callee {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(base) = self.evaluate_chain(object)? else {
                    return Ok(None);
                };
                (base, property.clone(), *optional)
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let Some(base) = self.evaluate_chain(object)? else {
                    return Ok(None);
                };
                let key = self.evaluate_expr(index)?.to_property_key();
                (base, key, *optional)
            }
            other => {
                return Ok(self
                    .evaluate_chain(other)?
                    .map(|function| (function, Value::Undefined)))
            }
        };

        if optional && base.is_nullish() {
            return Ok(None);
        }
        let function = self.get_property(&base, &key)?;
        Ok(Some((function, base)))
    }

    pub(crate) fn evaluate_arguments(&mut self, arguments: &[Argument]) -> Result<Vec<Value>, RuntimeError> {
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                Argument::Item(expr) => args.push(self.evaluate_expr(expr)?),
                Argument::Spread(expr) => {
                    let spread = self.evaluate_expr(expr)?;
                    args.extend(self.iterate(&spread)?);
                }
            }
        }
        Ok(args)
    }
}

fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.is_truthy(),
        LogicalOp::Or => left.is_truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

/// Operands `+` adds numerically rather than concatenating
fn is_numeric_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
    )
}

/// `**`, where any NaN exponent yields NaN (`1 ** NaN`)
fn power(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// Relational comparison: strings compare lexically, everything else
/// numerically; `None` when either side is NaN
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

fn instance_of(value: &Value, constructor: &Value) -> Result<bool, RuntimeError> {
    match constructor {
        Value::Function(closure) => Ok(match value {
            Value::Object(object) => object
                .borrow()
                .constructor
                .as_ref()
                .is_some_and(|c| Rc::ptr_eq(c, closure)),
            _ => false,
        }),
        Value::Native(native) => Ok(match (native.name.as_str(), value) {
            ("Error", Value::Error(_)) => true,
            (name, Value::Error(error)) => error.name == name,
            ("Array", Value::Array(_)) => true,
            ("Function", v) => v.is_callable(),
            ("Object", v) => !matches!(
                v,
                Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
            ),
            _ => false,
        }),
        _ => Err(RuntimeError::type_error(
            "Right-hand side of 'instanceof' is not callable",
        )),
    }
}

/// Source-like text of a callee for error messages: `obj.method`
fn callee_text(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(name) => name.clone(),
        Expr::This => "this".to_string(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", callee_text(object), property),
        Expr::Index { object, .. } => format!("{}[...]", callee_text(object)),
        Expr::Call { callee, .. } => format!("{}(...)", callee_text(callee)),
        _ => "expression".to_string(),
    }
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
    fn test_arithmetic_and_concatenation() {
        assert_eq!(text("1 + 2 * 3"), "7");
        assert_eq!(text("'a' + 1 + 2"), "a12");
        assert_eq!(text("1 + 2 + 'a'"), "3a");
        assert_eq!(text("2 ** 3 ** 2"), "512");
        assert_eq!(text("-7 % 3"), "-1");
        assert_eq!(text("[1, 2] + ''"), "1,2");
        assert_eq!(text("1 / 0"), "Infinity");
        assert_eq!(text("'b' > 'a'"), "true");
        assert_eq!(text("null + 1"), "1");
    }

    #[test]
    fn test_logical_and_nullish() {
        assert_eq!(text("0 || 'x'"), "x");
        assert_eq!(text("0 ?? 'x'"), "0");
        assert_eq!(text("null ?? 'x'"), "x");
        assert_eq!(text("let a = null; a ??= 5; a"), "5");
        assert_eq!(text("let b = 1; b &&= 2; b"), "2");
    }

    #[test]
    fn test_optional_chaining() {
        assert_eq!(text("const o = null; o?.a.b.c"), "undefined");
        assert_eq!(text("const o = { f: null }; o.f?.()"), "undefined");
        assert_eq!(text("const o = { a: { b: 3 } }; o?.a?.b"), "3");
        let err = run("const o = {}; o.a.b").unwrap_err();
        assert_eq!(err, "TypeError: Cannot read properties of undefined (reading 'b')");
    }

    #[test]
    fn test_not_a_function_message() {
        let err = run("const obj = {}; obj.missing()").unwrap_err();
        assert_eq!(err, "TypeError: obj.missing is not a function");
    }

    #[test]
    fn test_updates_and_compound_assignment() {
        assert_eq!(text("let i = 1; const j = i++; `${i} ${j}`"), "2 1");
        assert_eq!(text("const o = { n: 1 }; o.n += 4; ++o.n"), "6");
        assert_eq!(text("const xs = [1]; xs[0] *= 3; xs[0]"), "3");
        assert_eq!(run("const c = 1; c = 2").unwrap_err(), "TypeError: Assignment to constant variable.");
        assert_eq!(run("undeclared = 2").unwrap_err(), "ReferenceError: undeclared is not defined");
    }

    #[test]
    fn test_typeof_and_in() {
        assert_eq!(text("typeof missing"), "undefined");
        assert_eq!(text("typeof (() => 1)"), "function");
        assert_eq!(text("'a' in { a: 1 }"), "true");
        assert_eq!(text("1 in [5, 6]"), "true");
    }

    #[test]
    fn test_object_literal_spread_and_methods() {
        assert_eq!(
            text("const base = { a: 1 }; const o = { ...base, b: 2, ['c' + 1]: 3, read() { return this.b } }; Object.keys(o).join() + o.read()"),
            "a,b,c1,read2"
        );
    }

    #[test]
    fn test_this_in_arrow_functions() {
        assert_eq!(
            text("const o = { v: 4, f() { return [1].map(() => this.v)[0] } }; o.f()"),
            "4"
        );
    }

    #[test]
    fn test_instanceof_errors() {
        assert_eq!(text("new TypeError('x') instanceof Error"), "true");
        assert_eq!(text("new Error('x') instanceof TypeError"), "false");
        assert_eq!(text("[] instanceof Array"), "true");
    }
}
