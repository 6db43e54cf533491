//! Destructuring and parameter binding
//!
//! Patterns appear in declarations, parameters, loop heads and `catch`
//! clauses. Binding always declares new names in the current scope.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods::own_keys;
use crate::memory::value::{Object, Value};
use crate::transpiler::script::{Expr, Param, Pattern};

impl Interpreter {
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        mutable: bool,
    ) -> Result<(), RuntimeError> {
        match pattern {
            Pattern::Identifier(name) => {
                self.scope.declare(name.clone(), value, mutable);
                Ok(())
            }

            Pattern::Object { properties, rest } => {
                if value.is_nullish() {
                    return Err(RuntimeError::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_display_string(),
                        value.to_display_string()
                    )));
                }
                for property in properties {
                    let found = self.get_property(&value, &property.key)?;
                    let found = self.apply_default(found, property.default.as_ref())?;
                    self.bind_pattern(&property.value, found, mutable)?;
                }
                if let Some(rest) = rest {
                    let mut remaining = Object::new();
                    for key in own_keys(&value) {
                        if properties.iter().all(|p| p.key != key) {
                            let found = self.get_property(&value, &key)?;
                            remaining.set(key, found);
                        }
                    }
                    self.scope.declare(rest.clone(), Value::object(remaining), mutable);
                }
                Ok(())
            }

            Pattern::Array { elements, rest } => {
                let items = self.iterate(&value)?;
                for (index, element) in elements.iter().enumerate() {
                    let Some(element) = element else {
                        continue;
                    };
                    let item = items.get(index).cloned().unwrap_or_default();
                    let item = self.apply_default(item, element.default.as_ref())?;
                    self.bind_pattern(&element.pattern, item, mutable)?;
                }
                if let Some(rest) = rest {
                    let remaining = items.into_iter().skip(elements.len()).collect();
                    self.scope.declare(rest.clone(), Value::array(remaining), mutable);
                }
                Ok(())
            }
        }
    }

    /// Bind call arguments to a function's parameters in the current scope
    pub(crate) fn bind_parameters(&mut self, params: &[Param], args: &[Value]) -> Result<(), RuntimeError> {
        for (index, param) in params.iter().enumerate() {
            if param.rest {
                let rest = args.iter().skip(index).cloned().collect();
                self.bind_pattern(&param.pattern, Value::array(rest), true)?;
                break;
            }
            let arg = args.get(index).cloned().unwrap_or_default();
            let arg = self.apply_default(arg, param.default.as_ref())?;
            self.bind_pattern(&param.pattern, arg, true)?;
        }
        Ok(())
    }

    /// Defaults apply only to `undefined`, not to `null`
    fn apply_default(&mut self, value: Value, default: Option<&Expr>) -> Result<Value, RuntimeError> {
        match (value, default) {
            (Value::Undefined, Some(default)) => self.evaluate_expr(default),
            (value, _) => Ok(value),
        }
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

    #[test]
    fn test_object_patterns() {
        let value = run("const { a, b: renamed, c = 3, ...rest } = { a: 1, b: 2, d: 4, e: 5 }; [a, renamed, c, Object.keys(rest)].join('|')");
        assert_eq!(value.unwrap().as_str(), Some("1|2|3|d,e"));
    }

    #[test]
    fn test_array_patterns() {
        let value = run("const [x, , y = 9, ...zs] = [1, 2, undefined, 4, 5]; `${x} ${y} ${zs}`");
        assert_eq!(value.unwrap().as_str(), Some("1 9 4,5"));
    }

    #[test]
    fn test_parameters() {
        let value = run("function f(a, { b } = { b: 2 }, ...more) { return a + b + more.length } f(1, undefined, 'x', 'y')");
        assert_eq!(value.unwrap().as_number(), Some(5.0));
    }

    #[test]
    fn test_destructuring_null_fails() {
        let err = run("const { a } = null").unwrap_err();
        assert_eq!(err, "TypeError: Cannot destructure 'null' as it is null.");
    }
}
