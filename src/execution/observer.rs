// The `useObserver` ambient binding and the per-attempt registry of the
// state containers it hands out

use crate::memory::value::{Object, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// State containers created during the current attempt
#[derive(Debug, Clone, Default)]
pub struct ObserverRegistry {
    containers: Rc<RefCell<Vec<Value>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.containers.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.containers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.borrow().is_empty()
    }

    fn record(&self, container: Value) {
        self.containers.borrow_mut().push(container);
    }
}

/// `useObserver(initial)`: objects and arrays are shared as-is, primitives
/// are boxed as `{ value }`, no argument yields `{}`
pub fn binding(registry: &ObserverRegistry) -> Value {
    let registry = registry.clone();
    Value::native("useObserver", move |_, _, args| {
        let container = match args.first() {
            None => Value::object(Object::new()),
            Some(shared @ (Value::Object(_) | Value::Array(_))) => shared.clone(),
            Some(primitive) => {
                let mut boxed = Object::new();
                boxed.set("value", primitive.clone());
                Value::object(boxed)
            }
        };
        registry.record(container.clone());
        Ok(container)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::engine::{AmbientBindings, Interpreter, Limits};
    use crate::transpiler::transpile;

    fn run(source: &str, registry: &ObserverRegistry) -> Value {
        let script = transpile(source).unwrap();
        let ambient = AmbientBindings::new().bind("useObserver", binding(registry));
        let mut interpreter = Interpreter::new(ambient, Limits::default());
        interpreter.evaluate(&script).unwrap()
    }

    #[test]
    fn test_objects_are_shared() {
        let registry = ObserverRegistry::new();
        let value = run("const state = { count: 0 }; const seen = useObserver(state); seen.count++; state.count", &registry);
        assert_eq!(value.as_number(), Some(1.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_primitives_are_boxed() {
        let registry = ObserverRegistry::new();
        let value = run("const n = useObserver(5); n.value += 1; [n.value, Object.keys(useObserver())].join('|')", &registry);
        assert_eq!(value.as_str(), Some("6|"));
        assert_eq!(registry.len(), 2);

        registry.reset();
        assert!(registry.is_empty());
    }
}
