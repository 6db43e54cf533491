//! Lexical scopes
//!
//! A [`Scope`] is a shared handle to one level of bindings plus a link to its
//! parent. Closures keep the scope they were created in alive, so scopes are
//! reference-counted rather than pushed and popped like stack frames.
//!
//! The root of every evaluation is the intrinsic scope (language built-ins),
//! then the ambient scope (the names supplied by the embedding program), then
//! the script scope.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A variable binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}

#[derive(Debug, Default)]
struct ScopeData {
    bindings: FxHashMap<String, Binding>,
    parent: Option<Scope>,
    /// `this` for function scopes; arrow functions leave it unset so lookup
    /// continues to the enclosing function
    this: Option<Value>,
}

/// Why an assignment failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    NotDefined,
    Constant,
}

#[derive(Debug, Clone, Default)]
pub struct Scope(Rc<RefCell<ScopeData>>);

impl Scope {
    /// Scope with no parent
    pub fn root() -> Self {
        Self::default()
    }

    /// Block scope nested in `self`
    pub fn child(&self) -> Self {
        Scope(Rc::new(RefCell::new(ScopeData {
            parent: Some(self.clone()),
            ..ScopeData::default()
        })))
    }

    /// Function scope nested in `self` with its own `this`
    pub fn function_child(&self, this: Option<Value>) -> Self {
        let scope = self.child();
        scope.0.borrow_mut().this = this;
        scope
    }

    /// Declare a binding in this scope, replacing any previous one
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.into(), Binding { value, mutable });
    }

    /// Sibling scope starting with a copy of this scope's bindings. Loops
    /// fork their head scope per iteration so closures capture one
    /// iteration's values.
    pub fn fork(&self) -> Self {
        let data = self.0.borrow();
        Scope(Rc::new(RefCell::new(ScopeData {
            bindings: data.bindings.clone(),
            parent: data.parent.clone(),
            this: data.this.clone(),
        })))
    }

    /// Whether `name` is declared in this scope itself
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Resolve a name through the scope chain
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let data = current.0.borrow();
                if let Some(binding) = data.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                data.parent.clone()
            };
            current = next?;
        }
    }

    /// Assign to an existing binding found through the scope chain
    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            let next = {
                let mut data = current.0.borrow_mut();
                if let Some(binding) = data.bindings.get_mut(name) {
                    if !binding.mutable {
                        return Err(AssignError::Constant);
                    }
                    binding.value = value;
                    return Ok(());
                }
                data.parent.clone()
            };
            current = next.ok_or(AssignError::NotDefined)?;
        }
    }

    /// The nearest `this`, or `undefined` at the top level
    pub fn this_value(&self) -> Value {
        let mut current = self.clone();
        loop {
            let next = {
                let data = current.0.borrow();
                if let Some(this) = &data.this {
                    return this.clone();
                }
                data.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return Value::Undefined,
            }
        }
    }

    /// Names declared in this scope itself
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().bindings.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn downgrade(&self) -> WeakScope {
        WeakScope(Rc::downgrade(&self.0))
    }

    /// Drop every binding. Closures stored in a scope keep that scope alive
    /// through their own captured chain; clearing breaks those cycles once an
    /// evaluation is over.
    pub fn clear(&self) {
        let mut data = self.0.borrow_mut();
        data.bindings.clear();
        data.this = None;
    }
}

/// Non-owning handle used to tear scopes down after an evaluation
#[derive(Debug, Clone)]
pub struct WeakScope(Weak<RefCell<ScopeData>>);

impl WeakScope {
    pub fn upgrade(&self) -> Option<Scope> {
        self.0.upgrade().map(Scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let root = Scope::root();
        root.declare("x", Value::Number(1.0), true);
        let child = root.child();
        child.declare("y", Value::Number(2.0), true);

        assert_eq!(child.lookup("x").and_then(|v| v.as_number()), Some(1.0));
        assert_eq!(child.lookup("y").and_then(|v| v.as_number()), Some(2.0));
        assert!(root.lookup("y").is_none());
    }

    #[test]
    fn test_assign_respects_const() {
        let root = Scope::root();
        root.declare("c", Value::Number(1.0), false);
        root.declare("m", Value::Number(1.0), true);
        let child = root.child();

        assert_eq!(child.assign("c", Value::Null), Err(AssignError::Constant));
        assert_eq!(child.assign("missing", Value::Null), Err(AssignError::NotDefined));
        assert_eq!(child.assign("m", Value::Number(5.0)), Ok(()));
        assert_eq!(root.lookup("m").and_then(|v| v.as_number()), Some(5.0));
    }

    #[test]
    fn test_this_resolution() {
        let root = Scope::root();
        let function = root.function_child(Some(Value::string("receiver")));
        let arrow = function.child();

        assert_eq!(arrow.this_value().as_str(), Some("receiver"));
        assert!(matches!(root.this_value(), Value::Undefined));
    }
}
