// Execution engine for the snippet interpreter

use crate::interpreter::builtins;
use crate::interpreter::constants::{
    DEFAULT_MAX_CALL_DEPTH, DEFAULT_RANDOM_SEED, DEFAULT_STEP_LIMIT, SCOPE_PRUNE_THRESHOLD,
};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods::Prototypes;
use crate::memory::scope::{Scope, WeakScope};
use crate::memory::value::{Closure, Object, Value};
use crate::transpiler::script::{Function, FunctionBody, Script};
use std::rc::Rc;
use tracing::debug;

/// Non-local control flow raised by `break`, `continue` and `return`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return,
}

/// Names the embedding program makes visible to a snippet, in declaration
/// order. Each entry is bound as a constant in the ambient scope, between
/// the language intrinsics and the script's own scope.
#[derive(Debug, Clone, Default)]
pub struct AmbientBindings {
    entries: Vec<(String, Value)>,
}

impl AmbientBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing an earlier one of the same name
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.entries.retain(|(existing, _)| *existing != name);
        self.entries.push((name, value));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Evaluation guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub step_limit: u64,
    pub max_call_depth: usize,
    pub random_seed: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

/// SplitMix64, reseeded per interpreter so `Math.random` repeats across runs
#[derive(Debug, Clone)]
struct SeededRandom(u64);

impl SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Tree-walking interpreter for a lowered [`Script`]
pub struct Interpreter {
    /// Language built-ins (`Math`, `JSON`, `Error`, ...)
    intrinsics: Scope,

    /// Names supplied by the embedding program
    ambient: Scope,

    /// Top-level scope of the script
    global: Scope,

    /// Scope of the code currently executing
    pub(crate) scope: Scope,

    /// Every scope created so far, cleared on drop to break closure cycles
    scopes: Vec<WeakScope>,
    prune_at: usize,

    /// Pending `break`/`continue`/`return`
    pub(crate) control_flow: ControlFlow,

    /// Value carried by a pending `return`
    pub(crate) return_value: Value,

    /// Value of the last top-level expression statement
    pub(crate) completion: Value,

    steps: u64,
    call_depth: usize,
    limits: Limits,
    rng: SeededRandom,

    /// Methods of primitive and built-in receivers
    pub(crate) prototypes: Prototypes,
}

impl Interpreter {
    /// Create an interpreter whose script scope sees the intrinsics and
    /// `ambient`, and nothing else
    pub fn new(ambient: AmbientBindings, limits: Limits) -> Self {
        let intrinsics = Scope::root();
        builtins::install(&intrinsics);

        let ambient_scope = intrinsics.child();
        for (name, value) in ambient.entries {
            ambient_scope.declare(name, value, false);
        }
        let global = ambient_scope.child();

        Interpreter {
            intrinsics,
            ambient: ambient_scope,
            scope: global.clone(),
            global,
            scopes: Vec::new(),
            prune_at: SCOPE_PRUNE_THRESHOLD,
            control_flow: ControlFlow::Normal,
            return_value: Value::Undefined,
            completion: Value::Undefined,
            steps: 0,
            call_depth: 0,
            rng: SeededRandom(limits.random_seed),
            limits,
            prototypes: Prototypes::new(),
        }
    }

    /// Run a script to completion and return its completion value: the value
    /// of the last top-level expression statement, or `undefined`
    pub fn evaluate(&mut self, script: &Script) -> Result<Value, RuntimeError> {
        self.scope = self.global.clone();
        self.control_flow = ControlFlow::Normal;
        self.completion = Value::Undefined;

        let result = self.execute_block_body(&script.body);
        self.control_flow = ControlFlow::Normal;
        self.scope = self.global.clone();
        result?;

        debug!(steps = self.steps, "script evaluated");
        Ok(std::mem::take(&mut self.completion))
    }

    /// Call a script or native function
    pub fn call_function(
        &mut self,
        callee: &Value,
        this: Value,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(closure) => self.call_closure(closure.clone(), this, args),
            Value::Native(native) => {
                let native = native.clone();
                self.enter_call()?;
                let result = (native.func)(self, &this, args);
                self.call_depth -= 1;
                result
            }
            other => Err(RuntimeError::type_error(format!(
                "{} is not a function",
                describe_callee(other)
            ))),
        }
    }

    /// `new callee(...args)`
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(closure) if !closure.function.is_arrow => {
                let instance = Value::object(Object::with_constructor(closure.clone()));
                let result = self.call_closure(closure.clone(), instance.clone(), args)?;
                Ok(match result {
                    Value::Array(_) | Value::Object(_) | Value::Element(_) | Value::Error(_) => result,
                    _ => instance,
                })
            }
            Value::Native(_) => self.call_function(callee, Value::Undefined, args),
            other => Err(RuntimeError::type_error(format!(
                "{} is not a constructor",
                describe_callee(other)
            ))),
        }
    }

    /// Names declared at the top level of the script
    pub fn global_names(&self) -> Vec<String> {
        self.global.names()
    }

    /// Names visible from the ambient scope (excluding intrinsics)
    pub fn ambient_names(&self) -> Vec<String> {
        self.ambient.names()
    }

    /// Steps executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Next value of the seeded `Math.random` sequence
    pub(crate) fn random(&mut self) -> f64 {
        self.rng.next_f64()
    }

    /// Count one step against the budget
    pub(crate) fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.limits.step_limit {
            return Err(RuntimeError::StepLimitExceeded {
                limit: self.limits.step_limit,
            });
        }
        Ok(())
    }

    fn enter_call(&mut self) -> Result<(), RuntimeError> {
        self.tick()?;
        if self.call_depth >= self.limits.max_call_depth {
            return Err(RuntimeError::range_error("Maximum call stack size exceeded"));
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Whether code is running inside a called function
    pub(crate) fn in_function(&self) -> bool {
        self.call_depth > 0
    }

    fn call_closure(
        &mut self,
        closure: Rc<Closure>,
        this: Value,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        self.enter_call()?;
        let function = closure.function.clone();
        let this = if function.is_arrow { None } else { Some(this) };
        let scope = closure.scope.function_child(this);
        self.track(&scope);

        // a named function expression can refer to itself
        if let (false, Some(name)) = (function.is_arrow, &function.name) {
            scope.declare(name.clone(), Value::Function(closure.clone()), true);
        }

        let saved_scope = std::mem::replace(&mut self.scope, scope);
        let saved_flow = std::mem::replace(&mut self.control_flow, ControlFlow::Normal);
        let result = self.run_function(&function, args);
        self.scope = saved_scope;
        self.control_flow = saved_flow;
        self.call_depth -= 1;
        result
    }

    fn run_function(&mut self, function: &Function, args: &[Value]) -> Result<Value, RuntimeError> {
        self.bind_parameters(&function.params, args)?;
        match &function.body {
            FunctionBody::Expression(expr) => self.evaluate_expr(expr),
            FunctionBody::Block(body) => {
                self.execute_block_body(body)?;
                let value = if self.control_flow == ControlFlow::Return {
                    std::mem::take(&mut self.return_value)
                } else {
                    Value::Undefined
                };
                self.control_flow = ControlFlow::Normal;
                Ok(value)
            }
        }
    }

    /// Make a closure over the current scope
    pub(crate) fn make_closure(&self, function: &Rc<Function>) -> Value {
        Value::Function(Rc::new(Closure {
            function: function.clone(),
            scope: self.scope.clone(),
        }))
    }

    /// Enter a fresh block scope, returning the one to restore afterwards
    pub(crate) fn enter_block_scope(&mut self) -> Scope {
        let scope = self.scope.child();
        self.track(&scope);
        std::mem::replace(&mut self.scope, scope)
    }

    pub(crate) fn track(&mut self, scope: &Scope) {
        self.scopes.push(scope.downgrade());
        if self.scopes.len() >= self.prune_at {
            self.scopes.retain(|weak| weak.upgrade().is_some());
            self.prune_at = (self.scopes.len() * 2).max(SCOPE_PRUNE_THRESHOLD);
        }
    }

    /// Resolve a variable or raise `ReferenceError`
    pub(crate) fn lookup_variable(&self, name: &str) -> Result<Value, RuntimeError> {
        self.scope
            .lookup(name)
            .ok_or_else(|| RuntimeError::reference_error(format!("{} is not defined", name)))
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        let live = self
            .scopes
            .drain(..)
            .filter_map(|weak| weak.upgrade())
            .collect::<Vec<_>>();
        debug!(scopes = live.len(), steps = self.steps, "interpreter torn down");
        for scope in live {
            scope.clear();
        }
        self.global.clear();
        self.ambient.clear();
        self.intrinsics.clear();
    }
}

/// How a non-callable value is named in `is not a function` errors
pub(crate) fn describe_callee(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(_) | Value::Object(_) | Value::Element(_) | Value::Error(_) => {
            "object".to_string()
        }
        other => other.to_display_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::transpile;

    fn run(source: &str) -> Result<Value, RuntimeError> {
        let script = transpile(source).unwrap();
        let mut interpreter = Interpreter::new(AmbientBindings::new(), Limits::default());
        interpreter.evaluate(&script)
    }

    #[test]
    fn test_completion_value_is_last_top_level_expression() {
        assert_eq!(run("1 + 1").unwrap().as_number(), Some(2.0));
        assert_eq!(run("let x = 3; x * 2; const y = 1").unwrap().as_number(), Some(6.0));
        assert!(matches!(run("const z = 1").unwrap(), Value::Undefined));
        assert_eq!(
            run("function f() { 99; return 1 } f(); 5").unwrap().as_number(),
            Some(5.0)
        );
    }

    #[test]
    fn test_ambient_bindings_are_visible_and_constant() {
        let script = transpile("answer = 1").unwrap();
        let ambient = AmbientBindings::new().bind("answer", Value::Number(42.0));
        let mut interpreter = Interpreter::new(ambient.clone(), Limits::default());
        let err = interpreter.evaluate(&script).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Assignment to constant variable.");

        let script = transpile("answer + 1").unwrap();
        let mut interpreter = Interpreter::new(ambient, Limits::default());
        assert_eq!(interpreter.evaluate(&script).unwrap().as_number(), Some(43.0));
    }

    #[test]
    fn test_step_limit() {
        let script = transpile("while (true) {}").unwrap();
        let limits = Limits {
            step_limit: 1000,
            ..Limits::default()
        };
        let mut interpreter = Interpreter::new(AmbientBindings::new(), limits);
        let err = interpreter.evaluate(&script).unwrap_err();
        assert!(matches!(err, RuntimeError::StepLimitExceeded { limit: 1000 }));
    }

    #[test]
    fn test_call_depth_is_catchable() {
        let value = run(
            "function f() { return f() }
             let message = ''
             try { f() } catch (e) { message = e.message }
             message",
        )
        .unwrap();
        assert_eq!(value.as_str(), Some("Maximum call stack size exceeded"));
    }

    #[test]
    fn test_seeded_random_repeats() {
        let first = run("Math.random()").unwrap().as_number();
        let second = run("Math.random()").unwrap().as_number();
        assert_eq!(first, second);
        let n = first.unwrap();
        assert!((0.0..1.0).contains(&n));
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            run("function P(x) { this.x = x } const p = new P(4); p.x").unwrap().as_number(),
            Some(4.0)
        );
        assert!(run("function P() {} new P() instanceof P").unwrap().is_truthy());
        let err = run("const f = () => 1; new f()").unwrap_err();
        assert!(err.to_string().starts_with("TypeError:"));
    }
}
