//! Execution engine
//!
//! One attempt compiles the current snippet, evaluates it inside a fresh
//! sandbox and reports a single [`ExecutionResult`]:
//!
//! ```text
//! Idle → Compiling → Evaluating → Succeeded | Failed
//! ```
//!
//! The sandbox sees the language intrinsics plus exactly three ambient
//! bindings: `console` (captured into the [`LogStore`]), `Markup` and
//! `useObserver`. Compile and evaluation failures are converted into
//! [`PlaygroundError`]s here and never propagate further.

pub mod markup;
pub mod observer;

use crate::console::{LogStore, LogValue, SandboxConsole};
use crate::error::{EvaluationError, PlaygroundError};
use crate::interpreter::engine::{AmbientBindings, Interpreter, Limits};
use crate::memory::value::Value;
use crate::transpiler;
use observer::ObserverRegistry;
use serde::Serialize;
use tracing::{debug, info};

/// Names every sandbox receives from the host
pub const AMBIENT_NAMES: [&str; 3] = ["console", "Markup", "useObserver"];

/// Phase of the current (or last) attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptState {
    Idle,
    Compiling,
    Evaluating,
    Succeeded,
    Failed,
}

/// A renderable value together with the interpreter that produced it;
/// component functions inside the tree still need it to run
pub struct RenderedOutput {
    element: Value,
    interpreter: Interpreter,
}

impl RenderedOutput {
    pub fn element(&self) -> &Value {
        &self.element
    }

    /// The element and the interpreter to call its components with
    pub fn parts(&mut self) -> (&Value, &mut Interpreter) {
        (&self.element, &mut self.interpreter)
    }
}

/// Outcome of one attempt
pub enum ExecutionResult {
    Rendered(RenderedOutput),
    NonRenderable(LogValue),
    Failure(PlaygroundError),
}

impl ExecutionResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure(_))
    }

    pub fn error(&self) -> Option<&PlaygroundError> {
        match self {
            ExecutionResult::Failure(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionResult::Rendered(output) => {
                f.debug_tuple("Rendered").field(&output.element).finish()
            }
            ExecutionResult::NonRenderable(value) => f.debug_tuple("NonRenderable").field(value).finish(),
            ExecutionResult::Failure(err) => f.debug_tuple("Failure").field(err).finish(),
        }
    }
}

pub struct ExecutionEngine {
    limits: Limits,
    logs: LogStore,
    observers: ObserverRegistry,
    state: AttemptState,
    attempts: u64,
}

impl ExecutionEngine {
    pub fn new(limits: Limits, logs: LogStore) -> Self {
        Self {
            limits,
            logs,
            observers: ObserverRegistry::new(),
            state: AttemptState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    /// Run one attempt on `source`
    pub fn execute(&mut self, source: &str) -> ExecutionResult {
        self.attempts += 1;
        self.state = AttemptState::Idle;
        self.logs.reset();
        self.observers.reset();

        let ambient = self.ambient_bindings();

        self.state = AttemptState::Compiling;
        let script = match transpiler::transpile(source) {
            Ok(script) => script,
            Err(err) => {
                info!(attempt = self.attempts, error = %err, "snippet failed to compile");
                return self.fail(err.into());
            }
        };

        self.state = AttemptState::Evaluating;
        let mut interpreter = Interpreter::new(ambient, self.limits);
        let value = match interpreter.evaluate(&script) {
            Ok(value) => value,
            Err(err) => {
                info!(attempt = self.attempts, error = %err, steps = interpreter.steps(), "snippet evaluation failed");
                return self.fail(EvaluationError::from(err).into());
            }
        };

        self.state = AttemptState::Succeeded;
        debug!(
            attempt = self.attempts,
            steps = interpreter.steps(),
            logs = self.logs.len(),
            result = value.type_of(),
            "snippet evaluated"
        );
        match value {
            Value::Element(_) => ExecutionResult::Rendered(RenderedOutput {
                element: value,
                interpreter,
            }),
            other => ExecutionResult::NonRenderable(LogValue::capture(&other)),
        }
    }

    fn fail(&mut self, err: PlaygroundError) -> ExecutionResult {
        self.state = AttemptState::Failed;
        ExecutionResult::Failure(err)
    }

    fn ambient_bindings(&self) -> AmbientBindings {
        let [console_name, markup_name, observer_name] = AMBIENT_NAMES;
        AmbientBindings::new()
            .bind(console_name, SandboxConsole::new(self.logs.clone()).into_value())
            .bind(markup_name, markup::binding())
            .bind(observer_name, observer::binding(&self.observers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogKind;
    use crate::error::Stage;

    fn engine() -> ExecutionEngine {
        ExecutionEngine::new(Limits::default(), LogStore::new())
    }

    #[test]
    fn test_non_renderable_value() {
        let mut engine = engine();
        let result = engine.execute("1 + 1");
        assert!(matches!(result, ExecutionResult::NonRenderable(LogValue::Number(n)) if n == 2.0));
        assert_eq!(engine.state(), AttemptState::Succeeded);
        assert!(engine.logs().is_empty());
    }

    #[test]
    fn test_rendered_value() {
        let mut engine = engine();
        let result = engine.execute("<div>hi</div>");
        assert!(matches!(result, ExecutionResult::Rendered(_)));
    }

    #[test]
    fn test_compile_failure() {
        let mut engine = engine();
        let result = engine.execute("const = ;");
        assert_eq!(result.error().map(PlaygroundError::stage), Some(Stage::Compile));
        assert_eq!(engine.state(), AttemptState::Failed);
    }

    #[test]
    fn test_logs_are_reset_per_attempt() {
        let mut engine = engine();
        engine.execute("console.info('a'); console.warn('b')");
        assert_eq!(engine.logs().len(), 2);
        assert_eq!(engine.logs().entries()[1].kind, LogKind::Warning);

        engine.execute("console.error('c')");
        assert_eq!(engine.logs().len(), 1);
        assert_eq!(engine.logs().resets(), 2);
    }

    #[test]
    fn test_only_ambient_names_are_visible() {
        let mut engine = engine();
        let result = engine.execute("[typeof console, typeof Markup, typeof useObserver, typeof process, typeof window].join()");
        match result {
            ExecutionResult::NonRenderable(LogValue::String(text)) => {
                assert_eq!(text, "object,object,function,undefined,undefined")
            }
            other => panic!("unexpected result {:?}", other),
        }
        let names: Vec<String> = engine.ambient_bindings().names().map(str::to_string).collect();
        assert_eq!(names, AMBIENT_NAMES);
    }

    #[test]
    fn test_runaway_loop_fails() {
        let mut engine = ExecutionEngine::new(
            Limits {
                step_limit: 500,
                ..Limits::default()
            },
            LogStore::new(),
        );
        let result = engine.execute("while (true) {}");
        let err = result.error().map(ToString::to_string);
        assert_eq!(err.as_deref(), Some("RangeError: Execution step limit of 500 exceeded"));
    }
}
