//! Statement execution implementation
//!
//! This module handles the execution of all statement types of a lowered
//! script:
//!
//! - Declarations (`let`/`const` with patterns, hoisted function declarations)
//! - Control flow (if/else, while, do-while, for, for-of, for-in)
//! - `break`, `continue`, `return` and `throw`
//! - `try/catch/finally`
//! - Blocks and expression statements
//!
//! # Control Flow
//!
//! `break`, `continue` and `return` set [`ControlFlow`] on the interpreter and
//! every statement list stops at the first statement that leaves it
//! non-normal. Loops consume `Break`/`Continue`; calls consume `Return`.
//! Thrown values travel as `Err(RuntimeError::Thrown)`.
//!
//! # Scopes
//!
//! Each block gets its own scope. Loops with a `let` head fork the head scope
//! per iteration, so a closure created in the body keeps that iteration's
//! value.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::transpiler::script::{BindingKind, CatchClause, Declarator, Expr, Pattern, Stmt};

impl Interpreter {
    /// Execute a statement list in the current scope, hoisting its function
    /// declarations first
    pub(crate) fn execute_block_body(&mut self, body: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in body {
            if let Stmt::Function(function) = stmt {
                if let Some(name) = &function.name {
                    let closure = self.make_closure(function);
                    self.scope.declare(name.clone(), closure, true);
                }
            }
        }

        for stmt in body {
            self.execute_statement(stmt)?;
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// Execute a statement list in a fresh block scope
    pub(crate) fn execute_block(&mut self, body: &[Stmt]) -> Result<(), RuntimeError> {
        let saved = self.enter_block_scope();
        let result = self.execute_block_body(body);
        self.scope = saved;
        result
    }

    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        self.tick()?;

        match stmt {
            Stmt::Declare { kind, declarations } => self.execute_declaration(*kind, declarations),

            Stmt::Function(function) => {
                // hoisted by the enclosing block; only a lone branch body lands here
                if let Some(name) = &function.name {
                    if !self.scope.has_own(name) {
                        let closure = self.make_closure(function);
                        self.scope.declare(name.clone(), closure, true);
                    }
                }
                Ok(())
            }

            Stmt::Return(expr) => {
                self.return_value = match expr {
                    Some(expr) => self.evaluate_expr(expr)?,
                    None => Value::Undefined,
                };
                self.control_flow = ControlFlow::Return;
                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.execute_nested(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_nested(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => self.execute_while(condition, body),

            Stmt::DoWhile { body, condition } => self.execute_do_while(body, condition),

            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.execute_for(init.as_deref(), condition.as_ref(), update.as_ref(), body),

            Stmt::ForOf {
                kind,
                pattern,
                iterable,
                body,
            } => {
                let iterable = self.evaluate_expr(iterable)?;
                let items = self.iterate(&iterable)?;
                self.execute_for_each(*kind, pattern, items, body)
            }

            Stmt::ForIn {
                kind,
                pattern,
                object,
                body,
            } => {
                let object = self.evaluate_expr(object)?;
                let keys = crate::interpreter::methods::own_keys(&object)
                    .into_iter()
                    .map(Value::from)
                    .collect();
                self.execute_for_each(*kind, pattern, keys, body)
            }

            Stmt::Break => {
                self.control_flow = ControlFlow::Break;
                Ok(())
            }

            Stmt::Continue => {
                self.control_flow = ControlFlow::Continue;
                Ok(())
            }

            Stmt::Throw(expr) => {
                let value = self.evaluate_expr(expr)?;
                Err(RuntimeError::Thrown(value))
            }

            Stmt::Try {
                block,
                handler,
                finalizer,
            } => self.execute_try(block, handler.as_ref(), finalizer.as_deref()),

            Stmt::Block(body) => self.execute_block(body),

            Stmt::Expression(expr) => {
                let value = self.evaluate_expr(expr)?;
                if !self.in_function() {
                    self.completion = value;
                }
                Ok(())
            }
        }
    }

    /// Branch and loop bodies
    fn execute_nested(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Block(body) => self.execute_block(body),
            other => {
                let saved = self.enter_block_scope();
                let result = self.execute_statement(other);
                self.scope = saved;
                result
            }
        }
    }

    fn execute_declaration(
        &mut self,
        kind: BindingKind,
        declarations: &[Declarator],
    ) -> Result<(), RuntimeError> {
        for declarator in declarations {
            let value = match &declarator.init {
                Some(init) => self.evaluate_expr(init)?,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.pattern, value, kind == BindingKind::Let)?;
        }
        Ok(())
    }

    /// Consume `Break`/`Continue` after a loop body; `true` when the loop
    /// must stop
    fn loop_should_exit(&mut self) -> bool {
        match self.control_flow {
            ControlFlow::Break => {
                self.control_flow = ControlFlow::Normal;
                true
            }
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::Normal;
                false
            }
            ControlFlow::Return => true,
            ControlFlow::Normal => false,
        }
    }

    fn execute_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), RuntimeError> {
        loop {
            self.tick()?;
            if !self.evaluate_expr(condition)?.is_truthy() {
                return Ok(());
            }
            self.execute_nested(body)?;
            if self.loop_should_exit() {
                return Ok(());
            }
        }
    }

    fn execute_do_while(&mut self, body: &Stmt, condition: &Expr) -> Result<(), RuntimeError> {
        loop {
            self.tick()?;
            self.execute_nested(body)?;
            if self.loop_should_exit() {
                return Ok(());
            }
            if !self.evaluate_expr(condition)?.is_truthy() {
                return Ok(());
            }
        }
    }

    fn execute_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<(), RuntimeError> {
        let saved = self.enter_block_scope();
        let result = self.run_for_loop(init, condition, update, body);
        self.scope = saved;
        result
    }

    fn run_for_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<(), RuntimeError> {
        if let Some(init) = init {
            self.execute_statement(init)?;
        }

        loop {
            self.tick()?;
            if let Some(condition) = condition {
                if !self.evaluate_expr(condition)?.is_truthy() {
                    return Ok(());
                }
            }

            self.execute_nested(body)?;
            if self.loop_should_exit() {
                return Ok(());
            }

            // closures from this iteration keep the scope they captured
            let forked = self.scope.fork();
            self.track(&forked);
            self.scope = forked;

            if let Some(update) = update {
                self.evaluate_expr(update)?;
            }
        }
    }

    /// Shared by `for-of` (values) and `for-in` (keys)
    fn execute_for_each(
        &mut self,
        kind: BindingKind,
        pattern: &Pattern,
        items: Vec<Value>,
        body: &Stmt,
    ) -> Result<(), RuntimeError> {
        for item in items {
            self.tick()?;
            let saved = self.enter_block_scope();
            let result = self
                .bind_pattern(pattern, item, kind == BindingKind::Let)
                .and_then(|()| self.execute_nested(body));
            self.scope = saved;
            result?;

            if self.loop_should_exit() {
                break;
            }
        }
        Ok(())
    }

    fn execute_try(
        &mut self,
        block: &[Stmt],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Stmt]>,
    ) -> Result<(), RuntimeError> {
        let mut result = self.execute_block(block);

        if let (Err(err), Some(handler)) = (&result, handler) {
            if err.is_catchable() {
                let thrown = err.thrown_value();
                result = self.execute_catch(handler, thrown);
            }
        }

        let Some(finalizer) = finalizer else {
            return result;
        };
        if matches!(result, Err(RuntimeError::StepLimitExceeded { .. })) {
            return result;
        }

        let pending_flow = std::mem::replace(&mut self.control_flow, ControlFlow::Normal);
        let pending_return = std::mem::take(&mut self.return_value);
        self.execute_block(finalizer)?;

        if self.control_flow != ControlFlow::Normal {
            // a jump out of `finally` discards the pending outcome
            return Ok(());
        }
        self.control_flow = pending_flow;
        self.return_value = pending_return;
        result
    }

    fn execute_catch(&mut self, handler: &CatchClause, thrown: Value) -> Result<(), RuntimeError> {
        let saved = self.enter_block_scope();
        let result = match &handler.param {
            Some(param) => self.bind_pattern(param, thrown, true),
            None => Ok(()),
        }
        .and_then(|()| self.execute_block_body(&handler.body));
        self.scope = saved;
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{AmbientBindings, Interpreter, Limits};
    use crate::memory::value::Value;
    use crate::transpiler::transpile;

    fn run(source: &str) -> Value {
        let script = transpile(source).unwrap();
        let mut interpreter = Interpreter::new(AmbientBindings::new(), Limits::default());
        interpreter.evaluate(&script).unwrap()
    }

    #[test]
    fn test_loops() {
        assert_eq!(run("let s = 0; for (let i = 0; i < 5; i++) { s += i } s").as_number(), Some(10.0));
        assert_eq!(
            run("let s = 0; for (const x of [1, 2, 3]) { if (x == 2) continue; s += x } s").as_number(),
            Some(4.0)
        );
        assert_eq!(run("let n = 0; while (true) { n++; if (n > 3) break } n").as_number(), Some(4.0));
        assert_eq!(run("let n = 0; do { n++ } while (n < 0); n").as_number(), Some(1.0));
        assert_eq!(
            run("let keys = ''; for (const k in {a: 1, b: 2}) keys += k; keys").as_str(),
            Some("ab")
        );
    }

    #[test]
    fn test_closures_capture_iteration_bindings() {
        let value = run(
            "const fs = []
             for (let i = 0; i < 3; i++) fs.push(() => i)
             fs.map(f => f()).join(',')",
        );
        assert_eq!(value.as_str(), Some("0,1,2"));
    }

    #[test]
    fn test_hoisting() {
        assert_eq!(run("f(); function f() { return 7 } f()").as_number(), Some(7.0));
    }

    #[test]
    fn test_try_catch_finally() {
        let value = run(
            "let log = []
             try { throw new Error('boom') } catch (e) { log.push(e.message) } finally { log.push('done') }
             log.join(' ')",
        );
        assert_eq!(value.as_str(), Some("boom done"));

        let value = run(
            "function f() { try { return 'try' } finally { log = 'finally' } }
             let log = ''
             f() + ' ' + log",
        );
        assert_eq!(value.as_str(), Some("try finally"));

        let value = run("let r; try { null.x } catch { r = 'caught' } r");
        assert_eq!(value.as_str(), Some("caught"));
    }

    #[test]
    fn test_completion_inside_blocks() {
        assert_eq!(run("if (true) { 'yes' } else { 'no' }").as_str(), Some("yes"));
        assert_eq!(run("try { 1; throw 0 } catch (e) { 2 }").as_number(), Some(2.0));
    }
}
