//! Script printer
//!
//! `Display` for [`Script`]: plain script text with markup already turned
//! into factory calls. Used by `--emit-script` and in tests to check what
//! lowering produced.

use super::script::*;
use crate::memory::value::format_number;
use crate::parser::ast::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};
use std::fmt::{self, Write};

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer::default();
        for stmt in &self.body {
            printer.statement(stmt);
        }
        f.write_str(&printer.out)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer::default();
        printer.expr(self, 0);
        f.write_str(&printer.out)
    }
}

// Binding strength; a child weaker than its slot gets parentheses
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_UNARY: u8 = 16;
const PREC_POSTFIX: u8 = 17;
const PREC_CALL: u8 = 18;
const PREC_PRIMARY: u8 = 20;

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => 10,
        BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::InstanceOf
        | BinaryOp::In => 11,
        BinaryOp::Add | BinaryOp::Sub => 13,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 14,
        BinaryOp::Pow => 15,
    }
}

fn logical_precedence(op: LogicalOp) -> u8 {
    match op {
        LogicalOp::Nullish => 4,
        LogicalOp::Or => 5,
        LogicalOp::And => 6,
    }
}

pub(crate) fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::StrictEq => "===",
        BinaryOp::StrictNe => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::InstanceOf => "instanceof",
        BinaryOp::In => "in",
    }
}

fn logical_symbol(op: LogicalOp) -> &'static str {
    match op {
        LogicalOp::And => "&&",
        LogicalOp::Or => "||",
        LogicalOp::Nullish => "??",
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Assign { .. } => PREC_ASSIGN,
        Expr::Function(function) if function.is_arrow => PREC_ASSIGN,
        Expr::Conditional { .. } => PREC_CONDITIONAL,
        Expr::Logical { op, .. } => logical_precedence(*op),
        Expr::Binary { op, .. } => binary_precedence(*op),
        Expr::Unary { .. } => PREC_UNARY,
        Expr::Update { prefix: true, .. } => PREC_UNARY,
        Expr::Update { prefix: false, .. } => PREC_POSTFIX,
        Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } | Expr::New { .. } => PREC_CALL,
        _ => PREC_PRIMARY,
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn statement(&mut self, stmt: &Stmt) {
        self.line_start();
        self.statement_inline(stmt);
        self.push("\n");
    }

    /// Print a statement without leading indentation or trailing newline
    fn statement_inline(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { kind, declarations } => {
                self.declaration(*kind, declarations);
                self.push(";");
            }
            Stmt::Function(function) => self.function(function),
            Stmt::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.expr(value, 0);
                }
                self.push(";");
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.expr(condition, 0);
                self.push(") ");
                self.body(then_branch);
                if let Some(else_branch) = else_branch {
                    self.push(" else ");
                    self.body(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.push("while (");
                self.expr(condition, 0);
                self.push(") ");
                self.body(body);
            }
            Stmt::DoWhile { body, condition } => {
                self.push("do ");
                self.body(body);
                self.push(" while (");
                self.expr(condition, 0);
                self.push(");");
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                self.push("for (");
                match init.as_deref() {
                    Some(Stmt::Declare { kind, declarations }) => self.declaration(*kind, declarations),
                    Some(Stmt::Expression(expr)) => self.expr(expr, 0),
                    _ => {}
                }
                self.push("; ");
                if let Some(condition) = condition {
                    self.expr(condition, 0);
                }
                self.push("; ");
                if let Some(update) = update {
                    self.expr(update, 0);
                }
                self.push(") ");
                self.body(body);
            }
            Stmt::ForOf {
                kind,
                pattern,
                iterable,
                body,
            } => {
                self.push(&format!("for ({} ", kind_keyword(*kind)));
                self.pattern(pattern);
                self.push(" of ");
                self.expr(iterable, PREC_ASSIGN);
                self.push(") ");
                self.body(body);
            }
            Stmt::ForIn {
                kind,
                pattern,
                object,
                body,
            } => {
                self.push(&format!("for ({} ", kind_keyword(*kind)));
                self.pattern(pattern);
                self.push(" in ");
                self.expr(object, 0);
                self.push(") ");
                self.body(body);
            }
            Stmt::Break => self.push("break;"),
            Stmt::Continue => self.push("continue;"),
            Stmt::Throw(value) => {
                self.push("throw ");
                self.expr(value, 0);
                self.push(";");
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.block(block);
                if let Some(handler) = handler {
                    self.push(" catch ");
                    if let Some(param) = &handler.param {
                        self.push("(");
                        self.pattern(param);
                        self.push(") ");
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.block(finalizer);
                }
            }
            Stmt::Block(body) => self.block(body),
            Stmt::Expression(expr) => {
                // an expression statement may not start with `{` or `function`
                let needs_parens = matches!(expr, Expr::Object(_))
                    || matches!(expr, Expr::Function(f) if !f.is_arrow);
                if needs_parens {
                    self.push("(");
                    self.expr(expr, 0);
                    self.push(")");
                } else {
                    self.expr(expr, 0);
                }
                self.push(";");
            }
        }
    }

    fn declaration(&mut self, kind: BindingKind, declarations: &[Declarator]) {
        self.push(kind_keyword(kind));
        self.push(" ");
        for (i, declarator) in declarations.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.pattern(&declarator.pattern);
            if let Some(init) = &declarator.init {
                self.push(" = ");
                self.expr(init, PREC_ASSIGN);
            }
        }
    }

    fn body(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(body) => self.block(body),
            other => self.block(std::slice::from_ref(other)),
        }
    }

    fn block(&mut self, body: &[Stmt]) {
        if body.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.indent += 1;
        for stmt in body {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.line_start();
        self.push("}");
    }

    fn function(&mut self, function: &Function) {
        if !function.is_arrow {
            self.push("function");
            if let Some(name) = &function.name {
                self.push(" ");
                self.push(name);
            }
        }
        self.push("(");
        for (i, param) in function.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if param.rest {
                self.push("...");
            }
            self.pattern(&param.pattern);
            if let Some(default) = &param.default {
                self.push(" = ");
                self.expr(default, PREC_ASSIGN);
            }
        }
        self.push(")");
        if function.is_arrow {
            self.push(" =>");
        }
        self.push(" ");
        match &function.body {
            FunctionBody::Block(body) => self.block(body),
            FunctionBody::Expression(expr) => {
                if matches!(expr, Expr::Object(_)) {
                    self.push("(");
                    self.expr(expr, 0);
                    self.push(")");
                } else {
                    self.expr(expr, PREC_ASSIGN);
                }
            }
        }
    }

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Identifier(name) => self.push(name),
            Pattern::Object { properties, rest } => {
                self.push("{ ");
                let mut first = true;
                for property in properties {
                    if !first {
                        self.push(", ");
                    }
                    first = false;
                    self.property_name(&property.key);
                    let shorthand = matches!(&property.value, Pattern::Identifier(n) if *n == property.key);
                    if !shorthand {
                        self.push(": ");
                        self.pattern(&property.value);
                    }
                    if let Some(default) = &property.default {
                        self.push(" = ");
                        self.expr(default, PREC_ASSIGN);
                    }
                }
                if let Some(rest) = rest {
                    if !first {
                        self.push(", ");
                    }
                    self.push("...");
                    self.push(rest);
                }
                self.push(" }");
            }
            Pattern::Array { elements, rest } => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(element) = element {
                        self.pattern(&element.pattern);
                        if let Some(default) = &element.default {
                            self.push(" = ");
                            self.expr(default, PREC_ASSIGN);
                        }
                    }
                }
                if let Some(rest) = rest {
                    if !elements.is_empty() {
                        self.push(", ");
                    }
                    self.push("...");
                    self.push(rest);
                }
                self.push("]");
            }
        }
    }

    fn property_name(&mut self, name: &str) {
        if is_identifier_name(name) {
            self.push(name);
        } else {
            self.push(&quote(name));
        }
    }

    fn arguments(&mut self, arguments: &[Argument]) {
        self.push("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            match argument {
                Argument::Item(expr) => self.expr(expr, PREC_ASSIGN),
                Argument::Spread(expr) => {
                    self.push("...");
                    self.expr(expr, PREC_ASSIGN);
                }
            }
        }
        self.push(")");
    }

    /// Print `expr`, parenthesized when it binds weaker than `min`
    fn expr(&mut self, expr: &Expr, min: u8) {
        let parens = precedence(expr) < min;
        if parens {
            self.push("(");
        }
        self.expr_inner(expr);
        if parens {
            self.push(")");
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n) => {
                let text = format_number(*n);
                self.push(&text);
            }
            Expr::String(s) => {
                let text = quote(s);
                self.push(&text);
            }
            Expr::Template {
                quasis,
                expressions,
            } => {
                self.push("`");
                for (i, quasi) in quasis.iter().enumerate() {
                    let escaped = quasi
                        .replace('\\', "\\\\")
                        .replace('`', "\\`")
                        .replace("${", "\\${");
                    self.push(&escaped);
                    if let Some(expr) = expressions.get(i) {
                        self.push("${");
                        self.expr(expr, 0);
                        self.push("}");
                    }
                }
                self.push("`");
            }
            Expr::Bool(b) => self.push(if *b { "true" } else { "false" }),
            Expr::Null => self.push("null"),
            Expr::Undefined => self.push("undefined"),
            Expr::Identifier(name) => self.push(name),
            Expr::This => self.push("this"),
            Expr::Array(elements) => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match element {
                        ArrayElement::Item(e) => self.expr(e, PREC_ASSIGN),
                        ArrayElement::Spread(e) => {
                            self.push("...");
                            self.expr(e, PREC_ASSIGN);
                        }
                        ArrayElement::Hole => {}
                    }
                }
                if matches!(elements.last(), Some(ArrayElement::Hole)) {
                    self.push(",");
                }
                self.push("]");
            }
            Expr::Object(properties) => {
                if properties.is_empty() {
                    self.push("{}");
                    return;
                }
                self.push("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match property {
                        ObjectProperty::KeyValue { key, value } => {
                            match key {
                                PropertyKey::Named(name) => self.property_name(name),
                                PropertyKey::Computed(e) => {
                                    self.push("[");
                                    self.expr(e, PREC_ASSIGN);
                                    self.push("]");
                                }
                            }
                            self.push(": ");
                            self.expr(value, PREC_ASSIGN);
                        }
                        ObjectProperty::Spread(e) => {
                            self.push("...");
                            self.expr(e, PREC_ASSIGN);
                        }
                    }
                }
                self.push(" }");
            }
            Expr::Function(function) => self.function(function),
            Expr::Unary { op, operand } => {
                let symbol = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::TypeOf => "typeof ",
                    UnaryOp::Void => "void ",
                };
                self.push(symbol);
                // keep `- -x` from printing as `--x`
                if matches!((op, operand.as_ref()), (UnaryOp::Neg, Expr::Unary { op: UnaryOp::Neg, .. }))
                    || matches!((op, operand.as_ref()), (UnaryOp::Plus, Expr::Unary { op: UnaryOp::Plus, .. }))
                {
                    self.push(" ");
                }
                self.expr(operand, PREC_UNARY);
            }
            Expr::Update { op, prefix, target } => {
                let symbol = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    self.push(symbol);
                    self.expr(target, PREC_UNARY);
                } else {
                    self.expr(target, PREC_CALL);
                    self.push(symbol);
                }
            }
            Expr::Binary { op, left, right } => {
                let prec = binary_precedence(*op);
                // `**` is right-associative, everything else left
                let (left_min, right_min) = if *op == BinaryOp::Pow {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.expr(left, left_min);
                let _ = write!(self.out, " {} ", binary_symbol(*op));
                self.expr(right, right_min);
            }
            Expr::Logical { op, left, right } => {
                let prec = logical_precedence(*op);
                self.expr(left, prec);
                let _ = write!(self.out, " {} ", logical_symbol(*op));
                self.expr(right, prec + 1);
            }
            Expr::Assign { op, target, value } => {
                self.expr(target, PREC_CALL);
                let symbol = match op {
                    AssignOp::Assign => "=".to_string(),
                    AssignOp::Compound(op) => format!("{}=", binary_symbol(*op)),
                    AssignOp::Logical(op) => format!("{}=", logical_symbol(*op)),
                };
                let _ = write!(self.out, " {} ", symbol);
                self.expr(value, PREC_ASSIGN);
            }
            Expr::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                self.expr(condition, PREC_CONDITIONAL + 1);
                self.push(" ? ");
                self.expr(consequent, PREC_ASSIGN);
                self.push(" : ");
                self.expr(alternate, PREC_ASSIGN);
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                self.member_object(object);
                self.push(if *optional { "?." } else { "." });
                self.push(property);
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                self.member_object(object);
                if *optional {
                    self.push("?.");
                }
                self.push("[");
                self.expr(index, 0);
                self.push("]");
            }
            Expr::Call {
                callee,
                arguments,
                optional,
            } => {
                self.member_object(callee);
                if *optional {
                    self.push("?.");
                }
                self.arguments(arguments);
            }
            Expr::New { callee, arguments } => {
                self.push("new ");
                self.member_object(callee);
                self.arguments(arguments);
            }
        }
    }

    /// Object of a member access or callee of a call
    fn member_object(&mut self, object: &Expr) {
        let needs_parens = precedence(object) < PREC_CALL
            || matches!(object, Expr::Number(_) | Expr::Object(_))
            || matches!(object, Expr::Function(f) if !f.is_arrow);
        if needs_parens {
            self.push("(");
            self.expr_inner(object);
            self.push(")");
        } else {
            self.expr_inner(object);
        }
    }
}

fn kind_keyword(kind: BindingKind) -> &'static str {
    match kind {
        BindingKind::Let => "let",
        BindingKind::Const => "const",
    }
}
