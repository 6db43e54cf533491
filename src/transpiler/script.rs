//! Lowered script representation
//!
//! The executable form of a snippet: no types, no module syntax, no markup.
//! Markup has become `createElement` calls and `var` has become `let`.
//! Functions are reference-counted so closures can share them without
//! copying bodies.

use crate::parser::ast::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};
use std::rc::Rc;

/// A compiled snippet
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub body: Vec<Stmt>,
    /// Module specifiers of the imports removed during lowering
    pub stripped_imports: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Identifier(String),
    Object {
        properties: Vec<PatternProperty>,
        rest: Option<String>,
    },
    Array {
        elements: Vec<Option<PatternElement>>,
        rest: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct PatternProperty {
    pub key: String,
    pub value: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct PatternElement {
    pub pattern: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
    pub rest: bool,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expression(Expr),
}

#[derive(Debug)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    pub is_arrow: bool,
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub pattern: Pattern,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Declare {
        kind: BindingKind,
        declarations: Vec<Declarator>,
    },
    Function(Rc<Function>),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        kind: BindingKind,
        pattern: Pattern,
        iterable: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        kind: BindingKind,
        pattern: Pattern,
        object: Expr,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
    Block(Vec<Stmt>),
    Expression(Expr),
}

#[derive(Debug, Clone)]
pub enum ArrayElement {
    Item(Expr),
    Spread(Expr),
    Hole,
}

#[derive(Debug, Clone)]
pub enum PropertyKey {
    Named(String),
    Computed(Expr),
}

#[derive(Debug, Clone)]
pub enum ObjectProperty {
    KeyValue { key: PropertyKey, value: Expr },
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum Argument {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64),
    String(String),
    Template {
        quasis: Vec<String>,
        expressions: Vec<Expr>,
    },
    Bool(bool),
    Null,
    Undefined,
    Identifier(String),
    This,
    Array(Vec<ArrayElement>),
    Object(Vec<ObjectProperty>),
    Function(Rc<Function>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Argument>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        arguments: Vec<Argument>,
    },
}

impl Expr {
    /// `object.property` for a dotted path such as `Markup.createElement`
    pub fn dotted_path(path: &str) -> Expr {
        let mut parts = path.split('.');
        let root = Expr::Identifier(parts.next().unwrap_or_default().to_string());
        parts.fold(root, |object, property| Expr::Member {
            object: Box::new(object),
            property: property.to_string(),
            optional: false,
        })
    }
}
