//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: variables, functions, parameters, binding patterns,
//!   `import`/`export` and type declarations
//! - `statements`: control flow and other statements
//! - `expressions`: expressions with one method per precedence level
//! - `markup`: markup elements embedded in expressions
//! - `types`: type annotations (parsed only to be erased)
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! The parser pulls tokens from the [`Lexer`] on demand and holds exactly one
//! current token. Backtracking (arrow functions, function types) saves and
//! restores a [`Checkpoint`].

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, LexerState, Token, TokenKind};
use std::fmt;

/// Nested expressions, statements, elements and types one snippet may open
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parser error type
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Saved parser position
#[derive(Clone)]
pub(crate) struct Checkpoint {
    lexer: LexerState,
    current: Token,
    previous_location: SourceLocation,
}

/// Recursive descent parser for the snippet dialect
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) current: Token,
    pub(crate) previous_location: SourceLocation,
    /// Nesting depth of blocks and function bodies; 0 at the top level
    pub(crate) block_depth: usize,
    /// Recursion depth, bounded by [`MAX_NESTING_DEPTH`]
    pub(crate) nesting: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::with_lexer(Lexer::new(source))
    }

    /// Parser over a template substitution that starts at `start`, already
    /// `nesting` levels deep
    pub(crate) fn starting_at(source: &str, start: SourceLocation, nesting: usize) -> Result<Self, ParseError> {
        let mut parser = Self::with_lexer(Lexer::starting_at(source, start))?;
        parser.nesting = nesting;
        Ok(parser)
    }

    fn with_lexer(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            previous_location: current.location,
            current,
            block_depth: 0,
            nesting: 0,
        })
    }

    /// Parse the entire snippet
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.is_at_end() {
            program.body.push(self.parse_statement()?);
        }

        Ok(program)
    }

    // ===== Helper methods =====

    /// Move to the next token, returning the one just consumed
    pub(crate) fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        let consumed = std::mem::replace(&mut self.current, next);
        self.previous_location = consumed.location;
        Ok(consumed)
    }

    /// Replace the current token with a fresh one from the lexer. Used after
    /// raw markup scanning, where `current` no longer reflects the input.
    pub(crate) fn resync(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            lexer: self.lexer.save(),
            current: self.current.clone(),
            previous_location: self.previous_location,
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.lexer.restore(checkpoint.lexer);
        self.current = checkpoint.current;
        self.previous_location = checkpoint.previous_location;
    }

    /// Kind of the token after the current one, without consuming anything
    pub(crate) fn peek_next(&mut self) -> Result<TokenKind, ParseError> {
        let saved = self.lexer.save();
        let next = self.lexer.next_token();
        self.lexer.restore(saved);
        Ok(next?.kind)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    /// Whether the current token is the contextual keyword `word`
    pub(crate) fn check_ident(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Ident(name) if name == word)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn match_ident(&mut self, word: &str) -> Result<bool, ParseError> {
        if self.check_ident(word) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    /// Run `parse` one level deeper
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return self.error(format!(
                "Snippet nests more than {} levels deep",
                MAX_NESTING_DEPTH
            ));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    pub(crate) fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            message: message.into(),
            location: self.current_location(),
        })
    }

    pub(crate) fn expect_token(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            self.advance()
        } else {
            self.error(format!("{}, found {}", message, self.current.kind))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::LParen, &format!("Expected '(' {ctx}"))
            .map(|_| ())
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::RParen, &format!("Expected ')' {ctx}"))
            .map(|_| ())
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::LBrace, &format!("Expected '{{' {ctx}"))
            .map(|_| ())
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::RBrace, &format!("Expected '}}' {ctx}"))
            .map(|_| ())
    }

    /// End a statement. A semicolon is optional before `}`, at the end of
    /// input and after a line break.
    pub(crate) fn consume_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        if self.match_token(&TokenKind::Semicolon)? {
            return Ok(());
        }
        if self.check(&TokenKind::RBrace) || self.is_at_end() || self.current.newline_before {
            return Ok(());
        }
        self.error(format!("Expected ';' {ctx}, found {}", self.current.kind))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            self.advance()?;
            Ok(name)
        } else {
            self.error(format!("Expected identifier, found {}", self.current.kind))
        }
    }

    /// Identifier or keyword, for positions where any word is a valid name
    /// (`obj.default`, `{ new: 1 }`)
    pub(crate) fn expect_property_name(&mut self) -> Result<String, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Ident(name) => name.clone(),
            kind => match kind.keyword_text() {
                Some(word) => word.to_string(),
                None => {
                    return self.error(format!(
                        "Expected property name, found {}",
                        self.current.kind
                    ))
                }
            },
        };
        self.advance()?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_declarations_and_expression() {
        let program = parse("const x: number = 1 + 2 * 3\nx");

        assert_eq!(program.body.len(), 2);
        match &program.body[0] {
            Stmt::VarDecl {
                kind, declarations, ..
            } => {
                assert_eq!(*kind, VarKind::Const);
                assert_eq!(declarations.len(), 1);
                assert_eq!(
                    declarations[0].annotation.as_ref().map(|a| a.text.as_str()),
                    Some("number")
                );
            }
            other => panic!("Expected variable declaration, got {:?}", other),
        }
        assert!(matches!(program.body[1], Stmt::Expression { .. }));
    }

    #[test]
    fn test_parse_arrow_functions() {
        let program = parse("const f = (a: number, b = 2): number => a + b\nconst g = x => ({ x })");

        for stmt in &program.body {
            match stmt {
                Stmt::VarDecl { declarations, .. } => match &declarations[0].init {
                    Some(Expr::Function(def)) => assert!(def.is_arrow),
                    other => panic!("Expected arrow function, got {:?}", other),
                },
                other => panic!("Expected variable declaration, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let program = parse("(1 + 2) * 3");
        match &program.body[0] {
            Stmt::Expression {
                expr: Expr::Binary { op, .. },
                ..
            } => assert_eq!(*op, BinaryOp::Mul),
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_markup_with_children() {
        let program = parse("<div className=\"box\">Hello {name}<br/></div>");

        match &program.body[0] {
            Stmt::Expression {
                expr: Expr::Markup(element),
                ..
            } => {
                assert_eq!(element.name, Some(MarkupName::Intrinsic("div".to_string())));
                assert_eq!(element.attributes.len(), 1);
                assert_eq!(element.children.len(), 3);
                assert!(matches!(&element.children[0], MarkupChild::Text(t) if t == "Hello "));
                assert!(matches!(element.children[1], MarkupChild::Expression(_)));
                assert!(matches!(element.children[2], MarkupChild::Element(_)));
            }
            other => panic!("Expected markup, got {:?}", other),
        }
    }

    #[test]
    fn test_less_than_after_operand_is_comparison() {
        let program = parse("a < b");
        assert!(matches!(
            &program.body[0],
            Stmt::Expression {
                expr: Expr::Binary {
                    op: BinaryOp::Lt,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = Parser::new("<div></span>")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert!(err.message.contains("closing tag"), "{}", err.message);
    }

    #[test]
    fn test_import_inside_block_is_rejected() {
        let err = Parser::new("{ import x from 'y' }")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert!(err.message.contains("top level"), "{}", err.message);
    }

    #[test]
    fn test_unsupported_keyword() {
        let err = Parser::new("class A {}").unwrap().parse_program().unwrap_err();
        assert_eq!(err.message, "'class' is not supported in snippets");
        assert_eq!(err.location, SourceLocation::new(1, 1));
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::new(source)
            .and_then(|mut parser| parser.parse_program())
            .unwrap_err()
    }

    #[test]
    fn test_nesting_limit() {
        // debug builds need room for the frames below the limit
        let worker = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let shallow = format!("{}1{}", "(".repeat(60), ")".repeat(60));
                assert_eq!(parse(&shallow).body.len(), 1);

                let parens = format!("{}1{}", "(".repeat(1500), ")".repeat(1500));
                let err = parse_err(&parens);
                assert_eq!(err.message, "Snippet nests more than 128 levels deep");
                assert_eq!(err.location.line, 1);

                let markup = format!("{}x{}", "<b>".repeat(400), "</b>".repeat(400));
                assert!(parse_err(&markup).message.contains("nests more than"));

                let unary = format!("{}1", "!".repeat(5000));
                assert!(parse_err(&unary).message.contains("nests more than"));
            })
            .unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_bitwise_operators_are_rejected() {
        assert_eq!(
            parse_err("1 << 40").message,
            "Bitwise operator '<<' is not supported in snippets"
        );
        assert_eq!(
            parse_err("x >> 2").message,
            "Bitwise operator '>>' is not supported in snippets"
        );
        assert_eq!(
            parse_err("const m = 5 & 3").message,
            "Bitwise operator '&' is not supported in snippets"
        );
        assert_eq!(
            parse_err("a | b").message,
            "Bitwise operator '|' is not supported in snippets"
        );
        assert_eq!(
            parse_err("5 ^ 3").message,
            "Bitwise operator '^' is not supported in snippets"
        );
        assert_eq!(
            parse_err("~5").message,
            "Bitwise operator '~' is not supported in snippets"
        );
        // comparisons and closing generics still work
        assert_eq!(parse("a < b; c > d; let xs: Array<Array<number>> = []").body.len(), 3);
    }
}
