//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Declarations: `let`/`const`/`var`, `function`, `interface`, `type`
//! - Module syntax: `import`, `export` (top level only)
//! - Control flow: `if`, `while`, `do-while`, `for`, `for-of`, `for-in`
//! - Jump statements: `return`, `break`, `continue`, `throw`
//! - Exception handling: `try`/`catch`/`finally`
//! - Blocks and expression statements
//!
//! # Grammar
//!
//! ```text
//! statement ::= var_decl | function | import | export | type_decl
//!             | if_stmt | while_stmt | do_while_stmt | for_stmt
//!             | return_stmt | break_stmt | continue_stmt | throw_stmt
//!             | try_stmt | block | expr_stmt
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse block statements (inside braces, excluding the braces themselves)
    pub(crate) fn parse_block_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();

        match self.current.kind.clone() {
            TokenKind::LBrace => {
                let body = self.parse_block()?;
                Ok(Stmt::Block { body, location })
            }
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::Empty)
            }
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                let kind = self.parse_var_kind()?;
                let declarations = self.parse_var_declarators(kind)?;
                self.consume_semicolon("after variable declaration")?;
                Ok(Stmt::VarDecl {
                    kind,
                    declarations,
                    location,
                })
            }
            TokenKind::Function => Ok(Stmt::Function(self.parse_function(true)?)),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance()?;
                self.reject_label()?;
                self.consume_semicolon("after 'break'")?;
                Ok(Stmt::Break { location })
            }
            TokenKind::Continue => {
                self.advance()?;
                self.reject_label()?;
                self.consume_semicolon("after 'continue'")?;
                Ok(Stmt::Continue { location })
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Import if self.peek_next()? != TokenKind::LParen => {
                if self.block_depth > 0 {
                    return self.error("'import' declarations may only appear at the top level of a snippet");
                }
                self.parse_import()
            }
            TokenKind::Export => {
                if self.block_depth > 0 {
                    return self.error("'export' declarations may only appear at the top level of a snippet");
                }
                self.parse_export()
            }
            TokenKind::Ident(word)
                if (word == "interface" || word == "type")
                    && matches!(self.peek_next()?, TokenKind::Ident(_)) =>
            {
                if word == "interface" {
                    self.parse_interface()
                } else {
                    self.parse_type_alias()
                }
            }
            TokenKind::Ident(_) if self.peek_next()? == TokenKind::Colon => {
                self.error("Labeled statements are not supported")
            }
            TokenKind::Reserved(word) => self.error(format!("'{}' is not supported in snippets", word)),
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon("after expression")?;
                Ok(Stmt::Expression { expr, location })
            }
        }
    }

    /// Parse `{ statements }`
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_lbrace("to start block")?;
        self.block_depth += 1;
        let body = self.parse_block_statements()?;
        self.block_depth -= 1;
        self.expect_rbrace("to close block")?;
        Ok(body)
    }

    fn parse_var_kind(&mut self) -> Result<VarKind, ParseError> {
        let kind = match self.current.kind {
            TokenKind::Let => VarKind::Let,
            TokenKind::Const => VarKind::Const,
            TokenKind::Var => VarKind::Var,
            _ => return self.error(format!("Expected 'let', 'const' or 'var', found {}", self.current.kind)),
        };
        self.advance()?;
        Ok(kind)
    }

    fn reject_label(&self) -> Result<(), ParseError> {
        if matches!(self.current.kind, TokenKind::Ident(_)) && !self.current.newline_before {
            return self.error("Labeled statements are not supported");
        }
        Ok(())
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'if'
        self.expect_lparen("after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after if condition")?;

        let then_branch = Box::new(self.parse_nested_statement()?);
        let else_branch = if self.match_token(&TokenKind::Else)? {
            Some(Box::new(self.parse_nested_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'while'
        self.expect_lparen("after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after while condition")?;
        let body = Box::new(self.parse_nested_statement()?);

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    /// Parse do-while statement
    fn parse_do_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'do'
        let body = Box::new(self.parse_nested_statement()?);

        self.expect_token(&TokenKind::While, "Expected 'while' after do body")?;
        self.expect_lparen("after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after do-while condition")?;
        self.match_token(&TokenKind::Semicolon)?;

        Ok(Stmt::DoWhile {
            body,
            condition,
            location,
        })
    }

    /// Parse `for (init; cond; update)`, `for (const x of xs)` or
    /// `for (const k in obj)`
    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'for'
        if self.check_ident("await") {
            return self.error("'for await' is not supported in snippets");
        }
        self.expect_lparen("after 'for'")?;

        let init = match self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                let decl_location = self.current_location();
                let kind = self.parse_var_kind()?;
                let declarations = self.parse_var_declarators(kind)?;

                let is_of = self.check_ident("of");
                if is_of || self.check(&TokenKind::In) {
                    return self.parse_for_each(kind, declarations, is_of, location);
                }

                Some(Box::new(Stmt::VarDecl {
                    kind,
                    declarations,
                    location: decl_location,
                }))
            }
            _ => {
                let expr_location = self.current_location();
                let expr = self.parse_expression()?;
                Some(Box::new(Stmt::Expression {
                    expr,
                    location: expr_location,
                }))
            }
        };
        self.expect_token(&TokenKind::Semicolon, "Expected ';' after for initializer")?;

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_token(&TokenKind::Semicolon, "Expected ';' after for condition")?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_rparen("after for clauses")?;

        let body = Box::new(self.parse_nested_statement()?);

        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
            location,
        })
    }

    /// Rest of a `for-of`/`for-in` head after its single declarator
    fn parse_for_each(
        &mut self,
        kind: VarKind,
        mut declarations: Vec<Declarator>,
        is_of: bool,
        location: SourceLocation,
    ) -> Result<Stmt, ParseError> {
        if declarations.len() != 1 || declarations[0].init.is_some() {
            return self.error("Only a single binding without initializer is allowed in a for-of or for-in head");
        }
        let pattern = declarations.remove(0).pattern;
        self.advance()?; // 'of' / 'in'

        let subject = self.parse_expression()?;
        self.expect_rparen("after for head")?;
        let body = Box::new(self.parse_nested_statement()?);

        Ok(if is_of {
            Stmt::ForOf {
                kind,
                pattern,
                iterable: subject,
                body,
                location,
            }
        } else {
            Stmt::ForIn {
                kind,
                pattern,
                object: subject,
                body,
                location,
            }
        })
    }

    /// Parse return statement; a line break after `return` ends it
    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'return'

        let value = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon("after return value")?;

        Ok(Stmt::Return { value, location })
    }

    /// Parse throw statement
    fn parse_throw_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'throw'
        if self.current.newline_before {
            return self.error("Illegal newline after throw");
        }
        let value = self.parse_expression()?;
        self.consume_semicolon("after throw")?;

        Ok(Stmt::Throw { value, location })
    }

    /// Parse try/catch/finally
    fn parse_try_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance()?.location; // 'try'
        let block = self.parse_block()?;

        let handler = if self.match_token(&TokenKind::Catch)? {
            let param = if self.match_token(&TokenKind::LParen)? {
                let pattern = self.parse_binding_pattern()?;
                self.parse_optional_annotation()?;
                self.expect_rparen("after catch binding")?;
                Some(pattern)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.match_token(&TokenKind::Finally)? {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return self.error("Missing catch or finally after try");
        }

        Ok(Stmt::Try {
            block,
            handler,
            finalizer,
            location,
        })
    }

    /// Body of `if`/loops; declarations there are scoped like a block
    fn parse_nested_statement(&mut self) -> Result<Stmt, ParseError> {
        self.block_depth += 1;
        let stmt = self.parse_statement();
        self.block_depth -= 1;
        stmt
    }
}
