//! Markup element parsing
//!
//! ```text
//! element    ::= "<" name attribute* "/>" | "<" name attribute* ">" child* "</" name ">"
//!              | "<>" child* "</>"
//! attribute  ::= attr_name ("=" (string | "{" assignment "}" | element))? | "{" "..." assignment "}"
//! child      ::= text | "{" expression? "}" | element
//! ```
//!
//! Element bodies are scanned raw by the lexer, so the parser only pulls
//! tokens inside tags and `{ }` containers. Every method here leaves the
//! element's final `>` as the current token without consuming it: consuming
//! it would lex the text that follows as if it were code.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a markup element; the current token is its opening `<`
    pub(crate) fn parse_markup(&mut self) -> Result<MarkupElement, ParseError> {
        self.nested(Self::parse_markup_element)
    }

    fn parse_markup_element(&mut self) -> Result<MarkupElement, ParseError> {
        let location = self.advance()?.location; // '<'

        if self.check(&TokenKind::Gt) {
            let children = self.parse_markup_children(None, location)?;
            return Ok(MarkupElement {
                name: None,
                attributes: Vec::new(),
                children,
                location,
            });
        }

        let name = self.parse_markup_name()?;
        let attributes = self.parse_markup_attributes()?;

        if self.match_token(&TokenKind::Slash)? {
            if !self.check(&TokenKind::Gt) {
                return self.error(format!(
                    "Expected '>' to end self-closing tag <{}/>, found {}",
                    name, self.current.kind
                ));
            }
            return Ok(MarkupElement {
                name: Some(name),
                attributes,
                children: Vec::new(),
                location,
            });
        }

        let children = self.parse_markup_children(Some(&name), location)?;
        Ok(MarkupElement {
            name: Some(name),
            attributes,
            children,
            location,
        })
    }

    /// `div`, `my-widget`, `Counter`, `Ui.Card`
    fn parse_markup_name(&mut self) -> Result<MarkupName, ParseError> {
        let first = self.expect_property_name()?;

        if self.check(&TokenKind::Minus) {
            let mut name = first;
            while self.match_token(&TokenKind::Minus)? {
                name.push('-');
                name.push_str(&self.expect_property_name()?);
            }
            return Ok(MarkupName::Intrinsic(name));
        }

        let mut path = vec![first];
        while self.match_token(&TokenKind::Dot)? {
            path.push(self.expect_property_name()?);
        }

        let intrinsic = path.len() == 1 && path[0].starts_with(|c: char| c.is_ascii_lowercase());
        if intrinsic {
            Ok(MarkupName::Intrinsic(path.remove(0)))
        } else {
            Ok(MarkupName::Component(path))
        }
    }

    fn parse_markup_attributes(&mut self) -> Result<Vec<MarkupAttribute>, ParseError> {
        let mut attributes = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::Gt | TokenKind::Slash => break,
                TokenKind::Ge => {
                    return self.error("Unexpected '>=' in markup; write '{\"=\"}' for a literal '='")
                }
                TokenKind::Eof => return self.error("Unterminated markup tag"),
                TokenKind::LBrace => {
                    self.advance()?;
                    self.expect_token(&TokenKind::Ellipsis, "Expected '...' in attribute spread")?;
                    let expr = self.parse_assignment()?;
                    self.expect_rbrace("after attribute spread")?;
                    attributes.push(MarkupAttribute::Spread(expr));
                }
                _ => {
                    let name = self.parse_attribute_name()?;
                    let value = if self.match_token(&TokenKind::Eq)? {
                        Some(self.parse_attribute_value()?)
                    } else {
                        None
                    };
                    attributes.push(MarkupAttribute::Named { name, value });
                }
            }
        }

        Ok(attributes)
    }

    /// `class`, `aria-label`, `xlink:href`
    fn parse_attribute_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_property_name()?;
        loop {
            if self.match_token(&TokenKind::Minus)? {
                name.push('-');
            } else if self.match_token(&TokenKind::Colon)? {
                name.push(':');
            } else {
                return Ok(name);
            }
            name.push_str(&self.expect_property_name()?);
        }
    }

    fn parse_attribute_value(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        match self.current.kind.clone() {
            TokenKind::String(s) => {
                self.advance()?;
                Ok(Expr::String(s, location))
            }
            TokenKind::LBrace => {
                self.advance()?;
                if self.check(&TokenKind::RBrace) {
                    return self.error("Markup attributes must only be assigned a non-empty expression");
                }
                let expr = self.parse_assignment()?;
                self.expect_rbrace("after attribute expression")?;
                Ok(expr)
            }
            TokenKind::Lt => {
                let element = self.parse_markup()?;
                self.advance()?;
                Ok(Expr::Markup(Box::new(element)))
            }
            _ => self.error(format!(
                "Expected string, '{{' or element as attribute value, found {}",
                self.current.kind
            )),
        }
    }

    /// Children up to and including the closing tag. The current token is
    /// the `>` that ends the opening tag.
    fn parse_markup_children(
        &mut self,
        name: Option<&MarkupName>,
        location: SourceLocation,
    ) -> Result<Vec<MarkupChild>, ParseError> {
        let mut children = Vec::new();
        let display_name = name.map(|n| n.to_string()).unwrap_or_default();

        loop {
            let text = match self.lexer.markup_text() {
                Some(text) => text,
                None => {
                    return Err(ParseError {
                        message: format!("Unterminated markup element <{}>", display_name),
                        location,
                    })
                }
            };
            if !text.is_empty() {
                children.push(MarkupChild::Text(text));
            }

            if self.lexer.at_closing_tag() {
                self.resync()?; // '<'
                self.advance()?; // '/'
                self.advance()?;
                let closing = if self.check(&TokenKind::Gt) {
                    None
                } else {
                    Some(self.parse_markup_name()?)
                };
                if closing.as_ref() != name {
                    return self.error(format!(
                        "Expected corresponding closing tag for <{}>",
                        display_name
                    ));
                }
                if !self.check(&TokenKind::Gt) {
                    return self.error(format!(
                        "Expected '>' to end closing tag </{}>, found {}",
                        display_name, self.current.kind
                    ));
                }
                return Ok(children);
            }

            // `{}` and `{/* comment */}`
            if self.lexer.at_empty_container() {
                continue;
            }

            self.resync()?;
            if self.check(&TokenKind::LBrace) {
                self.advance()?;
                if self.check(&TokenKind::Ellipsis) {
                    return self.error("Spread children are not supported");
                }
                let expr = self.parse_expression()?;
                if !self.check(&TokenKind::RBrace) {
                    return self.error(format!(
                        "Expected '}}' after markup expression, found {}",
                        self.current.kind
                    ));
                }
                children.push(MarkupChild::Expression(expr));
            } else {
                children.push(MarkupChild::Element(self.parse_markup()?));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse_element(source: &str) -> MarkupElement {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        match program.body.into_iter().next() {
            Some(Stmt::Expression {
                expr: Expr::Markup(element),
                ..
            }) => *element,
            other => panic!("Expected markup statement, got {:?}", other),
        }
    }

    #[test]
    fn test_component_and_fragment_names() {
        let element = parse_element("<><Ui.Card /><my-box/></>");
        assert_eq!(element.name, None);
        match &element.children[..] {
            [MarkupChild::Element(card), MarkupChild::Element(my_box)] => {
                assert_eq!(
                    card.name,
                    Some(MarkupName::Component(vec!["Ui".to_string(), "Card".to_string()]))
                );
                assert_eq!(my_box.name, Some(MarkupName::Intrinsic("my-box".to_string())));
            }
            other => panic!("Unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_attribute_forms() {
        let element = parse_element("<input type=\"text\" value={v} disabled aria-label='x' {...rest} />");
        assert_eq!(element.attributes.len(), 5);
        assert!(matches!(
            &element.attributes[2],
            MarkupAttribute::Named { name, value: None } if name == "disabled"
        ));
        assert!(matches!(
            &element.attributes[3],
            MarkupAttribute::Named { name, .. } if name == "aria-label"
        ));
        assert!(matches!(element.attributes[4], MarkupAttribute::Spread(_)));
    }

    #[test]
    fn test_text_with_quotes_and_empty_containers() {
        let element = parse_element("<p>It's {/* note */} done</p>");
        match &element.children[..] {
            [MarkupChild::Text(a), MarkupChild::Text(b)] => {
                assert_eq!(a, "It's ");
                assert_eq!(b, " done");
            }
            other => panic!("Unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_markup_followed_by_code() {
        let program = Parser::new("const el = <b>hi</b>; el")
            .unwrap()
            .parse_program()
            .unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_unterminated_element() {
        let err = Parser::new("<div>hello").unwrap().parse_program().unwrap_err();
        assert_eq!(err.message, "Unterminated markup element <div>");
    }
}
