use std::fmt;

use crate::{
    ast::{BinaryOperator, Declarator, Fixity, LiteralKind, Node, UnaryOperator},
    token::{Token, TokenKind, TYPE_KEYWORDS},
};

type Result<T, E = ()> = std::result::Result<T, E>;

/// The outcome of a parse: a root node is always produced, with whatever
/// statements could be (partially) recognized, alongside the recorded
/// syntax errors.
#[derive(Debug)]
pub struct Parse {
    pub root: Node,
    pub errors: Vec<SyntaxError>,
}

pub fn parse(tokens: &[Token<'_>]) -> Parse {
    let mut p = Parser::new(tokens);
    let root = p.parse_program();
    Parse {
        root,
        errors: p.errors,
    }
}

struct Parser<'tok, 'src> {
    tokens: &'tok [Token<'src>],
    cursor: usize,
    /// Position just past the last token, used for end-of-input errors.
    eof: (u32, u32),
    errors: Vec<SyntaxError>,
}

impl<'src> Parser<'_, 'src> {
    fn parse_program(&mut self) -> Node {
        let mut body = Vec::new();
        while self.peek().is_some() {
            // A failed statement has consumed at least one token, so this
            // loop always terminates.
            if let Ok(stmt) = self.parse_statement() {
                body.push(stmt);
            }
        }
        Node::Program(body)
    }

    fn parse_statement(&mut self) -> Result<Node> {
        let Some(token) = self.peek() else {
            return Err(());
        };

        match token.kind {
            TokenKind::Keyword if TYPE_KEYWORDS.contains(token.text) => {
                self.advance();
                Ok(self.parse_declaration(token.text))
            }
            TokenKind::Keyword if token.text == "if" => {
                self.advance();
                self.parse_if()
            }
            TokenKind::Keyword if token.text == "while" => {
                self.advance();
                self.parse_while()
            }
            TokenKind::Keyword if token.text == "return" => {
                self.advance();
                self.parse_return()
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(self.parse_assignment(token.text))
            }
            _ if token.text == "{" => Ok(Node::Block(self.parse_block())),
            _ => {
                self.error_at(
                    token,
                    ErrorKind::UnexpectedStatementStart {
                        found: token.text.into(),
                    },
                );
                self.advance();
                Err(())
            }
        }
    }

    /// `type-keyword declarator (',' declarator)* ';'`
    ///
    /// The type keyword has already been consumed.
    fn parse_declaration(&mut self, ty: &'src str) -> Node {
        let mut declarators = Vec::new();
        loop {
            let Ok(name) = self.consume_identifier() else {
                break;
            };
            let initializer = if self.take("=") {
                self.parse_expr().ok()
            } else {
                None
            };
            declarators.push(Declarator {
                name: name.text.into(),
                initializer,
            });
            if !self.take(",") {
                break;
            }
        }
        self.consume(";");
        Node::Declaration {
            ty: ty.into(),
            declarators,
        }
    }

    /// `identifier '=' expr ';'`
    ///
    /// The target identifier has already been consumed. A missing `=` or a
    /// malformed right-hand side keeps the statement with no value rather
    /// than dropping it.
    fn parse_assignment(&mut self, target: &'src str) -> Node {
        let value = if self.consume("=") {
            let value = self.parse_expr().ok().map(Box::new);
            self.consume(";");
            value
        } else {
            None
        };
        Node::Assignment {
            target: target.into(),
            value,
        }
    }

    /// `if '(' expr ')' block [else block]`
    fn parse_if(&mut self) -> Result<Node> {
        self.consume("(");
        let condition = Box::new(self.parse_expr()?);
        self.consume(")");
        let then_block = self.parse_block();
        let else_block = if self.take("else") {
            Some(self.parse_block())
        } else {
            None
        };
        Ok(Node::If {
            condition,
            then_block,
            else_block,
        })
    }

    /// `while '(' expr ')' block`
    fn parse_while(&mut self) -> Result<Node> {
        self.consume("(");
        let condition = Box::new(self.parse_expr()?);
        self.consume(")");
        let body = self.parse_block();
        Ok(Node::While { condition, body })
    }

    /// `return [expr] ';'`
    fn parse_return(&mut self) -> Result<Node> {
        let value = if self.is(";") {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        self.consume(";");
        Ok(Node::Return(value))
    }

    /// `'{' statement* '}'`; missing braces are reported but do not abort
    /// the surrounding parse.
    fn parse_block(&mut self) -> Vec<Node> {
        let mut body = Vec::new();
        if !self.consume("{") {
            return body;
        }
        while self.except(&["}"]) {
            if let Ok(stmt) = self.parse_statement() {
                body.push(stmt);
            }
        }
        self.consume("}");
        body
    }

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Node> {
        let mut node = self.parse_multiplicative()?;
        while let Some(op) = self.take_operator(&[
            ("+", BinaryOperator::Add),
            ("-", BinaryOperator::Sub),
        ]) {
            let rhs = self.parse_multiplicative()?;
            node = Node::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_multiplicative(&mut self) -> Result<Node> {
        let mut node = self.parse_unary()?;
        while let Some(op) = self.take_operator(&[
            ("*", BinaryOperator::Mul),
            ("/", BinaryOperator::Div),
        ]) {
            let rhs = self.parse_unary()?;
            node = Node::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node> {
        let prefix = self.take_operator(&[
            ("++", UnaryOperator::Increment),
            ("--", UnaryOperator::Decrement),
            ("!", UnaryOperator::Not),
            ("-", UnaryOperator::Negate),
        ]);
        if let Some(op) = prefix {
            let operand = self.parse_unary()?;
            return Ok(Node::Unary {
                op,
                fixity: Fixity::Prefix,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Node> {
        let node = self.parse_primary()?;
        let postfix = self.take_operator(&[
            ("++", UnaryOperator::Increment),
            ("--", UnaryOperator::Decrement),
        ]);
        if let Some(op) = postfix {
            return Ok(Node::Unary {
                op,
                fixity: Fixity::Postfix,
                operand: Box::new(node),
            });
        }
        Ok(node)
    }

    /// `'(' expr ')' | identifier | number | string`
    ///
    /// On a token that cannot start a primary expression, the offending
    /// token is consumed and discarded to guarantee forward progress.
    fn parse_primary(&mut self) -> Result<Node> {
        let Some(token) = self.peek() else {
            self.error_at_eof(ErrorKind::UnexpectedExprToken { found: None });
            return Err(());
        };

        if token.text == "(" {
            self.advance();
            let expr = self.parse_expr()?;
            self.consume(")");
            return Ok(expr);
        }

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Node::Identifier(token.text.into()))
            }
            TokenKind::Number => {
                self.advance();
                Ok(Node::Literal {
                    kind: LiteralKind::Number,
                    text: token.text.into(),
                })
            }
            TokenKind::String => {
                self.advance();
                Ok(Node::Literal {
                    kind: LiteralKind::String,
                    text: token.text.into(),
                })
            }
            _ => {
                self.error_at(
                    token,
                    ErrorKind::UnexpectedExprToken {
                        found: Some(token.text.into()),
                    },
                );
                self.advance();
                Err(())
            }
        }
    }
}

impl<'src> Parser<'_, 'src> {
    fn new<'tok>(tokens: &'tok [Token<'src>]) -> Parser<'tok, 'src> {
        let eof = tokens.last().map_or((1, 1), end_position);
        let mut p = Parser {
            tokens,
            cursor: 0,
            eof,
            errors: Vec::with_capacity(8),
        };
        // Skip any leading trivia.
        while p.peek_raw().is_some_and(|t| t.is_trivia()) {
            p.cursor += 1;
        }
        p
    }

    fn peek_raw(&self) -> Option<Token<'src>> {
        self.tokens.get(self.cursor).copied()
    }

    /// Returns the current token. Comment trivia is never observed here:
    /// the constructor and [`Parser::advance`] skip past it.
    fn peek(&self) -> Option<Token<'src>> {
        self.peek_raw()
    }

    /// Returns the current token and advances past it (and any trivia).
    fn advance(&mut self) -> Option<Token<'src>> {
        let c = self.peek();
        if c.is_some() {
            self.cursor += 1;
            while self.peek_raw().is_some_and(|t| t.is_trivia()) {
                self.cursor += 1;
            }
        }
        c
    }

    /// Checks whether the current token's text matches the given one.
    fn is(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.text == text)
    }

    /// Advances if the current token matches the provided text, returning
    /// true. If not, returns false and doesn't advance.
    fn take(&mut self, text: &str) -> bool {
        if self.is(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// If the current token is an operator from the provided table,
    /// advances and returns the mapped value.
    fn take_operator<T: Copy>(&mut self, table: &[(&str, T)]) -> Option<T> {
        let token = self.peek()?;
        if token.kind != TokenKind::Operator {
            return None;
        }
        let &(_, mapped) = table.iter().find(|(text, _)| *text == token.text)?;
        self.advance();
        Some(mapped)
    }

    /// Advances if the current token matches the expected text, returning
    /// true. If not, records an error and continues at the current
    /// position without consuming anything.
    fn consume(&mut self, expected: &'static str) -> bool {
        if self.take(expected) {
            return true;
        }
        let kind = ErrorKind::ExpectedToken {
            expected,
            found: self.peek().map(|t| t.text.into()),
        };
        match self.peek() {
            Some(token) => self.error_at(token, kind),
            None => self.error_at_eof(kind),
        }
        false
    }

    /// Advances over an identifier token, or records an error without
    /// advancing.
    fn consume_identifier(&mut self) -> Result<Token<'src>> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.advance();
                Ok(token)
            }
            Some(token) => {
                self.error_at(
                    token,
                    ErrorKind::ExpectedIdentifier {
                        found: Some(token.text.into()),
                    },
                );
                Err(())
            }
            None => {
                self.error_at_eof(ErrorKind::ExpectedIdentifier { found: None });
                Err(())
            }
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided texts. End of input is implicitly included in the list.
    fn except(&self, except: &[&str]) -> bool {
        match self.peek() {
            Some(token) => !except.contains(&token.text),
            None => false,
        }
    }

    fn error_at(&mut self, token: Token<'_>, kind: ErrorKind) {
        self.errors.push(SyntaxError {
            kind,
            line: token.line,
            column: token.column,
        });
    }

    fn error_at_eof(&mut self, kind: ErrorKind) {
        let (line, column) = self.eof;
        self.errors.push(SyntaxError { kind, line, column });
    }
}

/// The position immediately after the token, accounting for line breaks
/// inside multi-line token texts.
fn end_position(token: &Token<'_>) -> (u32, u32) {
    let breaks = token.text.matches('\n').count();
    if breaks == 0 {
        let width = u32::try_from(token.text.chars().count()).unwrap_or(u32::MAX);
        (token.line, token.column + width)
    } else {
        let tail = token.text.rsplit('\n').next().unwrap_or("");
        let width = u32::try_from(tail.chars().count()).unwrap_or(u32::MAX);
        let line = token.line + u32::try_from(breaks).unwrap_or(u32::MAX);
        (line, width + 1)
    }
}

/// A recorded syntax error. The structured fields identify the failure;
/// [`fmt::Display`] renders the human-readable form of the boundary
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A specific token was required; `None` means end of input was found.
    ExpectedToken {
        expected: &'static str,
        found: Option<Box<str>>,
    },
    ExpectedIdentifier {
        found: Option<Box<str>>,
    },
    UnexpectedExprToken {
        found: Option<Box<str>>,
    },
    UnexpectedStatementStart {
        found: Box<str>,
    },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: ", self.line, self.column)?;

        let found = |f: &mut fmt::Formatter<'_>, found: &Option<Box<str>>| match found {
            Some(text) => write!(f, "'{text}'"),
            None => write!(f, "end of input"),
        };

        use ErrorKind::*;
        match &self.kind {
            ExpectedToken { expected, found: t } => {
                write!(f, "expected '{expected}', but got ")?;
                found(f, t)
            }
            ExpectedIdentifier { found: t } => {
                write!(f, "expected an identifier, but got ")?;
                found(f, t)
            }
            UnexpectedExprToken { found: t } => {
                write!(f, "unexpected ")?;
                found(f, t)?;
                write!(f, " in expression")
            }
            UnexpectedStatementStart { found: t } => {
                write!(f, "statement may not start with '{t}'")
            }
        }
    }
}
