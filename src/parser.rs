use tracing::{debug, trace};

use crate::ast::{Expression, Program, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenType};
use crate::symbol_table::SymbolTable;

/// Recursive-descent parser with one token of lookahead past `current`.
///
/// A parser performs exactly one pass: `program` consumes it, so its
/// symbol and label state cannot leak into another compilation.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    symbol_table: SymbolTable,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> ParseResult<Self> {
        let current = lexer.next_token()?;
        let peek = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peek,
            symbol_table: SymbolTable::new(),
        })
    }

    /// program ::= {NEWLINE} {statement}
    pub fn program(mut self) -> ParseResult<Program> {
        trace!("PROGRAM");

        while self.check(TokenType::Newline) {
            self.advance()?;
        }

        let mut statements = Vec::new();
        while !self.check(TokenType::Eof) {
            statements.push(self.statement()?);
        }

        if let Some(label) = self.symbol_table.unresolved_gotos().next() {
            return Err(ParseError::UndeclaredLabel {
                name: label.to_string(),
            });
        }

        debug!(
            statements = statements.len(),
            variables = self.symbol_table.variable_count(),
            labels = self.symbol_table.label_count(),
            "parsed program"
        );
        Ok(Program { statements })
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        let statement = match self.current.kind {
            TokenType::Print => self.parse_print()?,
            TokenType::If => self.parse_if()?,
            TokenType::While => self.parse_while()?,
            TokenType::Label => self.parse_label()?,
            TokenType::Goto => self.parse_goto()?,
            TokenType::Let => self.parse_let()?,
            TokenType::Input => self.parse_input()?,
            kind => {
                return Err(ParseError::InvalidStatement {
                    kind: kind.name().to_string(),
                    text: self.current.text.clone(),
                    location: self.current.location(),
                })
            }
        };

        self.nl()?;
        Ok(statement)
    }

    // "PRINT" (STRING | expression)
    fn parse_print(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-PRINT");
        self.advance()?; // consume 'PRINT'

        let expression = if self.check(TokenType::String) {
            let token = self.advance()?;
            Expression::string(token.text)
        } else {
            self.expression()?
        };

        Ok(Statement::Print { expression })
    }

    // "IF" comparison "THEN" nl {statement} "ENDIF"
    fn parse_if(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-IF");
        self.advance()?; // consume 'IF'

        let condition = self.comparison()?;
        self.expect(TokenType::Then)?;
        self.nl()?;
        let body = self.block(TokenType::EndIf)?;

        Ok(Statement::If { condition, body })
    }

    // "WHILE" comparison "REPEAT" nl {statement} "ENDWHILE"
    fn parse_while(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-WHILE");
        self.advance()?; // consume 'WHILE'

        let condition = self.comparison()?;
        self.expect(TokenType::Repeat)?;
        self.nl()?;
        let body = self.block(TokenType::EndWhile)?;

        Ok(Statement::While { condition, body })
    }

    /// Statements up to and including the closing keyword.
    fn block(&mut self, terminator: TokenType) -> ParseResult<Vec<Statement>> {
        let mut body = Vec::new();
        while !self.check(terminator) {
            if self.check(TokenType::Eof) {
                return Err(ParseError::UnexpectedEof {
                    expected: terminator.name().to_string(),
                    location: self.current.location(),
                });
            }
            body.push(self.statement()?);
        }
        self.expect(terminator)?;
        Ok(body)
    }

    // "LABEL" IDENT
    fn parse_label(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-LABEL");
        self.advance()?; // consume 'LABEL'

        let token = self.expect(TokenType::Ident)?;
        if !self.symbol_table.declare_label(&token.text) {
            return Err(ParseError::DuplicateLabel {
                location: token.location(),
                name: token.text,
            });
        }

        Ok(Statement::Label { name: token.text })
    }

    // "GOTO" IDENT, resolved once the whole program has been read
    fn parse_goto(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-GOTO");
        self.advance()?; // consume 'GOTO'

        let token = self.expect(TokenType::Ident)?;
        self.symbol_table.record_goto(&token.text);

        Ok(Statement::Goto { name: token.text })
    }

    // "LET" IDENT "=" expression
    fn parse_let(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-LET");
        self.advance()?; // consume 'LET'

        let name = self.expect(TokenType::Ident)?.text;
        self.symbol_table.declare_variable(&name);
        self.expect(TokenType::Eq)?;
        let value = self.expression()?;

        Ok(Statement::Let { name, value })
    }

    // "INPUT" IDENT
    fn parse_input(&mut self) -> ParseResult<Statement> {
        trace!("STATEMENT-INPUT");
        self.advance()?; // consume 'INPUT'

        let name = self.expect(TokenType::Ident)?.text;
        self.symbol_table.declare_variable(&name);

        Ok(Statement::Input { name })
    }

    /// comparison ::= expression (("==" | "!=" | ">" | ">=" | "<" | "<=") expression)
    fn comparison(&mut self) -> ParseResult<Expression> {
        trace!("COMPARISON");
        let left = self.expression()?;

        if !matches!(
            self.current.kind,
            TokenType::EqEq
                | TokenType::NotEq
                | TokenType::Gt
                | TokenType::GtEq
                | TokenType::Lt
                | TokenType::LtEq
        ) {
            return Err(ParseError::UnexpectedToken {
                expected: "comparison operator".to_string(),
                found: self.describe_current(),
                location: self.current.location(),
            });
        }

        let operator = self.advance()?;
        let right = self.expression()?;
        Ok(Expression::binary(left, operator, right))
    }

    /// expression ::= term {("+" | "-") term}
    fn expression(&mut self) -> ParseResult<Expression> {
        trace!("EXPRESSION");
        let mut expr = self.term()?;

        while matches!(self.current.kind, TokenType::Plus | TokenType::Minus) {
            let operator = self.advance()?;
            let right = self.term()?;
            expr = Expression::binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// term ::= unary {("*" | "/") unary}
    fn term(&mut self) -> ParseResult<Expression> {
        trace!("TERM");
        let mut expr = self.unary()?;

        while matches!(self.current.kind, TokenType::Asterisk | TokenType::Slash) {
            let operator = self.advance()?;
            let right = self.unary()?;
            expr = Expression::binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// unary ::= ["+" | "-"] primary
    ///
    /// A sign becomes a binary operation against zero: `-x` is `0 - x`.
    fn unary(&mut self) -> ParseResult<Expression> {
        trace!("UNARY");

        if matches!(self.current.kind, TokenType::Plus | TokenType::Minus) {
            let operator = self.advance()?;
            let operand = self.primary()?;
            return Ok(Expression::binary(Expression::num("0"), operator, operand));
        }

        self.primary()
    }

    /// primary ::= INTEGER | FLOAT | STRING | IDENT
    fn primary(&mut self) -> ParseResult<Expression> {
        trace!(text = %self.current.text, "PRIMARY");

        match self.current.kind {
            TokenType::Integer => Ok(Expression::num(self.advance()?.text)),
            TokenType::Float => Ok(Expression::float(self.advance()?.text)),
            TokenType::String => Ok(Expression::string(self.advance()?.text)),
            TokenType::Ident => {
                if !self.symbol_table.is_declared(&self.current.text) {
                    return Err(ParseError::UndeclaredVariable {
                        name: self.current.text.clone(),
                        location: self.current.location(),
                    });
                }
                Ok(Expression::var(self.advance()?.text))
            }
            TokenType::Eof => Err(ParseError::UnexpectedEof {
                expected: "expression".to_string(),
                location: self.current.location(),
            }),
            _ => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: self.describe_current(),
                location: self.current.location(),
            }),
        }
    }

    /// nl ::= NEWLINE {NEWLINE}
    fn nl(&mut self) -> ParseResult<()> {
        self.expect(TokenType::Newline)?;
        while self.check(TokenType::Newline) {
            self.advance()?;
        }
        Ok(())
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn peek(&self) -> &Token {
        &self.peek
    }

    fn check(&self, kind: TokenType) -> bool {
        self.current.kind == kind
    }

    /// Consumes the current token if it has the expected kind.
    fn expect(&mut self, kind: TokenType) -> ParseResult<Token> {
        if !self.check(kind) {
            return Err(ParseError::UnexpectedToken {
                expected: kind.name().to_string(),
                found: self.describe_current(),
                location: self.current.location(),
            });
        }
        self.advance()
    }

    /// Shifts the lookahead window and returns the token that was current.
    fn advance(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next_token()?;
        let peek = std::mem::replace(&mut self.peek, next);
        Ok(std::mem::replace(&mut self.current, peek))
    }

    fn describe_current(&self) -> String {
        match self.current.kind {
            TokenType::Newline | TokenType::Eof => self.current.kind.name().to_string(),
            kind => format!("{} '{}'", kind.name(), self.current.text),
        }
    }
}
