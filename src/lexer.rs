use std::fmt;

use crate::error::{LexError, LexResult, SourceLocation};

/// Token kinds, grouped into numeric bands: control (< 1), literals and
/// identifiers (1..=4), keywords (101..), operators (201..).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Eof = -1,
    Newline = 0,
    Integer = 1,
    Float = 2,
    Ident = 3,
    String = 4,

    Label = 101,
    Goto = 102,
    Print = 103,
    Input = 104,
    Let = 105,
    If = 106,
    Then = 107,
    EndIf = 108,
    While = 109,
    Repeat = 110,
    EndWhile = 111,

    Eq = 201,
    Plus = 202,
    Minus = 203,
    Asterisk = 204,
    Slash = 205,
    EqEq = 206,
    NotEq = 207,
    Lt = 208,
    LtEq = 209,
    Gt = 210,
    GtEq = 211,
}

const KEYWORDS: [TokenType; 11] = [
    TokenType::Label,
    TokenType::Goto,
    TokenType::Print,
    TokenType::Input,
    TokenType::Let,
    TokenType::If,
    TokenType::Then,
    TokenType::EndIf,
    TokenType::While,
    TokenType::Repeat,
    TokenType::EndWhile,
];

impl TokenType {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_keyword(self) -> bool {
        (101..200).contains(&self.code())
    }

    pub fn is_operator(self) -> bool {
        (201..300).contains(&self.code())
    }

    /// Looks up a keyword by its exact (case-sensitive) spelling.
    pub fn keyword(spelling: &str) -> Option<TokenType> {
        KEYWORDS.iter().copied().find(|kind| kind.name() == spelling)
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenType::Eof => "EOF",
            TokenType::Newline => "NEWLINE",
            TokenType::Integer => "INTEGER",
            TokenType::Float => "FLOAT",
            TokenType::Ident => "IDENT",
            TokenType::String => "STRING",
            TokenType::Label => "LABEL",
            TokenType::Goto => "GOTO",
            TokenType::Print => "PRINT",
            TokenType::Input => "INPUT",
            TokenType::Let => "LET",
            TokenType::If => "IF",
            TokenType::Then => "THEN",
            TokenType::EndIf => "ENDIF",
            TokenType::While => "WHILE",
            TokenType::Repeat => "REPEAT",
            TokenType::EndWhile => "ENDWHILE",
            TokenType::Eq => "EQ",
            TokenType::Plus => "PLUS",
            TokenType::Minus => "MINUS",
            TokenType::Asterisk => "ASTERISK",
            TokenType::Slash => "SLASH",
            TokenType::EqEq => "EQEQ",
            TokenType::NotEq => "NOTEQ",
            TokenType::Lt => "LT",
            TokenType::LtEq => "LTEQ",
            TokenType::Gt => "GT",
            TokenType::GtEq => "GTEQ",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub kind: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenType, line: usize, column: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            line,
            column,
        }
    }

    #[cfg(test)]
    pub fn synthetic(text: impl Into<String>, kind: TokenType) -> Self {
        Self::new(text, kind, 0, 0)
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        // The trailing newline terminates the final statement.
        let mut input: Vec<char> = source.chars().collect();
        input.push('\n');
        Self {
            input,
            position: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Drains the lexer into a token vector ending with `EOF`.
    pub fn tokenize(&mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenType::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();
        self.skip_comment();

        let line = self.line;
        let column = self.column;
        let location = SourceLocation::new(line, column);

        if self.is_at_end() {
            return Ok(Token::new("", TokenType::Eof, line, column));
        }

        let ch = self.current_char();
        let single = |kind: TokenType| Token::new(ch.to_string(), kind, line, column);

        let token = match ch {
            '+' => {
                self.advance();
                single(TokenType::Plus)
            }
            '-' => {
                self.advance();
                single(TokenType::Minus)
            }
            '*' => {
                self.advance();
                single(TokenType::Asterisk)
            }
            '/' => {
                self.advance();
                single(TokenType::Slash)
            }
            '\n' => {
                self.advance();
                single(TokenType::Newline)
            }
            '=' => self.read_operator(TokenType::Eq, TokenType::EqEq),
            '<' => self.read_operator(TokenType::Lt, TokenType::LtEq),
            '>' => self.read_operator(TokenType::Gt, TokenType::GtEq),
            '!' => {
                if self.peek() != '=' {
                    return Err(LexError::ExpectedNotEqual {
                        found: self.peek(),
                        location,
                    });
                }
                self.advance();
                self.advance();
                Token::new("!=", TokenType::NotEq, line, column)
            }
            '"' => self.read_string()?,
            _ if ch.is_ascii_digit() => self.read_number()?,
            _ if ch.is_ascii_alphabetic() => self.read_identifier(),
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    location,
                })
            }
        };

        Ok(token)
    }

    fn read_operator(&mut self, single: TokenType, double: TokenType) -> Token {
        let line = self.line;
        let column = self.column;
        let first = self.current_char();

        if self.peek() == '=' {
            self.advance();
            self.advance();
            Token::new(format!("{}=", first), double, line, column)
        } else {
            self.advance();
            Token::new(first.to_string(), single, line, column)
        }
    }

    fn read_string(&mut self) -> LexResult<Token> {
        let line = self.line;
        let column = self.column;
        self.advance(); // Skip opening quote

        let mut value = String::new();
        while self.current_char() != '"' {
            // The appended newline ends an unclosed literal.
            let ch = self.current_char();
            if matches!(ch, '\r' | '\n' | '\t' | '\\' | '%') {
                return Err(LexError::IllegalStringCharacter {
                    character: ch,
                    location: SourceLocation::new(self.line, self.column),
                });
            }

            value.push(ch);
            self.advance();
        }
        self.advance(); // Skip closing quote

        Ok(Token::new(value, TokenType::String, line, column))
    }

    fn read_number(&mut self) -> LexResult<Token> {
        let line = self.line;
        let column = self.column;
        let mut value = String::new();

        self.consume_digits(&mut value);

        if self.current_char() == '.' {
            if !self.peek().is_ascii_digit() {
                value.push('.');
                return Err(LexError::InvalidNumber {
                    value,
                    location: SourceLocation::new(line, column),
                });
            }
            value.push('.');
            self.advance();
            self.consume_digits(&mut value);
            return Ok(Token::new(value, TokenType::Float, line, column));
        }

        Ok(Token::new(value, TokenType::Integer, line, column))
    }

    fn consume_digits(&mut self, value: &mut String) {
        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let mut value = String::new();

        while !self.is_at_end() && self.current_char().is_ascii_alphanumeric() {
            value.push(self.current_char());
            self.advance();
        }

        let kind = TokenType::keyword(&value).unwrap_or(TokenType::Ident);
        Token::new(value, kind, line, column)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.current_char() {
                ' ' | '\r' | '\t' => self.advance(),
                _ => break,
            }
        }
    }

    // Stops in front of the newline so it is still emitted as a token.
    fn skip_comment(&mut self) {
        if self.current_char() == '#' {
            while !self.is_at_end() && self.current_char() != '\n' {
                self.advance();
            }
        }
    }

    pub fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    pub fn peek(&self) -> char {
        self.input.get(self.position + 1).copied().unwrap_or('\0')
    }

    pub fn advance(&mut self) {
        if !self.is_at_end() {
            if self.current_char() == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

impl Iterator for Lexer {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        // Stop after EOF or the first error.
        if !matches!(&result, Ok(token) if token.kind != TokenType::Eof) {
            self.finished = true;
        }
        Some(result)
    }
}
