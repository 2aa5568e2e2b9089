use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// Lexer Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("{location}: Unexpected character '{character}'")]
    UnexpectedCharacter {
        character: char,
        location: SourceLocation,
    },
    #[error("{location}: Illegal character {character:?} in string literal")]
    IllegalStringCharacter {
        character: char,
        location: SourceLocation,
    },
    #[error("{location}: Invalid number '{value}'")]
    InvalidNumber {
        value: String,
        location: SourceLocation,
    },
    #[error("{location}: Expected '!=', got '!{found}'")]
    ExpectedNotEqual {
        found: char,
        location: SourceLocation,
    },
}

// Parser Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{location}: Expected {expected}, got {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: SourceLocation,
    },
    #[error("{location}: Unexpected end of file, expected {expected}")]
    UnexpectedEof {
        expected: String,
        location: SourceLocation,
    },
    #[error("{location}: Invalid statement at '{text}' ({kind})")]
    InvalidStatement {
        kind: String,
        text: String,
        location: SourceLocation,
    },
    #[error("{location}: Referencing variable before assignment: {name}")]
    UndeclaredVariable {
        name: String,
        location: SourceLocation,
    },
    #[error("{location}: Label already exists: {name}")]
    DuplicateLabel {
        name: String,
        location: SourceLocation,
    },
    #[error("GOTO label undeclared: {name}")]
    UndeclaredLabel { name: String },
}

// Code generation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("Variable '{name}' has no inferred type")]
    UntypedVariable { name: String },
}

// Compilation Errors
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lex(LexError),
    #[error("Parse error: {0}")]
    Parse(ParseError),
    #[error("Code generation error: {0}")]
    Codegen(#[from] CodegenError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Build failed: {0}")]
    Build(String),
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Lex(err)
    }
}

// The parser pulls tokens lazily, so lexical failures arrive wrapped.
impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(lex) => CompileError::Lex(lex),
            other => CompileError::Parse(other),
        }
    }
}

// Result types
pub type LexResult<T> = Result<T, LexError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type CodegenResult<T> = Result<T, CodegenError>;
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_lex_error_surfaces_as_lex() {
        let lex = LexError::UnexpectedCharacter {
            character: '$',
            location: SourceLocation::new(1, 3),
        };
        let err: CompileError = ParseError::from(lex.clone()).into();
        assert!(matches!(err, CompileError::Lex(inner) if inner == lex));
    }

    #[test]
    fn test_error_messages_carry_location() {
        let err = ParseError::DuplicateLabel {
            name: "top".to_string(),
            location: SourceLocation::new(4, 7),
        };
        assert_eq!(err.to_string(), "4:7: Label already exists: top");

        let err = CompileError::from(ParseError::UndeclaredLabel {
            name: "missing".to_string(),
        });
        assert_eq!(err.to_string(), "Parse error: GOTO label undeclared: missing");
    }
}
