use thiserror::Error;

use crate::lexer::LexError;

/// Grammar violations. Every variant carries the 1-based position of the
/// token where parsing stopped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected {expected}, but got {found} at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("function definition must start with func at line {line}, column {column}")]
    ExpectedFunction { line: usize, column: usize },
    #[error("assignment target must be an identifier at line {line}, column {column}")]
    InvalidAssignmentTarget { line: usize, column: usize },
    #[error("malformed for-loop initializer at line {line}, column {column}")]
    InvalidForInitializer { line: usize, column: usize },
    #[error("invalid {kind} literal '{literal}' at line {line}, column {column}")]
    InvalidLiteral {
        kind: &'static str,
        literal: String,
        line: usize,
        column: usize,
    },
}

impl SyntaxError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            SyntaxError::UnexpectedToken { line, column, .. }
            | SyntaxError::ExpectedFunction { line, column }
            | SyntaxError::InvalidAssignmentTarget { line, column }
            | SyntaxError::InvalidForInitializer { line, column }
            | SyntaxError::InvalidLiteral { line, column, .. } => (*line, *column),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    pub fn category(&self) -> &'static str {
        match self {
            ParseError::Lex(_) => "LexError",
            ParseError::Syntax(_) => "SyntaxError",
        }
    }

    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Lex(error) => error.position(),
            ParseError::Syntax(error) => error.position(),
        }
    }
}
