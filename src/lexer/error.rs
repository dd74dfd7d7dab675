use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unknown character '{character}' at line {line}, column {column}")]
    UnexpectedCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Unterminated string literal at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("Unterminated char literal at line {line}, column {column}")]
    UnterminatedChar { line: usize, column: usize },
}

impl LexError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            LexError::UnexpectedCharacter { line, column, .. }
            | LexError::UnterminatedString { line, column }
            | LexError::UnterminatedChar { line, column } => (*line, *column),
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
