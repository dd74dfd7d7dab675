use thiserror::Error;

/// Typed errors produced by the tree-walking interpreter backend.
///
/// Evaluation does not track source positions, so none of these carry one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Program has no 'main' function")]
    MissingMain,
    #[error("Operation '{operation}' is not supported between {left} and {right}")]
    TypeMismatch {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Expected a boolean or integer condition, got {type_name}")]
    NotACondition { type_name: &'static str },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow in '{operation}'")]
    IntegerOverflow { operation: &'static str },
    #[error("No case matches switch value {value}")]
    NoMatchingCase { value: String },
    #[error("{construct} is not supported by the interpreter")]
    UnsupportedExpression { construct: String },
    #[error("Unsupported call '{name}'")]
    UnsupportedCall { name: String },
    #[error("'{name}' expected {expected} arguments, got {found}")]
    InvalidArgumentCount {
        name: String,
        expected: &'static str,
        found: usize,
    },
    #[error("Cannot convert {value} to {target}")]
    InvalidConversion { value: String, target: &'static str },
    #[error("Cannot iterate over a value of type {type_name}")]
    NotIterable { type_name: &'static str },
    #[error("Range step must not be zero")]
    InvalidRange,
    #[error("Console I/O failed: {message}")]
    Console { message: String },
}

impl RuntimeError {
    /// The error type name a `happen (...)` clause matches against. `Error`
    /// matches every kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::DivisionByZero => "DivideByZeroError",
            RuntimeError::InvalidConversion { .. }
            | RuntimeError::InvalidRange
            | RuntimeError::IntegerOverflow { .. }
            | RuntimeError::NoMatchingCase { .. } => "ValueError",
            RuntimeError::UnsupportedCall { .. }
            | RuntimeError::UnsupportedExpression { .. }
            | RuntimeError::InvalidArgumentCount { .. } => "MethodError",
            RuntimeError::MissingMain => "MainFunctionError",
            RuntimeError::Console { .. } => "CError",
            RuntimeError::UndefinedVariable { .. }
            | RuntimeError::TypeMismatch { .. }
            | RuntimeError::NotACondition { .. }
            | RuntimeError::NotIterable { .. } => "RuntimeError",
        }
    }

    pub fn is_caught_by(&self, error_type: &str) -> bool {
        error_type == "Error" || error_type == self.kind()
    }
}
