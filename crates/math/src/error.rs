use thiserror::Error;

/// Errors raised by fee arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    /// Basis points outside 0..=10000
    #[error("Invalid basis points {0}: must be at most 10000")]
    InvalidBasisPoints(u16),

    /// Arithmetic overflow occurred
    #[error("Math overflow in '{operation}' with values: {values:?}")]
    Overflow { operation: String, values: Vec<String> },

    /// Division by zero
    #[error("Division by zero in context: {context}")]
    DivisionByZero { context: String },
}

impl MathError {
    pub fn overflow(operation: &str, values: &[&str]) -> Self {
        MathError::Overflow {
            operation: operation.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

pub type MathResult<T> = Result<T, MathError>;
