//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is fatal to the operation that raised it. Nothing inside the
/// engine catches or retries them; the caller is expected to discard the whole
/// unit of work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Programmer error: an engine invariant was broken by the caller
    /// (e.g. removing a non-empty assignment, a missing subject link).
    #[error("logic error: {0}")]
    Logic(String),

    /// A stock rule rejected the operation (e.g. non-positive move quantity).
    #[error("stock logic error: {0}")]
    StockLogic(String),

    /// User-facing rejection of an operation that would destroy history.
    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    /// A value failed validation (e.g. malformed configuration input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn logic(msg: impl Into<String>) -> Self {
        Self::Logic(msg.into())
    }

    pub fn stock_logic(msg: impl Into<String>) -> Self {
        Self::StockLogic(msg.into())
    }

    pub fn illegal_operation(msg: impl Into<String>) -> Self {
        Self::IllegalOperation(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_category() {
        assert_eq!(
            DomainError::stock_logic("quantity must be greater than zero").to_string(),
            "stock logic error: quantity must be greater than zero"
        );
        assert_eq!(
            DomainError::illegal_operation("unit was delivered").to_string(),
            "illegal operation: unit was delivered"
        );
    }
}
