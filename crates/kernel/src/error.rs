//! Grid error types.

use thiserror::Error;

use crate::grid::operators::Operator;

/// Errors raised while building a grid response.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("unknown bind category: {0}")]
    UnknownBindCategory(String),

    #[error("unsupported search operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid operand for {operator}: {value:?}")]
    InvalidOperand { operator: Operator, value: String },

    #[error("invalid search pattern")]
    InvalidPattern(#[from] regex::Error),

    #[error("query backend error")]
    Backend(#[from] anyhow::Error),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl GridError {
    /// Whether the error is a caller contract violation rather than a
    /// failure inside the backend.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            GridError::UnknownBindCategory(_)
                | GridError::UnsupportedOperator(_)
                | GridError::InvalidOperand { .. }
        )
    }
}

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;
