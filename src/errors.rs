use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

/// entity kinds named in lookup and concurrency errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Borrower,
    Loan,
    /// a borrower with no loans at all
    BorrowerLoans,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Borrower => "borrower",
            Entity::Loan => "loan",
            Entity::BorrowerLoans => "loans for borrower",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: Entity,
        id: Uuid,
    },

    #[error("payment amount does not match the total due: expected {expected}, provided {provided}")]
    AmountMismatch {
        expected: Money,
        provided: Money,
    },

    #[error("no rows were updated by {operation}")]
    NoRowsAffected {
        operation: &'static str,
    },

    #[error("transaction error: {message}")]
    TransactionError {
        message: String,
    },

    #[error("validation error: {message}")]
    ValidationError {
        message: String,
    },

    #[error("version conflict on {entity} {id}: expected {expected}, found {found}")]
    VersionConflict {
        entity: Entity,
        id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("storage error: {message}")]
    StorageError {
        message: String,
    },

    #[error("workflow timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout {
        elapsed_ms: u128,
        limit_ms: u128,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LoanError {
    pub(crate) fn not_found(entity: Entity, id: Uuid) -> Self {
        LoanError::NotFound { entity, id }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LoanError::ValidationError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
