//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// This is the closed error taxonomy every ledger operation resolves to.
/// Infrastructure concerns (IO, locks) are mapped into it at the edges;
/// nothing in the domain layer panics or swallows a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input: bad enum value, empty name, scope fields
    /// inconsistent with the role's scope type.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Uniqueness violation or concurrent-write conflict
    /// (duplicate branch name, duplicate membership, stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization denial. Carries the rejected operation and the scope
    /// it targeted so callers can render a precise message. Never
    /// downgraded to another variant.
    #[error("forbidden: {operation} on {scope}")]
    Forbidden { operation: String, scope: String },

    /// A state-machine precondition was not met. Carries the current
    /// state and the transition that was attempted.
    #[error("invalid state: cannot {attempted} while {current}")]
    InvalidState { current: String, attempted: String },

    /// A requested entity does not exist.
    #[error("not found")]
    NotFound,

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(operation: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::Forbidden {
            operation: operation.into(),
            scope: scope.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        Self::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_carries_operation_and_scope() {
        let err = DomainError::forbidden("membership.approve", "branch 7");
        assert_eq!(err.to_string(), "forbidden: membership.approve on branch 7");
    }

    #[test]
    fn invalid_state_names_current_state() {
        let err = DomainError::invalid_state("pending", "issue card");
        assert_eq!(
            err.to_string(),
            "invalid state: cannot issue card while pending"
        );
    }
}
