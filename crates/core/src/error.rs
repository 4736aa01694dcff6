//! Domain error model.

use thiserror::Error;

/// Result type used across the ledger.
pub type DomainResult<T> = Result<T, DomainError>;

/// Ledger-level error.
///
/// Every fallible ledger operation reports one of these. `Validation` and
/// `NotFound` guarantee that no state changed; `Conflict` and `Persistence`
/// are transient and may be retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (non-positive amount, empty description,
    /// disallowed attachment type, oversized attachment).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was malformed (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced movement or attachment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A concurrent writer won (stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor lacks the capability required for the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The underlying storage failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The audit half of a mutation failed; the data half was rolled back.
    #[error("audit write failed: {0}")]
    AuditFailure(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn audit_failure(msg: impl Into<String>) -> Self {
        Self::AuditFailure(msg.into())
    }

    /// Whether the caller may retry the same request unchanged.
    ///
    /// `AuditFailure` is deliberately excluded: the caller must re-read the
    /// ledger before retrying to avoid recording a movement twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Persistence(_))
    }
}
