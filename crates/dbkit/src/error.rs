//! Error types for dbkit

use thiserror::Error;

/// Result type alias for dbkit operations
pub type DbResult<T> = Result<T, DbError>;

/// The class of schema constraint a rejected write violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    NotNull,
    Unique,
}

/// A write rejected by a schema constraint, as classified by an adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind:?} constraint {constraint:?} violated: {message}")]
pub struct ConstraintError {
    /// Which class of constraint fired
    pub kind: ConstraintKind,
    /// Constraint name as reported by the backend
    pub constraint: String,
    /// Backend-reported cause
    pub message: String,
}

/// Why the backend aborted a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollbackKind {
    SerializationFailure,
    Locked,
}

/// A transaction aborted by the backend for a reason worth retrying.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("transaction rolled back ({kind:?}): {message}")]
pub struct RollbackError {
    /// Why the transaction was aborted
    pub kind: RollbackKind,
    /// Backend-reported cause
    pub message: String,
}

/// Error types for statement building and execution
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DbError {
    /// A marker's binding key is absent from the binding map
    #[error("key {0:?} missing from bindings")]
    MissingKey(String),

    /// Insert or update statement declared without field markers
    #[error("statement has no field markers")]
    NoMarkers,

    /// Update or delete statement declared without a where clause
    #[error("update and delete statements require a where clause")]
    MissingPredicate,

    /// A value with the wrong shape for its clause (e.g. IN over a non-list)
    #[error("value has the wrong type for its clause")]
    InvalidType,

    /// Upsert statement declared without query-value markers
    #[error("upsert has no query-value markers")]
    NoQueryValues,

    /// Placeholder rewrite found a statement/argument arity mismatch
    #[error("statement declares {expected} placeholders but {supplied} arguments were supplied")]
    PlaceholderMismatch { expected: usize, supplied: usize },

    /// A backend row is wider or narrower than the selected column list
    #[error("row has {got} columns but the statement selects {expected}")]
    ColumnCount { expected: usize, got: usize },

    /// Row not found
    #[error("no rows in result set")]
    NoRows,

    /// The caller's cancellation or deadline fired mid-call
    #[error("operation canceled: {0}")]
    Canceled(String),

    /// A write rejected by a schema constraint
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// A transaction aborted by the backend
    #[error(transparent)]
    Rollback(#[from] RollbackError),

    /// Any other backend-reported failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl DbError {
    /// Create a missing-key error for a binding key
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    /// Create a backend error from any adapter-side message
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Create a classified constraint error
    pub fn constraint(
        kind: ConstraintKind,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Constraint(ConstraintError {
            kind,
            constraint: constraint.into(),
            message: message.into(),
        })
    }

    /// Create a classified rollback error
    pub fn rollback(kind: RollbackKind, message: impl Into<String>) -> Self {
        Self::Rollback(RollbackError {
            kind,
            message: message.into(),
        })
    }

    /// Check if this failure is worth retrying in a fresh transaction.
    ///
    /// True exactly for classified rollback errors (serialization failures
    /// and lock contention); everything else, including constraint
    /// violations and cancellation, is permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rollback(_))
    }

    /// Check if this is a classified constraint violation
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// Check if this is a missing binding key error
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }

    /// Check if this is a no-rows error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }
}
