//! Unified error types for the cashflow tracker.
//!
//! Every core operation returns [`Result`]. Callers branch on [`Error::kind`], which is the
//! stable contract; mapping kinds to transport status codes is up to the caller.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Message used when the caller has no membership in the ledger.
pub const ACCESS_DENIED: &str = "access denied to this ledger";
/// Message used when the caller's role is not in the allowed set.
pub const INSUFFICIENT_PERMISSIONS: &str = "insufficient permissions";

/// Errors produced by the cashflow tracker core.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: &'static str },

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No valid credential was presented
    Unauthenticated,
    /// Credential valid, membership or role insufficient
    Forbidden,
    /// Resource absent, or deliberately indistinguishable from absent
    NotFound,
    /// Semantically disallowed mutation
    InvalidOperation,
    /// Unique-constraint violation
    Conflict,
    /// Malformed input
    InvalidInput,
    /// Storage, configuration or environment failure
    Internal,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidInput { .. } | Self::InvalidAmount { .. } => ErrorKind::InvalidInput,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::Conflict { message },
            _ => Self::Database(err),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
