//! Error taxonomy for store operations

use thiserror::Error;

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY: i32 = 11000;
/// Server error code returned by `createCollection` for an existing namespace.
pub const NAMESPACE_EXISTS: i32 = 48;
/// Server error code returned by `createUser` for an existing principal.
pub const DUPLICATE_USER: i32 = 51003;
const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;

/// Errors raised by a [`Store`](crate::Store).
#[derive(Error, Debug)]
pub enum DbError {
    #[error("database unreachable: {0}")]
    Connectivity(String),

    #[error("permission denied during {operation}: {message}")]
    Permission { operation: String, message: String },

    #[error("duplicate key during {operation}: {message}")]
    DuplicateKey { operation: String, message: String },

    #[error("{operation} failed: {message}")]
    Command { operation: String, message: String },
}

impl DbError {
    /// Classify a server error code returned by `operation`.
    pub fn from_code(operation: &str, code: i32, message: impl Into<String>) -> Self {
        let operation = operation.to_string();
        let message = message.into();
        match code {
            UNAUTHORIZED | AUTHENTICATION_FAILED => Self::Permission { operation, message },
            DUPLICATE_KEY => Self::DuplicateKey { operation, message },
            _ => Self::Command { operation, message },
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
