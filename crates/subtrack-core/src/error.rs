//! Error types shared by every subtrack crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubtrackError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// Bad login. The reason is for logs only; callers see one generic
    /// message for every credential mismatch.
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Missing, malformed or expired bearer token.
    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubtrackError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for failures the caller cannot correct (store, crypto, bugs).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_)
        )
    }
}

pub type SubtrackResult<T> = Result<T, SubtrackError>;
