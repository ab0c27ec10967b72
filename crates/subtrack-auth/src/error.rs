//! Authentication error types.

use subtrack_core::error::SubtrackError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email and wrong password both end up here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("malformed token: {0}")]
    TokenMalformed(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for SubtrackError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => SubtrackError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::MissingToken | AuthError::TokenExpired | AuthError::TokenMalformed(_) => {
                SubtrackError::Unauthenticated {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => SubtrackError::Crypto(msg),
        }
    }
}
