//! HTTP error mapping and startup errors.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use subtrack_auth::AuthError;
use subtrack_core::error::SubtrackError;
use tracing::error;

/// Any failure a handler can return. Rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub SubtrackError);

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl ApiError {
    /// The client-facing message. Server-side causes are never exposed.
    pub fn message(&self) -> String {
        match &self.0 {
            SubtrackError::Validation { message } => message.clone(),
            SubtrackError::AlreadyExists { entity } => {
                format!("{} already exists", capitalize(entity))
            }
            SubtrackError::AuthenticationFailed { .. } => "Invalid credentials".into(),
            SubtrackError::Unauthenticated { .. } => "Unauthenticated".into(),
            SubtrackError::AuthorizationDenied { .. } => "Forbidden".into(),
            SubtrackError::NotFound { entity, .. } => format!("{} not found", capitalize(entity)),
            SubtrackError::Database(_) | SubtrackError::Crypto(_) | SubtrackError::Internal(_) => {
                "Server error".into()
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<SubtrackError> for ApiError {
    fn from(err: SubtrackError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            SubtrackError::Validation { .. }
            | SubtrackError::AlreadyExists { .. }
            | SubtrackError::AuthenticationFailed { .. } => StatusCode::BAD_REQUEST,
            SubtrackError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            SubtrackError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            SubtrackError::NotFound { .. } => StatusCode::NOT_FOUND,
            SubtrackError::Database(_) | SubtrackError::Crypto(_) | SubtrackError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.0.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.message(),
        })
    }
}

/// Failures that stop the binary before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] subtrack_db::DbError),

    #[error("auth setup error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Domain(#[from] SubtrackError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
