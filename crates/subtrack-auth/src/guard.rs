//! Per-request authorization decisions.
//!
//! Authenticate the bearer token first, then check the admin
//! requirement. Ownership is enforced by the subscription store. Only
//! the verified claims are consulted; nothing here reads a request body.

use subtrack_core::error::{SubtrackError, SubtrackResult};
use subtrack_core::models::principal::Principal;

use crate::error::AuthError;
use crate::token::TokenService;

const BEARER: &str = "bearer ";

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.map(str::trim).ok_or(AuthError::MissingToken)?;
    match value.get(..BEARER.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => {
            let token = value[BEARER.len()..].trim();
            if token.is_empty() {
                Err(AuthError::MissingToken)
            } else {
                Ok(token)
            }
        }
        _ => Err(AuthError::MissingToken),
    }
}

/// Unauthenticated requests stop here.
pub fn authenticate(header: Option<&str>, tokens: &TokenService) -> Result<Principal, AuthError> {
    let token = bearer_token(header)?;
    tokens.verify(token)?.principal()
}

/// Admin-scoped routes answer non-admins with a plain denial.
pub fn require_admin(principal: &Principal) -> SubtrackResult<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(SubtrackError::AuthorizationDenied {
            reason: "admin role required".into(),
        })
    }
}
