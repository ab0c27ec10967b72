//! Subtrack Auth — password hashing, session tokens, the per-request
//! authorization guard and the client session context.

pub mod config;
pub mod error;
pub mod guard;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput};
pub use session::{ActiveSession, ClientSession, MemorySessionStore, SessionStore};
pub use token::{AccessTokenClaims, IssuedToken, TokenService, ValidatedClaims};
