//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with a server-held secret. Verification
//! is purely stateless: no store lookup and no revocation list, so a
//! user whose role changes keeps the old role until the token expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtrack_core::clock::Clock;
use subtrack_core::models::principal::Principal;
use subtrack_core::models::user::Role;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Validated JWT claims — a newtype proving the token was verified.
#[derive(Debug, Clone)]
pub struct ValidatedClaims(pub AccessTokenClaims);

impl ValidatedClaims {
    /// The caller identity carried by the token.
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let user_id = Uuid::parse_str(&self.0.sub)
            .map_err(|e| AuthError::TokenMalformed(format!("invalid subject: {e}")))?;
        Ok(Principal::new(user_id, self.0.role))
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Crypto("JWT secret must not be empty".into()));
        }
        let lifetime = i64::try_from(config.token_lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::Crypto("token lifetime out of range".into()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            lifetime,
            clock,
        })
    }

    /// Issue a signed token for `user_id` expiring one lifetime from now.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<IssuedToken, AuthError> {
        let now = self.clock.now();
        let expires_at = now + self.lifetime;
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, issuer and expiry.
    ///
    /// Expiry is judged against the injected clock rather than the
    /// library's wall-clock check: a token is expired once `exp < now`.
    pub fn verify(&self, token: &str) -> Result<ValidatedClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        let claims = jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenMalformed(e.to_string()))?;

        if claims.exp < self.clock.now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(ValidatedClaims(claims))
    }
}

#[cfg(test)]
mod tests {
    use subtrack_core::clock::FixedClock;

    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_735_689_600, 0).unwrap()
    }

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-with-enough-entropy".into(),
            jwt_issuer: "subtrack-test".into(),
            ..AuthConfig::default()
        }
    }

    fn service() -> (TokenService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start()));
        let svc = TokenService::new(&test_config(), clock.clone()).unwrap();
        (svc, clock)
    }

    /// header.payload from `a`, signature from `b`.
    fn splice(a: &str, b: &str) -> String {
        let (head_a, _) = a.rsplit_once('.').unwrap();
        let (_, sig_b) = b.rsplit_once('.').unwrap();
        format!("{head_a}.{sig_b}")
    }

    #[test]
    fn issued_token_verifies_immediately() {
        let (svc, _) = service();
        let user_id = Uuid::new_v4();

        let issued = svc.issue(user_id, Role::Admin).unwrap();
        let claims = svc.verify(&issued.token).unwrap();

        assert_eq!(claims.0.sub, user_id.to_string());
        assert_eq!(claims.0.iss, "subtrack-test");
        assert_eq!(claims.principal().unwrap(), Principal::new(user_id, Role::Admin));
        assert_eq!(issued.expires_at, start() + Duration::hours(24));
    }

    #[test]
    fn token_expires_after_24_hours() {
        let (svc, clock) = service();
        let issued = svc.issue(Uuid::new_v4(), Role::User).unwrap();

        clock.advance(Duration::hours(24));
        assert!(svc.verify(&issued.token).is_ok(), "valid up to the boundary");

        clock.advance(Duration::seconds(1));
        assert!(matches!(svc.verify(&issued.token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn jti_is_unique() {
        let (svc, _) = service();
        let uid = Uuid::new_v4();
        let c1 = svc.verify(&svc.issue(uid, Role::User).unwrap().token).unwrap();
        let c2 = svc.verify(&svc.issue(uid, Role::User).unwrap().token).unwrap();
        assert_ne!(c1.0.jti, c2.0.jti);
    }

    #[test]
    fn forged_role_is_rejected() {
        let (svc, _) = service();
        let uid = Uuid::new_v4();
        let as_user = svc.issue(uid, Role::User).unwrap().token;
        let as_admin = svc.issue(uid, Role::Admin).unwrap().token;

        let forged = splice(&as_admin, &as_user);
        assert!(matches!(svc.verify(&forged), Err(AuthError::TokenMalformed(_))));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let (svc, clock) = service();
        let other = TokenService::new(
            &AuthConfig {
                jwt_secret: "another-secret".into(),
                ..test_config()
            },
            clock,
        )
        .unwrap();

        let token = other.issue(Uuid::new_v4(), Role::User).unwrap().token;
        assert!(matches!(svc.verify(&token), Err(AuthError::TokenMalformed(_))));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let (svc, clock) = service();
        let other = TokenService::new(
            &AuthConfig {
                jwt_issuer: "someone-else".into(),
                ..test_config()
            },
            clock,
        )
        .unwrap();

        let token = other.issue(Uuid::new_v4(), Role::User).unwrap().token;
        assert!(matches!(svc.verify(&token), Err(AuthError::TokenMalformed(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        let (svc, _) = service();
        for token in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(
                matches!(svc.verify(token), Err(AuthError::TokenMalformed(_))),
                "{token:?}"
            );
        }
    }

    #[test]
    fn empty_secret_is_refused() {
        let result = TokenService::new(&AuthConfig::default(), Arc::new(FixedClock::new(start())));
        assert!(matches!(result, Err(AuthError::Crypto(_))));
    }
}
