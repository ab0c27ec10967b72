//! Authentication service — registration, login and account lookups.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use subtrack_core::error::{SubtrackError, SubtrackResult};
use subtrack_core::models::principal::Principal;
use subtrack_core::models::user::{CreateUser, Role, UpdateUser, User, UserProfile, normalize_email};
use subtrack_core::repository::UserRepository;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::guard;
use crate::password;
use crate::token::TokenService;

/// Hashed once and verified against when the email is unknown, so both
/// failure paths do the same amount of work.
const TIMING_DUMMY_PASSWORD: &str = "subtrack-timing-equaliser";

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token.
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Authentication service.
///
/// Generic over the repository implementation so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    tokens: TokenService,
    config: AuthConfig,
    dummy_hash: OnceLock<String>,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, tokens: TokenService, config: AuthConfig) -> Self {
        Self {
            user_repo,
            tokens,
            config,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create a `user`-role account. Emails are unique ignoring case.
    pub async fn register(&self, input: RegisterInput) -> SubtrackResult<User> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(SubtrackError::validation("name is required"));
        }

        let email = normalize_email(&input.email);
        if !looks_like_email(&email) {
            return Err(SubtrackError::validation("a valid email address is required"));
        }

        if input.password.chars().count() < self.config.min_password_length {
            return Err(SubtrackError::validation(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        match self.user_repo.get_by_email(&email).await {
            Ok(_) => {
                return Err(SubtrackError::AlreadyExists {
                    entity: "user".into(),
                });
            }
            Err(SubtrackError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let password_hash = self.hash(input.password).await?;

        let user = self
            .user_repo
            .create(CreateUser {
                name,
                email,
                password_hash,
                role: Role::User,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password fail with the same error.
    pub async fn login(&self, input: LoginInput) -> SubtrackResult<LoginOutput> {
        let email = normalize_email(&input.email);

        let user = match self.user_repo.get_by_email(&email).await {
            Ok(u) => Some(u),
            Err(SubtrackError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let Some(user) = user else {
            let dummy = self.dummy_hash().await?;
            let _ = self.verify(input.password, dummy).await;
            warn!("Login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self.verify(input.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials.into());
        }

        let issued = self.tokens.issue(user.id, user.role)?;
        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginOutput {
            access_token: issued.token,
            expires_at: issued.expires_at,
            user: user.into(),
        })
    }

    /// Resolve an `Authorization` header into the caller's identity.
    pub fn authenticate(&self, header: Option<&str>) -> SubtrackResult<Principal> {
        guard::authenticate(header, &self.tokens).map_err(SubtrackError::from)
    }

    pub async fn profile(&self, principal: &Principal) -> SubtrackResult<UserProfile> {
        self.user_repo
            .get_by_id(principal.user_id)
            .await
            .map(UserProfile::from)
    }

    pub async fn list_users(&self, principal: &Principal) -> SubtrackResult<Vec<UserProfile>> {
        guard::require_admin(principal)?;
        let users = self.user_repo.list().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Operator-only role change; not reachable over HTTP. Existing
    /// tokens keep their old role until they expire.
    pub async fn assign_role(&self, email: &str, role: Role) -> SubtrackResult<User> {
        let user = self.user_repo.get_by_email(&normalize_email(email)).await?;
        let updated = self
            .user_repo
            .update(
                user.id,
                UpdateUser {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %updated.id, role = %role, "User role assigned");
        Ok(updated)
    }

    async fn hash(&self, password: String) -> SubtrackResult<String> {
        let pepper = self.config.pepper.clone();
        let hash = tokio::task::spawn_blocking(move || {
            password::hash_password(&password, pepper.as_deref())
        })
        .await
        .map_err(|e| SubtrackError::Internal(format!("hashing task failed: {e}")))??;
        Ok(hash)
    }

    async fn verify(&self, password: String, hash: String) -> SubtrackResult<bool> {
        let pepper = self.config.pepper.clone();
        let valid = tokio::task::spawn_blocking(move || {
            password::verify_password(&password, &hash, pepper.as_deref())
        })
        .await
        .map_err(|e| SubtrackError::Internal(format!("verification task failed: {e}")))??;
        Ok(valid)
    }

    async fn dummy_hash(&self) -> SubtrackResult<String> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.clone());
        }
        let hash = self.hash(TIMING_DUMMY_PASSWORD.into()).await?;
        Ok(self.dummy_hash.get_or_init(|| hash).clone())
    }
}

/// Shape check only: one `@` with something on both sides and a dot in
/// the domain. Deliverability is not our concern.
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
