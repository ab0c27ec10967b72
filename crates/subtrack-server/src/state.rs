//! Shared application state handed to every worker.

use std::sync::Arc;

use subtrack_auth::{AuthConfig, AuthError, AuthService, TokenService};
use subtrack_core::clock::Clock;
use subtrack_db::{DbManager, SurrealSubscriptionRepository, SurrealUserRepository};
use surrealdb::engine::any::Any;

pub type UserRepo = SurrealUserRepository<Any>;
pub type SubscriptionRepo = SurrealSubscriptionRepository<Any>;

pub struct AppState {
    pub auth: AuthService<UserRepo>,
    pub subscriptions: SubscriptionRepo,
    /// Applied when a new subscription omits its currency.
    pub default_currency: String,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        db: &DbManager,
        auth: AuthConfig,
        default_currency: String,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let tokens = TokenService::new(&auth, clock.clone())?;
        Ok(Self {
            auth: AuthService::new(SurrealUserRepository::new(db.client().clone()), tokens, auth),
            subscriptions: SurrealSubscriptionRepository::new(db.client().clone()),
            default_currency,
            clock,
        })
    }
}
