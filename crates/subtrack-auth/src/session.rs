//! Client-side session context.
//!
//! Holds the token and profile of whoever is signed in on a client. The
//! slot is replaced wholesale on every transition so readers only ever
//! see a complete snapshot.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use subtrack_core::clock::Clock;
use subtrack_core::error::SubtrackResult;
use subtrack_core::models::user::UserProfile;
use tokio::sync::RwLock;
use tracing::debug;

/// A signed-in session as seen by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

impl ActiveSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Durable storage for the current session, e.g. a file or keychain.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<ActiveSession>;
    fn save(&self, session: &ActiveSession);
    fn clear(&self);
}

/// Process-local store, mostly for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<ActiveSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<ActiveSession> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, session: &ActiveSession) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

pub struct ClientSession<S: SessionStore> {
    store: S,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<Arc<ActiveSession>>>,
}

impl<S: SessionStore> ClientSession<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            current: RwLock::new(None),
        }
    }

    /// Snapshot of the signed-in session, if any and not yet expired.
    pub async fn current(&self) -> Option<Arc<ActiveSession>> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| !s.is_expired(now))
            .cloned()
    }

    /// Record a fresh login.
    pub async fn begin(&self, session: ActiveSession) -> Arc<ActiveSession> {
        self.store.save(&session);
        let session = Arc::new(session);
        *self.current.write().await = Some(session.clone());
        debug!(user_id = %session.user.id, "Client session started");
        session
    }

    /// Sign out. Safe to call with nobody signed in.
    pub async fn end(&self) {
        self.store.clear();
        *self.current.write().await = None;
    }

    /// Re-establish the session saved in the store.
    ///
    /// `fetch_profile` is called with the stored token and should ask the
    /// server who it belongs to. Any failure, or an already expired
    /// token, wipes the stored session.
    pub async fn restore<F, Fut>(&self, fetch_profile: F) -> Option<Arc<ActiveSession>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = SubtrackResult<UserProfile>>,
    {
        let stored = self.store.load()?;

        if stored.is_expired(self.clock.now()) {
            debug!("Stored session expired");
            self.end().await;
            return None;
        }

        match fetch_profile(stored.token.clone()).await {
            Ok(user) => {
                let session = ActiveSession { user, ..stored };
                Some(self.begin(session).await)
            }
            Err(e) => {
                debug!(error = %e, "Stored session rejected");
                self.end().await;
                None
            }
        }
    }
}
