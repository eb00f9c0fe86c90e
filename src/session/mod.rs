//! Client session: tokens plus the signed-in user's profile.
//!
//! All reads go through [`SessionContext`], which wraps an injected
//! [`SessionStore`]. A missing or corrupt value is treated as "signed out";
//! nothing here panics on bad data.

pub mod profile;
pub mod store;
pub mod token;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub use profile::{Designation, Profile, Role, User};
pub use store::{FileStore, MemoryStore, SessionStore, StoredSession};
pub use token::{decode_claims, is_token_live, TokenClaims};

/// Body of a login, signup or refresh response. Every field is optional;
/// only the ones present are persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Snapshot of a live session
#[derive(Debug, Clone)]
pub struct Session {
    pub access: String,
    pub refresh: Option<String>,
    pub user: Option<User>,
}

impl Session {
    /// Role from the token claim, else from the stored profile
    pub fn role(&self) -> Option<Role> {
        resolve_role(&self.access, self.user.as_ref())
    }
}

/// The profile only fills in when the token has no role claim at all. A claim
/// that does not name a known role resolves to `None`.
fn resolve_role(access: &str, user: Option<&User>) -> Option<Role> {
    match decode_claims(access).and_then(|claims| claims.role) {
        Some(claim) => claim.parse().ok(),
        None => user.map(User::role),
    }
}

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn snapshot(&self) -> StoredSession {
        match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Session store unreadable, treating as signed out: {}", e);
                StoredSession::default()
            }
        }
    }

    /// Persist whichever of access, refresh and user are present
    pub fn save_auth(&self, payload: &AuthPayload) -> Result<(), ClientError> {
        let mut stored = self.snapshot();

        if let Some(access) = &payload.access {
            stored.access = Some(access.clone());
        }
        if let Some(refresh) = &payload.refresh {
            stored.refresh = Some(refresh.clone());
        }
        if let Some(user) = &payload.user {
            stored.user = Some(serde_json::to_string(user)?);
            tracing::info!("Signed in as {} ({})", user.username, user.role());
        }

        self.store.save(&stored)
    }

    /// Swap in a refreshed access token, leaving refresh and user untouched
    pub fn replace_access(&self, access: &str) -> Result<(), ClientError> {
        let mut stored = self.snapshot();
        stored.access = Some(access.to_string());
        self.store.save(&stored)
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access.filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.snapshot().refresh.filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.access_token()
            .is_some_and(|token| is_token_live(&token, now))
    }

    /// Role used for routing: the token claim, or the stored profile when
    /// the token carries no claim
    pub fn effective_role(&self) -> Option<Role> {
        let access = self.access_token()?;
        resolve_role(&access, self.get_user().as_ref())
    }

    pub fn role_from_token(&self) -> Option<Role> {
        self.access_token()
            .and_then(|token| decode_claims(&token))
            .and_then(|claims| claims.role())
    }

    /// Last saved profile, or `None` if absent or unparseable
    pub fn get_user(&self) -> Option<User> {
        let raw = self.snapshot().user?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Stored user profile is unreadable: {}", e);
                None
            }
        }
    }

    pub fn current(&self) -> Option<Session> {
        if !self.is_authenticated() {
            return None;
        }
        let stored = self.snapshot();
        Some(Session {
            access: stored.access?,
            refresh: stored.refresh,
            user: self.get_user(),
        })
    }

    /// Clear every persisted session key
    pub fn logout(&self) -> Result<(), ClientError> {
        tracing::info!("Clearing session");
        self.store.clear()
    }
}
