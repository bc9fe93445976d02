//! Auth state holder.
//!
//! Owns the signed-in session (email, role, bearer token) and mirrors it
//! into the persistent key-value store. Lifecycle:
//! - `hydrate()` restores a session from the store without any network call,
//!   so a stale token is accepted until the server rejects it
//! - `login()` writes all three keys in one store write
//! - `logout()` removes all three keys in one store write
//!
//! The in-memory token is zeroed on drop.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use zeroize::Zeroizing;

use crate::config::{EMAIL_KEY, ROLE_KEY, SESSION_KEYS, TOKEN_KEY};
use crate::models::Role;
use crate::storage::{KeyValueStore, StorageError};

// ═══════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════

/// One signed-in user.
#[derive(Clone)]
pub struct Session {
    email: String,
    role: String,
    token: Zeroizing<String>,
}

impl Session {
    pub fn new(token: &str, role: &str, email: &str) -> Self {
        Self {
            email: email.to_string(),
            role: role.to_string(),
            token: Zeroizing::new(token.to_string()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Raw role string as issued by the server.
    pub fn role_name(&self) -> &str {
        &self.role
    }

    /// Role, when the server issued one of the four known roles.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> UserInfo {
        UserInfo {
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Public view of the signed-in user (no token).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub email: String,
    pub role: String,
}

impl UserInfo {
    /// Local part of the email, shown in the sidebar.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

// ═══════════════════════════════════════════════════════════
// AuthStore
// ═══════════════════════════════════════════════════════════

/// Explicit session store, injected wherever auth state is needed.
pub struct AuthStore {
    store: Arc<dyn KeyValueStore>,
    session: RwLock<Option<Session>>,
}

impl AuthStore {
    /// Create an empty (signed-out) store without reading persisted state.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            session: RwLock::new(None),
        }
    }

    /// Create and synchronously restore the persisted session, if any.
    ///
    /// A session is restored only when token, role and email are all present.
    /// Unreadable storage leaves the holder signed out.
    pub fn hydrate(store: Arc<dyn KeyValueStore>) -> Self {
        let holder = Self::new(store);
        match holder.read_persisted() {
            Ok(Some(session)) => {
                tracing::debug!(email = %session.email, role = %session.role, "Session restored");
                if let Ok(mut guard) = holder.session.write() {
                    *guard = Some(session);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read persisted session: {e}"),
        }
        holder
    }

    fn read_persisted(&self) -> Result<Option<Session>, StorageError> {
        let token = self.store.get(TOKEN_KEY)?;
        let role = self.store.get(ROLE_KEY)?;
        let email = self.store.get(EMAIL_KEY)?;
        Ok(match (token, role, email) {
            (Some(token), Some(role), Some(email)) if !token.is_empty() => {
                Some(Session::new(&token, &role, &email))
            }
            _ => None,
        })
    }

    /// Persist and activate a new session.
    pub fn login(&self, token: &str, role: &str, email: &str) -> Result<(), StorageError> {
        self.store
            .set_all(&[(TOKEN_KEY, token), (ROLE_KEY, role), (EMAIL_KEY, email)])?;
        let mut guard = self.session.write().map_err(|_| StorageError::LockPoisoned)?;
        *guard = Some(Session::new(token, role, email));
        tracing::info!(email, role, "Signed in");
        Ok(())
    }

    /// Clear persisted and in-memory session state.
    ///
    /// In-memory state is cleared even if the store write fails.
    pub fn logout(&self) -> Result<(), StorageError> {
        let persisted = self.store.remove_all(&SESSION_KEYS);
        if let Ok(mut guard) = self.session.write() {
            *guard = None;
        }
        tracing::info!("Signed out");
        persisted
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Snapshot of the active session.
    pub fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|guard| (*guard).clone())
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.session().map(|s| s.user())
    }

    pub fn token(&self) -> Option<Zeroizing<String>> {
        self.session().map(|s| s.token)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
