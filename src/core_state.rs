//! Application state shared by every front-end command.
//!
//! `CoreState` owns the session store, the auth holder and the API client,
//! all reading and writing the same key-value store. The API client reads
//! the token from that store on each request, so `sign_in` / `sign_out` take
//! effect immediately.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError, MedSafeApi};
use crate::config::ClientConfig;
use crate::dashboard::Dashboard;
use crate::models::{RegisterRequest, RegisterResponse};
use crate::session::{AuthStore, UserInfo};
use crate::storage::{FileStore, KeyValueStore, StorageError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    auth: AuthStore,
    api: ApiClient,
}

impl CoreState {
    /// State backed by the session file in the configured data directory.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let store = Arc::new(FileStore::new(config.session_file()));
        Self::with_store(config, store)
    }

    /// State backed by an arbitrary store; the session is hydrated from it.
    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        let api = ApiClient::new(&config.api_base_url, store.clone())?;
        let auth = AuthStore::hydrate(store);
        tracing::debug!(
            api = %api.base_url(),
            authenticated = auth.is_authenticated(),
            "Core state ready"
        );
        Ok(Self { auth, api })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// Exchange credentials for a token and persist the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserInfo, CoreError> {
        let email = email.trim();
        let response = self.api.login(email, password).await?;
        self.auth.login(&response.token, &response.role, email)?;
        Ok(UserInfo {
            email: email.to_string(),
            role: response.role,
        })
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisterResponse, CoreError> {
        let response = self.api.register(request).await?;
        tracing::info!(email = %request.email, role = %request.role, "Account registered");
        Ok(response)
    }

    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.auth.logout()?;
        Ok(())
    }

    /// Signed-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<UserInfo, CoreError> {
        self.auth.user().ok_or(CoreError::NotAuthenticated)
    }

    /// Fresh dashboard for the signed-in user.
    pub fn dashboard(&self) -> Result<Dashboard, CoreError> {
        Ok(Dashboard::new(self.require_user()?))
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not signed in. Run `medsafe login` first")]
    NotAuthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
