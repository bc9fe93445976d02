//! HTTP implementation of `MedSafeApi`.
//!
//! Every call reads the bearer token from the session store (not from a
//! cached copy), so a login or logout is visible to the very next request.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use super::error::ApiError;
use super::MedSafeApi;
use crate::config::TOKEN_KEY;
use crate::models::{
    Alternative, AlternativesResponse, AssessmentRequest, AssessmentResult, CreatedPatient,
    LoginRequest, LoginResponse, MessageResponse, NewPatient, OverrideRecord, Patient,
    RegisterRequest, RegisterResponse, SystemStats,
};
use crate::storage::KeyValueStore;

/// MedSafe REST client. No request timeout, no retry.
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    store: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    /// Create a client for `base_url`, reading tokens from `store`.
    pub fn new(base_url: &str, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(trimmed.to_string()));
        }

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            base_url: parsed,
            http,
            store,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bearer_token(&self) -> Option<Zeroizing<String>> {
        match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => Some(Zeroizing::new(token)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not read session token, sending unauthenticated: {e}");
                None
            }
        }
    }

    async fn send<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = url.path().to_string();
        tracing::debug!(%method, path = %path, "API request");

        let mut request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &bytes);
            tracing::debug!(status = status.as_u16(), path = %path, "API error: {err}");
            return Err(err);
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, url, None).await
    }

    async fn post<T, B>(&self, url: Url, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, Some(body)).await
    }
}

impl MedSafeApi for ApiClient {
    async fn health(&self) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&[""])?;
        self.get(url).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        self.post(url, &LoginRequest { email, password }).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let url = self.endpoint(&["auth", "register"])?;
        self.post(url, request).await
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<AssessmentResult, ApiError> {
        let url = self.endpoint(&["api", "assess"])?;
        self.post(url, request).await
    }

    async fn log_override(&self, record: &OverrideRecord) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&["api", "assess", "override"])?;
        self.post(url, record).await
    }

    async fn alternatives(&self, drug_id: &str) -> Result<Vec<Alternative>, ApiError> {
        let url = self.endpoint(&["api", "alternatives", drug_id])?;
        let envelope: AlternativesResponse = self.get(url).await?;
        Ok(envelope.alternatives)
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
        let url = self.endpoint(&["api", "patients"])?;
        self.get(url).await
    }

    async fn create_patient(&self, patient: &NewPatient) -> Result<CreatedPatient, ApiError> {
        let url = self.endpoint(&["api", "patients"])?;
        self.post(url, patient).await
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Patient, ApiError> {
        let url = self.endpoint(&["api", "patient", patient_id])?;
        self.get(url).await
    }

    async fn search_drugs(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let mut url = self.endpoint(&["api", "drugs", "search"])?;
        url.query_pairs_mut().append_pair("q", query);
        self.get(url).await
    }

    async fn admin_stats(&self) -> Result<SystemStats, ApiError> {
        let url = self.endpoint(&["api", "admin", "stats"])?;
        self.get(url).await
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
