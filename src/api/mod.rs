//! Typed client for the MedSafe risk-assessment REST API.
//!
//! `MedSafeApi` is the seam between the dashboard and the network:
//! `ApiClient` implements it over HTTP, tests drive the workflow with an
//! in-process mock.

pub mod client;
pub mod error;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub mod test_server;

use std::future::Future;

pub use client::ApiClient;
pub use error::ApiError;

use crate::models::{
    Alternative, AssessmentRequest, AssessmentResult, CreatedPatient, LoginResponse,
    MessageResponse, NewPatient, OverrideRecord, Patient, RegisterRequest, RegisterResponse,
    SystemStats,
};

/// One async method per endpoint. Single attempt, no retry.
pub trait MedSafeApi: Send + Sync {
    /// `GET /`
    fn health(&self) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;

    /// `POST /auth/login`
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// `POST /auth/register`
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<RegisterResponse, ApiError>> + Send;

    /// `POST /api/assess`
    fn assess(
        &self,
        request: &AssessmentRequest,
    ) -> impl Future<Output = Result<AssessmentResult, ApiError>> + Send;

    /// `POST /api/assess/override`
    fn log_override(
        &self,
        record: &OverrideRecord,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;

    /// `GET /api/alternatives/:drugId`, unwrapped from its envelope.
    fn alternatives(
        &self,
        drug_id: &str,
    ) -> impl Future<Output = Result<Vec<Alternative>, ApiError>> + Send;

    /// `GET /api/patients`
    fn list_patients(&self) -> impl Future<Output = Result<Vec<Patient>, ApiError>> + Send;

    /// `POST /api/patients`
    fn create_patient(
        &self,
        patient: &NewPatient,
    ) -> impl Future<Output = Result<CreatedPatient, ApiError>> + Send;

    /// `GET /api/patient/:id`
    fn get_patient(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<Patient, ApiError>> + Send;

    /// `GET /api/drugs/search?q=`
    fn search_drugs(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// `GET /api/admin/stats`
    fn admin_stats(&self) -> impl Future<Output = Result<SystemStats, ApiError>> + Send;
}
