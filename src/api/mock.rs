//! Scriptable `MedSafeApi` for workflow and dashboard tests.

use std::sync::Mutex;

use super::error::ApiError;
use super::MedSafeApi;
use crate::models::{
    Alternative, AssessmentRequest, AssessmentResult, CreatedPatient, LoginResponse,
    MessageResponse, NewPatient, OverrideRecord, Patient, RegisterRequest, RegisterResponse,
    RiskLevel, SystemStats,
};

/// Canned responses plus a log of every call made.
///
/// `None` for a fallible endpoint makes it answer with a 500.
pub struct MockApi {
    pub assess_result: Mutex<Option<AssessmentResult>>,
    pub alternatives: Option<Vec<Alternative>>,
    pub drugs: Vec<String>,
    pub patients: Mutex<Vec<Patient>>,
    pub stats: Option<SystemStats>,
    pub override_ok: bool,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            assess_result: Mutex::new(Some(result(RiskLevel::Low, 0.12))),
            alternatives: Some(vec![Alternative {
                name: "Apixaban".into(),
                risk_reduction: "40%".into(),
            }]),
            drugs: ["Aspirin", "Atorvastatin", "Warfarin"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            patients: Mutex::new(Vec::new()),
            stats: Some(SystemStats::default()),
            override_ok: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

/// Minimal result at the given level.
pub fn result(level: RiskLevel, score: f64) -> AssessmentResult {
    AssessmentResult {
        risk_score: score,
        risk_level: level,
        interactions: vec![],
        shap_values: vec![],
        recommendation: None,
    }
}

pub fn patient(id: &str, name: &str) -> Patient {
    Patient {
        id: id.into(),
        name: name.into(),
        age: Some(50),
        gender: Some("Female".into()),
        allergies: vec![],
        medical_history: vec![],
        current_medications: vec![],
        created_at: None,
        extra: Default::default(),
    }
}

fn server_error(message: &str) -> ApiError {
    ApiError::Server {
        status: 500,
        message: message.into(),
    }
}

impl MockApi {
    pub fn returning(level: RiskLevel, score: f64) -> Self {
        Self {
            assess_result: Mutex::new(Some(result(level, score))),
            ..Self::default()
        }
    }

    pub fn failing_assess() -> Self {
        Self {
            assess_result: Mutex::new(None),
            ..Self::default()
        }
    }

    pub fn set_assess_result(&self, next: Option<AssessmentResult>) {
        *self.assess_result.lock().unwrap() = next;
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose name (text before `:`) is `name`.
    pub fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(':').next() == Some(name))
            .count()
    }
}

impl MedSafeApi for MockApi {
    async fn health(&self) -> Result<MessageResponse, ApiError> {
        self.record("health".into());
        Ok(MessageResponse {
            message: "MedSafe API is running".into(),
        })
    }

    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.record(format!("login:{email}"));
        Err(ApiError::Server {
            status: 401,
            message: "Invalid credentials".into(),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.record(format!("register:{}", request.email));
        Ok(RegisterResponse {
            message: "User created".into(),
            user_id: "u-mock".into(),
        })
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<AssessmentResult, ApiError> {
        self.record(format!("assess:{}", request.drug_id));
        self.assess_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| server_error("Model unavailable"))
    }

    async fn log_override(&self, record: &OverrideRecord) -> Result<MessageResponse, ApiError> {
        self.record(format!("override:{}", record.drug_id));
        if self.override_ok {
            Ok(MessageResponse {
                message: "Override logged successfully".into(),
            })
        } else {
            Err(server_error("Audit store unavailable"))
        }
    }

    async fn alternatives(&self, drug_id: &str) -> Result<Vec<Alternative>, ApiError> {
        self.record(format!("alternatives:{drug_id}"));
        self.alternatives
            .clone()
            .ok_or_else(|| server_error("Alternatives unavailable"))
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.record("list_patients".into());
        Ok(self.patients.lock().unwrap().clone())
    }

    async fn create_patient(&self, new: &NewPatient) -> Result<CreatedPatient, ApiError> {
        self.record(format!("create_patient:{}", new.name));
        let mut patients = self.patients.lock().unwrap();
        let id = format!("p-{}", patients.len() + 1);
        let mut created = patient(&id, &new.name);
        created.age = Some(new.age);
        created.gender = Some(new.gender.clone());
        created.allergies = new.allergies.clone();
        created.medical_history = new.medical_history.clone();
        created.current_medications = new.current_medications.clone();
        patients.push(created);
        Ok(CreatedPatient {
            message: "Patient created".into(),
            patient_id: id,
        })
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Patient, ApiError> {
        self.record(format!("get_patient:{patient_id}"));
        self.patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
            .ok_or(ApiError::Server {
                status: 404,
                message: "Patient not found".into(),
            })
    }

    async fn search_drugs(&self, query: &str) -> Result<Vec<String>, ApiError> {
        self.record(format!("search_drugs:{query}"));
        let needle = query.to_lowercase();
        Ok(self
            .drugs
            .iter()
            .filter(|d| d.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn admin_stats(&self) -> Result<SystemStats, ApiError> {
        self.record("admin_stats".into());
        self.stats
            .clone()
            .ok_or_else(|| server_error("Stats unavailable"))
    }
}
