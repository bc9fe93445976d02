//! Patient directory: list, register, look up.

use crate::api::{ApiError, MedSafeApi};
use crate::assessment::form::{normalize_list, ValidationError};
use crate::models::{CreatedPatient, NewPatient, Patient};

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Registration form, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub allergies: String,
    pub medical_history: String,
    pub current_medications: String,
}

impl Default for PatientForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: String::new(),
            gender: "Male".to_string(),
            allergies: String::new(),
            medical_history: String::new(),
            current_medications: String::new(),
        }
    }
}

impl PatientForm {
    /// Validate and normalize into the registration body.
    pub fn to_new_patient(&self) -> Result<NewPatient, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let age = self.age.trim();
        if age.is_empty() {
            return Err(ValidationError::MissingAge);
        }
        let age = age
            .parse()
            .map_err(|_| ValidationError::InvalidAge(age.to_string()))?;

        Ok(NewPatient {
            name: name.to_string(),
            age,
            gender: self.gender.trim().to_string(),
            allergies: normalize_list(&self.allergies),
            medical_history: normalize_list(&self.medical_history),
            current_medications: normalize_list(&self.current_medications),
        })
    }
}

/// Patients visible to the signed-in clinician.
#[derive(Debug, Default)]
pub struct PatientDirectory {
    patients: Vec<Patient>,
}

impl PatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Reload the list. Failure is logged and leaves the list empty.
    pub async fn load<A: MedSafeApi>(&mut self, api: &A) -> &[Patient] {
        match api.list_patients().await {
            Ok(patients) => {
                tracing::debug!(count = patients.len(), "Patients loaded");
                self.patients = patients;
            }
            Err(e) => {
                tracing::warn!("Failed to load patients: {e}");
                self.patients.clear();
            }
        }
        &self.patients
    }

    /// Register a patient, then refresh the list.
    pub async fn register<A: MedSafeApi>(
        &mut self,
        api: &A,
        form: &PatientForm,
    ) -> Result<CreatedPatient, PatientError> {
        let patient = form.to_new_patient()?;
        let created = api.create_patient(&patient).await?;
        tracing::info!(patient_id = %created.patient_id, "Patient registered");
        self.load(api).await;
        Ok(created)
    }

    /// Fetch one full record by id.
    pub async fn fetch<A: MedSafeApi>(&self, api: &A, id: &str) -> Result<Patient, ApiError> {
        api.get_patient(id.trim()).await
    }
}
