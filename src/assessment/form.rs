//! Assessment form state and its conversion into a request.

use crate::models::{AssessmentRequest, PatientContext, PatientData};

/// Input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Drug to prescribe is required")]
    MissingDrug,
    #[error("Age must be a whole number of years, got '{0}'")]
    InvalidAge(String),
    #[error("Age is required")]
    MissingAge,
    #[error("Creatinine must be a number, got '{0}'")]
    InvalidCreatinine(String),
    #[error("Name is required")]
    MissingName,
    #[error("Please provide a reason")]
    MissingReason,
    #[error("Unknown field '{0}'. Expected one of: {expected}", expected = AssessmentForm::FIELDS.join(", "))]
    UnknownField(String),
}

/// Split comma-separated free text into trimmed, non-empty entries.
pub fn normalize_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an age field; blank means 0.
pub fn parse_age(raw: &str) -> Result<u32, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| ValidationError::InvalidAge(raw.to_string()))
}

/// Parse a serum creatinine field; blank means not measured.
pub fn parse_creatinine(raw: &str) -> Result<Option<f64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(ValidationError::InvalidCreatinine(raw.to_string())),
    }
}

/// Raw text of the assessment form, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentForm {
    pub age: String,
    pub gender: String,
    pub creatinine: String,
    pub current_medications: String,
    pub allergies: String,
    pub drug_id: String,
}

impl Default for AssessmentForm {
    fn default() -> Self {
        Self {
            age: String::new(),
            gender: "male".to_string(),
            creatinine: String::new(),
            current_medications: String::new(),
            allergies: String::new(),
            drug_id: String::new(),
        }
    }
}

impl AssessmentForm {
    pub const FIELDS: [&'static str; 6] = [
        "age",
        "gender",
        "creatinine",
        "medications",
        "allergies",
        "drug",
    ];

    /// Set a field by name (`medications` and `drug` are the short forms).
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field.trim().to_ascii_lowercase().as_str() {
            "age" => &mut self.age,
            "gender" => &mut self.gender,
            "creatinine" => &mut self.creatinine,
            "medications" | "meds" | "current_medications" => &mut self.current_medications,
            "allergies" => &mut self.allergies,
            "drug" | "drug_id" => &mut self.drug_id,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.trim().to_string();
        Ok(())
    }

    pub fn medications(&self) -> Vec<String> {
        normalize_list(&self.current_medications)
    }

    /// Validate and build the wire request.
    pub fn to_request(&self) -> Result<AssessmentRequest, ValidationError> {
        let drug_id = self.drug_id.trim();
        if drug_id.is_empty() {
            return Err(ValidationError::MissingDrug);
        }
        Ok(AssessmentRequest {
            patient_data: PatientData {
                age: parse_age(&self.age)?,
                gender: self.gender.trim().to_string(),
                creatinine: parse_creatinine(&self.creatinine)?,
                current_medications: self.medications(),
                allergies: normalize_list(&self.allergies),
            },
            drug_id: drug_id.to_string(),
        })
    }
}

impl From<&AssessmentRequest> for PatientContext {
    fn from(request: &AssessmentRequest) -> Self {
        Self {
            drug_id: request.drug_id.clone(),
            age: request.patient_data.age,
            gender: request.patient_data.gender.clone(),
        }
    }
}
