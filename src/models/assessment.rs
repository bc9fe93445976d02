use serde::{Deserialize, Serialize};

use super::enums::RiskLevel;

/// Patient context sent with an assessment (`patient_data` on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientData {
    pub age: u32,
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatinine: Option<f64>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// A complete assessment request, built from the assessment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub patient_data: PatientData,
    pub drug_id: String,
}

/// One feature's contribution to the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapValue {
    pub feature: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution: Option<String>,
}

impl ShapValue {
    /// Positive values push the score up.
    pub fn increases_risk(&self) -> bool {
        self.value > 0.0
    }
}

/// Response of `POST /api/assess`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub interactions: Vec<String>,
    #[serde(default)]
    pub shap_values: Vec<ShapValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl AssessmentResult {
    /// Score as a whole percentage, rounded half away from zero.
    pub fn score_percent(&self) -> u32 {
        (self.risk_score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// A substitute drug suggested for an elevated-risk prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    pub risk_reduction: String,
}

/// Envelope of `GET /api/alternatives/:drugId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlternativesResponse {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// Audit record for a clinician proceeding despite elevated risk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub drug_id: String,
    pub risk_level: RiskLevel,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

/// Patient details echoed back to the caller after an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientContext {
    pub drug_id: String,
    pub age: u32,
    pub gender: String,
}
