use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response of `GET /api/admin/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub logs: Vec<AuditLogEntry>,
}

/// One entry of the server-side audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub details: Option<AuditDetails>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Known keys of an audit entry's `details` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(default)]
    pub drug_id: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl AuditLogEntry {
    /// "User abc123" for the first six characters, "System" when anonymous.
    pub fn actor(&self) -> String {
        match self.user_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => format!("User {}", id.chars().take(6).collect::<String>()),
            None => "System".to_string(),
        }
    }

    pub fn is_override(&self) -> bool {
        self.action == "OVERRIDE_RISK"
    }
}
