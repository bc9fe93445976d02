//! System statistics and audit trail (admin overview, stats and audit tabs).

use crate::api::{ApiError, MedSafeApi};
use crate::models::{AuditLogEntry, SystemStats};

/// "total_users" → "Total Users".
pub fn metric_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole numbers without a fraction, everything else to two places.
pub fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

/// "Drug: Warfarin • Risk: High", empty when the entry has neither.
pub fn log_summary(entry: &AuditLogEntry) -> String {
    let Some(details) = &entry.details else {
        return String::new();
    };
    let mut parts = Vec::new();
    if let Some(drug) = details.drug_id.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("Drug: {drug}"));
    }
    if let Some(level) = details.risk_level.as_deref().filter(|l| !l.is_empty()) {
        parts.push(format!("Risk: {level}"));
    }
    parts.join(" • ")
}

#[derive(Debug, Default)]
pub struct StatsPanel {
    stats: Option<SystemStats>,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch metrics and logs with a single request. On failure the panel
    /// is emptied and the error returned.
    pub async fn load<A: MedSafeApi>(&mut self, api: &A) -> Result<&SystemStats, ApiError> {
        self.stats = None;
        let stats = api.admin_stats().await?;
        Ok(&*self.stats.insert(stats))
    }

    pub fn stats(&self) -> Option<&SystemStats> {
        self.stats.as_ref()
    }

    /// Metrics as (label, formatted value), in key order.
    pub fn metric_rows(&self) -> Vec<(String, String)> {
        self.stats
            .iter()
            .flat_map(|s| s.metrics.iter())
            .map(|(k, v)| (metric_label(k), format_metric(*v)))
            .collect()
    }

    pub fn logs(&self) -> &[AuditLogEntry] {
        self.stats.as_ref().map(|s| s.logs.as_slice()).unwrap_or(&[])
    }
}
