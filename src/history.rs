//! Session-scoped assessment history (newest first, never persisted).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AssessmentResult, PatientContext, RiskLevel};

/// One completed assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub drug_id: String,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub timestamp: DateTime<Utc>,
    pub patient_age: u32,
    pub patient_gender: String,
}

impl HistoryItem {
    pub fn new(result: &AssessmentResult, context: &PatientContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            drug_id: context.drug_id.clone(),
            risk_level: result.risk_level,
            risk_score: result.risk_score,
            timestamp: Utc::now(),
            patient_age: context.age,
            patient_gender: context.gender.clone(),
        }
    }

    pub fn score_percent(&self) -> u32 {
        (self.risk_score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Ordered history, most recent entry first.
#[derive(Debug, Default)]
pub struct AssessmentHistory {
    items: VecDeque<HistoryItem>,
}

impl AssessmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry for a completed assessment.
    pub fn record(&mut self, result: &AssessmentResult, context: &PatientContext) -> &HistoryItem {
        self.items.push_front(HistoryItem::new(result, context));
        &self.items[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&HistoryItem> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
