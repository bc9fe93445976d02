//! Assessment workflow.
//!
//! One submission moves through
//! `Idle → Submitting → (FetchingAlternatives) → Done`, or ends in `Failed`.
//! Alternatives are fetched once per submission, and only for results above
//! Low; their failure never fails the assessment.

pub mod form;
pub mod report;
pub mod suggestions;

use chrono::Utc;

pub use form::{normalize_list, AssessmentForm, ValidationError};
pub use report::{ReportError, RiskReport};
pub use suggestions::{DrugSuggestions, SearchOutcome, SearchTicket};

use crate::api::{ApiError, MedSafeApi};
use crate::models::{
    Alternative, AssessmentResult, OverrideRecord, PatientContext, RiskLevel, Role,
};

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("An assessment is already in progress")]
    Busy,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("No assessment result yet")]
    NoResult,
    #[error("{0}")]
    OverrideNotPermitted(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentPhase {
    Idle,
    Submitting,
    FetchingAlternatives,
    Done,
    Failed,
}

impl AssessmentPhase {
    pub fn in_flight(self) -> bool {
        matches!(self, Self::Submitting | Self::FetchingAlternatives)
    }
}

/// State behind the assessment tab.
#[derive(Debug)]
pub struct AssessmentWorkflow {
    pub form: AssessmentForm,
    suggestions: DrugSuggestions,
    phase: AssessmentPhase,
    result: Option<AssessmentResult>,
    context: Option<PatientContext>,
    alternatives: Vec<Alternative>,
    last_error: Option<String>,
    override_reason: String,
}

impl Default for AssessmentWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentWorkflow {
    pub fn new() -> Self {
        Self {
            form: AssessmentForm::default(),
            suggestions: DrugSuggestions::new(),
            phase: AssessmentPhase::Idle,
            result: None,
            context: None,
            alternatives: Vec::new(),
            last_error: None,
            override_reason: String::new(),
        }
    }

    pub fn phase(&self) -> AssessmentPhase {
        self.phase
    }

    /// Submit is enabled whenever no request is in flight.
    pub fn can_submit(&self) -> bool {
        !self.phase.in_flight()
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// Patient context the current result was requested with.
    pub fn context(&self) -> Option<&PatientContext> {
        self.context.as_ref()
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn suggestions(&self) -> &[String] {
        self.suggestions.items()
    }

    pub fn override_reason(&self) -> &str {
        &self.override_reason
    }

    pub fn set_override_reason(&mut self, reason: &str) {
        self.override_reason = reason.to_string();
    }

    /// Return to `Idle` after an abandoned in-flight submission.
    pub fn cancel(&mut self) {
        if self.phase.in_flight() {
            tracing::debug!(phase = ?self.phase, "Assessment cancelled");
            self.phase = AssessmentPhase::Idle;
        }
    }

    // ── Drug autocomplete ──────────────────────────────────

    /// Update the drug field and refresh suggestions for it.
    pub async fn search_drug<A: MedSafeApi>(&mut self, api: &A, input: &str) -> SearchOutcome {
        self.form.drug_id = input.to_string();
        let Some(ticket) = self.suggestions.begin(input) else {
            return SearchOutcome::Cleared;
        };
        let response = api.search_drugs(ticket.query()).await;
        self.suggestions.resolve(&ticket, response)
    }

    /// Pick a suggestion as the drug to prescribe.
    pub fn pick_suggestion(&mut self, index: usize) -> Option<&str> {
        let chosen = self.suggestions.select(index)?;
        self.form.drug_id = chosen;
        Some(self.form.drug_id.as_str())
    }

    // ── Submission ─────────────────────────────────────────

    /// Run one assessment.
    ///
    /// Validation errors leave the workflow untouched. On success
    /// `on_result` sees the result and the echoed patient context before the
    /// alternatives fetch starts.
    pub async fn submit<A, F>(
        &mut self,
        api: &A,
        on_result: F,
    ) -> Result<&AssessmentResult, AssessmentError>
    where
        A: MedSafeApi,
        F: FnOnce(&AssessmentResult, &PatientContext),
    {
        if self.phase.in_flight() {
            return Err(AssessmentError::Busy);
        }
        let request = self.form.to_request()?;
        let context = PatientContext::from(&request);

        self.phase = AssessmentPhase::Submitting;
        self.result = None;
        self.context = None;
        self.alternatives.clear();
        self.last_error = None;
        self.suggestions.clear();

        let result = match api.assess(&request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(drug = %request.drug_id, "Assessment failed: {e}");
                self.phase = AssessmentPhase::Failed;
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        tracing::info!(
            drug = %request.drug_id,
            level = %result.risk_level,
            score = result.risk_score,
            "Assessment completed"
        );
        on_result(&result, &context);

        let elevated = result.risk_level.is_elevated();
        self.result = Some(result);
        self.context = Some(context);

        if elevated {
            self.phase = AssessmentPhase::FetchingAlternatives;
            match api.alternatives(&request.drug_id).await {
                Ok(alternatives) => self.alternatives = alternatives,
                Err(e) => {
                    tracing::warn!(drug = %request.drug_id, "Failed to fetch alternatives: {e}")
                }
            }
        }

        self.phase = AssessmentPhase::Done;
        self.result.as_ref().ok_or(AssessmentError::NoResult)
    }

    // ── Override ───────────────────────────────────────────

    /// Log a clinician's decision to proceed despite elevated risk.
    ///
    /// Returns the server acknowledgement and clears the reason on success.
    pub async fn override_decision<A: MedSafeApi>(
        &mut self,
        api: &A,
        role: Option<Role>,
        patient_id: Option<String>,
    ) -> Result<String, AssessmentError> {
        let record = self.override_record(role, patient_id)?;
        let ack = api.log_override(&record).await?;
        tracing::info!(
            drug = %record.drug_id,
            level = %record.risk_level,
            "Override logged"
        );
        self.override_reason.clear();
        Ok(ack.message)
    }

    /// Whether the override panel applies to the current result.
    pub fn can_override(&self, role: Option<Role>) -> bool {
        role == Some(Role::Clinician)
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.risk_level.is_elevated())
    }

    fn override_record(
        &self,
        role: Option<Role>,
        patient_id: Option<String>,
    ) -> Result<OverrideRecord, AssessmentError> {
        if role != Some(Role::Clinician) {
            return Err(AssessmentError::OverrideNotPermitted(
                "Only clinicians can override a risk assessment",
            ));
        }
        let (Some(result), Some(context)) = (&self.result, &self.context) else {
            return Err(AssessmentError::NoResult);
        };
        override_record(
            role,
            &context.drug_id,
            result.risk_level,
            &self.override_reason,
            patient_id,
        )
    }

    // ── Report ─────────────────────────────────────────────

    /// Report for the current result and form, if there is a result.
    pub fn report(&self) -> Option<RiskReport> {
        let result = self.result.as_ref()?;
        Some(RiskReport {
            generated_at: Utc::now(),
            age: form::parse_age(&self.form.age).unwrap_or_default(),
            gender: self.form.gender.clone(),
            drug_id: self.form.drug_id.clone(),
            current_medications: self.form.medications(),
            result: result.clone(),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Override outside the workflow
// ═══════════════════════════════════════════════════════════

/// Validate an override: clinician only, elevated level, non-blank reason.
fn override_record(
    role: Option<Role>,
    drug_id: &str,
    risk_level: RiskLevel,
    reason: &str,
    patient_id: Option<String>,
) -> Result<OverrideRecord, AssessmentError> {
    if role != Some(Role::Clinician) {
        return Err(AssessmentError::OverrideNotPermitted(
            "Only clinicians can override a risk assessment",
        ));
    }
    if !risk_level.is_elevated() {
        return Err(AssessmentError::OverrideNotPermitted(
            "Override applies only to elevated risk",
        ));
    }
    let drug_id = drug_id.trim();
    if drug_id.is_empty() {
        return Err(ValidationError::MissingDrug.into());
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::MissingReason.into());
    }
    Ok(OverrideRecord {
        drug_id: drug_id.to_string(),
        risk_level,
        reason: reason.to_string(),
        patient_id: patient_id.filter(|id| !id.trim().is_empty()),
    })
}

/// Log an override for a result the clinician already reviewed.
///
/// Posts exactly one override record; nothing is re-assessed.
pub async fn log_reviewed_override<A: MedSafeApi>(
    api: &A,
    role: Option<Role>,
    drug_id: &str,
    risk_level: RiskLevel,
    reason: &str,
    patient_id: Option<String>,
) -> Result<String, AssessmentError> {
    let record = override_record(role, drug_id, risk_level, reason, patient_id)?;
    let ack = api.log_override(&record).await?;
    tracing::info!(drug = %record.drug_id, level = %record.risk_level, "Override logged");
    Ok(ack.message)
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;

    fn workflow(drug: &str) -> AssessmentWorkflow {
        let mut wf = AssessmentWorkflow::new();
        wf.form.age = "67".into();
        wf.form.gender = "female".into();
        wf.form.current_medications = "Aspirin, , Metformin".into();
        wf.form.drug_id = drug.into();
        wf
    }

    #[tokio::test]
    async fn low_risk_skips_alternatives() {
        let api = MockApi::returning(RiskLevel::Low, 0.1);
        let mut wf = workflow("Aspirin");

        let result = wf.submit(&api, |_, _| {}).await.unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(api.count("alternatives"), 0);
        assert_eq!(wf.phase(), AssessmentPhase::Done);
        assert!(wf.alternatives().is_empty());
    }

    #[tokio::test]
    async fn elevated_risk_fetches_alternatives_once() {
        for level in [RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical] {
            let api = MockApi::returning(level, 0.7);
            let mut wf = workflow("Warfarin");
            wf.submit(&api, |_, _| {}).await.unwrap();
            assert_eq!(api.count("alternatives"), 1, "{level}");
            assert_eq!(api.calls(), vec!["assess:Warfarin", "alternatives:Warfarin"]);
            assert_eq!(wf.alternatives()[0].name, "Apixaban");
        }
    }

    #[tokio::test]
    async fn alternatives_failure_keeps_result() {
        let api = MockApi {
            alternatives: None,
            ..MockApi::returning(RiskLevel::High, 0.8)
        };
        let mut wf = workflow("Warfarin");

        assert!(wf.submit(&api, |_, _| {}).await.is_ok());
        assert_eq!(wf.phase(), AssessmentPhase::Done);
        assert_eq!(wf.result().unwrap().risk_level, RiskLevel::High);
        assert!(wf.alternatives().is_empty());
        assert!(wf.last_error().is_none());
    }

    #[tokio::test]
    async fn callback_receives_echoed_context() {
        let api = MockApi::returning(RiskLevel::Medium, 0.5);
        let mut wf = workflow("Lisinopril");
        let mut seen = None;

        wf.submit(&api, |r, ctx| seen = Some((r.risk_level, ctx.clone())))
            .await
            .unwrap();

        let (level, ctx) = seen.unwrap();
        assert_eq!(level, RiskLevel::Medium);
        assert_eq!(ctx.drug_id, "Lisinopril");
        assert_eq!(ctx.age, 67);
        assert_eq!(ctx.gender, "female");
    }

    #[tokio::test]
    async fn failure_leaves_no_result_and_reenables_submit() {
        let api = MockApi::failing_assess();
        let mut wf = workflow("Warfarin");
        let mut called = false;

        let err = wf.submit(&api, |_, _| called = true).await.unwrap_err();
        assert!(matches!(err, AssessmentError::Api(_)));
        assert!(!called);
        assert_eq!(wf.phase(), AssessmentPhase::Failed);
        assert!(wf.can_submit());
        assert!(wf.result().is_none());
        assert_eq!(wf.last_error(), Some("Model unavailable"));
        assert_eq!(api.count("alternatives"), 0);
    }

    #[tokio::test]
    async fn new_submission_clears_previous_result() {
        let api = MockApi::returning(RiskLevel::High, 0.8);
        let mut wf = workflow("Warfarin");
        wf.submit(&api, |_, _| {}).await.unwrap();

        api.set_assess_result(None);
        assert!(wf.submit(&api, |_, _| {}).await.is_err());
        assert!(wf.result().is_none());
        assert!(wf.alternatives().is_empty());
    }

    #[tokio::test]
    async fn validation_error_makes_no_request() {
        let api = MockApi::default();
        let mut wf = workflow("");

        let err = wf.submit(&api, |_, _| {}).await.unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::Validation(ValidationError::MissingDrug)
        ));
        assert!(api.calls().is_empty());
        assert_eq!(wf.phase(), AssessmentPhase::Idle);
    }

    #[tokio::test]
    async fn in_flight_submission_is_rejected() {
        let api = MockApi::default();
        let mut wf = workflow("Aspirin");
        wf.phase = AssessmentPhase::Submitting;

        assert!(matches!(
            wf.submit(&api, |_, _| {}).await,
            Err(AssessmentError::Busy)
        ));
        assert!(api.calls().is_empty());

        wf.cancel();
        assert!(wf.submit(&api, |_, _| {}).await.is_ok());
    }

    #[tokio::test]
    async fn drug_search_updates_suggestions() {
        let api = MockApi::default();
        let mut wf = AssessmentWorkflow::new();

        assert_eq!(wf.search_drug(&api, "a").await, SearchOutcome::Cleared);
        assert_eq!(api.count("search_drugs"), 0);

        assert_eq!(wf.search_drug(&api, "ar").await, SearchOutcome::Applied);
        assert_eq!(wf.suggestions(), ["Warfarin"]);
        assert_eq!(wf.form.drug_id, "ar");

        assert_eq!(wf.pick_suggestion(0), Some("Warfarin"));
        assert_eq!(wf.form.drug_id, "Warfarin");
        assert!(wf.suggestions().is_empty());
    }

    #[tokio::test]
    async fn override_requires_clinician_elevated_and_reason() {
        let api = MockApi::returning(RiskLevel::High, 0.8);
        let mut wf = workflow("Warfarin");

        assert!(matches!(
            wf.override_decision(&api, Some(Role::Clinician), None).await,
            Err(AssessmentError::NoResult)
        ));

        wf.submit(&api, |_, _| {}).await.unwrap();
        assert!(wf.can_override(Some(Role::Clinician)));
        assert!(!wf.can_override(Some(Role::Pharmacist)));

        wf.set_override_reason("Benefit outweighs risk");
        assert!(matches!(
            wf.override_decision(&api, Some(Role::Pharmacist), None).await,
            Err(AssessmentError::OverrideNotPermitted(_))
        ));

        wf.set_override_reason("   ");
        assert!(matches!(
            wf.override_decision(&api, Some(Role::Clinician), None).await,
            Err(AssessmentError::Validation(ValidationError::MissingReason))
        ));
        assert_eq!(api.count("override"), 0);

        wf.set_override_reason("Benefit outweighs risk");
        let ack = wf
            .override_decision(&api, Some(Role::Clinician), None)
            .await
            .unwrap();
        assert_eq!(ack, "Override logged successfully");
        assert_eq!(wf.override_reason(), "");
        assert_eq!(api.count("override"), 1);
    }

    #[tokio::test]
    async fn override_not_offered_for_low_risk() {
        let api = MockApi::returning(RiskLevel::Low, 0.1);
        let mut wf = workflow("Aspirin");
        wf.submit(&api, |_, _| {}).await.unwrap();
        wf.set_override_reason("Because");

        assert!(!wf.can_override(Some(Role::Clinician)));
        assert!(matches!(
            wf.override_decision(&api, Some(Role::Clinician), None).await,
            Err(AssessmentError::OverrideNotPermitted(_))
        ));
    }

    #[tokio::test]
    async fn override_failure_keeps_reason() {
        let api = MockApi {
            override_ok: false,
            ..MockApi::returning(RiskLevel::Critical, 1.0)
        };
        let mut wf = workflow("Warfarin");
        wf.submit(&api, |_, _| {}).await.unwrap();
        wf.set_override_reason("Palliative care");

        let err = wf
            .override_decision(&api, Some(Role::Clinician), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Audit store unavailable");
        assert_eq!(wf.override_reason(), "Palliative care");
    }

    #[tokio::test]
    async fn report_reflects_result_and_form() {
        let api = MockApi::returning(RiskLevel::Medium, 0.55);
        let mut wf = workflow("Lisinopril");
        assert!(wf.report().is_none());

        wf.submit(&api, |_, _| {}).await.unwrap();
        let report = wf.report().unwrap();
        assert_eq!(report.age, 67);
        assert_eq!(report.drug_id, "Lisinopril");
        assert_eq!(report.current_medications, vec!["Aspirin", "Metformin"]);
        assert!(report.render_text().contains("Score:        55%"));
    }

    #[tokio::test]
    async fn reviewed_override_posts_once_without_reassessing() {
        let api = MockApi::default();
        let ack = log_reviewed_override(
            &api,
            Some(Role::Clinician),
            " Warfarin ",
            RiskLevel::High,
            "Benefit outweighs risk",
            Some("p-1".into()),
        )
        .await
        .unwrap();

        assert_eq!(ack, "Override logged successfully");
        assert_eq!(api.calls(), vec!["override:Warfarin"]);
        assert_eq!(api.count("assess"), 0);
        assert_eq!(api.count("alternatives"), 0);
    }

    #[tokio::test]
    async fn reviewed_override_applies_workflow_checks() {
        let api = MockApi::default();

        let low = log_reviewed_override(&api, Some(Role::Clinician), "Aspirin", RiskLevel::Low, "ok", None)
            .await
            .unwrap_err();
        assert!(matches!(low, AssessmentError::OverrideNotPermitted(_)));

        let pharmacist =
            log_reviewed_override(&api, Some(Role::Pharmacist), "Warfarin", RiskLevel::High, "ok", None)
                .await
                .unwrap_err();
        assert!(matches!(pharmacist, AssessmentError::OverrideNotPermitted(_)));

        let blank = log_reviewed_override(&api, Some(Role::Clinician), "Warfarin", RiskLevel::Critical, "  ", None)
            .await
            .unwrap_err();
        assert!(matches!(
            blank,
            AssessmentError::Validation(ValidationError::MissingReason)
        ));

        assert!(api.calls().is_empty());
    }
}
