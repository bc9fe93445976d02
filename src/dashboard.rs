//! Dashboard state for one signed-in user.
//!
//! Ties the tab set, the assessment workflow, session history and the
//! data-backed panels together. Lives for one process; nothing here is
//! persisted.

use serde::Serialize;

use crate::api::MedSafeApi;
use crate::assessment::{AssessmentError, AssessmentWorkflow};
use crate::authorization::{tabs_for_role, TabId, TabSet};
use crate::history::AssessmentHistory;
use crate::models::{AssessmentResult, Role};
use crate::patients::PatientDirectory;
use crate::session::UserInfo;
use crate::stats::StatsPanel;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Unknown tab '{0}'")]
    Unknown(String),
    #[error("Tab '{0}' is not available for this role")]
    NotPermitted(TabId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient notification raised by dashboard actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Notification for a completed assessment.
    pub fn for_result(result: &AssessmentResult) -> Self {
        if result.risk_level.requires_review() {
            Self::new(
                ToastKind::Error,
                format!("Review Required: {} Risk Detected", result.risk_level),
            )
        } else {
            Self::new(ToastKind::Success, "Assessment Completed")
        }
    }
}

pub struct Dashboard {
    user: UserInfo,
    tabs: TabSet,
    active: TabId,
    history: AssessmentHistory,
    workflow: AssessmentWorkflow,
    patients: PatientDirectory,
    stats: StatsPanel,
    toast: Option<Toast>,
}

impl Dashboard {
    /// Dashboard for a signed-in user, opened on the role's default tab.
    pub fn new(user: UserInfo) -> Self {
        let tabs = tabs_for_role(user.role());
        let active = tabs.default_tab();
        Self {
            user,
            tabs,
            active,
            history: AssessmentHistory::new(),
            workflow: AssessmentWorkflow::new(),
            patients: PatientDirectory::new(),
            stats: StatsPanel::new(),
            toast: None,
        }
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn role(&self) -> Option<Role> {
        self.user.role()
    }

    pub fn tabs(&self) -> &TabSet {
        &self.tabs
    }

    pub fn active_tab(&self) -> TabId {
        self.active
    }

    /// Heading for the active tab.
    pub fn title(&self) -> &'static str {
        self.tabs
            .get(self.active)
            .map(|t| t.label)
            .unwrap_or("Dashboard")
    }

    pub fn select_tab(&mut self, id: TabId) -> Result<(), NavigationError> {
        if !self.tabs.contains(id) {
            return Err(NavigationError::NotPermitted(id));
        }
        self.active = id;
        Ok(())
    }

    /// `select_tab` by identifier, e.g. `"history"`.
    pub fn select_tab_named(&mut self, name: &str) -> Result<TabId, NavigationError> {
        let id = TabId::from_str(name).ok_or_else(|| NavigationError::Unknown(name.to_string()))?;
        self.select_tab(id)?;
        Ok(id)
    }

    pub fn history(&self) -> &AssessmentHistory {
        &self.history
    }

    pub fn workflow(&self) -> &AssessmentWorkflow {
        &self.workflow
    }

    pub fn workflow_mut(&mut self) -> &mut AssessmentWorkflow {
        &mut self.workflow
    }

    pub fn patients(&self) -> &PatientDirectory {
        &self.patients
    }

    pub fn patients_mut(&mut self) -> &mut PatientDirectory {
        &mut self.patients
    }

    pub fn stats(&self) -> &StatsPanel {
        &self.stats
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    /// Consume the pending notification, if any.
    pub fn take_toast(&mut self) -> Option<Toast> {
        self.toast.take()
    }

    /// Load whatever the active tab displays.
    pub async fn refresh<A: MedSafeApi>(&mut self, api: &A) {
        match self.active {
            TabId::Patients => {
                self.patients.load(api).await;
            }
            TabId::Overview | TabId::Stats | TabId::Audit => {
                if let Err(e) = self.stats.load(api).await {
                    tracing::warn!(tab = %self.active, "Failed to load system stats: {e}");
                }
            }
            TabId::Assess | TabId::History | TabId::Alternatives | TabId::Users => {}
        }
    }

    /// Run the assessment form; on success record history and raise a toast.
    pub async fn submit_assessment<A: MedSafeApi>(
        &mut self,
        api: &A,
    ) -> Result<&AssessmentResult, AssessmentError> {
        let history = &mut self.history;
        let toast = &mut self.toast;
        let outcome = self
            .workflow
            .submit(api, |result, context| {
                history.record(result, context);
                *toast = Some(Toast::for_result(result));
            })
            .await;
        if let Err(e) = &outcome {
            self.toast = Some(Toast::new(ToastKind::Error, e.to_string()));
        }
        outcome
    }

    /// Log an override for the current result as the signed-in user.
    pub async fn override_decision<A: MedSafeApi>(
        &mut self,
        api: &A,
        patient_id: Option<String>,
    ) -> Result<String, AssessmentError> {
        let role = self.role();
        let outcome = self.workflow.override_decision(api, role, patient_id).await;
        self.toast = Some(match &outcome {
            Ok(message) => Toast::new(ToastKind::Success, message.clone()),
            Err(e) => Toast::new(ToastKind::Error, e.to_string()),
        });
        outcome
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
