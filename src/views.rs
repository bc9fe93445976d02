//! Plain-text renderers for the dashboard tabs.
//!
//! Read-only: every function takes state and returns a string for stdout.

use std::fmt::Write;

use crate::authorization::{TabId, TabSet};
use crate::dashboard::{Dashboard, Toast, ToastKind};
use crate::history::AssessmentHistory;
use crate::models::{Alternative, AssessmentResult, Patient, RiskLevel, ShapValue};
use crate::stats::{log_summary, StatsPanel};

const BAR_WIDTH: usize = 20;

pub const ALTERNATIVES_GUIDANCE: &str = "Drug Alternatives: run a Risk Assessment to get \
context-aware alternatives.\nAssess tab → enter drug → see the Safer Alternatives panel.";

/// Tab list with the active entry marked.
pub fn render_tabs(tabs: &TabSet, active: TabId) -> String {
    let mut out = String::new();
    for tab in tabs.tabs() {
        let marker = if tab.id == active { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} {} {:<20} [{}]", tab.icon, tab.label, tab.id);
    }
    out
}

/// Brand, navigation, and signed-in user.
pub fn render_sidebar(dash: &Dashboard) -> String {
    let user = dash.user();
    let mut out = String::from("🛡️  MedSafe\n\n");
    out.push_str(&render_tabs(dash.tabs(), dash.active_tab()));
    let _ = writeln!(out, "\n{} ({})", user.display_name(), user.role);
    out
}

pub fn render_toast(toast: &Toast) -> String {
    let icon = match toast.kind {
        ToastKind::Success => '✓',
        ToastKind::Error => '✕',
    };
    format!("{icon} {}", toast.message)
}

/// Horizontal bar for one SHAP value, scaled to the largest magnitude.
fn shap_bar(value: f64, max_abs: f64) -> String {
    let len = if max_abs > 0.0 {
        ((value.abs() / max_abs) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    let glyph = if value > 0.0 { '█' } else { '░' };
    std::iter::repeat(glyph).take(len.max(1)).collect()
}

fn render_shap(values: &[ShapValue]) -> String {
    let max_abs = values.iter().map(|s| s.value.abs()).fold(0.0, f64::max);
    let mut out = String::from("Feature Contribution (SHAP)\n");
    for s in values {
        let _ = writeln!(
            out,
            "  {:<18} {:>+7.3} {}",
            s.feature,
            s.value,
            shap_bar(s.value, max_abs)
        );
    }
    out.push_str("  █ increases risk   ░ decreases risk\n");
    out
}

fn render_alternatives(alternatives: &[Alternative]) -> String {
    let mut out = String::from("Safer Alternatives\n");
    for a in alternatives {
        let _ = writeln!(out, "  {:<24} {}", a.name, a.risk_reduction);
    }
    out
}

/// Result card, SHAP chart, alternatives, and the override prompt.
pub fn render_result(
    result: &AssessmentResult,
    alternatives: &[Alternative],
    can_override: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} Risk    {}% confidence",
        result.risk_level.icon(),
        result.risk_level,
        result.score_percent()
    );
    if let Some(rec) = &result.recommendation {
        let _ = writeln!(out, "Recommendation: {rec}");
    }
    for i in &result.interactions {
        let _ = writeln!(out, "Interaction: {i}");
    }
    if !result.shap_values.is_empty() {
        out.push('\n');
        out.push_str(&render_shap(&result.shap_values));
    }
    if !alternatives.is_empty() {
        out.push('\n');
        out.push_str(&render_alternatives(alternatives));
    }
    if can_override {
        out.push_str(
            "\n⚠️ Override Decision: give a clinical justification with `override <reason>`\n",
        );
    }
    out
}

fn history_marker(level: RiskLevel) -> char {
    match level {
        RiskLevel::Critical => '!',
        RiskLevel::Low => '✓',
        RiskLevel::Medium | RiskLevel::High => '⚠',
    }
}

pub fn render_history(history: &AssessmentHistory) -> String {
    if history.is_empty() {
        return "📋 No Assessment History\nAs you perform risk checks, they will appear here.\n"
            .to_string();
    }
    let mut out = String::from("Session History\n");
    for h in history.iter() {
        let _ = writeln!(
            out,
            "  {} {:<16} Patient: {}y / {} • Score: {}%   {}",
            history_marker(h.risk_level),
            h.drug_id,
            h.patient_age,
            h.patient_gender,
            h.score_percent(),
            h.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S")
        );
    }
    out
}

pub fn render_patients(patients: &[Patient]) -> String {
    if patients.is_empty() {
        return "No patients found.\n".to_string();
    }
    let mut out = format!("{:<24} {:>4}  {:<8} {}\n", "Name", "Age", "Gender", "ID");
    for p in patients {
        let age = p.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into());
        let _ = writeln!(
            out,
            "{:<24} {:>4}  {:<8} {}...",
            p.name,
            age,
            p.gender.as_deref().unwrap_or("-"),
            p.short_id()
        );
    }
    out
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Full record, including fields the client does not interpret.
pub fn render_patient(patient: &Patient) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", patient.name, patient.id);
    if let Some(age) = patient.age {
        let _ = writeln!(out, "  Age:         {age}");
    }
    if let Some(gender) = &patient.gender {
        let _ = writeln!(out, "  Gender:      {gender}");
    }
    let _ = writeln!(out, "  Allergies:   {}", list_or_none(&patient.allergies));
    let _ = writeln!(out, "  History:     {}", list_or_none(&patient.medical_history));
    let _ = writeln!(
        out,
        "  Medications: {}",
        list_or_none(&patient.current_medications)
    );
    if let Some(created) = &patient.created_at {
        let _ = writeln!(out, "  Registered:  {created}");
    }
    for (key, value) in &patient.extra {
        let _ = writeln!(out, "  {key}: {value}");
    }
    out
}

pub fn render_stats(panel: &StatsPanel) -> String {
    let mut out = String::new();
    if panel.stats().is_none() {
        return "Statistics unavailable.\n".to_string();
    }
    for (label, value) in panel.metric_rows() {
        let _ = writeln!(out, "{label:<24} {value:>8}");
    }
    out.push_str("\nRecent Activity\n");
    if panel.logs().is_empty() {
        out.push_str("  No recent activity found.\n");
        return out;
    }
    for log in panel.logs() {
        let summary = log_summary(log);
        let _ = write!(out, "  {:<20} {}", log.action, log.actor());
        if !summary.is_empty() {
            let _ = write!(out, "  {summary}");
        }
        if let Some(ts) = &log.timestamp {
            let _ = write!(out, "  {ts}");
        }
        out.push('\n');
    }
    out
}

pub fn render_suggestions(suggestions: &[String]) -> String {
    let mut out = String::new();
    for (i, s) in suggestions.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {s}", i + 1);
    }
    out
}

/// Assessment tab: form state plus the latest result.
pub fn render_assess(dash: &Dashboard) -> String {
    let wf = dash.workflow();
    let form = &wf.form;
    let mut out = String::from("Patient Assessment\n");
    let _ = writeln!(out, "  age:         {}", form.age);
    let _ = writeln!(out, "  gender:      {}", form.gender);
    let _ = writeln!(out, "  creatinine:  {}", form.creatinine);
    let _ = writeln!(out, "  medications: {}", form.current_medications);
    let _ = writeln!(out, "  allergies:   {}", form.allergies);
    let _ = writeln!(out, "  drug:        {}", form.drug_id);
    if !wf.suggestions().is_empty() {
        out.push_str(&render_suggestions(wf.suggestions()));
    }
    if let Some(err) = wf.last_error() {
        let _ = writeln!(out, "\n✕ {err}");
    }
    if let Some(result) = wf.result() {
        out.push('\n');
        out.push_str(&render_result(
            result,
            wf.alternatives(),
            wf.can_override(dash.role()),
        ));
    }
    out
}

/// Header plus body of the active tab.
pub fn render_active_tab(dash: &Dashboard) -> String {
    let title = dash.title();
    let mut out = format!("{title}\n{}\n", "─".repeat(title.chars().count().max(9)));
    let body = match dash.active_tab() {
        TabId::Overview | TabId::Stats | TabId::Audit => render_stats(dash.stats()),
        TabId::Assess => render_assess(dash),
        TabId::Patients => render_patients(dash.patients().patients()),
        TabId::History => render_history(dash.history()),
        TabId::Alternatives => format!("{ALTERNATIVES_GUIDANCE}\n"),
        TabId::Users => "User management is handled on the server.\n".to_string(),
    };
    out.push_str(&body);
    out
}
