//! Role → navigation resolver.
//!
//! Total mapping from a (possibly unrecognized) role to the ordered set of
//! dashboard tabs it may see and the tab it lands on. Presentation only:
//! every protected action is re-checked by the server.

use serde::Serialize;

use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Dashboard tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabId {
    Overview,
    Patients,
    Assess,
    History,
    Alternatives,
    Stats,
    Users,
    Audit,
}

impl TabId {
    pub const ALL: [TabId; 8] = [
        TabId::Overview,
        TabId::Patients,
        TabId::Assess,
        TabId::History,
        TabId::Alternatives,
        TabId::Stats,
        TabId::Users,
        TabId::Audit,
    ];

    /// Parse from the identifier used on the command line.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Patients => "patients",
            Self::Assess => "assess",
            Self::History => "history",
            Self::Alternatives => "alternatives",
            Self::Stats => "stats",
            Self::Users => "users",
            Self::Audit => "audit",
        }
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub id: TabId,
    pub label: &'static str,
    pub icon: &'static str,
}

const fn tab(id: TabId, label: &'static str, icon: &'static str) -> Tab {
    Tab { id, label, icon }
}

/// Ordered tabs for one role plus the tab shown first.
///
/// `default` is always a member of `tabs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabSet {
    tabs: Vec<Tab>,
    default: TabId,
}

impl TabSet {
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn default_tab(&self) -> TabId {
        self.default
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.tabs.iter().any(|t| t.id == id)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════
// Resolver
// ═══════════════════════════════════════════════════════════

const OVERVIEW: Tab = tab(TabId::Overview, "Overview", "⬡");
const ASSESS: Tab = tab(TabId::Assess, "Risk Assessment", "🧬");
const HISTORY: Tab = tab(TabId::History, "History", "📋");
const ALTERNATIVES: Tab = tab(TabId::Alternatives, "Drug Alternatives", "💊");
const PATIENTS: Tab = tab(TabId::Patients, "Patients", "👥");

/// Resolve the navigation for a role; `None` is an unrecognized role.
pub fn tabs_for_role(role: Option<Role>) -> TabSet {
    let (tabs, default) = match role {
        Some(Role::Clinician) => (
            vec![OVERVIEW, PATIENTS, ASSESS, HISTORY, ALTERNATIVES],
            TabId::Overview,
        ),
        Some(Role::Pharmacist) => (
            vec![
                ALTERNATIVES,
                tab(TabId::Assess, "Verification", "✅"),
                tab(TabId::History, "Lookups", "📋"),
            ],
            TabId::Alternatives,
        ),
        Some(Role::Admin) => (
            vec![
                tab(TabId::Stats, "System Stats", "📊"),
                tab(TabId::Users, "User Management", "👥"),
                tab(TabId::Audit, "Audit Logs", "📝"),
            ],
            TabId::Stats,
        ),
        Some(Role::Patient) => (
            vec![tab(TabId::History, "My Health", "❤️")],
            TabId::History,
        ),
        None => (
            vec![OVERVIEW, ASSESS, HISTORY, ALTERNATIVES],
            TabId::Overview,
        ),
    };
    TabSet { tabs, default }
}

/// Landing tab for a role.
pub fn default_tab(role: Option<Role>) -> TabId {
    tabs_for_role(role).default_tab()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
