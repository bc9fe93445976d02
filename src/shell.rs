//! Interactive dashboard shell.
//!
//! One line in, one rendered reply out. Every failure is printed and the
//! shell keeps going; only `quit` or end of input leave the loop.

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::api::{ApiError, MedSafeApi};
use crate::assessment::{AssessmentError, ReportError};
use crate::authorization::TabId;
use crate::dashboard::{Dashboard, NavigationError};
use crate::patients::PatientError;
use crate::views;

const HELP: &str = "commands:
  show                    render the active tab
  tabs                    list tabs available to your role
  tab <id>                switch tab (overview, patients, assess, history, ...)
  set <field> <value>     edit the assessment form (age, gender, creatinine,
                          medications, allergies, drug)
  drug <text>             set the drug and search for matching names
  pick <n>                use suggestion n as the drug
  submit                  run the risk assessment
  override <reason>       log a clinician override for the current result
  report [file.pdf]       print the clinical report, optionally save as PDF
  history                 session history
  patients                patient directory
  patient <id>            one patient record
  stats                   system statistics and audit log
  help                    this text
  quit                    leave the shell";

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error("{0}")]
    Usage(&'static str),
    #[error("Unknown command '{0}'. Type `help` for a list")]
    Unknown(String),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Patient(#[from] PatientError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub output: String,
    pub exit: bool,
}

impl Reply {
    fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit: false,
        }
    }
}

pub struct ShellSession {
    dashboard: Dashboard,
}

impl ShellSession {
    pub fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn prompt(&self) -> String {
        format!("medsafe:{}> ", self.dashboard.active_tab())
    }

    /// Execute one input line.
    pub async fn handle_line<A: MedSafeApi>(&mut self, api: &A, line: &str) -> Reply {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        match command {
            "" => Reply::text(""),
            "quit" | "exit" => Reply {
                output: String::new(),
                exit: true,
            },
            "help" => Reply::text(HELP),
            _ => match self.dispatch(api, command, rest).await {
                Ok(output) => Reply::text(output),
                Err(e) => Reply::text(format!("error: {e}")),
            },
        }
    }

    fn require_tab(&self, id: TabId) -> Result<(), CommandError> {
        if self.dashboard.tabs().contains(id) {
            Ok(())
        } else {
            Err(NavigationError::NotPermitted(id).into())
        }
    }

    async fn open_tab<A: MedSafeApi>(&mut self, api: &A, id: TabId) -> Result<String, CommandError> {
        self.dashboard.select_tab(id)?;
        self.dashboard.refresh(api).await;
        Ok(views::render_active_tab(&self.dashboard))
    }

    async fn dispatch<A: MedSafeApi>(
        &mut self,
        api: &A,
        command: &str,
        rest: &str,
    ) -> Result<String, CommandError> {
        match command {
            "show" => Ok(views::render_active_tab(&self.dashboard)),
            "tabs" => Ok(views::render_sidebar(&self.dashboard)),
            "tab" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("usage: tab <id>"));
                }
                let id = TabId::from_str(rest)
                    .ok_or_else(|| NavigationError::Unknown(rest.to_string()))?;
                self.open_tab(api, id).await
            }
            "history" => self.open_tab(api, TabId::History).await,
            "patients" => self.open_tab(api, TabId::Patients).await,
            "stats" => self.open_tab(api, TabId::Stats).await,
            "patient" => {
                self.require_tab(TabId::Patients)?;
                if rest.is_empty() {
                    return Err(CommandError::Usage("usage: patient <id>"));
                }
                let patient = self.dashboard.patients().fetch(api, rest).await?;
                Ok(views::render_patient(&patient))
            }
            "set" => {
                self.require_tab(TabId::Assess)?;
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err(CommandError::Usage("usage: set <field> <value>"));
                }
                self.dashboard
                    .workflow_mut()
                    .form
                    .set(field, value)
                    .map_err(AssessmentError::from)?;
                Ok(views::render_assess(&self.dashboard))
            }
            "drug" => {
                self.require_tab(TabId::Assess)?;
                self.dashboard.workflow_mut().search_drug(api, rest).await;
                let suggestions = self.dashboard.workflow().suggestions();
                if suggestions.is_empty() {
                    Ok(format!("drug: {rest}"))
                } else {
                    Ok(views::render_suggestions(suggestions))
                }
            }
            "pick" => {
                self.require_tab(TabId::Assess)?;
                let index: usize = rest
                    .parse()
                    .map_err(|_| CommandError::Usage("usage: pick <n>"))?;
                let picked = match index.checked_sub(1) {
                    Some(i) => self.dashboard.workflow_mut().pick_suggestion(i),
                    None => None,
                };
                let chosen = picked.ok_or(CommandError::Usage("no such suggestion"))?;
                Ok(format!("drug: {chosen}"))
            }
            "submit" => {
                self.require_tab(TabId::Assess)?;
                self.dashboard.select_tab(TabId::Assess)?;
                let outcome = self.dashboard.submit_assessment(api).await.map(|_| ());
                let toast = self.dashboard.take_toast();
                outcome?;
                let mut out = toast.map(|t| views::render_toast(&t) + "\n\n").unwrap_or_default();
                out.push_str(&views::render_assess(&self.dashboard));
                Ok(out)
            }
            "override" => {
                self.require_tab(TabId::Assess)?;
                self.dashboard.workflow_mut().set_override_reason(rest);
                let outcome = self.dashboard.override_decision(api, None).await;
                self.dashboard.take_toast();
                Ok(outcome?)
            }
            "report" => {
                let report = self
                    .dashboard
                    .workflow()
                    .report()
                    .ok_or(AssessmentError::NoResult)?;
                let mut out = report.render_text();
                if !rest.is_empty() {
                    report.write_pdf(Path::new(rest))?;
                    out.push_str(&format!("\nSaved PDF to {rest}\n"));
                }
                Ok(out)
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Read commands from `input` until `quit` or end of input.
pub async fn run_shell<A, R, W>(
    api: &A,
    session: &mut ShellSession,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    A: MedSafeApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", views::render_sidebar(session.dashboard()))?;
    write!(out, "{}", session.prompt())?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let reply = session.handle_line(api, &line).await;
        if !reply.output.is_empty() {
            writeln!(out, "{}", reply.output.trim_end())?;
        }
        if reply.exit {
            return Ok(());
        }
        write!(out, "{}", session.prompt())?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
