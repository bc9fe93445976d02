use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use medsafe_lib::api::{ApiError, MedSafeApi};
use medsafe_lib::assessment::{log_reviewed_override, AssessmentError, ReportError};
use medsafe_lib::authorization::{tabs_for_role, TabId};
use medsafe_lib::config::ClientConfig;
use medsafe_lib::core_state::{CoreError, CoreState};
use medsafe_lib::dashboard::{Dashboard, NavigationError};
use medsafe_lib::models::{RegisterRequest, RiskLevel, Role};
use medsafe_lib::patients::{PatientDirectory, PatientError, PatientForm};
use medsafe_lib::shell::{run_shell, ShellSession};
use medsafe_lib::stats::StatsPanel;
use medsafe_lib::views;

#[derive(Debug, Parser)]
#[command(
    name = "medsafe",
    version,
    about = "Clinical decision support for drug-safety risk assessment",
    long_about = "medsafe talks to a MedSafe risk-assessment server.\n\n\
        It signs you in, runs drug-safety assessments with explanations and\n\
        safer alternatives, logs clinician overrides, manages patients and\n\
        shows system statistics, depending on your role.\n\n\
        EXAMPLES:\n\
        \n  medsafe login dr.house@hospital.org               Sign in (prompts for password)\n\
        \n  medsafe assess Warfarin --age 71 --meds Aspirin     Assess a prescription\n\
        \n  medsafe assess Warfarin --age 71 --pdf report.pdf   Save a PDF report\n\
        \n  medsafe dashboard                                   Interactive dashboard"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// API base URL (overrides MEDSAFE_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the server is reachable
    Health,
    /// Sign in and store the session
    Login {
        email: String,
        /// Prompted for without echo when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register(RegisterArgs),
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List the dashboard tabs for your role
    Tabs,
    /// Search drug names
    Drugs { query: String },
    /// Run a risk assessment for a prescription
    Assess(AssessArgs),
    /// Safer alternatives for a drug
    Alternatives { drug: String },
    /// Log a clinician override for a result already reviewed
    Override(OverrideArgs),
    /// Patient directory
    #[command(subcommand)]
    Patients(PatientsCommand),
    /// System statistics and recent audit activity
    Stats,
    /// Interactive dashboard (default)
    Dashboard,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    /// Prompted for without echo when omitted
    #[arg(long)]
    password: Option<String>,
    /// clinician, pharmacist, admin or patient
    #[arg(long, default_value = "clinician")]
    role: String,
}

#[derive(Debug, Args)]
struct PrescriptionArgs {
    /// Drug to prescribe
    drug: String,
    #[arg(long, default_value = "")]
    age: String,
    #[arg(long, default_value = "male")]
    gender: String,
    /// Serum creatinine, mg/dL
    #[arg(long, default_value = "")]
    creatinine: String,
    /// Comma-separated current medications
    #[arg(long, default_value = "")]
    meds: String,
    /// Comma-separated allergies
    #[arg(long, default_value = "")]
    allergies: String,
}

#[derive(Debug, Args)]
struct AssessArgs {
    #[command(flatten)]
    prescription: PrescriptionArgs,
    /// Print the clinical report after the result
    #[arg(long)]
    report: bool,
    /// Save the clinical report as PDF
    #[arg(long, value_name = "PATH")]
    pdf: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct OverrideArgs {
    /// Drug the reviewed assessment was for
    drug: String,
    /// Risk level shown in the reviewed result (Medium, High or Critical)
    #[arg(long)]
    level: String,
    /// Clinical justification
    #[arg(long)]
    reason: String,
    /// Patient the override applies to
    #[arg(long)]
    patient: Option<String>,
}

#[derive(Debug, Subcommand)]
enum PatientsCommand {
    /// List registered patients
    List,
    /// Register a patient
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
        #[arg(long, default_value = "Male")]
        gender: String,
        #[arg(long, default_value = "")]
        allergies: String,
        #[arg(long, default_value = "")]
        history: String,
        #[arg(long, default_value = "")]
        meds: String,
    },
    /// Show one patient record
    Show { id: String },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Patient(#[from] PatientError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    medsafe_lib::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    let state = CoreState::new(config)?;

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Health => {
            let ack = state.api().health().await?;
            println!("{} ({})", ack.message, state.api().base_url());
        }
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password(&email).await?,
            };
            let user = state.sign_in(&email, &password).await?;
            println!("Signed in as {} ({})", user.email, user.role);
            if user.role().is_none() {
                tracing::warn!(role = %user.role, "Unrecognized role; showing the base dashboard");
            }
        }
        Command::Register(args) => {
            if Role::parse(&args.role).is_none() {
                return Err(CliError::Usage(format!(
                    "Unknown role '{}'. Expected one of: {}",
                    args.role,
                    Role::ALL.map(|r| r.as_str()).join(", ")
                )));
            }
            let email = args.email.trim().to_string();
            let password = match args.password {
                Some(p) => p,
                None => read_password(&email).await?,
            };
            let request = RegisterRequest {
                username: args.username,
                email,
                password,
                role: args.role.trim().to_ascii_lowercase(),
            };
            let response = state.register(&request).await?;
            println!("{} ({})", response.message, response.user_id);
        }
        Command::Logout => {
            state.sign_out()?;
            println!("Signed out");
        }
        Command::Whoami => {
            let user = state.require_user()?;
            println!("{} <{}> ({})", user.display_name(), user.email, user.role);
        }
        Command::Tabs => {
            let user = state.require_user()?;
            let tabs = tabs_for_role(user.role());
            print!("{}", views::render_tabs(&tabs, tabs.default_tab()));
        }
        Command::Drugs { query } => {
            state.require_user()?;
            for name in state.api().search_drugs(query.trim()).await? {
                println!("{name}");
            }
        }
        Command::Assess(args) => {
            let dash = assess(&state, args.prescription).await?;
            if args.report || args.pdf.is_some() {
                let report = dash.workflow().report().ok_or(AssessmentError::NoResult)?;
                if args.report {
                    println!("\n{}", report.render_text());
                }
                if let Some(path) = args.pdf {
                    report.write_pdf(&path)?;
                    println!("Saved PDF to {}", path.display());
                }
            }
        }
        Command::Override(args) => {
            let user = state.require_user()?;
            let level = RiskLevel::parse(&args.level).ok_or_else(|| {
                CliError::Usage(format!(
                    "Unknown risk level '{}'. Expected one of: {}",
                    args.level,
                    RiskLevel::ALL.map(|l| l.as_str()).join(", ")
                ))
            })?;
            let ack = log_reviewed_override(
                state.api(),
                user.role(),
                &args.drug,
                level,
                &args.reason,
                args.patient,
            )
            .await?;
            println!("{ack}");
        }
        Command::Alternatives { drug } => {
            state.require_user()?;
            let alternatives = state.api().alternatives(drug.trim()).await?;
            if alternatives.is_empty() {
                println!("No alternatives found for {drug}");
            }
            for a in alternatives {
                println!("{:<24} {}", a.name, a.risk_reduction);
            }
        }
        Command::Patients(command) => patients(&state, command).await?,
        Command::Stats => {
            state.require_user()?;
            let mut panel = StatsPanel::new();
            panel.load(state.api()).await?;
            print!("{}", views::render_stats(&panel));
        }
        Command::Dashboard => {
            let mut session = ShellSession::new(state.dashboard()?);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = io::stdout();
            run_shell(state.api(), &mut session, stdin, &mut stdout).await?;
        }
    }
    Ok(())
}

/// Submit one prescription through a fresh dashboard and print the result.
async fn assess(state: &CoreState, args: PrescriptionArgs) -> Result<Dashboard, CliError> {
    let mut dash = state.dashboard()?;
    dash.select_tab(TabId::Assess)?;

    let form = &mut dash.workflow_mut().form;
    form.drug_id = args.drug;
    form.age = args.age;
    form.gender = args.gender;
    form.creatinine = args.creatinine;
    form.current_medications = args.meds;
    form.allergies = args.allergies;

    let submitted = dash.submit_assessment(state.api()).await.map(|_| ());
    if let Some(toast) = dash.take_toast() {
        eprintln!("{}", views::render_toast(&toast));
    }
    submitted?;
    print!("{}", views::render_assess(&dash));
    Ok(dash)
}

async fn patients(state: &CoreState, command: PatientsCommand) -> Result<(), CliError> {
    state.require_user()?;
    let api = state.api();
    let mut directory = PatientDirectory::new();
    match command {
        PatientsCommand::List => {
            let patients = api.list_patients().await?;
            print!("{}", views::render_patients(&patients));
        }
        PatientsCommand::Add {
            name,
            age,
            gender,
            allergies,
            history,
            meds,
        } => {
            let form = PatientForm {
                name,
                age,
                gender,
                allergies,
                medical_history: history,
                current_medications: meds,
            };
            let created = directory.register(api, &form).await?;
            println!("{} ({})", created.message, created.patient_id);
        }
        PatientsCommand::Show { id } => {
            let patient = directory.fetch(api, id.trim()).await?;
            print!("{}", views::render_patient(&patient));
        }
    }
    Ok(())
}

/// No-echo password prompt on the terminal.
async fn read_password(email: &str) -> io::Result<String> {
    let prompt = format!("Password for {email}: ");
    tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
        .await
        .map_err(io::Error::other)?
}
