pub mod api; // REST client for the MedSafe server
pub mod assessment; // Risk assessment workflow, form, suggestions, report
pub mod authorization; // Role → tab navigation
pub mod config;
pub mod core_state; // Session + client wiring shared by every command
pub mod dashboard;
pub mod history;
pub mod models;
pub mod patients;
pub mod session;
pub mod shell; // Interactive dashboard
pub mod stats;
pub mod storage;
pub mod views;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `-v`.
///
/// Logs go to stderr so command output on stdout stays clean. A second call
/// is a no-op.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::verbose_log_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    tracing::debug!("{} v{} starting", config::APP_NAME, config::APP_VERSION);
}
