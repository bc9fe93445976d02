use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedSafe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable selecting the risk-assessment API base URL.
pub const API_URL_ENV: &str = "MEDSAFE_API_URL";

/// Environment variable overriding the data directory (session store).
pub const DATA_DIR_ENV: &str = "MEDSAFE_DATA_DIR";

/// Base URL used when `MEDSAFE_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Namespace prefix shared by every persisted session key.
pub const STORAGE_PREFIX: &str = "medsafe_";
pub const TOKEN_KEY: &str = "medsafe_token";
pub const ROLE_KEY: &str = "medsafe_role";
pub const EMAIL_KEY: &str = "medsafe_email";

/// The three session keys, cleared together on logout.
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, ROLE_KEY, EMAIL_KEY];

/// File name of the key-value session store inside the data directory.
pub const SESSION_FILE: &str = "session.json";

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medsafe=info,medsafe_lib=info"
}

/// Filter used for `-v` and above.
pub fn verbose_log_filter(level: u8) -> &'static str {
    match level {
        0 => default_log_filter(),
        1 => "medsafe=debug,medsafe_lib=debug",
        _ => "medsafe=trace,medsafe_lib=trace,reqwest=debug",
    }
}

/// Get the application data directory.
/// `~/.medsafe/` unless `MEDSAFE_DATA_DIR` is set; the working directory
/// stands in for a missing home directory.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medsafe")
}

/// Resolve the API base URL from the environment.
pub fn api_base_url() -> String {
    resolve_api_url(std::env::var(API_URL_ENV).ok())
}

fn resolve_api_url(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            api_base_url: api_base_url(),
            data_dir: app_data_dir(),
        }
    }

    /// Replace the API base URL (command-line override).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}
