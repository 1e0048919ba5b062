use crate::admission::AdmissionSchedule;
use crate::store::RetryPolicy;
use std::time::Duration;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | Database and log files |
/// | TIME_API_URL | http://worldtimeapi.org/api/ip | Remote time endpoint |
/// | TIME_FETCH_TIMEOUT_MS | 3000 | Remote time fetch timeout |
/// | DISABLED_WINDOWS | 600-630,750-960 | Minute-of-day windows, `start-end` pairs |
/// | TXN_MAX_ATTEMPTS | 5 | Checkout transaction retry budget |
/// | TXN_BACKOFF_MS | 20 | Base backoff between retries |
/// | LOG_LEVEL | info | Default tracing filter |
/// | ENVIRONMENT | development | development \| production |
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database file and logs
    pub work_dir: String,
    /// Remote time endpoint consulted before the admission check
    pub time_api_url: String,
    /// Remote time fetch timeout (milliseconds)
    pub time_fetch_timeout_ms: u64,
    /// Disabled-window spec, e.g. `"600-630,750-960"`
    pub disabled_windows: String,
    /// Checkout transaction retry budget
    pub txn_max_attempts: u32,
    /// Base backoff between transaction retries (milliseconds)
    pub txn_backoff_ms: u64,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
    /// Running environment: development | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            time_api_url: std::env::var("TIME_API_URL")
                .unwrap_or_else(|_| "http://worldtimeapi.org/api/ip".into()),
            time_fetch_timeout_ms: std::env::var("TIME_FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            disabled_windows: std::env::var("DISABLED_WINDOWS")
                .unwrap_or_else(|_| "600-630,750-960".into()),
            txn_max_attempts: std::env::var("TXN_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            txn_backoff_ms: std::env::var("TXN_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the work directory (common in tests)
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Path of the database file inside the work directory
    pub fn db_path(&self) -> String {
        format!("{}/canteen.redb", self.work_dir)
    }

    /// Retry policy for the checkout transaction
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.txn_max_attempts.max(1),
            backoff_base: Duration::from_millis(self.txn_backoff_ms),
        }
    }

    /// Admission schedule from the window spec
    ///
    /// A malformed spec falls back to the built-in windows rather than
    /// running with admission disabled.
    pub fn admission_schedule(&self) -> AdmissionSchedule {
        match AdmissionSchedule::parse(&self.disabled_windows) {
            Some(schedule) => schedule,
            None => {
                tracing::warn!(
                    spec = %self.disabled_windows,
                    "Malformed DISABLED_WINDOWS, using built-in schedule"
                );
                AdmissionSchedule::default_windows()
            }
        }
    }

    pub fn time_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.time_fetch_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
