use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::workflows::WaitSettings;

/// Fallback when neither the command line nor configuration gives a timeout.
pub const DEFAULT_WORKFLOW_TIMEOUT_SECS: u64 = 180;

const MIN_POLL_INTERVAL_SECS: u64 = 1;

const CONFIG_FILE: &str = "workflow-wait.toml";
const RC_FILE: &str = ".workflow-wait-rc";
const ENV_PREFIX: &str = "WORKFLOW_WAIT";

/// Main configuration structure for workflow-wait
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowWaitConfig {
    /// Platform API settings
    pub api: ApiConfig,
    /// Polling loop settings
    pub wait: WaitConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the platform API
    pub base_url: String,
    /// Session token (can be set via TERMINUS_SESSION)
    pub token: Option<String>,
    /// Sustained request rate towards the API
    pub requests_per_second: u32,
    /// Per-request HTTP timeout; unset leaves fetches bounded only by the overall wait
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaitConfig {
    /// Used when the command line gives no maximum wait
    pub default_timeout_seconds: Option<u64>,
    /// Sleep between polls, at least one second
    pub poll_interval_seconds: u64,
    /// Give up after this many polls without a matching workflow (unbounded if unset)
    pub max_not_found_attempts: Option<u32>,
    /// How far before "now" the default start time lies
    pub start_lookback_seconds: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default log filter directive, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Default for WorkflowWaitConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://terminus.pantheon.io/api".to_string(),
                token: None, // Will be read from env var or config file
                requests_per_second: 2,
                request_timeout_seconds: None,
            },
            wait: WaitConfig {
                default_timeout_seconds: Some(10),
                poll_interval_seconds: 5,
                max_not_found_attempts: None,
                start_lookback_seconds: 60,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl WaitConfig {
    pub fn effective_timeout_seconds(&self) -> u64 {
        self.default_timeout_seconds
            .unwrap_or(DEFAULT_WORKFLOW_TIMEOUT_SECS)
    }

    /// Settings handed to the waiter.
    pub fn settings(&self) -> WaitSettings {
        WaitSettings {
            default_timeout_seconds: self.effective_timeout_seconds(),
            poll_interval: Duration::from_secs(self.poll_interval_seconds.max(MIN_POLL_INTERVAL_SECS)),
            max_not_found_attempts: self.max_not_found_attempts,
            start_lookback_seconds: self.start_lookback_seconds,
        }
    }
}

impl WorkflowWaitConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (workflow-wait.toml, .workflow-wait-rc)
    /// 3. Environment variables (prefixed with WORKFLOW_WAIT_, `__` between sections)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`WorkflowWaitConfig::load`] with config files looked up in `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        for name in [CONFIG_FILE, RC_FILE] {
            let path = dir.join(name);
            if path.exists() {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: WorkflowWaitConfig = builder.build()?.try_deserialize()?;

        if loaded.api.token.is_none() {
            if let Ok(token) = std::env::var("TERMINUS_SESSION") {
                loaded.api.token = Some(token);
            }
        }

        Ok(loaded)
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api.token.is_some() {
            copy.api.token = Some("********".to_string());
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<WorkflowWaitConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = WorkflowWaitConfig::load_env_file();
        WorkflowWaitConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static WorkflowWaitConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
