//! Settings Persistence System
//!
//! Provides persistent client settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema defaults for missing sections
//! - Clamping of out-of-range values on load and save
//!
//! Storage location: {config_dir}/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::core::analysis::input_validation::validate_base_url;
use crate::core::fs::atomic_write_bytes;
use crate::core::polling::PollConfig;
use crate::core::service::ServiceTimeouts;
use crate::core::{CoreError, CoreResult};

/// Settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Environment variable overriding the service base URL
pub const API_URL_ENV: &str = "FRAMEPROBE_API_URL";

/// Service address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default settings directory: `{platform config dir}/frameprobe`
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("frameprobe"))
}

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Analysis service connection
    #[serde(default)]
    pub api: ApiSettings,

    /// Status polling budget
    #[serde(default)]
    pub polling: PollingSettings,

    /// Export destinations
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            api: ApiSettings::default(),
            polling: PollingSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl ClientSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected so a hand-edited file
    /// never stops the client from starting.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.api.base_url = match validate_base_url(&self.api.base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!("{}; falling back to {}", e, DEFAULT_API_URL);
                DEFAULT_API_URL.to_string()
            }
        };

        let t = &mut self.api.timeouts;
        t.health_secs = t.health_secs.clamp(1, 600);
        t.submit_secs = t.submit_secs.clamp(1, 600);
        t.poll_secs = t.poll_secs.clamp(1, 600);
        t.pdf_secs = t.pdf_secs.clamp(1, 600);

        self.polling.max_attempts = self.polling.max_attempts.clamp(1, 10_000);
        self.polling.interval_secs = self.polling.interval_secs.clamp(0, 60);

        if let Some(dir) = &self.export.output_dir {
            if dir.as_os_str().is_empty() {
                self.export.output_dir = None;
            }
        }
    }

    /// Applies a base URL override (from the environment or the command line).
    ///
    /// Invalid overrides are rejected so a typo is reported rather than
    /// silently replaced by the default.
    pub fn with_api_url_override(mut self, url: Option<&str>) -> CoreResult<Self> {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            self.api.base_url = validate_base_url(url).map_err(CoreError::ValidationError)?;
        }
        Ok(self)
    }

    /// Applies `FRAMEPROBE_API_URL` when set
    pub fn with_env_overrides(self) -> CoreResult<Self> {
        let url = std::env::var(API_URL_ENV).ok();
        self.with_api_url_override(url.as_deref())
    }

    pub fn service_timeouts(&self) -> ServiceTimeouts {
        let t = &self.api.timeouts;
        ServiceTimeouts {
            health: Duration::from_secs(t.health_secs),
            submit: Duration::from_secs(t.submit_secs),
            poll: Duration::from_secs(t.poll_secs),
            pdf: Duration::from_secs(t.pdf_secs),
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.polling.max_attempts,
            interval: Duration::from_secs(self.polling.interval_secs),
        }
    }

    /// Export directory, defaulting to the current directory
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Analysis service connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeouts: TimeoutSettings::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Per-call timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutSettings {
    #[serde(default = "default_health_secs")]
    pub health_secs: u64,
    #[serde(default = "default_submit_secs")]
    pub submit_secs: u64,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    #[serde(default = "default_pdf_secs")]
    pub pdf_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            health_secs: default_health_secs(),
            submit_secs: default_submit_secs(),
            poll_secs: default_poll_secs(),
            pdf_secs: default_pdf_secs(),
        }
    }
}

fn default_health_secs() -> u64 {
    5
}

fn default_submit_secs() -> u64 {
    60
}

fn default_poll_secs() -> u64 {
    5
}

fn default_pdf_secs() -> u64 {
    30
}

/// Status polling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollingSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    150
}

fn default_interval_secs() -> u64 {
    2
}

/// Export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Directory for JSON and PDF exports (`None` = current directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given config directory
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        // Ensure parent directory exists so the lock file can be created.
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> ClientSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(ClientSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<ClientSettings>(&content)?;
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                ClientSettings::default()
            }
        }
    }

    /// Save settings to disk using atomic write (temp file + rename)
    pub fn save(&self, settings: &ClientSettings) -> CoreResult<ClientSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;
            atomic_write_bytes(&self.settings_path, content.as_bytes())?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<ClientSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(ClientSettings::default())
        })
    }
}
