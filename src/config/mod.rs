use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub notification_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `session.json`; `None` means `$HOME/.config/approvex`
    pub config_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Pick up APPROVEX_* from a local .env when present
        let _ = dotenvy::dotenv();

        let environment = match env::var("APPROVEX_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("APPROVEX_API_BASE") {
            let trimmed = v.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                self.api.base_url = trimmed.to_string();
            }
        }
        if let Ok(v) = env::var("APPROVEX_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("APPROVEX_POLL_SECS") {
            self.polling.notification_interval_secs =
                v.parse().unwrap_or(self.polling.notification_interval_secs);
        }
        if let Ok(v) = env::var("APPROVEX_MAX_UPLOAD_BYTES") {
            self.upload.max_upload_bytes = v.parse().unwrap_or(self.upload.max_upload_bytes);
        }
        if let Ok(v) = env::var("APPROVEX_CONFIG_DIR") {
            if !v.trim().is_empty() {
                self.storage.config_dir = Some(PathBuf::from(v));
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: DEFAULT_API_BASE.to_string(),
                timeout_secs: 60,
            },
            polling: PollingConfig {
                notification_interval_secs: 30,
            },
            upload: UploadConfig {
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            storage: StorageConfig { config_dir: None },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: DEFAULT_API_BASE.to_string(),
                timeout_secs: 30,
            },
            polling: PollingConfig {
                notification_interval_secs: 30,
            },
            upload: UploadConfig {
                max_upload_bytes: 5 * 1024 * 1024,
            },
            storage: StorageConfig { config_dir: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: DEFAULT_API_BASE.to_string(),
                timeout_secs: 20,
            },
            polling: PollingConfig {
                notification_interval_secs: 60,
            },
            upload: UploadConfig {
                max_upload_bytes: 5 * 1024 * 1024,
            },
            storage: StorageConfig { config_dir: None },
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.notification_interval_secs.max(1))
    }
}

// Global singleton config - initialized once on first access
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
