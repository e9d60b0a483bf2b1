//! Server configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::Time;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// WaniKani API settings.
    pub wanikani: WaniKaniConfig,
    /// Daily update schedule.
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Apply environment overrides.
    ///
    /// Recognized variables: `WANIKANI_API_KEY` (API credential) and
    /// `WKSTATS_DATA_PATH` (history document path). Environment beats
    /// the config file; CLI flags beat both.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(key) = lookup("WANIKANI_API_KEY")
            && !key.is_empty()
        {
            self.wanikani.api_key = Some(key);
        }
        if let Some(path) = lookup("WKSTATS_DATA_PATH")
            && !path.is_empty()
        {
            self.storage.path = PathBuf::from(path);
        }
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Storage path is not empty
    /// - WaniKani base URL has an http(s) scheme
    /// - Schedule time parses as `HH:MM`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.wanikani.validate());
        errors.extend(self.schedule.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "bind address cannot be empty".to_string(),
            });
        } else {
            let parts: Vec<&str> = self.bind.rsplitn(2, ':').collect();
            if parts.len() != 2 {
                errors.push(ValidationError {
                    field: "server.bind".to_string(),
                    message: format!(
                        "invalid bind address '{}': expected format 'host:port'",
                        self.bind
                    ),
                });
            } else {
                let port_str = parts[0];
                match port_str.parse::<u16>() {
                    Ok(0) => {
                        errors.push(ValidationError {
                            field: "server.bind".to_string(),
                            message: "port cannot be 0".to_string(),
                        });
                    }
                    Err(_) => {
                        errors.push(ValidationError {
                            field: "server.bind".to_string(),
                            message: format!(
                                "invalid port '{}': must be a number 1-65535",
                                port_str
                            ),
                        });
                    }
                    Ok(_) => {}
                }
            }
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// History document path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: wkstats_store::default_data_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "history path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// WaniKani API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaniKaniConfig {
    /// Personal access token. Usually supplied via `WANIKANI_API_KEY`
    /// rather than written into the config file.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
}

impl Default for WaniKaniConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: wkstats_client::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl WaniKaniConfig {
    /// Validate WaniKani configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(ValidationError {
                field: "wanikani.base_url".to_string(),
                message: format!(
                    "invalid base URL '{}': must start with http:// or https://",
                    self.base_url
                ),
            });
        }

        if let Some(key) = &self.api_key
            && key.is_empty()
        {
            errors.push(ValidationError {
                field: "wanikani.api_key".to_string(),
                message: "api_key cannot be empty string (use null/omit instead)".to_string(),
            });
        }

        errors
    }
}

/// Daily update schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Whether the scheduler runs at all.
    pub enabled: bool,
    /// Daily fire time in UTC, `HH:MM`.
    pub time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time: "23:59".to_string(),
        }
    }
}

impl ScheduleConfig {
    /// Parse the configured fire time.
    pub fn fire_time(&self) -> Result<Time, ValidationError> {
        let invalid = || ValidationError {
            field: "schedule.time".to_string(),
            message: format!("invalid time '{}': expected 'HH:MM' (24-hour)", self.time),
        };

        let (hour, minute) = self.time.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Time::from_hms(hour, minute, 0).map_err(|_| invalid())
    }

    /// Validate schedule configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        match self.fire_time() {
            Ok(_) => Vec::new(),
            Err(e) => vec![e],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `schedule.time`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wkstats")
        .join("server.toml")
}
