//! Service settings and configuration types.
//!
//! Settings are read once at startup from `settings.json` in the user's
//! config directory (or a path given on the command line) and are never
//! mutated afterwards. Every component receives the section it needs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("settings file {}: {source}", path.display())]
    Io {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A setting has a value the service cannot run with.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// No config directory could be determined for this user.
    #[error("could not determine a config directory")]
    NoConfigDir,
}

/// Top-level service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IMAP connection settings.
    pub mailbox: MailboxSettings,
    /// Poll loop settings.
    pub polling: PollingSettings,
    /// Print engine settings.
    pub printing: PrintSettings,
    /// Ledger, log and temp file locations.
    pub storage: StorageSettings,
}

/// IMAP account and folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxSettings {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port (993 for TLS, 143 for plaintext).
    pub port: u16,
    /// Whether to wrap the connection in TLS.
    pub use_tls: bool,
    /// Login name, usually the email address.
    pub username: String,
    /// Password or app-specific password. When absent it is taken from the
    /// environment or the system keychain.
    pub password: Option<String>,
    /// Folder to watch.
    pub folder: String,
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 993,
            use_tls: true,
            username: String::new(),
            password: None,
            folder: "INBOX".to_string(),
        }
    }
}

/// Poll loop timing and message selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Seconds to wait between poll cycles.
    pub interval_secs: u64,
    /// Subject prefix a message must start with to be printed.
    pub subject_prefix: String,
    /// Seconds to wait before reconnecting after a transport error.
    pub error_backoff_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            subject_prefix: "[PRINT]".to_string(),
            error_backoff_secs: 10,
        }
    }
}

impl PollingSettings {
    /// Poll interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Error backoff as a [`Duration`].
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Print engine behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    /// Print silently to the default printer. When false the engine opens
    /// its print dialog for the operator.
    pub auto_print: bool,
    /// Permanently delete the source email after a successful dispatch.
    pub delete_after_print: bool,
    /// Explicit path to the browser executable.
    pub engine_path: Option<PathBuf>,
    /// Seconds to let the engine run in silent mode before terminating it.
    pub print_wait_secs: u64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            auto_print: true,
            delete_after_print: false,
            engine_path: None,
            print_wait_secs: 8,
        }
    }
}

impl PrintSettings {
    /// Silent-mode wait as a [`Duration`].
    pub fn print_wait(&self) -> Duration {
        Duration::from_secs(self.print_wait_secs)
    }
}

/// File locations and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Hours a temporary artifact may live before the sweep removes it.
    pub retention_hours: u64,
    /// Append-only list of handled UIDs.
    pub ledger_path: PathBuf,
    /// Log file the service appends to.
    pub log_path: PathBuf,
    /// Directory for temporary artifacts. Defaults to the system temp dir.
    pub temp_root: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            retention_hours: 6,
            ledger_path: PathBuf::from("printed_uids.txt"),
            log_path: PathBuf::from("autoprint.log"),
            temp_root: None,
        }
    }
}

impl StorageSettings {
    /// Retention window as a [`Duration`].
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }

    /// Resolved temp root.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Settings {
    /// Default settings file location (`<config dir>/settings.json`).
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        directories::ProjectDirs::from("com", "PartonIT", "autoprint")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads and validates settings from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes these settings to `path` as pretty JSON, creating parent dirs.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Rejects settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "mailbox.host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.mailbox.username.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "mailbox.username",
                reason: "must not be empty".to_string(),
            });
        }
        if self.mailbox.folder.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "mailbox.folder",
                reason: "must not be empty".to_string(),
            });
        }
        if self.polling.subject_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "polling.subject_prefix",
                reason: "an empty prefix would print every message".to_string(),
            });
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "polling.interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
