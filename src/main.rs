//! autoprint - Entry point for the email print service

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use autoprint::config::{ConfigError, Settings};
use autoprint::App;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let settings_path = match std::env::args_os().nth(1) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Settings::default_path(),
    };
    let loaded = settings_path.and_then(|path| load_settings(&path));

    let log_path = loaded
        .as_ref()
        .ok()
        .and_then(|settings| settings.as_ref())
        .map(|settings| settings.storage.log_path.clone());
    init_logging(log_path.as_deref());

    let settings = match loaded {
        Ok(Some(settings)) => settings,
        Ok(None) => std::process::exit(2),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = App::run(settings).await {
        tracing::error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

/// Loads settings, writing a default file and returning `None` when there is
/// none yet.
fn load_settings(path: &Path) -> Result<Option<Settings>, ConfigError> {
    if !path.exists() {
        Settings::default().save(path)?;
        eprintln!(
            "Created default settings at {}. Fill in the mailbox details and start again.",
            path.display()
        );
        return Ok(None);
    }
    Settings::load(path).map(Some)
}

fn init_logging(log_path: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, open_error) = match log_path.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!("Log file unavailable, logging to console only: {}", e);
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
