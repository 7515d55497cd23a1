//! Chromium-family print engine.
//!
//! Locates a Chrome/Chromium executable and launches it with
//! `tokio::process`. Output is discarded; the process is never waited on
//! except when it is terminated.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

use super::{EngineCommand, EngineLauncher, EngineProcess};

#[cfg(target_os = "windows")]
const FALLBACK_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(target_os = "macos")]
const FALLBACK_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const FALLBACK_LOCATIONS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium-browser",
    "/usr/bin/chromium",
    "/snap/bin/chromium",
];

/// Launches Chrome or Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    /// Creates a launcher.
    pub fn new() -> Self {
        Self
    }

    /// Platform fallback locations, in search order.
    pub fn fallback_locations() -> impl Iterator<Item = PathBuf> {
        FALLBACK_LOCATIONS.iter().map(PathBuf::from)
    }

    /// Returns the configured path if it exists, otherwise the first existing
    /// fallback location.
    pub fn locate(configured: Option<&Path>) -> Option<PathBuf> {
        Self::locate_in(configured, Self::fallback_locations())
    }

    /// Like [`locate`](Self::locate) with an explicit candidate list.
    pub fn locate_in(
        configured: Option<&Path>,
        candidates: impl IntoIterator<Item = PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(path) = configured.filter(|p| p.exists()) {
            return Some(path.to_path_buf());
        }
        if let Some(path) = configured {
            tracing::warn!(path = %path.display(), "configured engine path does not exist, trying defaults");
        }
        candidates.into_iter().find(|p| p.exists())
    }
}

impl EngineLauncher for ChromeLauncher {
    fn launch(&self, command: &EngineCommand) -> std::io::Result<Box<dyn EngineProcess>> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        tracing::debug!(
            program = %command.program.display(),
            pid = child.id(),
            silent = command.is_silent(),
            "engine launched"
        );
        Ok(Box::new(ChromeProcess { child }))
    }
}

/// Handle to a launched browser.
#[derive(Debug)]
pub struct ChromeProcess {
    child: Child,
}

#[async_trait]
impl EngineProcess for ChromeProcess {
    async fn terminate(&mut self) {
        match self.child.kill().await {
            Ok(()) => tracing::debug!("engine terminated"),
            Err(e) => tracing::debug!(error = %e, "engine already exited"),
        }
    }
}
