//! Print dispatcher.
//!
//! The [`PrintDispatcher`] takes a tracked HTML artifact, injects a script
//! that triggers the browser's print action once the page has rendered,
//! writes the result to a separate dispatcher artifact and launches the
//! print engine against it.
//!
//! In silent mode the engine prints straight to the default printer and is
//! killed after a bounded wait. In interactive mode it is left running with
//! the print dialog open; its artifact is removed later by the retention
//! sweep.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::PrintSettings;
use crate::domain::JobOutcome;
use crate::providers::engine::{ChromeLauncher, EngineCommand, EngineLauncher};
use crate::storage::{dispatch_artifact_name, remove_if_exists};

/// Name of the engine profile directory under the temp root.
pub const PROFILE_DIR_NAME: &str = "chrome_print_profile";

/// Delay between page load and the print call, in milliseconds.
const PRINT_DELAY_MS: u32 = 500;

/// Errors that can occur while dispatching a print job.
#[derive(Debug, Error)]
pub enum PrintError {
    /// No engine executable could be found. Fatal at startup.
    #[error("print engine not found (searched: {searched})")]
    EngineNotFound {
        /// Locations that were checked.
        searched: String,
    },

    /// The job could not be handed to the engine.
    #[error("print dispatch failed: {0}")]
    Dispatch(String),
}

/// Returns the trigger script injected into printable pages.
fn print_script(auto_close: bool) -> String {
    let close = if auto_close { " window.close();" } else { "" };
    format!(
        "<script>window.onload = function() {{ setTimeout(function() {{ window.print();{} }}, {}); }};</script>",
        close, PRINT_DELAY_MS
    )
}

/// Inserts the print trigger before the last `</body>`, else before the last
/// `</html>`, else at the end. Tag matching ignores ASCII case.
pub fn inject_print_script(html: &str, auto_close: bool) -> String {
    let script = print_script(auto_close);
    let lower = html.to_ascii_lowercase();
    let insert_at = lower.rfind("</body>").or_else(|| lower.rfind("</html>"));

    match insert_at {
        Some(index) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..index]);
            out.push_str(&script);
            out.push_str(&html[index..]);
            out
        }
        None => format!("{}{}", html, script),
    }
}

/// Hands HTML artifacts to the print engine.
pub struct PrintDispatcher {
    engine_path: PathBuf,
    launcher: Arc<dyn EngineLauncher>,
    temp_root: PathBuf,
    print_wait: Duration,
}

impl std::fmt::Debug for PrintDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintDispatcher")
            .field("engine_path", &self.engine_path)
            .field("temp_root", &self.temp_root)
            .field("print_wait", &self.print_wait)
            .finish()
    }
}

impl PrintDispatcher {
    /// Resolves the engine executable and builds a dispatcher.
    ///
    /// Fails with [`PrintError::EngineNotFound`] when neither the configured
    /// path nor any platform fallback exists.
    pub fn new(
        settings: &PrintSettings,
        temp_root: impl Into<PathBuf>,
        launcher: Arc<dyn EngineLauncher>,
    ) -> Result<Self, PrintError> {
        Self::new_with_candidates(
            settings,
            ChromeLauncher::fallback_locations().collect(),
            temp_root,
            launcher,
        )
    }

    /// Like [`new`](Self::new), searching `candidates` instead of the
    /// platform fallback locations.
    pub fn new_with_candidates(
        settings: &PrintSettings,
        candidates: Vec<PathBuf>,
        temp_root: impl Into<PathBuf>,
        launcher: Arc<dyn EngineLauncher>,
    ) -> Result<Self, PrintError> {
        let configured = settings.engine_path.as_deref();
        let engine_path = ChromeLauncher::locate_in(configured, candidates.iter().cloned())
            .ok_or_else(|| {
                let searched: Vec<String> = configured
                    .into_iter()
                    .chain(candidates.iter().map(PathBuf::as_path))
                    .map(|p| p.display().to_string())
                    .collect();
                PrintError::EngineNotFound {
                    searched: searched.join(", "),
                }
            })?;

        tracing::info!(engine = %engine_path.display(), "print engine located");
        Ok(Self::with_engine(
            engine_path,
            temp_root,
            settings.print_wait(),
            launcher,
        ))
    }

    /// Builds a dispatcher for an already resolved engine.
    pub fn with_engine(
        engine_path: impl Into<PathBuf>,
        temp_root: impl Into<PathBuf>,
        print_wait: Duration,
        launcher: Arc<dyn EngineLauncher>,
    ) -> Self {
        Self {
            engine_path: engine_path.into(),
            launcher,
            temp_root: temp_root.into(),
            print_wait,
        }
    }

    /// Engine executable in use.
    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    /// Prints the HTML file at `path`.
    ///
    /// `auto_close` selects silent mode. The source file is left alone; the
    /// dispatcher works on its own copy.
    pub async fn render_and_print(
        &self,
        path: &Path,
        auto_close: bool,
    ) -> Result<JobOutcome, PrintError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PrintError::Dispatch(format!("reading {}: {}", path.display(), e)))?;
        let html = inject_print_script(&String::from_utf8_lossy(&bytes), auto_close);

        let target = self.temp_root.join(dispatch_artifact_name());
        tokio::fs::write(&target, html)
            .await
            .map_err(|e| PrintError::Dispatch(format!("writing {}: {}", target.display(), e)))?;

        let profile_dir = self.temp_root.join(PROFILE_DIR_NAME);
        if let Err(e) = tokio::fs::create_dir_all(&profile_dir).await {
            remove_if_exists(&target);
            return Err(PrintError::Dispatch(format!(
                "creating profile {}: {}",
                profile_dir.display(),
                e
            )));
        }

        let command = EngineCommand::print(&self.engine_path, &profile_dir, &target, auto_close);
        let mut process = match self.launcher.launch(&command) {
            Ok(process) => process,
            Err(e) => {
                remove_if_exists(&target);
                return Err(PrintError::Dispatch(format!(
                    "launching {}: {}",
                    self.engine_path.display(),
                    e
                )));
            }
        };

        if !auto_close {
            tracing::info!(artifact = %target.display(), "print dialog opened");
            return Ok(JobOutcome::DialogOpened);
        }

        tokio::time::sleep(self.print_wait).await;
        process.terminate().await;
        remove_if_exists(&target);
        tracing::info!(source = %path.display(), "sent to printer");
        Ok(JobOutcome::AutoPrinted)
    }
}
