//! Print engine launcher traits.
//!
//! The dispatcher builds an [`EngineCommand`] and hands it to an
//! [`EngineLauncher`]; the returned [`EngineProcess`] is what it terminates
//! once the silent-mode wait is over.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Flag that makes Chromium-based browsers print without a dialog.
pub const KIOSK_PRINTING_FLAG: &str = "--kiosk-printing";

/// A fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Engine executable.
    pub program: PathBuf,
    /// Arguments, target file last.
    pub args: Vec<OsString>,
}

impl EngineCommand {
    /// Builds the invocation that renders `target` with its own profile.
    ///
    /// `silent` adds [`KIOSK_PRINTING_FLAG`] so the page's `window.print()`
    /// goes straight to the default printer.
    pub fn print(program: &Path, profile_dir: &Path, target: &Path, silent: bool) -> Self {
        let mut args = Vec::with_capacity(3);
        if silent {
            args.push(OsString::from(KIOSK_PRINTING_FLAG));
        }
        let mut profile = OsString::from("--user-data-dir=");
        profile.push(profile_dir.as_os_str());
        args.push(profile);
        args.push(target.as_os_str().to_os_string());

        Self {
            program: program.to_path_buf(),
            args,
        }
    }

    /// Returns whether this is a silent (kiosk) invocation.
    pub fn is_silent(&self) -> bool {
        self.args.iter().any(|a| a == KIOSK_PRINTING_FLAG)
    }
}

/// A running engine process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineProcess: Send {
    /// Kills the process and reaps it. Errors are logged, not returned.
    async fn terminate(&mut self);
}

/// Starts engine processes.
#[cfg_attr(test, mockall::automock)]
pub trait EngineLauncher: Send + Sync {
    /// Spawns the engine without waiting for it to exit.
    fn launch(&self, command: &EngineCommand) -> std::io::Result<Box<dyn EngineProcess>>;
}
