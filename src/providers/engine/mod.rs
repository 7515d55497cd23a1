//! Rendering/print engine launchers.
//!
//! The only engine shipped is a Chromium-family browser, driven through
//! `--kiosk-printing` for silent printing.

mod chrome;
mod traits;

pub use chrome::{ChromeLauncher, ChromeProcess};
#[cfg(test)]
pub use traits::{MockEngineLauncher, MockEngineProcess};
pub use traits::{EngineCommand, EngineLauncher, EngineProcess, KIOSK_PRINTING_FLAG};
