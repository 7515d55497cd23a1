//! Pipeline services.
//!
//! Services sit between the application layer and the infrastructure layer:
//!
//! ```text
//! Application Layer (App, journal, shutdown signal)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Providers, Storage)
//! ```
//!
//! # Services Overview
//!
//! - [`PollOrchestrator`]: runs poll cycles and owns every other component
//! - [`PrintDispatcher`]: injects the print trigger and drives the engine
//! - [`StatusBoard`]: lock-protected cycle state for displays and the journal

mod poll_service;
mod print_service;
mod status_service;

pub use poll_service::{CycleReport, JobError, PollOptions, PollOrchestrator};
pub use print_service::{inject_print_script, PrintDispatcher, PrintError, PROFILE_DIR_NAME};
pub use status_service::{
    ErrorRecord, JobRecord, PollState, StatusBoard, StatusSnapshot, RECENT_LIMIT,
};
