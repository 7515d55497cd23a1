//! Status board shared with presentation layers.
//!
//! The [`StatusBoard`] keeps the current poll cycle state behind a single
//! mutex and republishes every change as a [`StatusEvent`]. A display can
//! either sample [`StatusBoard::snapshot`] on its own cadence or subscribe
//! to the event bus.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app::events::{EventBus, StatusEvent};
use crate::domain::JobOutcome;

/// How many recent jobs and errors the board remembers.
pub const RECENT_LIMIT: usize = 3;

/// Poll orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Not started yet.
    #[default]
    Starting,
    /// Opening the mailbox session.
    Connecting,
    /// Searching for candidate messages.
    Searching,
    /// Working through candidate UIDs.
    Processing,
    /// Waiting for the next cycle.
    IdleWait,
    /// Waiting after a transport error.
    ErrorBackoff,
    /// Cleaning up before exit.
    ShuttingDown,
}

/// A completed job as shown on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// When the job finished.
    pub at: DateTime<Local>,
    /// Message subject.
    pub subject: String,
    /// What happened.
    pub outcome: JobOutcome,
}

/// A reported error as shown on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// When the error was reported.
    pub at: DateTime<Local>,
    /// Error text.
    pub message: String,
}

/// Point-in-time copy of the board.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    /// Current orchestrator state.
    pub state: PollState,
    /// Current status line.
    pub status: String,
    /// UIDs returned by the last search.
    pub messages_found: usize,
    /// Candidates not yet handled in the current cycle.
    pub pending: usize,
    /// Jobs dispatched since startup.
    pub jobs_processed: u64,
    /// When the last cycle finished.
    pub last_check: Option<DateTime<Local>>,
    /// When the next cycle is due.
    pub next_check: Option<DateTime<Local>>,
    /// When the last retention sweep ran.
    pub last_cleanup: Option<DateTime<Local>>,
    /// When the next retention sweep is due.
    pub next_cleanup: Option<DateTime<Local>>,
    /// Seconds left in the idle countdown.
    pub countdown_remaining: u64,
    /// Length of the idle countdown.
    pub countdown_total: u64,
    /// Most recent jobs, newest first.
    pub recent_jobs: VecDeque<JobRecord>,
    /// Most recent errors, newest first.
    pub recent_errors: VecDeque<ErrorRecord>,
}

/// Shared, lock-protected cycle state plus its event stream.
#[derive(Debug, Default)]
pub struct StatusBoard {
    snapshot: Mutex<StatusSnapshot>,
    bus: EventBus,
}

impl StatusBoard {
    /// Creates an empty board with its own event bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board publishing on an existing bus.
    pub fn with_bus(bus: EventBus) -> Self {
        Self {
            snapshot: Mutex::new(StatusSnapshot::default()),
            bus,
        }
    }

    /// The bus status events are published on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().clone()
    }

    /// Moves to `state` and sets the status line.
    pub fn transition(&self, state: PollState, status: impl Into<String>) {
        let status = status.into();
        {
            let mut snapshot = self.lock();
            snapshot.state = state;
            snapshot.status = status.clone();
        }
        tracing::debug!(?state, %status, "status changed");
        self.bus.publish(StatusEvent::StatusChanged(status));
    }

    /// Sets the status line without changing state.
    pub fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.lock().status = status.clone();
        self.bus.publish(StatusEvent::StatusChanged(status));
    }

    /// Records how many UIDs the last search returned.
    pub fn set_messages_found(&self, count: usize) {
        self.lock().messages_found = count;
    }

    /// Records how many candidates remain in the current cycle.
    pub fn set_pending(&self, count: usize) {
        self.lock().pending = count;
    }

    /// Records a dispatched job.
    pub fn job_completed(&self, subject: &str, outcome: JobOutcome) {
        {
            let mut snapshot = self.lock();
            snapshot.jobs_processed += 1;
            snapshot.recent_jobs.push_front(JobRecord {
                at: Local::now(),
                subject: subject.to_string(),
                outcome,
            });
            snapshot.recent_jobs.truncate(RECENT_LIMIT);
        }
        self.bus.publish(StatusEvent::JobCompleted {
            subject: subject.to_string(),
            outcome,
        });
    }

    /// Records a recoverable error.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut snapshot = self.lock();
            snapshot.recent_errors.push_front(ErrorRecord {
                at: Local::now(),
                message: message.clone(),
            });
            snapshot.recent_errors.truncate(RECENT_LIMIT);
        }
        self.bus.publish(StatusEvent::ErrorOccurred(message));
    }

    /// Records the end of a cycle.
    pub fn cycle_timing(&self, last: DateTime<Local>, next: DateTime<Local>) {
        {
            let mut snapshot = self.lock();
            snapshot.last_check = Some(last);
            snapshot.next_check = Some(next);
        }
        self.bus.publish(StatusEvent::CycleTiming { last, next });
    }

    /// Records a retention sweep.
    pub fn cleanup_timing(&self, last: DateTime<Local>, next: DateTime<Local>) {
        {
            let mut snapshot = self.lock();
            snapshot.last_cleanup = Some(last);
            snapshot.next_cleanup = Some(next);
        }
        self.bus.publish(StatusEvent::CleanupTiming { last, next });
    }

    /// Records one tick of the idle countdown.
    pub fn countdown_tick(&self, remaining: u64, total: u64) {
        {
            let mut snapshot = self.lock();
            snapshot.countdown_remaining = remaining;
            snapshot.countdown_total = total;
        }
        self.bus
            .publish(StatusEvent::CountdownTick { remaining, total });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatusSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
